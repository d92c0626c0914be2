//! 테스트용 기록 클라이언트
//!
//! 네트워크 없이 엔진/CLI 흐름을 검증하기 위해 호출을 기록하고,
//! 필요하면 지정한 에러를 반환합니다.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiError;

/// 기록된 호출
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    /// 작업 시작 신호
    StartSignal { task_id: String },
    /// 결과 제출 (직렬화된 본문)
    SubmitResult {
        task_id: String,
        body: serde_json::Value,
    },
    /// 파일 업로드
    UploadFile {
        task_id: String,
        path: String,
        size: usize,
    },
}

/// 테스트용 Mock 전송 클라이언트
///
/// 복제본은 같은 호출 기록을 공유합니다.
#[derive(Debug, Clone, Default)]
pub struct MockApiClient {
    calls: Arc<Mutex<Vec<ApiCall>>>,
    start_error: Option<ApiError>,
    submit_error: Option<ApiError>,
    upload_error: Option<ApiError>,
}

impl MockApiClient {
    /// 모든 호출이 성공하는 클라이언트를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 시작 신호 호출이 실패하도록 설정합니다.
    pub fn with_start_error(mut self, err: ApiError) -> Self {
        self.start_error = Some(err);
        self
    }

    /// 결과 제출 호출이 실패하도록 설정합니다.
    pub fn with_submit_error(mut self, err: ApiError) -> Self {
        self.submit_error = Some(err);
        self
    }

    /// 업로드 호출이 실패하도록 설정합니다.
    pub fn with_upload_error(mut self, err: ApiError) -> Self {
        self.upload_error = Some(err);
        self
    }

    /// 지금까지 기록된 호출
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().clone()
    }

    /// 업로드된 파일 경로 목록
    pub fn uploaded_paths(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|call| match call {
                ApiCall::UploadFile { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// 마지막으로 제출된 결과 본문
    pub fn submitted_result(&self) -> Option<serde_json::Value> {
        self.lock().iter().rev().find_map(|call| match call {
            ApiCall::SubmitResult { body, .. } => Some(body.clone()),
            _ => None,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ApiCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: ApiCall) {
        self.lock().push(call);
    }
}

impl ApiClient for MockApiClient {
    async fn submit_start_signal(&self, task_id: &str) -> Result<(), ApiError> {
        self.record(ApiCall::StartSignal {
            task_id: task_id.to_owned(),
        });
        match &self.start_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn submit_result<T: Serialize + Sync>(
        &self,
        task_id: &str,
        result: &T,
    ) -> Result<(), ApiError> {
        let body = serde_json::to_value(result)
            .map_err(|e| ApiError::Request(format!("serialize result: {e}")))?;
        self.record(ApiCall::SubmitResult {
            task_id: task_id.to_owned(),
            body,
        });
        match &self.submit_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn upload_file(
        &self,
        task_id: &str,
        relative_path: &str,
        content: Vec<u8>,
    ) -> Result<(), ApiError> {
        self.record(ApiCall::UploadFile {
            task_id: task_id.to_owned(),
            path: relative_path.to_owned(),
            size: content.len(),
        });
        match &self.upload_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_in_order() {
        let client = MockApiClient::new();
        client.submit_start_signal("t-1").await.unwrap();
        client.upload_file("t-1", "lib/a.jar", vec![0; 4]).await.unwrap();
        client
            .submit_result("t-1", &serde_json::json!({"ok": true}))
            .await
            .unwrap();

        let calls = client.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[0],
            ApiCall::StartSignal {
                task_id: "t-1".to_owned()
            }
        );
        assert_eq!(client.uploaded_paths(), vec!["lib/a.jar".to_owned()]);
        assert_eq!(
            client.submitted_result(),
            Some(serde_json::json!({"ok": true}))
        );
    }

    #[tokio::test]
    async fn configured_error_is_returned_and_call_still_recorded() {
        let client = MockApiClient::new().with_submit_error(ApiError::Timeout);
        let result = client.submit_result("t-2", &1u8).await;
        assert_eq!(result, Err(ApiError::Timeout));
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn clones_share_the_call_log() {
        let client = MockApiClient::new();
        let clone = client.clone();
        clone.submit_start_signal("t-3").await.unwrap();
        assert_eq!(client.calls().len(), 1);
    }
}
