//! 원격 서비스 API 추상화
//!
//! [`ApiClient`] 트레이트는 엔진과 CLI가 사용하는 전송 연산을 정의합니다.
//! 운영 코드는 [`HttpApiClient`]를, 테스트는 [`MockApiClient`](crate::MockApiClient)를 사용합니다.
//!
//! ```text
//! Inspector ──▶ ApiClient (trait)
//!                 │        │
//!                 ▼        ▼
//!          HttpApiClient  MockApiClient
//!                 │
//!                 ▼
//!          remote service
//! ```

use std::future::Future;

use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use depwatch_core::config::ServerConfig;

use crate::error::ApiError;

/// 작업 시작 신호 엔드포인트
pub const START_CHECK_PATH: &str = "/message/v2/access/client/start_check";

/// 작업 결과 제출 엔드포인트
pub const SUBMIT_RESULT_PATH: &str = "/message/v2/access/client/submit_result";

/// 파일 업로드 엔드포인트 (딥 스캔, 바이너리/펌웨어 스캔)
pub const UPLOAD_FILE_PATH: &str = "/message/v2/access/client/upload_file";

/// 원격 서비스 전송 연산
///
/// 트레이트는 `Send + Sync + 'static`이므로 `Arc`로 감싸 비동기 작업 간에 공유할 수 있습니다.
pub trait ApiClient: Send + Sync + 'static {
    /// 작업 시작 신호를 보냅니다.
    ///
    /// 결과 제출 전에 작업마다 한 번 호출합니다. 빈 작업 ID는 호출 측 버그입니다.
    fn submit_start_signal(
        &self,
        task_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// 직렬화 가능한 작업 결과를 제출합니다.
    fn submit_result<T: Serialize + Sync>(
        &self,
        task_id: &str,
        result: &T,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// 파일 하나를 업로드합니다.
    ///
    /// `relative_path`는 스캔 대상 루트 기준 경로입니다.
    fn upload_file(
        &self,
        task_id: &str,
        relative_path: &str,
        content: Vec<u8>,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;
}

#[derive(Debug, Serialize)]
struct StartCheckRequest<'a> {
    task_info: &'a str,
}

#[derive(Debug, Serialize)]
struct SubmitResultRequest<'a, T> {
    task_info: &'a str,
    result: &'a T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: String,
}

/// reqwest 기반 운영 클라이언트
///
/// 모든 요청에 `Authorization: Bearer <token>` 헤더를 붙입니다.
#[derive(Debug, Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpApiClient {
    /// 서버 설정과 토큰으로 클라이언트를 생성합니다.
    ///
    /// 토큰이 비어있으면 [`ApiError::TokenInvalid`]를 반환합니다.
    pub fn new(server: &ServerConfig, token: impl Into<String>) -> Result<Self, ApiError> {
        let token = token.into().trim().to_owned();
        if token.is_empty() {
            return Err(ApiError::TokenInvalid);
        }

        if server.tls_allow_insecure {
            warn!("TLS certificate verification disabled");
        }

        let client = reqwest::Client::builder()
            .timeout(server.request_timeout())
            .danger_accept_invalid_certs(server.tls_allow_insecure)
            .user_agent(concat!("depwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Request(format!("build http client: {e}")))?;

        Ok(Self {
            client,
            base_url: server.normalized_base_url(),
            token,
        })
    }

    /// 정규화된 서비스 기본 주소
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Request(format!("read response body failed: {e}")))?;
        debug!(status = status.as_u16(), size = body.len(), "response received");

        if status.is_success() {
            return Ok(());
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(parse_error_body(status, &body));
        }
        Err(ApiError::Request(format!("http code {status}")))
    }
}

/// 4xx/5xx 응답 본문을 구조화된 에러로 변환합니다.
fn parse_error_body(status: StatusCode, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => ApiError::Application {
            status: status.as_u16(),
            code: envelope.error.code,
            message: envelope.error.message,
            details: envelope.error.details,
        },
        Err(e) => {
            debug!(error = %e, "error body is not structured");
            ApiError::ParseErrorBody {
                status: status.as_u16(),
            }
        }
    }
}

impl ApiClient for HttpApiClient {
    async fn submit_start_signal(&self, task_id: &str) -> Result<(), ApiError> {
        debug_assert!(!task_id.is_empty(), "task id must not be empty");
        debug!(task_id, "send start signal");
        self.send(
            self.post(START_CHECK_PATH)
                .json(&StartCheckRequest { task_info: task_id }),
        )
        .await
    }

    async fn submit_result<T: Serialize + Sync>(
        &self,
        task_id: &str,
        result: &T,
    ) -> Result<(), ApiError> {
        debug!(task_id, "submit result");
        self.send(self.post(SUBMIT_RESULT_PATH).json(&SubmitResultRequest {
            task_info: task_id,
            result,
        }))
        .await
    }

    async fn upload_file(
        &self,
        task_id: &str,
        relative_path: &str,
        content: Vec<u8>,
    ) -> Result<(), ApiError> {
        debug!(task_id, path = relative_path, size = content.len(), "upload file");
        self.send(
            self.post(UPLOAD_FILE_PATH)
                .query(&[("task_info", task_id), ("path", relative_path)])
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                .body(content),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server(url: &str) -> ServerConfig {
        ServerConfig {
            base_url: url.to_owned(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn blank_token_is_rejected() {
        let result = HttpApiClient::new(&server("https://sca.example.com"), "  ");
        assert!(matches!(result, Err(ApiError::TokenInvalid)));
    }

    #[test]
    fn base_url_is_normalized() {
        let client = HttpApiClient::new(&server(" https://sca.example.com/// "), "t").unwrap();
        assert_eq!(client.base_url(), "https://sca.example.com");
    }

    #[test]
    fn structured_error_body_is_parsed() {
        let body = br#"{"error":{"code":4001,"message":"bad","details":"token expired"}}"#;
        let err = parse_error_body(StatusCode::UNAUTHORIZED, body);
        assert_eq!(
            err,
            ApiError::Application {
                status: 401,
                code: 4001,
                message: "bad".to_owned(),
                details: "token expired".to_owned(),
            }
        );
    }

    #[test]
    fn missing_optional_error_fields_default_to_empty() {
        let err = parse_error_body(StatusCode::BAD_REQUEST, br#"{"error":{"code":1}}"#);
        assert_eq!(err.to_string(), "[1]");
    }

    #[test]
    fn unstructured_error_body_is_reported() {
        let err = parse_error_body(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err, ApiError::ParseErrorBody { status: 502 });
    }
}
