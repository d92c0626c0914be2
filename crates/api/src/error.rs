//! 전송 에러 타입
//!
//! [`ApiError`]는 원격 서비스 호출에서 발생하는 모든 에러를 나타냅니다.
//! `From<ApiError> for DepwatchError` 구현으로 최상위 에러로 전파됩니다.

use depwatch_core::error::DepwatchError;

/// 전송 에러
///
/// 모든 필드가 문자열/정수이므로 복제 가능합니다 (Mock 클라이언트에서 재사용).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// 요청 타임아웃
    #[error("API request timeout")]
    Timeout,

    /// 토큰이 없거나 비어있음
    #[error("token invalid")]
    TokenInvalid,

    /// 요청 전송 실패 (연결 실패, 예상하지 못한 상태 코드 등)
    #[error("send request failed: {0}")]
    Request(String),

    /// 서버가 반환한 구조화된 애플리케이션 에러
    #[error("[{code}]{}", detail_text(.message, .details))]
    Application {
        /// HTTP 상태 코드
        status: u16,
        /// 서비스 에러 코드
        code: i64,
        /// 에러 메시지
        message: String,
        /// 상세 설명
        details: String,
    },

    /// 에러 응답 본문을 해석할 수 없음
    #[error("parse error message failed (HTTP {status})")]
    ParseErrorBody {
        /// HTTP 상태 코드
        status: u16,
    },
}

impl ApiError {
    /// 네트워크 타임아웃 에러인지 반환합니다.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// `details`가 비어있으면 `message`를 사용합니다.
fn detail_text<'a>(message: &'a str, details: &'a str) -> &'a str {
    if details.is_empty() { message } else { details }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(err.to_string())
        }
    }
}

impl From<ApiError> for DepwatchError {
    fn from(err: ApiError) -> Self {
        DepwatchError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_error_prefers_details() {
        let err = ApiError::Application {
            status: 400,
            code: 1001,
            message: "bad request".to_owned(),
            details: "task_info missing".to_owned(),
        };
        assert_eq!(err.to_string(), "[1001]task_info missing");
    }

    #[test]
    fn application_error_falls_back_to_message() {
        let err = ApiError::Application {
            status: 500,
            code: 7,
            message: "internal".to_owned(),
            details: String::new(),
        };
        assert_eq!(err.to_string(), "[7]internal");
    }

    #[test]
    fn converts_to_transport_error() {
        let err: DepwatchError = ApiError::Timeout.into();
        assert!(matches!(err, DepwatchError::Transport(_)));
        assert!(err.to_string().contains("API request timeout"));
    }

    #[test]
    fn only_timeout_reports_timeout() {
        assert!(ApiError::Timeout.is_timeout());
        assert!(!ApiError::Request("refused".to_owned()).is_timeout());
    }
}
