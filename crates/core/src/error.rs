//! 에러 타입: 도메인별 에러 정의
//!
//! 각 크레이트는 자기 도메인 에러(`EngineError`, `ApiError` 등)를 정의하고,
//! `From` 구현을 통해 최상위 [`DepwatchError`]로 변환합니다.

/// depwatch 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum DepwatchError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 토큰 저장소 에러
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// 스캔 엔진 에러 (생태계 탐지, 추출, 작업 상태)
    #[error("scan error: {0}")]
    Scan(String),

    /// 원격 서비스 전송 에러
    #[error("transport error: {0}")]
    Transport(String),

    /// 취소됨
    #[error("cancelled")]
    Cancelled,

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 토큰 저장소 에러
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// 홈 디렉토리를 확인할 수 없음
    #[error("cannot determine home directory")]
    HomeDirUnavailable,

    /// 삭제할 토큰 파일이 없음
    #[error("token file not found")]
    TokenFileNotFound,

    /// 토큰 파일 I/O 실패
    #[error("{action} token file {path}: {source}")]
    Io {
        /// 수행하던 동작 (read, write, delete)
        action: &'static str,
        /// 토큰 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}
