//! depwatch 공통 크레이트
//!
//! CLI, 전송 클라이언트, 스캔 엔진이 공유하는 타입을 정의합니다.
//!
//! - [`error`]: 최상위 에러 (`DepwatchError`) 및 설정/토큰 에러
//! - [`config`]: `DepwatchConfig` 로딩, 환경변수 오버라이드, 검증
//! - [`token`]: API 토큰 결정 및 로컬 토큰 파일 관리
//! - [`types`]: 스캔 종류, 출력 모드, 콘솔 로그 레벨
//! - [`metrics`]: 메트릭 이름 상수

pub mod config;
pub mod error;
pub mod metrics;
pub mod token;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, DepwatchError, TokenError};

// 설정
pub use config::{DepwatchConfig, GeneralConfig, ScanConfig, ServerConfig};

// 토큰
pub use token::{TokenSource, TokenStore};

// 도메인 타입
pub use types::{ConsoleLogLevel, OutputMode, ScanKind};
