//! depwatch 전송 클라이언트
//!
//! 완료된 스캔 작업 결과를 원격 취약점 매칭 서비스로 전송합니다.
//!
//! # 모듈 구성
//!
//! - [`error`]: 전송 에러 (`ApiError`)
//! - [`client`]: 전송 추상화 (`ApiClient` 트레이트, `HttpApiClient`)
//! - [`mock`]: 테스트용 기록 클라이언트 (`MockApiClient`)
//!
//! # 응답 분류
//!
//! | 응답 | 결과 |
//! |------|------|
//! | 2xx | 성공 |
//! | 4xx/5xx + `{"error": {...}}` | [`ApiError::Application`] |
//! | 4xx/5xx + 해석 불가 본문 | [`ApiError::ParseErrorBody`] |
//! | 네트워크 타임아웃 | [`ApiError::Timeout`] |
//! | 그 외 | [`ApiError::Request`] |

pub mod client;
pub mod error;
pub mod mock;

pub use client::{ApiClient, HttpApiClient};
pub use error::ApiError;
pub use mock::{ApiCall, MockApiClient};
