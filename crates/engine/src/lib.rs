//! depwatch 스캔 엔진
//!
//! 대상 디렉토리의 빌드/패키지 생태계를 탐지하고, 각 생태계의 도구를 안전하게 실행하여
//! 의존성 그래프를 추출한 뒤 하나의 작업 결과로 병합합니다.
//!
//! # 모듈 구성
//!
//! - [`error`]: 엔진 에러 (`EngineError`)
//! - [`config`]: 엔진 설정 (`EngineSettings`, 빌더)
//! - [`process`]: 외부 프로세스 실행 (`ProcessRunner`, `Invocation`, `EnvOverlay`)
//! - [`failure`]: 실행 실패 분류 (`ExecutionFailure`, `FailureKind`)
//! - [`version`]: 도구 버전 파싱 (`ToolVersion`)
//! - [`environment`]: 결정된 생태계 환경 (`EcosystemEnvironment`)
//! - [`detector`]: 생태계 탐지기 (`EcosystemDetector` trait, Gradle/Maven/npm/Go/pip)
//! - [`extract`]: 의존성 추출 (트리 출력, lockfile)
//! - [`task`]: 스캔 작업 모델과 상태 전이 (`ScanTask`, `TaskState`, `TaskResult`)
//! - [`context`]: 실행 컨텍스트 (`ExecContext`, `ScanContext`)
//! - [`git`]: Git 메타데이터
//! - [`deep`]: 업로드 대상 수집 (딥 스캔, 바이너리/펌웨어)
//! - [`inspector`]: 오케스트레이터 (`Inspector`)
//!
//! # 아키텍처
//!
//! ```text
//! ScanTask --> ScanContext --> Inspector --+--> EcosystemDetector (생태계별 동시)
//!                                          |        |
//!                                          |   ProcessRunner --> VersionProbe / FailureClassifier
//!                                          |        |
//!                                          +--> extract --> TaskResult --> ApiClient
//! ```

pub mod config;
pub mod context;
pub mod deep;
pub mod detector;
pub mod environment;
pub mod error;
pub mod extract;
pub mod failure;
pub mod git;
pub mod inspector;
pub mod process;
pub mod task;
pub mod types;
pub mod version;

// --- Public API Re-exports ---

// 오케스트레이터
pub use inspector::Inspector;

// 설정
pub use config::{EngineSettings, EngineSettingsBuilder};

// 컨텍스트
pub use context::{ExecContext, ScanContext};

// 에러
pub use error::EngineError;
pub use failure::{ExecutionFailure, FailureKind, STDERR_EXCERPT_LIMIT};
pub use process::{EnvOverlay, Invocation, ProcessError, ProcessOutput, ProcessRunner};

// 탐지
pub use detector::{
    Detection, EcosystemDetector, GoDetector, GradleDetector, ManifestOnlyReason, MavenDetector,
    NpmDetector, PipDetector, default_detectors,
};
pub use environment::{CandidateAttempt, CandidateOrigin, CandidateStatus, EcosystemEnvironment};
pub use version::{ToolVersion, VersionParseError};

// 추출
pub use extract::{ExtractOptions, ScopeFilter};

// 작업
pub use task::{
    Artifact, Diagnostic, DiagnosticStage, EcosystemModule, ScanTask, ScanTaskBuilder, TaskReport,
    TaskResult, TaskState,
};

// 도메인 타입
pub use git::GitInfo;
pub use types::{Dependency, Ecosystem};
