//! 엔진 에러 타입
//!
//! [`EngineError`]는 탐지, 추출, 작업 상태 전이에서 발생하는 모든 에러를 나타냅니다.
//! `From<EngineError> for DepwatchError` 구현으로 `?` 연산자를 통해 상위로 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **탐지**: `Detection`, `NoCandidate`, `DetectionExhausted`, `NoEcosystem`
//! - **추출**: `Extraction`, `ExtractionFailed`
//! - **작업**: `InvalidTarget`, `InvalidTransition`, `TaskSealed`
//! - **취소**: `Cancelled` (재시도하지 않음)
//! - **전송**: `Transport`
//! - **설정/I/O**: `Config`, `Io`, `Join`

use depwatch_api::ApiError;
use depwatch_core::error::DepwatchError;

use crate::failure::ExecutionFailure;
use crate::task::TaskState;
use crate::types::Ecosystem;

/// 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 생태계 환경 평가 실패 (마지막 후보의 분류된 실패)
    #[error("evaluate {ecosystem} environment: {failure}")]
    Detection {
        ecosystem: Ecosystem,
        #[source]
        failure: ExecutionFailure,
    },

    /// 평가할 후보가 없음
    #[error("no {ecosystem} tool candidate available")]
    NoCandidate { ecosystem: Ecosystem },

    /// 적용 가능한 모든 생태계의 탐지 실패
    #[error("no ecosystem environment could be resolved: {}", describe_failures(.failures))]
    DetectionExhausted {
        /// 생태계별 실패 (생태계 순서)
        failures: Vec<(Ecosystem, EngineError)>,
    },

    /// 대상 디렉토리에 지원하는 매니페스트가 없음
    #[error("no supported ecosystem found in {path}")]
    NoEcosystem { path: String },

    /// 실행 컨텍스트 취소
    #[error("scan cancelled")]
    Cancelled,

    /// 추출 결과 해석 실패
    #[error("extract {ecosystem} dependencies: {reason}")]
    Extraction { ecosystem: Ecosystem, reason: String },

    /// 추출 도구 실행 실패
    #[error("extract {ecosystem} dependencies: {failure}")]
    ExtractionFailed {
        ecosystem: Ecosystem,
        #[source]
        failure: ExecutionFailure,
    },

    /// 스캔 대상 경로 오류
    #[error("invalid scan target {path}: {reason}")]
    InvalidTarget { path: String, reason: String },

    /// 허용되지 않는 작업 상태 전이
    #[error("invalid task transition: {from} -> {to}")]
    InvalidTransition { from: TaskState, to: TaskState },

    /// 오케스트레이터에 넘겨진 뒤 변경 시도
    #[error("task is sealed, cannot change {field}")]
    TaskSealed { field: &'static str },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 백그라운드 태스크 실패 (패닉 또는 중단)
    #[error("background task failed: {0}")]
    Join(String),

    /// 원격 서비스 전송 에러
    #[error(transparent)]
    Transport(#[from] ApiError),

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

fn describe_failures(failures: &[(Ecosystem, EngineError)]) -> String {
    failures
        .iter()
        .map(|(_, err)| err.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl EngineError {
    /// 취소로 인한 에러인지 반환합니다.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// 관련 생태계 (생태계 단위 에러만)
    pub fn ecosystem(&self) -> Option<Ecosystem> {
        match self {
            Self::Detection { ecosystem, .. }
            | Self::NoCandidate { ecosystem }
            | Self::Extraction { ecosystem, .. }
            | Self::ExtractionFailed { ecosystem, .. } => Some(*ecosystem),
            _ => None,
        }
    }

    /// 생태계별로 나눈 실패 목록
    ///
    /// `DetectionExhausted`는 담긴 실패 전부를, 생태계 단위 에러는 자기 자신을 반환합니다.
    pub fn ecosystem_failures(&self) -> Vec<(Ecosystem, &EngineError)> {
        match self {
            Self::DetectionExhausted { failures } => {
                failures.iter().map(|(eco, err)| (*eco, err)).collect()
            }
            other => other.ecosystem().map(|eco| (eco, other)).into_iter().collect(),
        }
    }

    /// 추출 단계 에러인지 반환합니다.
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. } | Self::ExtractionFailed { .. })
    }

    /// 분류된 실행 실패 (있는 경우)
    pub fn execution_failure(&self) -> Option<&ExecutionFailure> {
        match self {
            Self::Detection { failure, .. } | Self::ExtractionFailed { failure, .. } => {
                Some(failure)
            }
            _ => None,
        }
    }
}

impl From<EngineError> for DepwatchError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Cancelled => DepwatchError::Cancelled,
            EngineError::Transport(e) => DepwatchError::from(e),
            other => DepwatchError::Scan(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;
    use crate::process::ProcessError;

    fn exec_failure() -> ExecutionFailure {
        ExecutionFailure::classify(ProcessError::Exited {
            program: "gradle".to_owned(),
            code: Some(1),
            stdout: Vec::new(),
            stderr: b"boom".to_vec(),
        })
    }

    #[test]
    fn detection_error_chains_failure() {
        let err = EngineError::Detection {
            ecosystem: Ecosystem::Gradle,
            failure: exec_failure(),
        };
        assert!(err.to_string().starts_with("evaluate gradle environment"));
        let source = err.source().expect("failure must be chained");
        assert!(source.to_string().contains("exit status 1"));
        assert_eq!(err.ecosystem(), Some(Ecosystem::Gradle));
        assert_eq!(err.execution_failure().and_then(|f| f.exit_code()), Some(1));
    }

    #[test]
    fn exhausted_error_lists_every_ecosystem() {
        let err = EngineError::DetectionExhausted {
            failures: vec![
                (
                    Ecosystem::Gradle,
                    EngineError::Detection {
                        ecosystem: Ecosystem::Gradle,
                        failure: exec_failure(),
                    },
                ),
                (
                    Ecosystem::Maven,
                    EngineError::NoCandidate {
                        ecosystem: Ecosystem::Maven,
                    },
                ),
            ],
        };
        let msg = err.to_string();
        assert!(msg.contains("evaluate gradle environment"));
        assert!(msg.contains("no maven tool candidate"));

        let split = err.ecosystem_failures();
        assert_eq!(
            split.iter().map(|(eco, _)| *eco).collect::<Vec<_>>(),
            vec![Ecosystem::Gradle, Ecosystem::Maven]
        );
        assert_eq!(split[0].1.execution_failure().and_then(|f| f.exit_code()), Some(1));
    }

    #[test]
    fn single_ecosystem_error_splits_to_itself() {
        let err = EngineError::Extraction {
            ecosystem: Ecosystem::Npm,
            reason: "bad lockfile".to_owned(),
        };
        let split = err.ecosystem_failures();
        assert_eq!(split.len(), 1);
        assert_eq!(split[0].0, Ecosystem::Npm);
        assert!(err.is_extraction());
        assert!(EngineError::Cancelled.ecosystem_failures().is_empty());
    }

    #[test]
    fn transition_error_display() {
        let err = EngineError::InvalidTransition {
            from: TaskState::Completed,
            to: TaskState::Extracting,
        };
        assert_eq!(err.to_string(), "invalid task transition: completed -> extracting");
    }

    #[test]
    fn converts_to_top_level_error() {
        assert!(matches!(
            DepwatchError::from(EngineError::Cancelled),
            DepwatchError::Cancelled
        ));
        assert!(matches!(
            DepwatchError::from(EngineError::Transport(ApiError::Timeout)),
            DepwatchError::Transport(_)
        ));
        let err = DepwatchError::from(EngineError::NoEcosystem {
            path: "/work".to_owned(),
        });
        assert!(err.to_string().contains("no supported ecosystem found in /work"));
    }
}
