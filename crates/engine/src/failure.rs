//! 실행 실패 분류
//!
//! 원시 프로세스 에러([`ProcessError`])와 버전 파싱 에러([`VersionParseError`])를
//! 종료 코드, 제한된 stderr 발췌, 원본 에러를 담은 [`ExecutionFailure`]로 변환합니다.
//!
//! 호출자는 문자열 비교 없이 [`FailureKind`]로 분기합니다.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde::ser::SerializeStruct;

use crate::process::ProcessError;
use crate::version::VersionParseError;

/// stderr 발췌 최대 길이 (바이트)
pub const STDERR_EXCERPT_LIMIT: usize = 256;

/// 실패 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 시작 실패 또는 0이 아닌 종료 (다음 후보로 대체 가능)
    Execution,
    /// 실행은 성공했으나 출력 해석 실패 (다음 후보로 대체 가능)
    Parse,
    /// 실행 시간 초과
    TimedOut,
    /// 실행 컨텍스트 취소 (재시도하지 않음)
    Cancelled,
}

impl FailureKind {
    /// 다음 후보로 넘어갈 수 있는 실패인지 반환합니다.
    pub fn allows_fallback(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Execution => "execution",
            Self::Parse => "parse",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 분류된 실행 실패
///
/// 원본 에러는 `Arc`로 보관하여 복제해도 원인 체인이 유지됩니다.
#[derive(Debug, Clone)]
pub struct ExecutionFailure {
    kind: FailureKind,
    exit_code: Option<i32>,
    stderr_excerpt: Vec<u8>,
    source: Arc<dyn std::error::Error + Send + Sync + 'static>,
}

impl ExecutionFailure {
    /// 프로세스 에러를 분류합니다.
    pub fn classify(err: ProcessError) -> Self {
        match err {
            ProcessError::Exited {
                code, ref stderr, ..
            } => {
                let stderr_excerpt = truncate_excerpt(stderr).to_vec();
                Self {
                    kind: FailureKind::Execution,
                    exit_code: code,
                    stderr_excerpt,
                    source: Arc::new(err),
                }
            }
            ProcessError::TimedOut { .. } => Self::without_output(FailureKind::TimedOut, err),
            ProcessError::Cancelled { .. } => Self::without_output(FailureKind::Cancelled, err),
            ProcessError::Spawn { .. } | ProcessError::Io { .. } => {
                Self::without_output(FailureKind::Execution, err)
            }
        }
    }

    /// 버전 파싱 실패를 분류합니다.
    ///
    /// 프로세스는 정상 종료했으므로 종료 코드는 0입니다.
    pub fn from_parse(err: VersionParseError, stderr: &[u8]) -> Self {
        Self {
            kind: FailureKind::Parse,
            exit_code: Some(0),
            stderr_excerpt: truncate_excerpt(stderr).to_vec(),
            source: Arc::new(err),
        }
    }

    fn without_output(kind: FailureKind, err: ProcessError) -> Self {
        Self {
            kind,
            exit_code: None,
            stderr_excerpt: Vec::new(),
            source: Arc::new(err),
        }
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// 프로세스가 실제로 시작되어 코드를 반환한 경우에만 존재합니다.
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// stderr 발췌 (최대 [`STDERR_EXCERPT_LIMIT`] 바이트)
    pub fn stderr_excerpt(&self) -> &[u8] {
        &self.stderr_excerpt
    }

    /// stderr 발췌를 문자열로 해석합니다. 잘린 멀티바이트 문자는 대체 문자가 됩니다.
    pub fn stderr_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr_excerpt)
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == FailureKind::Cancelled
    }

    /// 원본 에러
    pub fn underlying(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.source.as_ref()
    }
}

/// 앞에서부터 최대 [`STDERR_EXCERPT_LIMIT`] 바이트를 반환합니다.
pub fn truncate_excerpt(stderr: &[u8]) -> &[u8] {
    &stderr[..stderr.len().min(STDERR_EXCERPT_LIMIT)]
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        if !self.stderr_excerpt.is_empty() {
            write!(f, ", output:\n{}", self.stderr_text())?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecutionFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl Serialize for ExecutionFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ExecutionFailure", 4)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("message", &self.source.to_string())?;
        state.serialize_field("exit_code", &self.exit_code)?;
        state.serialize_field("stderr", &self.stderr_text())?;
        state.end()
    }
}
