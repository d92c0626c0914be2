//! CLI-specific error types and exit code mapping

use std::collections::BTreeMap;

use depwatch_api::ApiError;
use depwatch_core::error::{DepwatchError, TokenError};
use depwatch_core::types::OutputMode;
use depwatch_engine::{Diagnostic, Ecosystem, EngineError};

/// Per-ecosystem diagnostics kept on a failed task.
pub type ScanDiagnostics = BTreeMap<Ecosystem, Vec<Diagnostic>>;

/// Exit code for a failed scan pipeline in machine-readable mode.
pub const JSON_SCAN_FAILURE_EXIT_CODE: i32 = -1;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Scan target could not be resolved.
    #[error("invalid path {path}: {reason}")]
    Path { path: String, reason: String },

    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Runtime environment is not usable (missing token, home directory, ...).
    #[error("{0}")]
    Environment(String),

    /// Token file could not be stored or removed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// Scan pipeline failure (detection, extraction, cancellation).
    #[error("scan failed: {message}")]
    Scan {
        message: String,
        /// Failures recorded per ecosystem before the task failed.
        diagnostics: ScanDiagnostics,
    },

    /// Remote service failure, surfaced verbatim.
    #[error("{0}")]
    Transport(#[from] ApiError),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Scan failure without per-ecosystem diagnostics.
    pub fn scan(message: impl Into<String>) -> Self {
        Self::Scan {
            message: message.into(),
            diagnostics: ScanDiagnostics::new(),
        }
    }

    /// Attach the diagnostics of a failed task. Other variants are returned unchanged.
    pub fn with_diagnostics(self, recorded: &ScanDiagnostics) -> Self {
        match self {
            Self::Scan { message, .. } => Self::Scan {
                message,
                diagnostics: recorded.clone(),
            },
            other => other,
        }
    }

    /// Per-ecosystem diagnostics (scan failures only).
    pub fn diagnostics(&self) -> Option<&ScanDiagnostics> {
        match self {
            Self::Scan { diagnostics, .. } if !diagnostics.is_empty() => Some(diagnostics),
            _ => None,
        }
    }

    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                        |
    /// |------|------------------------------------------------|
    /// | 0    | Success                                        |
    /// | 1    | Path, config, environment or transport failure |
    /// | 1    | Scan failure (interactive mode)                |
    /// | -1   | Scan failure (machine-readable mode)           |
    pub fn exit_code(&self, mode: OutputMode) -> i32 {
        match (self, mode) {
            (Self::Scan { .. }, OutputMode::MachineReadable) => JSON_SCAN_FAILURE_EXIT_CODE,
            _ => 1,
        }
    }

    /// Short machine-readable error category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Path { .. } => "path",
            Self::Config(_) => "config",
            Self::Environment(_) | Self::Token(_) => "environment",
            Self::Scan { .. } => "scan",
            Self::Transport(_) => "transport",
            Self::JsonSerialize(_) | Self::Io(_) => "output",
        }
    }
}

impl From<EngineError> for CliError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Transport(api) => Self::Transport(api),
            EngineError::InvalidTarget { path, reason } => Self::Path { path, reason },
            EngineError::Config { .. } => Self::Config(e.to_string()),
            other => Self::scan(other.to_string()),
        }
    }
}

impl From<DepwatchError> for CliError {
    fn from(e: DepwatchError) -> Self {
        match e {
            DepwatchError::Config(c) => Self::Config(c.to_string()),
            DepwatchError::Token(t) => Self::Token(t),
            DepwatchError::Io(io) => Self::Io(io),
            DepwatchError::Transport(msg) => Self::Environment(msg),
            DepwatchError::Scan(msg) => Self::scan(msg),
            DepwatchError::Cancelled => Self::scan("scan cancelled"),
        }
    }
}
