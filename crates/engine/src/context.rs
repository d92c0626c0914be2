//! 실행 컨텍스트
//!
//! [`ExecContext`]는 취소 토큰, 엔진 설정, 프로세스 실행기, 로그 span을 묶어
//! 파이프라인 전체에 명시적으로 전달됩니다. 전역 상태를 사용하지 않으므로
//! 동시에 실행되는 작업(테스트, 배치)이 서로 간섭하지 않습니다.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Span;

use crate::config::EngineSettings;
use crate::process::{Invocation, ProcessError, ProcessOutput, ProcessRunner};
use crate::task::ScanTask;

/// 실행 컨텍스트
///
/// 복제본은 같은 취소 토큰과 설정을 공유합니다.
#[derive(Debug, Clone)]
pub struct ExecContext {
    cancel: CancellationToken,
    settings: Arc<EngineSettings>,
    runner: ProcessRunner,
    span: Span,
}

impl ExecContext {
    pub fn new(settings: EngineSettings) -> Self {
        let runner =
            ProcessRunner::new(settings.process_timeout).with_kill_grace(settings.kill_grace);
        Self {
            cancel: CancellationToken::new(),
            settings: Arc::new(settings),
            runner,
            span: Span::none(),
        }
    }

    /// 로그 span을 교체한 컨텍스트를 반환합니다.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// 컨텍스트를 취소합니다. 진행 중인 모든 자식 프로세스가 종료됩니다.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `after` 경과 후 컨텍스트를 취소하는 타이머를 시작합니다 (전체 마감 시간).
    pub fn cancel_after(&self, after: Duration) -> JoinHandle<()> {
        let token = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(after) => token.cancel(),
                _ = token.cancelled() => {}
            }
        })
    }

    /// 컨텍스트의 취소 토큰으로 명령을 실행합니다.
    pub async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, ProcessError> {
        self.runner.run(&self.cancel, invocation).await
    }
}

/// 스캔 작업과 실행 컨텍스트의 묶음
///
/// 작업은 이 구조체가 단독으로 소유합니다.
#[derive(Debug)]
pub struct ScanContext {
    pub exec: ExecContext,
    pub task: ScanTask,
}

impl ScanContext {
    pub fn new(exec: ExecContext, task: ScanTask) -> Self {
        Self { exec, task }
    }
}
