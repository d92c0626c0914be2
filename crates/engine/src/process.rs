//! 외부 프로세스 실행기
//!
//! [`ProcessRunner`]는 수명이 제한된 외부 명령 실행을 담당합니다.
//!
//! - 호출이 반환되면 자식 프로세스는 더 이상 실행 중이 아닙니다
//!   (정상 종료, 취소/타임아웃으로 종료, 또는 시작 실패).
//! - stdout/stderr는 바이트열로 수집합니다.
//! - 종료 코드 0일 때만 `Ok`를 반환합니다.
//! - 환경변수 오버레이([`EnvOverlay`])는 호출마다 적용되며 부모 프로세스 환경을 변경하지 않습니다.
//!
//! # 종료 절차 (unix)
//!
//! 자식은 새 프로세스 그룹에서 시작합니다. 취소나 타임아웃 시 그룹 전체에
//! SIGTERM을 보내고, 유예 시간 안에 종료하지 않으면 SIGKILL을 보낸 뒤 회수합니다.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use depwatch_core::metrics as m;

/// 기본 종료 유예 시간
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);

const GROUP_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// 프로세스 실행 에러
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// 프로세스 시작 실패 (실행 파일 없음, 권한 없음 등)
    #[error("start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// 0이 아닌 코드로 종료
    #[error("{program}: exit status {}", exit_code_text(.code))]
    Exited {
        program: String,
        /// 종료 코드 (시그널로 종료되면 None)
        code: Option<i32>,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
    },

    /// 실행 시간 초과
    #[error("{program}: timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },

    /// 실행 컨텍스트가 취소됨
    #[error("{program}: cancelled")]
    Cancelled { program: String },

    /// 실행 중 I/O 실패 (출력 수집 등)
    #[error("{program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

fn exit_code_text(code: &Option<i32>) -> String {
    code.map_or_else(|| "unknown (killed by signal)".to_owned(), |c| c.to_string())
}

/// 불변 환경변수 오버레이
///
/// 부모 환경을 상속한 뒤 같은 키만 교체합니다. 중복 항목은 생기지 않습니다.
/// `with`는 새 오버레이를 반환하므로 공유된 오버레이가 변경되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverlay {
    vars: BTreeMap<OsString, OsString>,
}

impl EnvOverlay {
    /// 빈 오버레이
    pub fn new() -> Self {
        Self::default()
    }

    /// 키 하나를 추가/교체한 새 오버레이를 반환합니다.
    pub fn with(&self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        let mut vars = self.vars.clone();
        vars.insert(key.into(), value.into());
        Self { vars }
    }

    /// `other`의 항목이 우선하도록 합친 새 오버레이를 반환합니다.
    pub fn merged(&self, other: &EnvOverlay) -> Self {
        let mut vars = self.vars.clone();
        vars.extend(other.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { vars }
    }

    /// 키에 해당하는 값
    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars.iter().map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    fn apply(&self, cmd: &mut Command) {
        for (key, value) in &self.vars {
            cmd.env(key, value);
        }
    }
}

/// 실행할 명령 하나
#[derive(Debug, Clone)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
    overlay: EnvOverlay,
    timeout: Option<Duration>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            overlay: EnvOverlay::default(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// 작업 디렉토리
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// 환경변수 오버레이 (기존 오버레이와 합쳐지며 새 값이 우선)
    pub fn overlay(mut self, overlay: &EnvOverlay) -> Self {
        self.overlay = self.overlay.merged(overlay);
        self
    }

    /// 이 호출에만 적용되는 타임아웃 (없으면 실행기 기본값)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn env_overlay(&self) -> &EnvOverlay {
        &self.overlay
    }

    /// 로그용 명령줄 문자열
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

/// 성공한 실행의 출력
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// stdout을 UTF-8로 해석합니다 (잘못된 바이트는 대체 문자).
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// 외부 프로세스 실행기
///
/// 상태가 없으므로 복제 비용이 작고, 실행 컨텍스트에 담아 전달합니다.
#[derive(Debug, Clone, Copy)]
pub struct ProcessRunner {
    default_timeout: Duration,
    kill_grace: Duration,
}

enum WaitOutcome {
    Exited(ExitStatus),
    Cancelled,
    TimedOut,
}

impl ProcessRunner {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            default_timeout,
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    /// 종료 유예 시간을 설정합니다.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// 명령을 실행하고 종료될 때까지 기다립니다.
    ///
    /// `cancel`이 취소되거나 타임아웃이 지나면 프로세스 트리를 종료하고
    /// 유예 시간 안에 반환합니다.
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        invocation: &Invocation,
    ) -> Result<ProcessOutput, ProcessError> {
        let program = invocation.program_name();
        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled { program });
        }

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.current_dir {
            cmd.current_dir(dir);
        }
        if !invocation.overlay.is_empty() {
            debug!(program = %program, vars = invocation.overlay.len(), "apply env overlay");
            invocation.overlay.apply(&mut cmd);
        }
        configure_process_group(&mut cmd);

        info!("Execute: {}", invocation.command_line());
        let started = Instant::now();

        let mut child = cmd.spawn().map_err(|source| {
            record_invocation("spawn_failed", started);
            ProcessError::Spawn {
                program: program.clone(),
                source,
            }
        })?;
        // 리더가 회수된 뒤에도 그룹에 남은 자식을 종료하기 위해 보관
        let pgid = child.id();

        let mut stdout_handle = spawn_reader(child.stdout.take());
        let mut stderr_handle = spawn_reader(child.stderr.take());

        let timeout = invocation.timeout.unwrap_or(self.default_timeout);
        let deadline = tokio::time::Instant::now() + timeout;
        let outcome = tokio::select! {
            status = child.wait() => match status {
                Ok(status) => WaitOutcome::Exited(status),
                Err(source) => {
                    stdout_handle.abort();
                    stderr_handle.abort();
                    record_invocation("io_error", started);
                    return Err(ProcessError::Io { program, source });
                }
            },
            _ = cancel.cancelled() => WaitOutcome::Cancelled,
            _ = tokio::time::sleep_until(deadline) => WaitOutcome::TimedOut,
        };

        let status = match outcome {
            WaitOutcome::Exited(status) => status,
            interrupted => {
                self.terminate(&mut child, &program).await;
                stdout_handle.abort();
                stderr_handle.abort();
                return Err(interrupted_error(interrupted, program, timeout, started));
            }
        };

        // 백그라운드 자식이 파이프를 잡고 있으면 리더 종료 후에도 EOF가 오지 않습니다.
        let collected = tokio::select! {
            output = async {
                let stdout = join_reader(&mut stdout_handle).await;
                let stderr = join_reader(&mut stderr_handle).await;
                (stdout, stderr)
            } => Ok(output),
            _ = cancel.cancelled() => Err(WaitOutcome::Cancelled),
            _ = tokio::time::sleep_until(deadline) => Err(WaitOutcome::TimedOut),
        };

        let (stdout, stderr) = match collected {
            Ok(output) => output,
            Err(interrupted) => {
                debug!(program = %program, "leader exited but output pipes are still held");
                if let Some(pgid) = pgid {
                    kill_process_group(pgid, self.kill_grace).await;
                }
                stdout_handle.abort();
                stderr_handle.abort();
                return Err(interrupted_error(interrupted, program, timeout, started));
            }
        };
        let stdout = stdout.map_err(|source| ProcessError::Io {
            program: program.clone(),
            source,
        })?;
        let stderr = stderr.map_err(|source| ProcessError::Io {
            program: program.clone(),
            source,
        })?;

        if status.success() {
            record_invocation("success", started);
            return Ok(ProcessOutput { stdout, stderr });
        }

        record_invocation("failure", started);
        Err(ProcessError::Exited {
            program,
            code: status.code(),
            stdout,
            stderr,
        })
    }

    /// 프로세스 트리를 종료하고 유예 시간 안에 회수합니다.
    async fn terminate(&self, child: &mut Child, program: &str) {
        if let Err(e) = kill_process_tree(child, self.kill_grace).await {
            warn!(program, error = %e, "failed to kill process tree");
        }
        match tokio::time::timeout(self.kill_grace, child.wait()).await {
            Ok(Ok(status)) => debug!(program, %status, "child reaped"),
            Ok(Err(e)) => warn!(program, error = %e, "wait after kill failed"),
            Err(_) => warn!(program, "child not reaped within grace period"),
        }
    }
}

fn interrupted_error(
    outcome: WaitOutcome,
    program: String,
    timeout: Duration,
    started: Instant,
) -> ProcessError {
    if matches!(outcome, WaitOutcome::TimedOut) {
        record_invocation("timed_out", started);
        warn!(program = %program, ?timeout, "process timed out");
        ProcessError::TimedOut { program, timeout }
    } else {
        record_invocation("cancelled", started);
        warn!(program = %program, "process cancelled");
        ProcessError::Cancelled { program }
    }
}

fn record_invocation(result: &'static str, started: Instant) {
    metrics::counter!(m::TOOL_INVOCATIONS_TOTAL, m::LABEL_RESULT => result).increment(1);
    metrics::histogram!(m::TOOL_INVOCATION_DURATION_SECONDS)
        .record(started.elapsed().as_secs_f64());
}

fn spawn_reader<R>(reader: Option<R>) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut reader) = reader {
            reader.read_to_end(&mut buf).await?;
        }
        Ok(buf)
    })
}

async fn join_reader(
    handle: &mut JoinHandle<std::io::Result<Vec<u8>>>,
) -> std::io::Result<Vec<u8>> {
    match handle.await {
        Ok(result) => result,
        Err(e) => Err(std::io::Error::other(format!("output reader task failed: {e}"))),
    }
}

#[cfg(unix)]
fn configure_process_group(cmd: &mut Command) {
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn configure_process_group(_cmd: &mut Command) {}

#[cfg(unix)]
async fn kill_process_tree(child: &mut Child, grace: Duration) -> std::io::Result<()> {
    let Some(pid) = child.id().and_then(|pid| i32::try_from(pid).ok()) else {
        // 이미 회수되었거나 PID 변환 불가
        return child.start_kill();
    };

    // SAFETY: pid는 process_group(0)으로 만든 그룹의 리더이며 아직 회수되지 않았습니다.
    let term_result = unsafe { libc::killpg(pid, libc::SIGTERM) };
    if term_result == 0
        && let Ok(Ok(_)) = tokio::time::timeout(grace, child.wait()).await
    {
        return Ok(());
    }

    // SAFETY: 위와 같음
    let kill_result = unsafe { libc::killpg(pid, libc::SIGKILL) };
    if kill_result == 0 {
        return Ok(());
    }

    let killpg_error = std::io::Error::last_os_error();
    if killpg_error.raw_os_error() == Some(libc::ESRCH) {
        return Ok(());
    }
    child.start_kill().map_err(|kill_error| {
        std::io::Error::other(format!("killpg: {killpg_error}; kill: {kill_error}"))
    })
}

#[cfg(not(unix))]
async fn kill_process_tree(child: &mut Child, _grace: Duration) -> std::io::Result<()> {
    child.start_kill()
}

/// 리더가 이미 회수된 프로세스 그룹을 종료합니다.
///
/// 그룹은 구성원이 하나라도 남아 있는 동안 리더의 PID로 유지됩니다.
#[cfg(unix)]
async fn kill_process_group(pgid: u32, grace: Duration) {
    let Ok(pgid) = i32::try_from(pgid) else {
        return;
    };

    // SAFETY: pgid는 process_group(0)으로 만든 그룹 ID입니다. 그룹이 없으면 ESRCH로 실패합니다.
    if unsafe { libc::killpg(pgid, libc::SIGTERM) } != 0 {
        return;
    }
    let deadline = tokio::time::Instant::now() + grace;
    while tokio::time::Instant::now() < deadline {
        tokio::time::sleep(GROUP_POLL_INTERVAL).await;
        // SAFETY: 시그널 0은 존재 여부만 확인합니다.
        if unsafe { libc::killpg(pgid, 0) } != 0 {
            return;
        }
    }
    // SAFETY: 위와 같음
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        let error = std::io::Error::last_os_error();
        if error.raw_os_error() != Some(libc::ESRCH) {
            warn!(pgid, error = %error, "failed to kill process group");
        }
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pgid: u32, _grace: Duration) {}
