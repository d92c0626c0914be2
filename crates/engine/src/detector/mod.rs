//! 생태계 탐지기
//!
//! [`EcosystemDetector`] trait은 생태계마다 후보 도구 목록, 버전 인자, 버전 파서를 정의합니다.
//! 실제 후보 평가 루프는 [`resolve_environment`] 하나로 공유됩니다.
//!
//! # 후보 평가 순서
//!
//! 1. 프로젝트 래퍼 스크립트 (존재할 때만)
//! 2. 시스템 설치 도구 (PATH 검색)
//!
//! 각 후보는 순서대로 실행되며, 실행과 버전 해석이 모두 성공한 첫 후보에서 멈춥니다.
//! 실패한 후보의 분류된 실패는 `last_error`로 보존됩니다.
//! 취소는 재시도 없이 즉시 전파됩니다.

pub mod go;
pub mod gradle;
pub mod maven;
pub mod npm;
pub mod pip;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use depwatch_core::metrics as m;

use crate::config::EngineSettings;
use crate::context::ExecContext;
use crate::environment::{CandidateAttempt, CandidateOrigin, CandidateStatus, EcosystemEnvironment};
use crate::error::EngineError;
use crate::failure::ExecutionFailure;
use crate::process::{EnvOverlay, Invocation};
use crate::types::Ecosystem;
use crate::version::{ToolVersion, VersionParseError};

pub use go::GoDetector;
pub use gradle::GradleDetector;
pub use maven::MavenDetector;
pub use npm::NpmDetector;
pub use pip::PipDetector;

/// 생태계 탐지기 trait
///
/// 구현체는 상태가 없는 설명자이며, 프로세스 실행은 [`resolve_environment`]가 담당합니다.
pub trait EcosystemDetector: Send + Sync + 'static {
    /// 담당 생태계
    fn ecosystem(&self) -> Ecosystem;

    /// 생태계 적용 여부를 판단하는 매니페스트 파일명
    fn manifest_files(&self) -> &'static [&'static str];

    /// 프로젝트 래퍼 스크립트 파일명 (우선순위 순)
    fn wrapper_scripts(&self) -> &'static [&'static str] {
        &[]
    }

    /// 시스템 도구 이름 (우선순위 순)
    fn system_tools(&self) -> &'static [&'static str];

    /// 버전 확인 인자
    fn version_args(&self) -> &'static [&'static str];

    /// 이후 모든 호출 앞에 붙일 비대화형/조용한 출력 플래그
    fn quiet_args(&self) -> &'static [&'static str] {
        &[]
    }

    /// 버전 출력 파싱
    fn parse_version(&self, output: &str) -> Result<ToolVersion, VersionParseError>;

    /// 도구 호출에 적용할 환경변수 오버레이
    fn overlay(&self, settings: &EngineSettings) -> EnvOverlay {
        settings.base_overlay.clone()
    }

    /// 설정으로 도구 실행이 생략되었는지 여부
    fn skipped(&self, _settings: &EngineSettings) -> bool {
        false
    }

    /// 외부 도구가 필요한지 여부 (lockfile만으로 추출 가능하면 false)
    fn requires_tool(&self, _dir: &Path) -> bool {
        true
    }

    /// 디렉토리에 이 생태계의 매니페스트가 있는지 확인합니다.
    fn applies_to(&self, dir: &Path) -> bool {
        self.manifest_files()
            .iter()
            .any(|name| dir.join(name).is_file())
    }

    /// 평가할 후보 목록을 만듭니다. 없는 래퍼 스크립트는 후보에서 제외됩니다.
    fn candidates(&self, dir: &Path) -> Vec<CandidateAttempt> {
        let wrappers = self
            .wrapper_scripts()
            .iter()
            .map(|name| dir.join(name))
            .filter(|path| path.is_file())
            .map(|path| CandidateAttempt::new(path, CandidateOrigin::Wrapper));
        let tools = self
            .system_tools()
            .iter()
            .map(|name| CandidateAttempt::new(PathBuf::from(name), CandidateOrigin::System));
        wrappers.chain(tools).collect()
    }
}

/// 도구 없이 매니페스트만으로 처리하는 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestOnlyReason {
    /// 설정으로 도구 실행이 생략됨
    ToolSkipped,
    /// lockfile만으로 추출 가능
    NoToolRequired,
}

/// 생태계 하나의 탐지 결과
#[derive(Debug, Clone)]
pub enum Detection {
    /// 도구 환경이 결정됨
    Resolved(EcosystemEnvironment),
    /// 도구 없이 진행
    ManifestOnly(ManifestOnlyReason),
}

impl Detection {
    pub fn environment(&self) -> Option<&EcosystemEnvironment> {
        match self {
            Self::Resolved(env) => Some(env),
            Self::ManifestOnly(_) => None,
        }
    }
}

/// 기본 탐지기 목록 (결과 키 순서와 동일)
pub fn default_detectors() -> Vec<Arc<dyn EcosystemDetector>> {
    vec![
        Arc::new(GradleDetector),
        Arc::new(MavenDetector),
        Arc::new(NpmDetector),
        Arc::new(GoDetector),
        Arc::new(PipDetector),
    ]
}

/// 생태계 하나를 탐지합니다.
///
/// 생략 설정이나 lockfile이 있으면 도구를 실행하지 않습니다.
pub async fn detect(
    ctx: &ExecContext,
    detector: &dyn EcosystemDetector,
    dir: &Path,
) -> Result<Detection, EngineError> {
    let ecosystem = detector.ecosystem();
    if detector.skipped(ctx.settings()) {
        info!(%ecosystem, "tool execution skipped by configuration");
        return Ok(Detection::ManifestOnly(ManifestOnlyReason::ToolSkipped));
    }
    if !detector.requires_tool(dir) {
        info!(%ecosystem, "lockfile present, no tool required");
        return Ok(Detection::ManifestOnly(ManifestOnlyReason::NoToolRequired));
    }
    resolve_environment(ctx, detector, dir)
        .await
        .map(Detection::Resolved)
}

/// 후보를 순서대로 평가하여 환경을 결정합니다.
///
/// 모든 후보가 실패하면 마지막 후보의 분류된 실패로 [`EngineError::Detection`]을 반환합니다.
pub async fn resolve_environment(
    ctx: &ExecContext,
    detector: &dyn EcosystemDetector,
    dir: &Path,
) -> Result<EcosystemEnvironment, EngineError> {
    let ecosystem = detector.ecosystem();
    let overlay = detector.overlay(ctx.settings());
    let mut candidates = detector.candidates(dir);
    let mut last_error: Option<ExecutionFailure> = None;

    for idx in 0..candidates.len() {
        let program = candidates[idx].program.clone();
        let invocation = Invocation::new(&program)
            .args(detector.version_args().iter().copied())
            .current_dir(dir)
            .overlay(&overlay);

        match probe_version(ctx, detector, &invocation).await {
            Ok(version) => {
                candidates[idx].status = CandidateStatus::Used;
                info!(%ecosystem, program = %program.display(), %version, "environment resolved");
                metrics::counter!(m::DETECTOR_RESOLVED_TOTAL, m::LABEL_ECOSYSTEM => ecosystem.to_string())
                    .increment(1);
                return Ok(EcosystemEnvironment::resolved(
                    ecosystem,
                    version,
                    program,
                    candidates,
                    last_error,
                    dir.to_path_buf(),
                    detector.quiet_args(),
                    overlay,
                ));
            }
            Err(failure) => {
                candidates[idx].status = CandidateStatus::Error;
                error!(%ecosystem, program = %program.display(), "Eval version: {failure}");
                metrics::counter!(
                    m::DETECTOR_CANDIDATE_FAILURES_TOTAL,
                    m::LABEL_ECOSYSTEM => ecosystem.to_string(),
                    m::LABEL_FAILURE_KIND => failure.kind().as_str()
                )
                .increment(1);
                if !failure.kind().allows_fallback() {
                    return Err(EngineError::Cancelled);
                }
                last_error = Some(failure);
            }
        }
    }

    match last_error {
        Some(failure) => Err(EngineError::Detection { ecosystem, failure }),
        None => Err(EngineError::NoCandidate { ecosystem }),
    }
}

/// 후보 하나를 실행하고 버전을 해석합니다.
async fn probe_version(
    ctx: &ExecContext,
    detector: &dyn EcosystemDetector,
    invocation: &Invocation,
) -> Result<ToolVersion, ExecutionFailure> {
    let output = ctx
        .run(invocation)
        .await
        .map_err(ExecutionFailure::classify)?;
    detector
        .parse_version(&output.stdout_lossy())
        .map_err(|e| ExecutionFailure::from_parse(e, &output.stderr))
}
