//! 생태계 실행 환경
//!
//! [`EcosystemEnvironment`]는 탐지에 성공한 도구의 버전, 경로, 후보별 상태를 담습니다.
//! 생성자는 탐지기 내부에서만 호출되며, 경로와 버전이 항상 함께 채워집니다.
//! 실패한 탐지는 환경 대신 에러로 표현되므로 부분적으로 채워진 환경은 노출되지 않습니다.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::failure::ExecutionFailure;
use crate::process::{EnvOverlay, Invocation};
use crate::types::Ecosystem;
use crate::version::ToolVersion;

/// 후보 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    /// 시도하지 않음 (앞선 후보가 성공했거나 후보가 없음)
    NotAttempted,
    /// 이 후보로 환경이 결정됨
    Used,
    /// 실행 또는 버전 해석 실패
    Error,
}

/// 후보 위치 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrigin {
    /// 프로젝트에 포함된 래퍼 스크립트 (gradlew, mvnw)
    Wrapper,
    /// 시스템에 설치된 도구 (PATH 검색)
    System,
}

/// 후보 하나의 시도 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateAttempt {
    pub program: PathBuf,
    pub origin: CandidateOrigin,
    pub status: CandidateStatus,
}

impl CandidateAttempt {
    pub fn new(program: impl Into<PathBuf>, origin: CandidateOrigin) -> Self {
        Self {
            program: program.into(),
            origin,
            status: CandidateStatus::NotAttempted,
        }
    }
}

/// 결정된 생태계 환경
#[derive(Debug, Clone, Serialize)]
pub struct EcosystemEnvironment {
    ecosystem: Ecosystem,
    tool_version: ToolVersion,
    resolved_path: PathBuf,
    candidates: Vec<CandidateAttempt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<ExecutionFailure>,
    #[serde(skip)]
    project_dir: PathBuf,
    #[serde(skip)]
    quiet_args: &'static [&'static str],
    #[serde(skip)]
    overlay: EnvOverlay,
}

impl EcosystemEnvironment {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn resolved(
        ecosystem: Ecosystem,
        tool_version: ToolVersion,
        resolved_path: PathBuf,
        candidates: Vec<CandidateAttempt>,
        last_error: Option<ExecutionFailure>,
        project_dir: PathBuf,
        quiet_args: &'static [&'static str],
        overlay: EnvOverlay,
    ) -> Self {
        Self {
            ecosystem,
            tool_version,
            resolved_path,
            candidates,
            last_error,
            project_dir,
            quiet_args,
            overlay,
        }
    }

    pub fn ecosystem(&self) -> Ecosystem {
        self.ecosystem
    }

    pub fn tool_version(&self) -> &ToolVersion {
        &self.tool_version
    }

    /// 성공한 실행 파일/스크립트 경로
    pub fn resolved_path(&self) -> &Path {
        &self.resolved_path
    }

    pub fn candidates(&self) -> &[CandidateAttempt] {
        &self.candidates
    }

    /// 해당 종류 첫 후보의 상태 (후보가 없으면 `NotAttempted`)
    pub fn status_of(&self, origin: CandidateOrigin) -> CandidateStatus {
        self.candidates
            .iter()
            .find(|c| c.origin == origin)
            .map_or(CandidateStatus::NotAttempted, |c| c.status)
    }

    pub fn wrapper_status(&self) -> CandidateStatus {
        self.status_of(CandidateOrigin::Wrapper)
    }

    /// 마지막으로 실패한 후보의 분류된 실패 (이후 후보가 성공해도 유지됨)
    pub fn last_error(&self) -> Option<&ExecutionFailure> {
        self.last_error.as_ref()
    }

    /// 결정된 도구로 실행할 명령을 만듭니다.
    ///
    /// 생태계의 조용한/비대화형 플래그를 앞에 붙이고, 탐지 때와 같은 오버레이와
    /// 프로젝트 디렉토리를 적용합니다.
    pub fn command<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString>,
    {
        let inv = Invocation::new(&self.resolved_path)
            .args(self.quiet_args.iter().copied())
            .args(args)
            .current_dir(&self.project_dir)
            .overlay(&self.overlay);
        tracing::info!("Prepare: {}", inv.command_line());
        inv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(candidates: Vec<CandidateAttempt>) -> EcosystemEnvironment {
        EcosystemEnvironment::resolved(
            Ecosystem::Gradle,
            ToolVersion::new(7, 6, 0),
            PathBuf::from("gradle"),
            candidates,
            None,
            PathBuf::from("/work/app"),
            &["--quiet", "--console", "plain"],
            EnvOverlay::new().with("JAVA_HOME", "/opt/jre"),
        )
    }

    #[test]
    fn command_prepends_quiet_flags_and_keeps_overlay() {
        let env = sample(Vec::new());
        let inv = env.command(["dependencies"]);
        assert_eq!(
            inv.command_line(),
            "gradle --quiet --console plain dependencies"
        );
        assert!(inv.env_overlay().get("JAVA_HOME").is_some());
    }

    #[test]
    fn missing_wrapper_reports_not_attempted() {
        let mut system = CandidateAttempt::new("gradle", CandidateOrigin::System);
        system.status = CandidateStatus::Used;
        let env = sample(vec![system]);
        assert_eq!(env.wrapper_status(), CandidateStatus::NotAttempted);
        assert_eq!(env.status_of(CandidateOrigin::System), CandidateStatus::Used);
    }

    #[test]
    fn serialization_hides_runtime_fields() {
        let json = serde_json::to_value(sample(Vec::new())).unwrap();
        assert_eq!(json["tool_version"], "7.6.0");
        assert_eq!(json["resolved_path"], "gradle");
        assert!(json.get("overlay").is_none());
        assert!(json.get("last_error").is_none());
    }
}
