//! 스캔 작업 모델
//!
//! [`ScanTask`]는 한 번의 실행 단위입니다. 대상 경로, 스캔 종류, 출력 모드는 생성 시 고정되고,
//! 프로젝트 식별자는 오케스트레이터에 넘겨지기 전까지만 변경할 수 있습니다.
//!
//! # 상태 전이
//!
//! ```text
//! Created ──> EnvironmentResolving ──> Extracting ──> Completed
//!    │                 │                   │
//!    └─────────────────┴───────────────────┴──────> Failed
//! ```
//!
//! 생태계 탐지가 없는 스캔(바이너리, 펌웨어)은 `Created -> Extracting`으로 바로 진행합니다.
//! `Failed`로 전이하면 부분 결과는 버려지고 생태계별 진단만 남습니다.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use depwatch_core::types::{OutputMode, ScanKind};

use crate::detector::ManifestOnlyReason;
use crate::environment::EcosystemEnvironment;
use crate::error::EngineError;
use crate::extract::ExtractOptions;
use crate::failure::FailureKind;
use crate::git::GitInfo;
use crate::types::{Dependency, Ecosystem, count_dependencies};

/// 작업 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Created,
    EnvironmentResolving,
    Extracting,
    Completed,
    Failed,
}

impl TaskState {
    /// 종료 상태인지 반환합니다.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn allows(self, next: TaskState, kind: ScanKind) -> bool {
        use TaskState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Created, EnvironmentResolving) => kind.inspects_ecosystems(),
            (Created, Extracting) => !kind.inspects_ecosystems(),
            (EnvironmentResolving, Extracting) | (Extracting, Completed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::EnvironmentResolving => "environment_resolving",
            Self::Extracting => "extracting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 진단이 발생한 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticStage {
    Detection,
    Extraction,
}

/// 생태계 단위의 복구된 실패
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub stage: DiagnosticStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    /// stderr 발췌 (비어 있으면 생략)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl Diagnostic {
    /// 엔진 에러에서 진단을 만듭니다. 분류된 실패가 있으면 종류, 종료 코드, stderr 발췌를 보존합니다.
    pub fn from_error(stage: DiagnosticStage, err: &EngineError) -> Self {
        let failure = err.execution_failure();
        Self {
            stage,
            kind: failure.map(|f| f.kind()),
            message: err.to_string(),
            exit_code: failure.and_then(|f| f.exit_code()),
            stderr: failure
                .filter(|f| !f.stderr_excerpt().is_empty())
                .map(|f| f.stderr_text().into_owned()),
        }
    }
}

/// 생태계 하나의 결과
#[derive(Debug, Clone, Serialize)]
pub struct EcosystemModule {
    pub ecosystem: Ecosystem,
    /// 도구 환경 (매니페스트만 사용한 경우 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<EcosystemEnvironment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_only: Option<ManifestOnlyReason>,
    pub dependency_count: usize,
    pub dependencies: Vec<Dependency>,
}

impl EcosystemModule {
    pub fn new(
        ecosystem: Ecosystem,
        environment: Option<EcosystemEnvironment>,
        manifest_only: Option<ManifestOnlyReason>,
        dependencies: Vec<Dependency>,
    ) -> Self {
        Self {
            ecosystem,
            environment,
            manifest_only,
            dependency_count: count_dependencies(&dependencies),
            dependencies,
        }
    }
}

/// 업로드된 산출물
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// 대상 경로 기준 상대 경로
    pub path: String,
    pub size: u64,
}

/// 작업 결과
///
/// 모든 맵은 생태계 키로 정렬되므로 병합 순서와 무관하게 같은 결과가 됩니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskResult {
    pub modules: BTreeMap<Ecosystem, EcosystemModule>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub diagnostics: BTreeMap<Ecosystem, Vec<Diagnostic>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git: Option<GitInfo>,
}

impl TaskResult {
    /// 생태계 모듈을 병합합니다. 같은 생태계는 교체됩니다.
    pub fn merge_module(&mut self, module: EcosystemModule) {
        self.modules.insert(module.ecosystem, module);
    }

    pub fn add_diagnostic(&mut self, ecosystem: Ecosystem, diagnostic: Diagnostic) {
        self.diagnostics.entry(ecosystem).or_default().push(diagnostic);
    }

    /// 모든 모듈의 의존성 노드 수
    pub fn total_dependencies(&self) -> usize {
        self.modules.values().map(|m| m.dependency_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty() && self.artifacts.is_empty()
    }
}

/// 스캔 작업
#[derive(Debug)]
pub struct ScanTask {
    id: String,
    target_path: PathBuf,
    kind: ScanKind,
    output_mode: OutputMode,
    project_id: Option<String>,
    project_name: Option<String>,
    deep_scan: bool,
    skip_git: bool,
    extract_options: ExtractOptions,
    sealed: bool,
    state: TaskState,
    result: TaskResult,
    failure: Option<String>,
}

impl ScanTask {
    /// 빌더를 생성합니다.
    pub fn builder(target_path: impl Into<PathBuf>, kind: ScanKind) -> ScanTaskBuilder {
        ScanTaskBuilder::new(target_path, kind)
    }

    /// 작업 식별자 (UUID v4)
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    pub fn kind(&self) -> ScanKind {
        self.kind
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project_name.as_deref()
    }

    /// 프로젝트 ID를 변경합니다. 봉인된 작업이면 에러.
    pub fn set_project_id(&mut self, id: impl Into<String>) -> Result<(), EngineError> {
        self.ensure_unsealed("project_id")?;
        self.project_id = Some(id.into());
        Ok(())
    }

    /// 프로젝트 이름을 변경합니다. 봉인된 작업이면 에러.
    pub fn set_project_name(&mut self, name: impl Into<String>) -> Result<(), EngineError> {
        self.ensure_unsealed("project_name")?;
        self.project_name = Some(name.into());
        Ok(())
    }

    fn ensure_unsealed(&self, field: &'static str) -> Result<(), EngineError> {
        if self.sealed {
            return Err(EngineError::TaskSealed { field });
        }
        Ok(())
    }

    pub fn deep_scan(&self) -> bool {
        self.deep_scan
    }

    pub fn skip_git(&self) -> bool {
        self.skip_git
    }

    pub fn extract_options(&self) -> &ExtractOptions {
        &self.extract_options
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// 오케스트레이터에 넘겨질 때 호출됩니다. 이후 프로젝트 식별자는 변경할 수 없습니다.
    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn result(&self) -> &TaskResult {
        &self.result
    }

    pub(crate) fn result_mut(&mut self) -> &mut TaskResult {
        &mut self.result
    }

    /// 실패 메시지 (`Failed` 상태에서만)
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// 상태를 전이합니다.
    pub fn transition(&mut self, next: TaskState) -> Result<(), EngineError> {
        if !self.state.allows(next, self.kind) {
            return Err(EngineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!(task_id = %self.id, from = %self.state, to = %next, "task transition");
        self.state = next;
        Ok(())
    }

    /// 작업을 실패로 종료합니다.
    ///
    /// 모듈, 산출물, git 정보는 버려지고 이미 기록된 진단은 유지됩니다.
    /// 에러에 담긴 생태계별 실패도 진단으로 추가됩니다.
    /// 이미 종료된 작업이면 아무것도 하지 않습니다.
    pub fn fail(&mut self, err: &EngineError) {
        if self.state.is_terminal() {
            return;
        }
        self.state = TaskState::Failed;
        let mut result = TaskResult {
            diagnostics: std::mem::take(&mut self.result.diagnostics),
            ..TaskResult::default()
        };
        for (ecosystem, cause) in err.ecosystem_failures() {
            let stage = if cause.is_extraction() {
                DiagnosticStage::Extraction
            } else {
                DiagnosticStage::Detection
            };
            result.add_diagnostic(ecosystem, Diagnostic::from_error(stage, cause));
        }
        self.result = result;
        self.failure = Some(err.to_string());
    }

    /// 직렬화용 보고서
    pub fn report(&self) -> TaskReport<'_> {
        TaskReport {
            task_id: &self.id,
            target: &self.target_path,
            kind: self.kind,
            state: self.state,
            project_id: self.project_id.as_deref(),
            project_name: self.project_name.as_deref(),
            deep_scan: self.deep_scan,
            failure: self.failure.as_deref(),
            result: &self.result,
        }
    }
}

/// 작업 보고서 (전송 및 JSON 출력 형식)
#[derive(Debug, Serialize)]
pub struct TaskReport<'a> {
    pub task_id: &'a str,
    pub target: &'a Path,
    pub kind: ScanKind,
    pub state: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<&'a str>,
    pub deep_scan: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<&'a str>,
    pub result: &'a TaskResult,
}

/// [`ScanTask`] 빌더
#[derive(Debug)]
pub struct ScanTaskBuilder {
    target_path: PathBuf,
    kind: ScanKind,
    output_mode: OutputMode,
    project_id: Option<String>,
    project_name: Option<String>,
    deep_scan: bool,
    skip_git: bool,
    extract_options: ExtractOptions,
}

impl ScanTaskBuilder {
    pub fn new(target_path: impl Into<PathBuf>, kind: ScanKind) -> Self {
        Self {
            target_path: target_path.into(),
            kind,
            output_mode: OutputMode::Interactive,
            project_id: None,
            project_name: None,
            deep_scan: false,
            skip_git: false,
            extract_options: ExtractOptions::default(),
        }
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn project_id(mut self, id: Option<String>) -> Self {
        self.project_id = id;
        self
    }

    pub fn project_name(mut self, name: Option<String>) -> Self {
        self.project_name = name;
        self
    }

    /// 딥 스캔 (소스 업로드) 활성화
    pub fn deep_scan(mut self, enabled: bool) -> Self {
        self.deep_scan = enabled;
        self
    }

    pub fn skip_git(mut self, skip: bool) -> Self {
        self.skip_git = skip;
        self
    }

    pub fn extract_options(mut self, options: ExtractOptions) -> Self {
        self.extract_options = options;
        self
    }

    /// 대상 경로를 검증하고 작업을 생성합니다.
    ///
    /// 대상은 존재하는 절대 경로여야 하며, 소스 스캔은 디렉토리여야 합니다.
    pub fn build(self) -> Result<ScanTask, EngineError> {
        let invalid = |reason: &str| EngineError::InvalidTarget {
            path: self.target_path.display().to_string(),
            reason: reason.to_owned(),
        };
        if !self.target_path.is_absolute() {
            return Err(invalid("path must be absolute"));
        }
        if !self.target_path.exists() {
            return Err(invalid("no such file or directory"));
        }
        if self.kind.inspects_ecosystems() && !self.target_path.is_dir() {
            return Err(invalid("source scan target must be a directory"));
        }

        Ok(ScanTask {
            id: uuid::Uuid::new_v4().to_string(),
            target_path: self.target_path,
            kind: self.kind,
            output_mode: self.output_mode,
            project_id: self.project_id,
            project_name: self.project_name,
            deep_scan: self.deep_scan,
            skip_git: self.skip_git,
            extract_options: self.extract_options,
            sealed: false,
            state: TaskState::Created,
            result: TaskResult::default(),
            failure: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_task(dir: &Path) -> ScanTask {
        ScanTask::builder(dir, ScanKind::Source).build().unwrap()
    }

    #[test]
    fn builder_rejects_relative_and_missing_paths() {
        let err = ScanTask::builder("relative/dir", ScanKind::Source)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must be absolute"));

        let dir = tempfile::tempdir().unwrap();
        let err = ScanTask::builder(dir.path().join("missing"), ScanKind::Binary)
            .build()
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTarget { .. }));
    }

    #[test]
    fn source_scan_requires_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.jar");
        std::fs::write(&file, b"PK").unwrap();
        assert!(ScanTask::builder(&file, ScanKind::Source).build().is_err());
        assert!(ScanTask::builder(&file, ScanKind::Binary).build().is_ok());
    }

    #[test]
    fn project_fields_freeze_after_seal() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = source_task(dir.path());
        task.set_project_name("demo").unwrap();
        task.seal();
        let err = task.set_project_id("p-1").unwrap_err();
        assert!(matches!(err, EngineError::TaskSealed { field: "project_id" }));
        assert_eq!(task.project_name(), Some("demo"));
        assert_eq!(task.project_id(), None);
    }

    #[test]
    fn source_lifecycle_follows_state_machine() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = source_task(dir.path());
        assert!(task.transition(TaskState::Extracting).is_err());
        task.transition(TaskState::EnvironmentResolving).unwrap();
        task.transition(TaskState::Extracting).unwrap();
        task.transition(TaskState::Completed).unwrap();
        assert!(task.transition(TaskState::Failed).is_err());
    }

    #[test]
    fn binary_scan_skips_environment_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = ScanTask::builder(dir.path(), ScanKind::Binary).build().unwrap();
        assert!(task.transition(TaskState::EnvironmentResolving).is_err());
        task.transition(TaskState::Extracting).unwrap();
    }

    #[test]
    fn failing_discards_partial_results() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = source_task(dir.path());
        task.transition(TaskState::EnvironmentResolving).unwrap();
        task.result_mut().merge_module(EcosystemModule::new(
            Ecosystem::Npm,
            None,
            Some(ManifestOnlyReason::NoToolRequired),
            vec![Dependency::new("ms", "2.1.3")],
        ));
        task.fail(&EngineError::Cancelled);
        assert_eq!(task.state(), TaskState::Failed);
        assert!(task.result().is_empty());
        assert!(task.result().diagnostics.is_empty());
        assert_eq!(task.failure(), Some("scan cancelled"));
    }

    #[test]
    fn failing_keeps_diagnostics_for_every_ecosystem() {
        use crate::failure::ExecutionFailure;
        use crate::process::ProcessError;

        let dir = tempfile::tempdir().unwrap();
        let mut task = source_task(dir.path());
        task.transition(TaskState::EnvironmentResolving).unwrap();
        task.result_mut().add_diagnostic(
            Ecosystem::Pip,
            Diagnostic::from_error(
                DiagnosticStage::Detection,
                &EngineError::NoCandidate {
                    ecosystem: Ecosystem::Pip,
                },
            ),
        );

        let gradle = EngineError::Detection {
            ecosystem: Ecosystem::Gradle,
            failure: ExecutionFailure::classify(ProcessError::Exited {
                program: "./gradlew".to_owned(),
                code: Some(1),
                stdout: Vec::new(),
                stderr: b"Could not resolve plugin".to_vec(),
            }),
        };
        let go = EngineError::NoCandidate {
            ecosystem: Ecosystem::Go,
        };
        task.fail(&EngineError::DetectionExhausted {
            failures: vec![(Ecosystem::Gradle, gradle), (Ecosystem::Go, go)],
        });

        let diagnostics = &task.result().diagnostics;
        assert_eq!(diagnostics.len(), 3);
        let gradle = &diagnostics[&Ecosystem::Gradle][0];
        assert_eq!(gradle.kind, Some(FailureKind::Execution));
        assert_eq!(gradle.exit_code, Some(1));
        assert_eq!(gradle.stderr.as_deref(), Some("Could not resolve plugin"));
        assert!(diagnostics[&Ecosystem::Go][0].message.contains("no go tool candidate"));

        let json = serde_json::to_value(task.report()).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["result"]["diagnostics"]["gradle"][0]["exit_code"], 1);
    }

    #[test]
    fn report_serializes_state_and_modules() {
        let dir = tempfile::tempdir().unwrap();
        let mut task = source_task(dir.path());
        task.result_mut().merge_module(EcosystemModule::new(
            Ecosystem::Go,
            None,
            None,
            vec![Dependency::new("github.com/pkg/errors", "v0.9.1")],
        ));
        let json = serde_json::to_value(task.report()).unwrap();
        assert_eq!(json["state"], "created");
        assert_eq!(json["kind"], "source");
        assert_eq!(json["result"]["modules"]["go"]["dependency_count"], 1);
        assert!(json.get("failure").is_none());
    }

    #[test]
    fn task_ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        assert_ne!(source_task(dir.path()).id(), source_task(dir.path()).id());
    }
}
