//! 의존성 추출
//!
//! 탐지 결과([`Detection`])에 따라 결정된 도구로 의존성 트리를 출력하게 하거나,
//! 도구가 필요 없으면 lockfile을 직접 읽습니다.
//!
//! | 생태계 | 도구 사용 | 매니페스트만 |
//! |--------|-----------|--------------|
//! | Gradle | `dependencies --configuration runtimeClasspath` | 빈 목록 |
//! | Maven  | `dependency:tree -DoutputFile=...` | 빈 목록 |
//! | npm    | `ls --all --json` | `package-lock.json` |
//! | Go     | `list -m all` | - |
//! | pip    | `freeze` | `requirements.txt` |

pub mod go;
pub mod npm;
pub mod pip;
pub mod tree;

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::context::ExecContext;
use crate::detector::Detection;
use crate::detector::npm::NPM_LOCKFILE;
use crate::detector::pip::REQUIREMENTS_FILE;
use crate::environment::EcosystemEnvironment;
use crate::error::EngineError;
use crate::failure::ExecutionFailure;
use crate::process::{ProcessError, ProcessOutput};
use crate::types::{Dependency, Ecosystem};

pub use tree::{TreeStyle, parse_dependency_tree};

/// Gradle 의존성 구성
const GRADLE_CONFIGURATION: &str = "runtimeClasspath";

/// Maven 스코프 필터
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeFilter {
    /// 필터링하지 않음
    All,
    /// 지정된 스코프만 포함
    Only(BTreeSet<String>),
}

impl Default for ScopeFilter {
    fn default() -> Self {
        Self::Only(["compile", "runtime"].into_iter().map(String::from).collect())
    }
}

impl ScopeFilter {
    /// 스코프가 없는 노드는 항상 포함합니다.
    pub fn allows(&self, scope: Option<&str>) -> bool {
        match (self, scope) {
            (Self::All, _) | (_, None) => true,
            (Self::Only(scopes), Some(scope)) => scopes.contains(scope),
        }
    }

    /// 필터에 맞지 않는 노드를 하위 트리와 함께 제거합니다.
    pub fn apply(&self, deps: Vec<Dependency>) -> Vec<Dependency> {
        if matches!(self, Self::All) {
            return deps;
        }
        deps.into_iter()
            .filter(|d| self.allows(d.scope.as_deref()))
            .map(|mut d| {
                d.children = self.apply(std::mem::take(&mut d.children));
                d
            })
            .collect()
    }
}

impl FromStr for ScopeFilter {
    type Err = EngineError;

    /// `"compile,runtime"` 또는 `"all"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let scopes: BTreeSet<String> = s
            .split(',')
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        if scopes.is_empty() {
            return Err(EngineError::Config {
                field: "scope".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }
        if scopes.contains("all") {
            return Ok(Self::All);
        }
        Ok(Self::Only(scopes))
    }
}

impl fmt::Display for ScopeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(scopes) => {
                let joined: Vec<&str> = scopes.iter().map(String::as_str).collect();
                f.write_str(&joined.join(","))
            }
        }
    }
}

/// 추출 옵션
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Maven 스코프 필터
    pub maven_scopes: ScopeFilter,
    /// Gradle 하위 프로젝트 (`:name` 형식, 비어 있으면 루트 프로젝트)
    pub gradle_projects: Vec<String>,
}

impl ExtractOptions {
    /// `--gradle-projects` 값(쉼표 구분)을 `:name` 형식으로 정규화합니다.
    pub fn with_gradle_projects(mut self, list: &str) -> Self {
        self.gradle_projects = list
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(normalize_gradle_project)
            .collect();
        self
    }
}

/// 프로젝트 이름을 `:name` 형식으로 정규화합니다.
pub fn normalize_gradle_project(name: &str) -> String {
    format!(":{}", name.trim_start_matches(':'))
}

/// 생태계 하나의 의존성을 추출합니다.
pub async fn extract(
    ctx: &ExecContext,
    ecosystem: Ecosystem,
    dir: &Path,
    detection: &Detection,
    options: &ExtractOptions,
) -> Result<Vec<Dependency>, EngineError> {
    let deps = match (ecosystem, detection) {
        (Ecosystem::Gradle, Detection::Resolved(env)) => {
            extract_gradle(ctx, env, &options.gradle_projects).await?
        }
        (Ecosystem::Maven, Detection::Resolved(env)) => {
            let deps = extract_maven(ctx, env).await?;
            options.maven_scopes.apply(deps)
        }
        (Ecosystem::Npm, Detection::Resolved(env)) => {
            let output = run_tolerating_exit(ctx, env, ["ls", "--all", "--json"]).await?;
            npm::parse_npm_ls(&output).map_err(|e| EngineError::Extraction {
                ecosystem,
                reason: format!("npm ls output: {e}"),
            })?
        }
        (Ecosystem::Npm, Detection::ManifestOnly(_)) => {
            let content = read_manifest(dir, NPM_LOCKFILE).await?;
            npm::parse_package_lock(&content).map_err(|e| EngineError::Extraction {
                ecosystem,
                reason: format!("{}: {e}", NPM_LOCKFILE),
            })?
        }
        (Ecosystem::Go, Detection::Resolved(env)) => {
            let output = run_tool(ctx, env, ["list", "-m", "all"]).await?;
            go::parse_go_list(&output.stdout_lossy())
        }
        (Ecosystem::Pip, Detection::Resolved(env)) => {
            let output = run_tool(ctx, env, ["freeze"]).await?;
            pip::parse_requirements(&output.stdout_lossy())
        }
        (Ecosystem::Pip, Detection::ManifestOnly(_)) => {
            let content = read_manifest(dir, REQUIREMENTS_FILE).await?;
            pip::parse_requirements(&content)
        }
        (_, Detection::ManifestOnly(reason)) => {
            debug!(%ecosystem, ?reason, "no tool output to extract from");
            Vec::new()
        }
    };
    info!(%ecosystem, count = deps.len(), "dependencies extracted");
    Ok(deps)
}

async fn extract_gradle(
    ctx: &ExecContext,
    env: &EcosystemEnvironment,
    projects: &[String],
) -> Result<Vec<Dependency>, EngineError> {
    let tasks: Vec<String> = if projects.is_empty() {
        vec!["dependencies".to_owned()]
    } else {
        projects.iter().map(|p| format!("{p}:dependencies")).collect()
    };

    let mut merged: Vec<Dependency> = Vec::new();
    for task in tasks {
        let output = run_tool(
            ctx,
            env,
            [task.as_str(), "--configuration", GRADLE_CONFIGURATION],
        )
        .await?;
        for dep in parse_dependency_tree(&output.stdout_lossy(), TreeStyle::Gradle) {
            // 여러 프로젝트가 공유하는 의존성은 한 번만
            if !merged.contains(&dep) {
                merged.push(dep);
            }
        }
    }
    Ok(merged)
}

async fn extract_maven(
    ctx: &ExecContext,
    env: &EcosystemEnvironment,
) -> Result<Vec<Dependency>, EngineError> {
    // --quiet 모드에서는 트리가 표준 출력에 찍히지 않으므로 파일로 받습니다.
    let output_file =
        std::env::temp_dir().join(format!("depwatch-mvn-{}.txt", uuid::Uuid::new_v4()));
    let arg = format!("-DoutputFile={}", output_file.display());
    let result = run_tool(ctx, env, ["dependency:tree", arg.as_str(), "-DappendOutput=true"]).await;

    let content = match result {
        Ok(_) => tokio::fs::read_to_string(&output_file).await.map_err(|source| {
            EngineError::Io {
                path: output_file.display().to_string(),
                source,
            }
        }),
        Err(e) => Err(e),
    };
    if let Err(e) = tokio::fs::remove_file(&output_file).await {
        debug!(path = %output_file.display(), error = %e, "remove maven output file");
    }
    Ok(parse_dependency_tree(&content?, TreeStyle::Maven))
}

/// 결정된 도구를 실행합니다. 0이 아닌 종료는 추출 실패입니다.
async fn run_tool<const N: usize>(
    ctx: &ExecContext,
    env: &EcosystemEnvironment,
    args: [&str; N],
) -> Result<ProcessOutput, EngineError> {
    let invocation = env.command(args);
    ctx.run(&invocation)
        .await
        .map_err(|e| extraction_failure(env.ecosystem(), e))
}

/// 0이 아닌 종료여도 표준 출력이 있으면 그대로 사용합니다.
///
/// `npm ls`는 누락/불일치 패키지가 있으면 1로 종료하지만 트리는 정상 출력합니다.
async fn run_tolerating_exit<const N: usize>(
    ctx: &ExecContext,
    env: &EcosystemEnvironment,
    args: [&str; N],
) -> Result<String, EngineError> {
    let invocation = env.command(args);
    match ctx.run(&invocation).await {
        Ok(output) => Ok(output.stdout_lossy()),
        Err(ProcessError::Exited { code, stdout, .. }) if !stdout.is_empty() => {
            warn!(ecosystem = %env.ecosystem(), ?code, "tool exited non-zero, using its output");
            Ok(String::from_utf8_lossy(&stdout).into_owned())
        }
        Err(e) => Err(extraction_failure(env.ecosystem(), e)),
    }
}

fn extraction_failure(ecosystem: Ecosystem, err: ProcessError) -> EngineError {
    let failure = ExecutionFailure::classify(err);
    if failure.is_cancelled() {
        return EngineError::Cancelled;
    }
    EngineError::ExtractionFailed { ecosystem, failure }
}

async fn read_manifest(dir: &Path, name: &str) -> Result<String, EngineError> {
    let path = dir.join(name);
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| EngineError::Io {
            path: path.display().to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineSettings;
    use crate::detector::ManifestOnlyReason;

    #[test]
    fn scope_filter_parses_list_and_all() {
        let filter: ScopeFilter = "Compile, test".parse().unwrap();
        assert!(filter.allows(Some("compile")));
        assert!(filter.allows(Some("test")));
        assert!(!filter.allows(Some("runtime")));
        assert!(filter.allows(None));

        assert_eq!("all".parse::<ScopeFilter>().unwrap(), ScopeFilter::All);
        assert!(" , ".parse::<ScopeFilter>().is_err());
    }

    #[test]
    fn default_scope_filter_is_compile_and_runtime() {
        assert_eq!(ScopeFilter::default().to_string(), "compile,runtime");
    }

    #[test]
    fn scope_filter_drops_subtrees() {
        let mut junit = Dependency::new("junit:junit", "4.13.2");
        junit.scope = Some("test".to_owned());
        let mut core = Dependency::new("a:core", "1.0");
        core.scope = Some("compile".to_owned());
        let mut nested_test = Dependency::new("a:mock", "1.0");
        nested_test.scope = Some("test".to_owned());
        core.children.push(nested_test);

        let filtered = ScopeFilter::default().apply(vec![core, junit]);
        assert_eq!(filtered.len(), 1);
        assert!(filtered[0].children.is_empty());
    }

    #[test]
    fn gradle_projects_are_normalized() {
        let opts = ExtractOptions::default().with_gradle_projects("app, :lib,,");
        assert_eq!(opts.gradle_projects, vec![":app", ":lib"]);
    }

    #[tokio::test]
    async fn npm_lockfile_is_read_without_tool() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("package-lock.json"),
            r#"{"lockfileVersion":3,"packages":{"":{},"node_modules/ms":{"version":"2.1.3"}}}"#,
        )
        .unwrap();
        let ctx = ExecContext::new(EngineSettings::default());
        let deps = extract(
            &ctx,
            Ecosystem::Npm,
            dir.path(),
            &Detection::ManifestOnly(ManifestOnlyReason::NoToolRequired),
            &ExtractOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(deps, vec![Dependency::new("ms", "2.1.3")]);
    }

    #[tokio::test]
    async fn skipped_gradle_yields_empty_module() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ExecContext::new(EngineSettings::default());
        let deps = extract(
            &ctx,
            Ecosystem::Gradle,
            dir.path(),
            &Detection::ManifestOnly(ManifestOnlyReason::ToolSkipped),
            &ExtractOptions::default(),
        )
        .await
        .unwrap();
        assert!(deps.is_empty());
    }

    #[tokio::test]
    async fn broken_lockfile_is_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("package-lock.json"), "{").unwrap();
        let ctx = ExecContext::new(EngineSettings::default());
        let err = extract(
            &ctx,
            Ecosystem::Npm,
            dir.path(),
            &Detection::ManifestOnly(ManifestOnlyReason::NoToolRequired),
            &ExtractOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, EngineError::Extraction { ecosystem: Ecosystem::Npm, .. }));
    }
}
