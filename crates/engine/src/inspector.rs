//! 스캔 오케스트레이터
//!
//! [`Inspector`]는 [`ScanContext`]에 담긴 작업 하나를 끝까지 진행합니다.
//!
//! # 소스 스캔 흐름
//!
//! ```text
//! start signal --> git info --> detect (생태계별 동시 실행) --> join
//!                                                               |
//!                      submit result <-- Completed <-- extract (생태계 순서)
//!                            |
//!                      deep scan upload (--deep)
//! ```
//!
//! 바이너리/펌웨어 스캔은 탐지 없이 산출물을 업로드한 뒤 결과를 제출합니다.
//!
//! 생태계 하나의 탐지 실패는 다른 생태계가 남아 있으면 진단으로 기록됩니다.
//! 취소는 즉시 전파되며, 실패한 작업은 결과를 제출하지 않습니다.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{Instrument, error, info, info_span, warn};

use depwatch_api::ApiClient;
use depwatch_core::metrics as m;
use depwatch_core::types::ScanKind;

use crate::context::{ExecContext, ScanContext};
use crate::deep::{CollectRules, UploadFile, collect_upload_files, upload_files};
use crate::detector::{Detection, EcosystemDetector, ManifestOnlyReason, default_detectors, detect};
use crate::environment::EcosystemEnvironment;
use crate::error::EngineError;
use crate::extract::extract;
use crate::git::collect_git_info;
use crate::task::{Diagnostic, DiagnosticStage, EcosystemModule, ScanTask, TaskState};
use crate::types::Ecosystem;

/// 생태계별 탐지 결과 (생태계 순서로 정렬)
type DetectionResults = BTreeMap<Ecosystem, Result<Detection, EngineError>>;

/// 스캔 오케스트레이터
pub struct Inspector<C: ApiClient> {
    client: Arc<C>,
    detectors: Vec<Arc<dyn EcosystemDetector>>,
    concurrent_detection: bool,
}

impl<C: ApiClient> Inspector<C> {
    /// 기본 탐지기 목록과 동시 탐지로 생성합니다.
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            detectors: default_detectors(),
            concurrent_detection: true,
        }
    }

    /// 탐지기 목록을 교체합니다.
    pub fn with_detectors(mut self, detectors: Vec<Arc<dyn EcosystemDetector>>) -> Self {
        self.detectors = detectors;
        self
    }

    /// 생태계 탐지를 동시에 실행할지 설정합니다 (기본 true).
    pub fn with_concurrent_detection(mut self, concurrent: bool) -> Self {
        self.concurrent_detection = concurrent;
        self
    }

    /// 작업을 실행합니다.
    ///
    /// 성공하면 작업은 `Completed`, 실패하면 `Failed` 상태로 끝나며 에러가 반환됩니다.
    pub async fn run(&self, scan: &mut ScanContext) -> Result<(), EngineError> {
        let span = info_span!(
            parent: scan.exec.span(),
            "scan",
            task_id = %scan.task.id(),
            kind = %scan.task.kind()
        );
        let started = Instant::now();
        let kind = scan.task.kind();

        let outcome = self
            .run_task(&scan.exec, &mut scan.task)
            .instrument(span.clone())
            .await;

        let result_label = match &outcome {
            Ok(()) => "success",
            Err(e) => {
                scan.task.fail(e);
                span.in_scope(|| error!(error = %e, "scan failed"));
                "failure"
            }
        };
        metrics::counter!(
            m::TASK_FINISHED_TOTAL,
            m::LABEL_SCAN_KIND => kind.to_string(),
            m::LABEL_RESULT => result_label
        )
        .increment(1);
        metrics::histogram!(m::TASK_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        outcome
    }

    async fn run_task(&self, ctx: &ExecContext, task: &mut ScanTask) -> Result<(), EngineError> {
        task.seal();
        self.client.submit_start_signal(task.id()).await?;
        info!(path = %task.target_path().display(), "scan started");

        match task.kind() {
            ScanKind::Source => self.inspect_source(ctx, task).await,
            ScanKind::Binary | ScanKind::Firmware => self.scan_artifacts(ctx, task).await,
        }
    }

    async fn inspect_source(&self, ctx: &ExecContext, task: &mut ScanTask) -> Result<(), EngineError> {
        task.transition(TaskState::EnvironmentResolving)?;
        let dir = task.target_path().to_path_buf();

        if !task.skip_git() {
            task.result_mut().git = collect_git_info(ctx, &dir).await;
        }

        let applicable: Vec<Arc<dyn EcosystemDetector>> = self
            .detectors
            .iter()
            .filter(|d| d.applies_to(&dir))
            .cloned()
            .collect();
        if applicable.is_empty() {
            return Err(EngineError::NoEcosystem {
                path: dir.display().to_string(),
            });
        }
        info!(
            ecosystems = ?applicable.iter().map(|d| d.ecosystem()).collect::<Vec<_>>(),
            "applicable ecosystems"
        );

        let results = if self.concurrent_detection {
            detect_concurrently(ctx, &applicable, &dir).await?
        } else {
            detect_sequentially(ctx, &applicable, &dir).await
        };
        let resolved = partition_detections(task, results)?;

        task.transition(TaskState::Extracting)?;
        for (ecosystem, detection) in resolved {
            match extract(ctx, ecosystem, &dir, &detection, task.extract_options()).await {
                Ok(deps) => {
                    let (env, manifest_only) = split_detection(detection);
                    task.result_mut()
                        .merge_module(EcosystemModule::new(ecosystem, env, manifest_only, deps));
                }
                Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
                Err(e) => {
                    warn!(%ecosystem, error = %e, "extraction failed");
                    let (env, manifest_only) = split_detection(detection);
                    let result = task.result_mut();
                    result.add_diagnostic(
                        ecosystem,
                        Diagnostic::from_error(DiagnosticStage::Extraction, &e),
                    );
                    result.merge_module(EcosystemModule::new(ecosystem, env, manifest_only, Vec::new()));
                }
            }
        }

        task.transition(TaskState::Completed)?;
        info!(
            modules = task.result().modules.len(),
            dependencies = task.result().total_dependencies(),
            "scan completed"
        );
        self.client.submit_result(task.id(), &task.report()).await?;

        if task.deep_scan() {
            let rules = CollectRules::source(ctx.settings().deep_scan_max_file_size);
            let files = collect_blocking(dir, rules).await?;
            let artifacts = upload_files(ctx, self.client.as_ref(), task.id(), &files).await?;
            task.result_mut().artifacts = artifacts;
        }
        Ok(())
    }

    async fn scan_artifacts(&self, ctx: &ExecContext, task: &mut ScanTask) -> Result<(), EngineError> {
        task.transition(TaskState::Extracting)?;
        let target = task.target_path().to_path_buf();
        let files = collect_blocking(target.clone(), CollectRules::artifacts()).await?;
        if files.is_empty() {
            return Err(EngineError::InvalidTarget {
                path: target.display().to_string(),
                reason: "no files to upload".to_owned(),
            });
        }
        let artifacts = upload_files(ctx, self.client.as_ref(), task.id(), &files).await?;
        task.result_mut().artifacts = artifacts;

        task.transition(TaskState::Completed)?;
        self.client.submit_result(task.id(), &task.report()).await?;
        Ok(())
    }
}

/// 생태계별 탐지를 동시에 실행하고 모두 끝날 때까지 기다립니다.
async fn detect_concurrently(
    ctx: &ExecContext,
    detectors: &[Arc<dyn EcosystemDetector>],
    dir: &Path,
) -> Result<DetectionResults, EngineError> {
    let handles: Vec<_> = detectors
        .iter()
        .map(|detector| {
            let ecosystem = detector.ecosystem();
            let ctx = ctx.clone();
            let detector = Arc::clone(detector);
            let dir = dir.to_path_buf();
            let span = info_span!(parent: ctx.span(), "detect", %ecosystem);
            let handle = tokio::spawn(
                async move { detect(&ctx, detector.as_ref(), &dir).await }.instrument(span),
            );
            (ecosystem, handle)
        })
        .collect();

    let mut results = DetectionResults::new();
    for (ecosystem, handle) in handles {
        let outcome = handle
            .await
            .map_err(|e| EngineError::Join(format!("{ecosystem} detection: {e}")))?;
        results.insert(ecosystem, outcome);
    }
    Ok(results)
}

/// 생태계별 탐지를 순서대로 실행합니다. 취소되면 남은 생태계는 건너뜁니다.
async fn detect_sequentially(
    ctx: &ExecContext,
    detectors: &[Arc<dyn EcosystemDetector>],
    dir: &Path,
) -> DetectionResults {
    let mut results = DetectionResults::new();
    for detector in detectors {
        let ecosystem = detector.ecosystem();
        let span = info_span!(parent: ctx.span(), "detect", %ecosystem);
        let outcome = detect(ctx, detector.as_ref(), dir).instrument(span).await;
        let cancelled = matches!(outcome, Err(EngineError::Cancelled));
        results.insert(ecosystem, outcome);
        if cancelled {
            break;
        }
    }
    results
}

/// 탐지 결과를 성공과 실패로 나눕니다.
///
/// 성공이 하나라도 있으면 실패는 진단으로 기록하고 성공만 반환합니다.
/// 모두 실패하면 유일한 실패는 그대로, 여러 실패는 [`EngineError::DetectionExhausted`]로 반환합니다.
fn partition_detections(
    task: &mut ScanTask,
    results: DetectionResults,
) -> Result<Vec<(Ecosystem, Detection)>, EngineError> {
    if results.values().any(|r| matches!(r, Err(EngineError::Cancelled))) {
        return Err(EngineError::Cancelled);
    }

    let mut resolved = Vec::new();
    let mut failed: Vec<(Ecosystem, EngineError)> = Vec::new();
    for (ecosystem, outcome) in results {
        match outcome {
            Ok(detection) => resolved.push((ecosystem, detection)),
            Err(e) => failed.push((ecosystem, e)),
        }
    }

    if resolved.is_empty() {
        if failed.len() == 1 {
            if let Some((_, err)) = failed.pop() {
                return Err(err);
            }
        }
        return Err(EngineError::DetectionExhausted { failures: failed });
    }

    for (ecosystem, err) in &failed {
        warn!(%ecosystem, error = %err, "ecosystem skipped");
        task.result_mut().add_diagnostic(
            *ecosystem,
            Diagnostic::from_error(DiagnosticStage::Detection, err),
        );
    }
    Ok(resolved)
}

fn split_detection(
    detection: Detection,
) -> (Option<EcosystemEnvironment>, Option<ManifestOnlyReason>) {
    match detection {
        Detection::Resolved(env) => (Some(env), None),
        Detection::ManifestOnly(reason) => (None, Some(reason)),
    }
}

/// 파일 수집은 블로킹 I/O이므로 별도 스레드에서 실행합니다.
async fn collect_blocking(
    target: PathBuf,
    rules: CollectRules,
) -> Result<Vec<UploadFile>, EngineError> {
    tokio::task::spawn_blocking(move || collect_upload_files(&target, rules))
        .await
        .map_err(|e| EngineError::Join(format!("collect upload files: {e}")))
}
