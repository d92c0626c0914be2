//! `depwatch binscan` / `depwatch iotscan` command handler

use std::sync::Arc;

use tracing::info;

use depwatch_core::types::{OutputMode, ScanKind};
use depwatch_engine::ScanTask;

use crate::cli::ArtifactArgs;
use crate::commands::{AppContext, execute_task, resolve_target};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute an artifact upload scan of the given kind.
pub async fn execute(
    args: ArtifactArgs,
    kind: ScanKind,
    app: &AppContext,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let task = build_task(&args, kind)?;
    let settings = app.engine_settings()?;
    let client = Arc::new(app.api_client()?);
    info!(path = %task.target_path().display(), %kind, "starting artifact scan");

    let task = execute_task(client, settings, task).await?;
    writer.render(&task.report())
}

/// Build an artifact task; the target may be a single file or a directory.
pub fn build_task(args: &ArtifactArgs, kind: ScanKind) -> Result<ScanTask, CliError> {
    let target = resolve_target(&args.path)?;
    let task = ScanTask::builder(target, kind)
        .output_mode(OutputMode::from_json_flag(args.json))
        .build()?;
    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_binary_task_for_file() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("app.jar");
        std::fs::write(&jar, b"PK").unwrap();

        let task = build_task(
            &ArtifactArgs {
                path: jar.clone(),
                json: true,
            },
            ScanKind::Binary,
        )
        .unwrap();
        assert_eq!(task.kind(), ScanKind::Binary);
        assert_eq!(task.output_mode(), OutputMode::MachineReadable);
        assert_eq!(task.target_path(), std::fs::canonicalize(&jar).unwrap());
    }

    #[test]
    fn test_missing_artifact_is_path_error() {
        let err = build_task(
            &ArtifactArgs {
                path: "/no/firmware.bin".into(),
                json: false,
            },
            ScanKind::Firmware,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "path");
    }
}
