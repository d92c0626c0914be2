//! `depwatch scan` command handler

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use depwatch_core::types::{OutputMode, ScanKind};
use depwatch_engine::{ExtractOptions, ScanTask, ScopeFilter};

use crate::cli::ScanArgs;
use crate::commands::{AppContext, execute_task, resolve_target};
use crate::error::CliError;
use crate::output::OutputWriter;

/// Execute the `scan` command.
pub async fn execute(
    args: ScanArgs,
    app: &AppContext,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let (task, note) = build_task(&args)?;
    if let Some(note) = note {
        writer.note(&note);
    }

    let settings = app.engine_settings()?;
    let client = Arc::new(app.api_client()?);
    info!(path = %task.target_path().display(), "starting source scan");

    let task = execute_task(client, settings, task).await?;
    writer.render(&task.report())
}

/// Build the scan task from the arguments.
///
/// A file target scans its containing directory; the returned note says so.
pub fn build_task(args: &ScanArgs) -> Result<(ScanTask, Option<String>), CliError> {
    let (dir, note) = scan_directory(&args.path)?;

    let mut options = ExtractOptions {
        maven_scopes: args.scope.parse::<ScopeFilter>()?,
        ..ExtractOptions::default()
    };
    if let Some(projects) = &args.gradle_projects {
        options = options.with_gradle_projects(projects);
    }

    let task = ScanTask::builder(dir, ScanKind::Source)
        .output_mode(OutputMode::from_json_flag(args.json))
        .project_id(args.project_id.clone())
        .project_name(args.project_name.clone())
        .deep_scan(args.deep)
        .skip_git(args.skip_git)
        .extract_options(options)
        .build()?;
    Ok((task, note))
}

fn scan_directory(path: &std::path::Path) -> Result<(PathBuf, Option<String>), CliError> {
    let resolved = resolve_target(path)?;
    if resolved.is_dir() {
        return Ok((resolved, None));
    }
    let parent = resolved
        .parent()
        .map(|p| p.to_path_buf())
        .ok_or_else(|| CliError::Path {
            path: resolved.display().to_string(),
            reason: "file has no parent directory".to_owned(),
        })?;
    let note = format!(
        "{} is a file, scanning its directory {}",
        resolved.display(),
        parent.display()
    );
    Ok((parent, Some(note)))
}
