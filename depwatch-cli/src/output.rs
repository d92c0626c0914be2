//! Output formatting abstraction for text vs JSON rendering
//!
//! All subcommand output flows through [`OutputWriter`] which handles format switching.
//! This keeps format-specific logic out of command handlers entirely.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;
use serde_json::json;

use depwatch_core::types::OutputMode;
use depwatch_engine::{
    CandidateStatus, Diagnostic, Ecosystem, EcosystemModule, ManifestOnlyReason, TaskReport,
    TaskState,
};

use crate::error::CliError;

/// Abstraction for writing CLI output in different formats.
///
/// Subcommand handlers call `writer.render(&payload)` where `payload`
/// implements both `Serialize` (for JSON) and `Render` (for text).
pub struct OutputWriter {
    mode: OutputMode,
}

impl OutputWriter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(&mut handle, payload)
    }

    /// Render a payload to an arbitrary writer.
    ///
    /// For `Interactive` mode, delegates to `Render::render_text()`.
    /// For `MachineReadable` mode, serialises via `serde_json`.
    pub fn render_to<T: Render + Serialize>(
        &self,
        w: &mut dyn Write,
        payload: &T,
    ) -> Result<(), CliError> {
        match self.mode {
            OutputMode::Interactive => payload.render_text(w)?,
            OutputMode::MachineReadable => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }

    /// Print an informational note (interactive mode only).
    pub fn note(&self, message: &str) {
        if self.mode == OutputMode::Interactive {
            eprintln!("{} {}", "note:".cyan().bold(), message);
        }
    }

    /// Report a failure.
    ///
    /// Machine-readable mode prints `{"error": {"kind", "message", "diagnostics"?}}`
    /// to stdout so CI consumers always get a JSON document.
    pub fn render_error(&self, err: &CliError) {
        match self.mode {
            OutputMode::Interactive => {
                eprintln!("{} {}", "error:".red().bold(), err);
                let mut stderr = std::io::stderr().lock();
                for (ecosystem, diagnostics) in err.diagnostics().into_iter().flatten() {
                    for diag in diagnostics {
                        let _ = write_diagnostic(&mut stderr, ecosystem, diag);
                    }
                }
            }
            OutputMode::MachineReadable => {
                let body = error_body(err);
                let stdout = std::io::stdout();
                let mut handle = stdout.lock();
                if serde_json::to_writer_pretty(&mut handle, &body).is_err()
                    || writeln!(handle).is_err()
                {
                    eprintln!("error: {err}");
                }
            }
        }
    }
}

/// JSON document for a failed run.
///
/// Scan failures carry the per-ecosystem diagnostics in the same shape as the task report.
pub fn error_body(err: &CliError) -> serde_json::Value {
    let mut body = json!({
        "kind": err.kind(),
        "message": err.to_string(),
    });
    if let Some(diagnostics) = err.diagnostics().and_then(|d| serde_json::to_value(d).ok()) {
        body["diagnostics"] = diagnostics;
    }
    json!({ "error": body })
}

fn write_diagnostic(
    w: &mut dyn Write,
    ecosystem: &Ecosystem,
    diag: &Diagnostic,
) -> std::io::Result<()> {
    let exit = diag
        .exit_code
        .map(|c| format!(" (exit {c})"))
        .unwrap_or_default();
    writeln!(
        w,
        "  {} {}: {}{}",
        "warning:".yellow().bold(),
        ecosystem,
        diag.message,
        exit
    )?;
    if let Some(stderr) = &diag.stderr {
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            writeln!(w, "      {}", line.dimmed())?;
        }
    }
    Ok(())
}

/// Trait for human-readable text rendering.
///
/// Implemented by every CLI output payload alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

impl Render for TaskReport<'_> {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let state = match self.state {
            TaskState::Completed => self.state.to_string().green().bold(),
            TaskState::Failed => self.state.to_string().red().bold(),
            _ => self.state.to_string().yellow(),
        };
        writeln!(w, "{} {} ({})", "Task".bold(), self.task_id, state)?;
        writeln!(w, "  target: {}", self.target.display())?;
        writeln!(w, "  kind:   {}", self.kind)?;
        if let Some(name) = self.project_name {
            writeln!(w, "  project: {name}")?;
        }
        if let Some(failure) = self.failure {
            writeln!(w, "  failure: {}", failure.red())?;
        }

        if let Some(git) = &self.result.git {
            if let Some(branch) = &git.branch {
                writeln!(w, "  branch: {branch}")?;
            }
            if let Some(commit) = &git.commit {
                writeln!(w, "  commit: {commit}")?;
            }
        }

        if !self.result.modules.is_empty() {
            writeln!(w)?;
            writeln!(
                w,
                "{:<8} {:<10} {:<12} {:>6}",
                "ECOSYSTEM", "TOOL", "VIA", "DEPS"
            )?;
            for module in self.result.modules.values() {
                render_module(w, module)?;
            }
            writeln!(
                w,
                "{} dependencies in {} ecosystem(s)",
                self.result.total_dependencies(),
                self.result.modules.len()
            )?;
        }

        for (ecosystem, diagnostics) in &self.result.diagnostics {
            for diag in diagnostics {
                write_diagnostic(w, ecosystem, diag)?;
            }
        }

        if !self.result.artifacts.is_empty() {
            writeln!(w)?;
            writeln!(w, "Uploaded {} file(s)", self.result.artifacts.len())?;
            for artifact in &self.result.artifacts {
                writeln!(w, "  {} ({} bytes)", artifact.path, artifact.size)?;
            }
        }
        Ok(())
    }
}

fn render_module(w: &mut dyn Write, module: &EcosystemModule) -> std::io::Result<()> {
    let (tool, via) = match (&module.environment, module.manifest_only) {
        (Some(env), _) => {
            let via = if env.wrapper_status() == CandidateStatus::Used {
                "wrapper"
            } else {
                "system"
            };
            (env.tool_version().to_string(), via)
        }
        (None, Some(ManifestOnlyReason::ToolSkipped)) => ("-".to_owned(), "skipped"),
        (None, _) => ("-".to_owned(), "manifest"),
    };
    writeln!(
        w,
        "{:<8} {:<10} {:<12} {:>6}",
        module.ecosystem.to_string(),
        tool,
        via,
        module.dependency_count
    )?;
    if let Some(last) = module.environment.as_ref().and_then(|env| env.last_error()) {
        writeln!(w, "         {} {}", "fallback after:".dimmed(), last)?;
    }
    Ok(())
}
