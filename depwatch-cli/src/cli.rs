//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use depwatch_core::types::OutputMode;

/// depwatch -- software composition analysis client.
///
/// Use `depwatch <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "depwatch", version, about, long_about = None)]
pub struct Cli {
    /// Path to a config.toml (default: ~/.depwatch/config.toml when present).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API token (overrides API_TOKEN and the stored token file).
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Analysis service base URL.
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Console log level (silent, error, warn, info, debug).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Do not write a log file.
    #[arg(long, global = true)]
    pub no_log_file: bool,

    /// Write the log file to this path instead of ~/.depwatch/logs.
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "no_log_file")]
    pub write_log_to: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Output mode requested by the active subcommand.
    pub fn output_mode(&self) -> OutputMode {
        let json = match &self.command {
            Commands::Scan(args) => args.json,
            Commands::Binscan(args) | Commands::Iotscan(args) => args.json,
            Commands::Auth(_) => false,
        };
        OutputMode::from_json_flag(json)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a source directory for dependencies.
    Scan(ScanArgs),

    /// Scan a binary artifact (.jar, .war, ...) or a directory of artifacts.
    Binscan(ArtifactArgs),

    /// Scan an IoT firmware image or a directory of images.
    Iotscan(ArtifactArgs),

    /// Manage the stored API token.
    Auth(AuthArgs),
}

// ---- scan ----

/// Detect ecosystems and extract dependencies from a project directory.
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Directory to scan (a file path scans its parent directory).
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Print the task report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Upload the source tree after the result is submitted.
    #[arg(long)]
    pub deep: bool,

    /// Project identifier on the analysis service.
    #[arg(long)]
    pub project_id: Option<String>,

    /// Project name on the analysis service.
    #[arg(long)]
    pub project_name: Option<String>,

    /// Do not collect git metadata.
    #[arg(long)]
    pub skip_git: bool,

    /// Maven scopes to keep (comma separated, or "all").
    #[arg(long, default_value = "compile,runtime")]
    pub scope: String,

    /// Gradle projects to inspect (comma separated, e.g. "app,lib").
    #[arg(long, value_name = "LIST")]
    pub gradle_projects: Option<String>,
}

// ---- binscan / iotscan ----

/// Upload an artifact for analysis.
#[derive(Args, Debug, Clone)]
pub struct ArtifactArgs {
    /// Artifact file or directory.
    pub path: PathBuf,

    /// Print the task report as JSON.
    #[arg(long)]
    pub json: bool,
}

// ---- auth ----

/// Manage the stored API token.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Store an API token in ~/.depwatch/token.
    Login {
        /// Token issued by the analysis service.
        token: String,
    },
    /// Remove the stored API token.
    Logout,
}
