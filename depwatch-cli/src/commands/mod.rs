//! Command handlers -- one module per subcommand

pub mod artifact;
pub mod auth;
pub mod scan;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use depwatch_api::{ApiClient, HttpApiClient};
use depwatch_core::config::DepwatchConfig;
use depwatch_core::token::TokenStore;
use depwatch_core::types::ScanKind;
use depwatch_engine::{EngineSettings, ExecContext, Inspector, ScanContext, ScanTask};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::logging::{self, LogOptions};
use crate::output::OutputWriter;

/// Explicit dependencies built once at process start.
pub struct AppContext {
    pub config: DepwatchConfig,
    pub tokens: TokenStore,
}

impl AppContext {
    /// Load configuration and apply CLI overrides.
    pub async fn load(cli: &Cli) -> Result<Self, CliError> {
        let mut config = DepwatchConfig::load_optional(cli.config.as_deref()).await?;
        if let Some(server) = &cli.server {
            config.server.base_url = server.clone();
            config.validate()?;
        }
        Ok(Self {
            config,
            tokens: TokenStore::new(cli.token.clone()),
        })
    }

    /// Engine settings derived from the `[scan]` section.
    pub fn engine_settings(&self) -> Result<EngineSettings, CliError> {
        let settings = EngineSettings::from_core(&self.config.scan);
        settings.validate()?;
        Ok(settings)
    }

    /// Authenticated client for the analysis service.
    pub fn api_client(&self) -> Result<HttpApiClient, CliError> {
        let token = self.tokens.token().ok_or_else(|| {
            CliError::Environment(
                "no API token: pass --token, set API_TOKEN or run `depwatch auth login TOKEN`"
                    .to_owned(),
            )
        })?;
        Ok(HttpApiClient::new(&self.config.server, token)?)
    }
}

/// Run the parsed command line.
pub async fn dispatch(cli: Cli, writer: &OutputWriter) -> Result<(), CliError> {
    let app = AppContext::load(&cli).await?;

    let log_options = LogOptions::from_flags(
        cli.log_level.as_deref(),
        &app.config.general.log_level,
        cli.no_log_file,
        cli.write_log_to.as_deref(),
        app.config.general.resolved_log_dir(),
    )?;
    logging::init(&log_options);
    info!(version = env!("CARGO_PKG_VERSION"), "depwatch starting");

    match cli.command {
        Commands::Scan(args) => scan::execute(args, &app, writer).await,
        Commands::Binscan(args) => artifact::execute(args, ScanKind::Binary, &app, writer).await,
        Commands::Iotscan(args) => artifact::execute(args, ScanKind::Firmware, &app, writer).await,
        Commands::Auth(args) => auth::execute(args, &app.tokens, writer),
    }
}

/// Drive one task to completion.
///
/// Ctrl-C cancels the execution context; running tools are terminated and
/// the task fails with a cancellation error.
pub async fn execute_task<C: ApiClient>(
    client: Arc<C>,
    settings: EngineSettings,
    task: ScanTask,
) -> Result<ScanTask, CliError> {
    let exec = ExecContext::new(settings);
    let cancel = exec.cancel_token().clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling scan");
            cancel.cancel();
        }
    });

    let mut scan = ScanContext::new(exec, task);
    let outcome = Inspector::new(client).run(&mut scan).await;
    interrupt.abort();

    outcome.map_err(|e| CliError::from(e).with_diagnostics(&scan.task.result().diagnostics))?;
    Ok(scan.task)
}

/// Resolve a user-supplied path to an absolute, existing path.
pub fn resolve_target(path: &Path) -> Result<PathBuf, CliError> {
    std::fs::canonicalize(path).map_err(|e| CliError::Path {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}
