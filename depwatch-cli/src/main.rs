use clap::Parser;

use depwatch_cli::cli::Cli;
use depwatch_cli::commands;
use depwatch_cli::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let mode = cli.output_mode();
    let writer = OutputWriter::new(mode);

    let code = match commands::dispatch(cli, &writer).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "depwatch failed");
            writer.render_error(&e);
            e.exit_code(mode)
        }
    };
    std::process::exit(code);
}
