//! Main entry point for the eprel-downloader CLI

use clap::Parser;
use eprel_downloader::cli::{Cli, Commands};
use eprel_downloader::metrics::init_metrics;
use eprel_downloader::shutdown::ShutdownCoordinator;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing; `LOG_FORMAT=json` switches to JSON lines
fn init_tracing(verbose: bool) {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let default_level = if verbose { "eprel_downloader=debug" } else { "eprel_downloader=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let shutdown = ShutdownCoordinator::shared();
    shutdown.listen_for_ctrl_c();

    match &cli.command {
        Commands::Download(args) => {
            if let Some(addr) = args.metrics_addr {
                init_metrics(addr)?;
            }
            args.execute(&cli, shutdown).await?;
        }
        Commands::Categories(command) => command.execute(cli.output_format)?,
        Commands::ExtractId(command) => command.execute(cli.output_format)?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Command failed: {:#}", e);
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
