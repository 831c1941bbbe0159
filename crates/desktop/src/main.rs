use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use opsdesk_desktop::cli::{Cli, Commands};
use opsdesk_desktop::{DirectorySink, ExportClient, ExportCoordinator, StatusOption, TerminalNotifier};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    opsdesk_observability::init();

    let cli = Cli::parse();
    let config = cli.client_config();

    let client = match &config.auth_token {
        Some(token) => ExportClient::with_token(&config.api_url, token),
        None => ExportClient::new(&config.api_url),
    };
    if !client.check_connectivity().await {
        tracing::warn!(api_url = %config.api_url, "API health check failed; trying anyway");
    }

    let coordinator = ExportCoordinator::new(
        Arc::new(client),
        Arc::new(DirectorySink::new(&config.out_dir)),
        Arc::new(TerminalNotifier),
    );

    let filter = cli.filter();
    if let Some(start) = &filter.start {
        coordinator.set_start_date(start.as_str()).await;
    }
    if let Some(end) = &filter.end {
        coordinator.set_end_date(end.as_str()).await;
    }
    coordinator.set_status(StatusOption::from(filter.status)).await;

    let ok = match &cli.command {
        Commands::Preview(_) => coordinator.request_preview().await.is_ok(),
        Commands::Commit(args) => {
            // An empty preview makes the commit below refuse without a request.
            if args.check_first && coordinator.request_preview().await.is_err() {
                return Ok(ExitCode::FAILURE);
            }
            coordinator.commit_export().await.is_ok()
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
