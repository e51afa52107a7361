mod cli;
mod config;
mod dashboard;
mod deploy;
mod error;

use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use config::Settings;
use dashboard::HttpDashboardClient;
use deploy::Orchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netclaim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let settings = Settings::load(&cli.config)?;
    tracing::info!("Starting NetClaim");
    tracing::info!("Dashboard: {}", settings.api_base_url);
    tracing::info!("Organization: {}", settings.organization_id);

    let client = HttpDashboardClient::new(settings.api_base_url.clone(), settings.api_key.clone())?;

    // Cancellation fires between steps, never mid-call.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping after the current step");
                cancel.cancel();
            }
        });
    }
    if let Some(secs) = cli.timeout {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            tracing::warn!("run deadline of {}s reached", secs);
            cancel.cancel();
        });
    }

    let request = cli.to_request();
    let orchestrator = Orchestrator::new(&client, &settings, cancel);
    let result = orchestrator.run(&request).await;

    println!("{}", serde_json::to_string_pretty(&result)?);

    if result.is_success() {
        if result.has_warnings() {
            tracing::warn!("deployment completed with verification warnings");
        }
        Ok(())
    } else {
        std::process::exit(1);
    }
}
