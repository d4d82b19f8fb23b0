use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use events_client::cli::{self, Cli};
use events_client::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout is left to command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "events_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenv::dotenv().ok();
    let config = AppConfig::from_env()?;

    let cli = Cli::parse();

    cli::run(cli, config).await
}
