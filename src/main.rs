mod app;

use anyhow::{Context, Result};
use tracing::info;

use app::{AppConfig, PagerApp};

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the listing.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("idxd_pager=info".parse()?),
        )
        .init();

    let config = AppConfig::from_env()?;
    info!(
        start = %config.start,
        remote = config.api_base.is_some(),
        "Starting idxd-pager"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, async move {
        let app = PagerApp::new(config)?;
        app.run().await
    })
}
