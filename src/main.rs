//! Binary entrypoint: load the dataset once, then serve questions over HTTP.

use std::sync::Arc;

use anyhow::Result;
use salesq::config::ServerConfig;
use salesq::reader;
use salesq::server::QueryServer;
use salesq::QueryDispatcher;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("salesq=info,warn")),
        )
        .init();

    let config = ServerConfig::from_env()?;

    // The table is complete before the listener is bound.
    let table = Arc::new(reader::load(&config.dataset_path));
    let dispatcher = Arc::new(QueryDispatcher::new(table));

    let server = QueryServer::new(config, dispatcher)?;
    server.start().await?;
    Ok(())
}
