use tracing::info;

use catalog_service::{CatalogService, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = ServiceConfig::from_env()?;

    info!(
        "Starting catalog service on http://{}:{} (database: {})",
        cfg.host, cfg.port, cfg.database_uri
    );

    CatalogService::open(cfg)?.serve().await
}
