use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::storage::s3::S3ObjectStorage;
use tracing::info;
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::state::AppState;
use server::upload::UploadOrchestrator;
use server::{build_router, database, sweeper};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = database::init_db(&config.database.url)
        .await
        .context("Failed to connect to database")?;
    database::ensure_constraints(&db).await?;

    let storage = S3ObjectStorage::new(&config.storage).context("Failed to set up object storage")?;
    let uploads = Arc::new(UploadOrchestrator::new(
        Arc::new(storage),
        Duration::from_secs(config.storage.url_ttl_secs),
    ));

    if config.sweeper.enabled {
        tokio::spawn(sweeper::run_pending_sweeper(
            db.clone(),
            uploads.clone(),
            config.sweeper.clone(),
        ));
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let state = AppState {
        db,
        config: Arc::new(config),
        uploads,
    };
    let app = build_router(state);

    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
