//! ShelfSync — book shelf proxy bridging reading trackers to a third-party
//! book site via its public feed and a simulated browser session.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use shelfsync_server::routes;
use shelfsync_server::state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("SHELFSYNC_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = shelfsync_core::ShelfSyncConfig::from_env(&data_dir)?;
    let port = config.port;

    let store = Arc::new(
        shelfsync_store::SessionStore::open(&config.data_paths.store)
            .map_err(|e| anyhow::anyhow!("Failed to open session store: {}", e))?,
    );
    let profiles = shelfsync_store::ProfileRoot::new(&config.data_paths.sessions);
    let driver: Arc<dyn shelfsync_browser::BrowserDriver> =
        Arc::new(shelfsync_browser::ChromiumDriver::new());

    let sessions =
        shelfsync_sync::SessionManager::new(driver.clone(), store.clone(), profiles.clone());
    let syncer = shelfsync_sync::ProgressSyncer::new(driver, store.clone(), profiles);
    let feed = shelfsync_feed::FeedIngester::new();

    let state = Arc::new(AppState::new(config, store, sessions, syncer, feed));
    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("ShelfSync server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
