use epoch::clock::SystemClock;
use epoch::{AppState, Config, FileStore, TimeRepository, WeekView, router};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::from_env();
    let store = FileStore::open(config.data_dir.clone()).await?;
    info!("storing data in {}", store.dir().display());

    let view = WeekView::new(TimeRepository::new(store), Arc::new(SystemClock)).await;
    let app = router(AppState::new(view));

    let addr = config.addr();
    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
