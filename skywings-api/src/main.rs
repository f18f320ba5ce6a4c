use std::net::SocketAddr;

use skywings_api::{app, state::AppState};
use skywings_store::app_config::{Config, StorageBackend};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skywings_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        port = config.server.port,
        backend = ?config.storage.backend,
        "Starting SkyWings API"
    );

    let app_state = match config.storage.backend {
        StorageBackend::Postgres => AppState::connect(&config).await?,
        StorageBackend::Memory => {
            tracing::warn!("In-memory storage: nothing survives a restart");
            AppState::in_memory(&config)
        }
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
