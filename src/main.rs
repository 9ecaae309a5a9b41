use anyhow::Context;
use axum::{routing::get, Router};
use std::net::{IpAddr, SocketAddr};
use tokio::task;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinema_booking::{config::Config, controllers, AppState};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("invalid configuration")?;

    let registry = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.app.rust_log));
    if config.app.log_format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    info!(environment = %config.app.environment, "Starting cinema booking API");

    let host: IpAddr = config.app.host.parse().context("HOST must be an IP address")?;
    let addr = SocketAddr::new(host, config.app.port);

    let app_state = AppState::new(config).await?;

    // Прогрев кеша каталога в фоне
    let state_for_bg = app_state.clone();
    task::spawn(async move {
        state_for_bg.cache.warmup_cache().await;
    });

    let app = Router::new()
        .route("/", get(|| async { "Cinema Booking API v1.0" }))
        .route("/health", get(|| async { "OK" }))
        .nest("/api", controllers::routes())
        .with_state(app_state)
        .layer(TraceLayer::new_for_http());

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
