use mimalloc::MiMalloc;
use startup_registry::config::Config;
use startup_registry::{AppState, RecordStore, SupabaseAuth, registry_router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::from_env()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(config = ?cfg, "configuration loaded");
    if cfg.auth_service_key.is_none() {
        warn!("no auth service key configured; failed sign-ups cannot be compensated");
    }

    let store = RecordStore::connect(&cfg.database_url, cfg.database_max_connections).await?;
    store.init_schema().await?;

    let gateway = SupabaseAuth::new(&cfg)?;
    info!(auth_url = %gateway.base_url(), "identity provider configured");

    let state = AppState::new(store, Arc::new(gateway));
    let app = registry_router(state);

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
