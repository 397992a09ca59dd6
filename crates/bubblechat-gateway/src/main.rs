//! bubblechat gateway
//!
//! - Store over WebSocket: /v1/ws (streaming subscriptions)
//! - Store over REST: /v1/store/*path, unload beacon at /v1/beacon/*path
//! - Preset rooms seeded at boot
//! - Prometheus text at /metrics

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use bubblechat_gateway::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = config::config_path();
    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .gateway
        .listen
        .parse()
        .expect("gateway.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg).expect("app state init failed");
    let seeded = state.seed_preset_rooms().await.expect("preset room seeding failed");
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, seeded, "bubblechat-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await
        .expect("server failed");
}
