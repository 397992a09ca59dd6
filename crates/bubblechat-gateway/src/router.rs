//! Axum router wiring.
//!
//! - `/v1/ws`: WebSocket lane (streaming subscriptions)
//! - `/v1/store/*path`: read / write / delete
//! - `/v1/beacon/*path`: unload beacon
//! - `/metrics`: Prometheus text

use axum::{
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/ws", get(transport::ws::ws_upgrade))
        .route(
            "/v1/store/*path",
            get(transport::rest::read_path)
                .put(transport::rest::write_path)
                .delete(transport::rest::delete_path),
        )
        .route("/v1/beacon/*path", post(transport::rest::beacon))
        .route("/metrics", get(transport::rest::metrics))
        .with_state(state)
}
