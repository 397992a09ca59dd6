//! REST surface over the store.
//!
//! Paths may carry a trailing `.json`, so URLs written for a hosted
//! key-tree database (`.../rooms/X/activeUsers/s1.json`) work unchanged.
//! `PUT` with a `null` body deletes. `POST /v1/beacon/...` is the unload
//! signal: it always answers `204` and never reports the delete's outcome.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::{json, Value};
use thiserror::Error;

use bubblechat_core::error::{ChatError, ClientCode};
use bubblechat_core::protocol::paths::StorePath;

use crate::app_state::AppState;

/// `ChatError` as an HTTP response.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] ChatError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = match code {
            ClientCode::BadRequest | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
            ClientCode::AlreadyExists | ClientCode::ColorTaken => StatusCode::CONFLICT,
            ClientCode::NotFound => StatusCode::NOT_FOUND,
            ClientCode::NoOp => StatusCode::OK,
            ClientCode::Transient => StatusCode::SERVICE_UNAVAILABLE,
            ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error": code.as_str(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

fn store_path(raw: &str) -> Result<StorePath, ApiError> {
    let raw = raw.strip_suffix(".json").unwrap_or(raw);
    Ok(StorePath::parse(raw)?)
}

/// Count one REST request under its route and client code.
fn record<T>(app: &AppState, route: &'static str, res: &Result<T, ApiError>) {
    let code = match res {
        Ok(_) => "OK",
        Err(e) => e.0.client_code().as_str(),
    };
    app.metrics().rest_requests.inc(&[("route", route), ("code", code)]);
}

pub async fn read_path(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let res = async {
        let path = store_path(&raw)?;
        let value = app.store().read_once(&path).await?;
        Ok::<_, ApiError>(Json(value.unwrap_or(Value::Null)))
    }
    .await;
    record(&app, "read", &res);
    res
}

pub async fn write_path(
    State(app): State<AppState>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let res = async {
        let path = store_path(&raw)?;
        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| ChatError::BadRequest(format!("invalid json body: {e}")))?;
        if value.is_null() {
            app.store().delete(&path).await?;
        } else {
            app.store().write(&path, value).await?;
        }
        Ok::<_, ApiError>(StatusCode::NO_CONTENT)
    }
    .await;
    record(&app, "write", &res);
    res
}

pub async fn delete_path(
    State(app): State<AppState>,
    Path(raw): Path<String>,
) -> Result<StatusCode, ApiError> {
    let res = async {
        let path = store_path(&raw)?;
        app.store().delete(&path).await?;
        Ok::<_, ApiError>(StatusCode::NO_CONTENT)
    }
    .await;
    record(&app, "delete", &res);
    res
}

/// Fire-and-forget delete. The body, if any, is ignored.
pub async fn beacon(State(app): State<AppState>, Path(raw): Path<String>, body: Bytes) -> StatusCode {
    let code = match store_path(&raw) {
        Ok(path) if !path.is_root() => {
            tracing::debug!(path = %path, body_len = body.len(), "unload beacon");
            app.store().beacon_delete(&path);
            "OK"
        }
        Ok(_) => {
            tracing::debug!("beacon for root ignored");
            "IGNORED"
        }
        Err(e) => {
            tracing::debug!(error = %e, "beacon with invalid path ignored");
            "IGNORED"
        }
    };
    app.metrics().rest_requests.inc(&[("route", "beacon"), ("code", code)]);
    StatusCode::NO_CONTENT
}

pub async fn metrics(State(app): State<AppState>) -> String {
    app.metrics().render()
}
