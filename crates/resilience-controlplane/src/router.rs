//! The control plane's HTTP surface, built with `axum`.
//!
//! The router is built against `Arc<Registry>` state, mirroring how the
//! teacher's own `axum-resilient-kv-store` example wires application state
//! into its router — the registry is passed in, never reached for through a
//! process-global `static`. Callers typically `.nest("/failsafe",
//! controlplane::router(registry))`, matching the default prefix in the
//! specification; the router itself is prefix-agnostic.

use crate::error::ControlPlaneError;
use crate::registry::Registry;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;

/// Builds the control-plane router over the given registry.
pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/liveness", get(liveness))
        .route("/patterns", get(list_patterns))
        .route("/config", get(list_config))
        .route("/config/:kind/:name", get(get_config))
        .route("/config/:kind/:name", put(update_config))
        .route("/metrics", get(list_metrics))
        .route("/metrics/:kind/:name", get(get_metrics))
        .route("/metrics/:kind/:name", delete(reset_metrics))
        .route("/control/:kind/:name/enable", post(enable))
        .route("/control/:kind/:name/disable", post(disable))
        .with_state(registry)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn liveness() -> impl IntoResponse {
    Json(json!({ "status": "alive" }))
}

async fn list_patterns(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    Json(registry.list())
}

async fn list_config(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let configs: Vec<Value> = registry
        .list()
        .into_iter()
        .filter_map(|summary| registry.get(&summary.kind, &summary.name).ok())
        .map(|handle| {
            json!({
                "kind": handle.kind(),
                "name": handle.name(),
                "config": handle.config(),
            })
        })
        .collect();
    Json(configs)
}

async fn get_config(
    State(registry): State<Arc<Registry>>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ControlPlaneError> {
    let handle = registry.get(&kind, &name)?;
    Ok(Json(handle.config()))
}

async fn update_config(
    State(registry): State<Arc<Registry>>,
    Path((kind, name)): Path<(String, String)>,
    Json(patch): Json<Value>,
) -> Result<impl IntoResponse, ControlPlaneError> {
    let handle = registry.get(&kind, &name)?;
    handle.update_config(patch)?;
    Ok(Json(handle.config()))
}

async fn list_metrics(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let metrics: Vec<Value> = registry
        .list()
        .into_iter()
        .filter_map(|summary| registry.get(&summary.kind, &summary.name).ok())
        .map(|handle| {
            json!({
                "kind": handle.kind(),
                "name": handle.name(),
                "metrics": handle.metrics(),
            })
        })
        .collect();
    Json(metrics)
}

async fn get_metrics(
    State(registry): State<Arc<Registry>>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ControlPlaneError> {
    let handle = registry.get(&kind, &name)?;
    Ok(Json(handle.metrics()))
}

async fn reset_metrics(
    State(registry): State<Arc<Registry>>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ControlPlaneError> {
    let handle = registry.get(&kind, &name)?;
    handle.reset_metrics();
    Ok(StatusCode::NO_CONTENT)
}

async fn enable(
    State(registry): State<Arc<Registry>>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ControlPlaneError> {
    let handle = registry.get(&kind, &name)?;
    handle.set_enabled(true);
    Ok(Json(json!({ "kind": kind, "name": name, "enabled": true })))
}

async fn disable(
    State(registry): State<Arc<Registry>>,
    Path((kind, name)): Path<(String, String)>,
) -> Result<impl IntoResponse, ControlPlaneError> {
    let handle = registry.get(&kind, &name)?;
    handle.set_enabled(false);
    Ok(Json(json!({ "kind": kind, "name": name, "enabled": false })))
}
