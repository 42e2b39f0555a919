use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use rdflix_core::SanitizedConfig;

use crate::metrics::encode_metrics;
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub debrid_configured: bool,
    pub indexers: Vec<String>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        debrid_configured: state.config().debrid.is_configured(),
        indexers: state.service().indexer_names(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// Addon manifest served to stream-discovery players.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: &'static str,
    pub version: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub resources: Vec<&'static str>,
    pub types: Vec<&'static str>,
    pub catalogs: Vec<serde_json::Value>,
    pub id_prefixes: Vec<&'static str>,
}

pub async fn manifest() -> Json<Manifest> {
    Json(Manifest {
        id: "org.community.realdebrid",
        version: env!("CARGO_PKG_VERSION"),
        name: "Real-Debrid Community",
        description: "Real-Debrid Community Addon",
        resources: vec!["stream"],
        types: vec!["movie", "series"],
        catalogs: Vec::new(),
        id_prefixes: vec!["tt"],
    })
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
