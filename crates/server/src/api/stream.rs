//! Stream-discovery endpoint.
//!
//! Malformed requests answer 400. Everything past parsing answers 200, with
//! an empty `streams` array when nothing resolved or the pipeline task died.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

use rdflix_core::{FileEntry, RequestContext, StreamDescriptor};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StreamsResponse {
    pub streams: Vec<StremioStream>,
}

/// One stream in the player's wire format.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StremioStream {
    pub name: String,
    pub title: String,
    pub url: String,
    pub behavior_hints: BehaviorHints,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_list: Option<Vec<StremioFile>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorHints {
    pub binge_group: String,
    pub filename: String,
    pub video_size: u64,
}

#[derive(Debug, Serialize)]
pub struct StremioFile {
    pub path: String,
    pub size: u64,
    pub url: Option<String>,
}

impl From<&FileEntry> for StremioFile {
    fn from(file: &FileEntry) -> Self {
        Self {
            path: file.path.clone(),
            size: file.size_bytes,
            url: file.url.clone(),
        }
    }
}

impl From<&StreamDescriptor> for StremioStream {
    fn from(stream: &StreamDescriptor) -> Self {
        Self {
            name: stream.name.clone(),
            title: stream.title.clone(),
            url: stream.url.clone(),
            behavior_hints: BehaviorHints {
                binge_group: stream.binge_group.clone(),
                filename: stream.file_name.clone(),
                video_size: stream.size_bytes,
            },
            file_list: stream
                .file_list
                .as_ref()
                .map(|files| files.iter().map(StremioFile::from).collect()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// `GET /stream/{type}/{id}.json`
pub async fn get_streams(
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, String)>,
) -> Response {
    respond(state, &kind, strip_json(&id)).await
}

/// `GET /stream/{type}/{id}/{extra}.json`
///
/// `extra` may carry `season:episode` for a bare series id; other extra
/// arguments are ignored.
pub async fn get_streams_with_extra(
    State(state): State<Arc<AppState>>,
    Path((kind, id, extra)): Path<(String, String, String)>,
) -> Response {
    let extra = strip_json(&extra);
    let id = if !id.contains(':') && is_season_episode(extra) {
        format!("{}:{}", id, extra)
    } else {
        id
    };
    respond(state, &kind, &id).await
}

async fn respond(state: Arc<AppState>, kind: &str, id: &str) -> Response {
    let ctx = match RequestContext::from_stremio(kind, id) {
        Ok(ctx) => ctx,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response();
        }
    };

    let span = info_span!(
        "stream_request",
        request_id = %Uuid::new_v4(),
        kind = %ctx.kind,
        id = %ctx.stremio_id(),
    );
    let service = state.service();
    let task_ctx = ctx.clone();
    let task = tokio::spawn(async move { service.streams_for(&task_ctx).await }.instrument(span));

    let streams = match task.await {
        Ok(streams) => streams,
        Err(e) => {
            error!(id = %ctx.stremio_id(), error = %e, "Stream task failed");
            Vec::new()
        }
    };

    Json(StreamsResponse {
        streams: streams.iter().map(StremioStream::from).collect(),
    })
    .into_response()
}

fn strip_json(segment: &str) -> &str {
    segment.strip_suffix(".json").unwrap_or(segment)
}

fn is_season_episode(extra: &str) -> bool {
    match extra.split_once(':') {
        Some((s, e)) => s.parse::<u32>().is_ok() && e.parse::<u32>().is_ok(),
        None => false,
    }
}
