// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Audio clip route handlers.

use crate::models::audio::{AudioClipQuery, AudioClipResponse, EpisodeIdFormat};
use crate::models::error::ErrorResponse;
use crate::services::audio::{validate_episode_id, AudioClipClient, AudioClipError};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

/// State for audio routes.
#[derive(Clone)]
pub struct AudioState {
    pub client: Arc<AudioClipClient>,
}

impl AudioState {
    pub fn new(client: AudioClipClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(audio_clip_handler),
    components(schemas(AudioClipResponse, ErrorResponse))
)]
pub struct AudioApiDoc;

/// Create audio router, mounted under `/api/v1`.
pub fn audio_router() -> Router<AudioState> {
    Router::new().route("/audio_clips/{episode_id}", get(audio_clip_handler))
}

type Rejection = (StatusCode, Json<ErrorResponse>);

fn rejection(error: AudioClipError) -> Rejection {
    let status = error.status_code();
    let body = match &error {
        AudioClipError::InvalidEpisodeId(_) => ErrorResponse {
            error: error.to_string(),
            accepted_formats: Some(EpisodeIdFormat::accepted_formats()),
        },
        AudioClipError::InvalidRange(_) => ErrorResponse::new(error.to_string()),
        _ => ErrorResponse::new(error.user_message()),
    };
    (status, Json(body))
}

/// GET /api/v1/audio_clips/{episode_id} - Resolve a playable clip URL.
#[utoipa::path(
    get,
    path = "/api/v1/audio_clips/{episode_id}",
    params(
        ("episode_id" = String, Path, description = "GUID, ObjectId, substack:post:<n> or flightcast:episode:<GUID>"),
        AudioClipQuery
    ),
    responses(
        (status = 200, description = "Clip is ready", body = AudioClipResponse),
        (status = 400, description = "Malformed episode id or range", body = ErrorResponse),
        (status = 504, description = "Clip generation timed out", body = ErrorResponse)
    ),
    tag = "audio"
)]
async fn audio_clip_handler(
    State(state): State<AudioState>,
    Path(episode_id): Path<String>,
    Query(query): Query<AudioClipQuery>,
) -> Result<Json<AudioClipResponse>, Rejection> {
    let format = validate_episode_id(&episode_id).map_err(rejection)?;

    let start_time_ms = query.start_time_ms.ok_or_else(|| {
        rejection(AudioClipError::InvalidRange(
            "start_time_ms is required".to_string(),
        ))
    })?;

    let clip = state
        .client
        .fetch_clip(&episode_id, start_time_ms, query.duration_ms)
        .await
        .map_err(rejection)?;

    info!(
        episode_id = %episode_id,
        format = ?format,
        start_time_ms,
        cache_hit = ?clip.cache_hit,
        "audio clip resolved"
    );

    Ok(Json(clip))
}
