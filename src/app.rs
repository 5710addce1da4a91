// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Application state, route handlers, and router construction.
//!
//! This module is `pub` so that integration tests can build a test router directly
//! without starting the full binary.

use crate::models::error::ErrorResponse;
use crate::models::intelligence::DashboardResponse;
use crate::models::search::{SearchApiResponse, SearchRequest};
use crate::models::settings::Settings;
use crate::models::version::VersionResponse;
use crate::routes::{audio_router, AudioApiDoc, AudioState};
use crate::services::audio::AudioClipClient;
use crate::services::cache::ResponseCache;
use crate::services::intelligence::IntelligenceClient;
use crate::services::logging::redact_query;
use crate::services::search::{cached_search, SearchBackend, SearchClient, SearchError};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application version extracted from `Cargo.toml` at compile time.
/// The patch segment can be overridden via `PODINSIGHT_PATCH_VERSION` (see `build.rs`).
pub const VERSION: &str = env!("PODINSIGHT_VERSION");

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared application state injected into every route handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub search_backend: Arc<dyn SearchBackend>,
    /// Shared with every search served by this process
    pub cache: Arc<ResponseCache>,
    pub intelligence_client: Arc<IntelligenceClient>,
    pub audio_state: AudioState,
}

impl AppState {
    /// Build the state with real upstream clients
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let search_client = SearchClient::new(&settings.api_base_url, settings.search_timeout)?;
        let intelligence_client =
            IntelligenceClient::new(&settings.api_base_url, settings.search_timeout)?;
        let audio_client = AudioClipClient::new(&settings.api_base_url, settings.audio_timeout)?;
        let cache = ResponseCache::new(settings.cache_ttl, settings.cache_max_entries);

        Ok(Self {
            settings: Arc::new(settings),
            search_backend: Arc::new(search_client),
            cache: Arc::new(cache),
            intelligence_client: Arc::new(intelligence_client),
            audio_state: AudioState::new(audio_client),
        })
    }
}

type Rejection = (StatusCode, Json<ErrorResponse>);

fn search_rejection(error: &SearchError) -> Rejection {
    let status = match error {
        SearchError::Timeout | SearchError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
        SearchError::AllMethodsFailed => StatusCode::SERVICE_UNAVAILABLE,
        SearchError::Network(_) | SearchError::Upstream { .. } | SearchError::Decode(_) => {
            StatusCode::BAD_GATEWAY
        }
        SearchError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorResponse::new(error.user_message())))
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

pub async fn version_handler(State(state): State<AppState>) -> Json<VersionResponse> {
    Json(VersionResponse {
        agent: "podinsight-agent".to_string(),
        version: VERSION.to_string(),
        api_base_url: state.settings.api_base_url.clone(),
    })
}

pub async fn search_handler(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchApiResponse>, Rejection> {
    let query_len = payload.query.trim().chars().count();
    if query_len < state.settings.min_query_len {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!(
                "Query must be at least {} characters",
                state.settings.min_query_len
            ))),
        ));
    }

    let response = cached_search(state.search_backend.as_ref(), &state.cache, &payload)
        .await
        .map_err(|e| {
            warn!(query = %redact_query(payload.query.trim()), error = %e, "search request failed");
            search_rejection(&e)
        })?;

    info!(
        query = %redact_query(payload.query.trim()),
        cached = response.cached,
        "search served"
    );

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    #[serde(default = "default_dashboard_limit")]
    pub limit: u32,
}

fn default_dashboard_limit() -> u32 {
    8
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse>, Rejection> {
    state
        .intelligence_client
        .dashboard(params.limit)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(error = %e, "dashboard request failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse::new(format!("Intelligence error: {e}"))),
            )
        })
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the Axum application router.
///
/// Audio routes are nested under `/api/v1` with their own state; their OpenAPI
/// document is served by Swagger UI.
pub fn create_router(state: AppState) -> Router {
    let audio_routes = audio_router().with_state(state.audio_state.clone());

    Router::new()
        .route("/version", get(version_handler))
        .route("/api/search", post(search_handler))
        .route("/api/intelligence/dashboard", get(dashboard_handler))
        .with_state(state)
        .nest("/api/v1", audio_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", AudioApiDoc::openapi()))
}
