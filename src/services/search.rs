// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::search::{RawApiResponse, SearchApiResponse, SearchRequest};
use crate::services::cache::ResponseCache;
use crate::services::logging::redact_query;
use crate::services::transform::to_outcome;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const TOO_SLOW_MESSAGE: &str = "The search took too long to respond. Please try again.";
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network error. Please check your connection and try again.";
pub const UNAVAILABLE_MESSAGE: &str =
    "Search is temporarily unavailable. Please try again in a moment.";

/// Failure of a single search round trip
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search request timed out")]
    Timeout,
    #[error("search gateway timed out (HTTP 504)")]
    GatewayTimeout,
    #[error("network error: {0}")]
    Network(String),
    #[error("search API returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("all search methods failed")]
    AllMethodsFailed,
    #[error("invalid search response: {0}")]
    Decode(String),
    #[error("{0}")]
    Other(String),
}

impl SearchError {
    /// Classify a free-form error message, e.g. one relayed from another client
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();

        if lower.contains("failed to fetch") || lower.contains("error sending request") {
            SearchError::Network(message)
        } else if lower.contains("timed out") || lower.contains("timeout") {
            SearchError::Timeout
        } else if lower.contains("504") {
            SearchError::GatewayTimeout
        } else {
            SearchError::Other(message)
        }
    }

    /// Text shown in the results panel
    pub fn user_message(&self) -> String {
        match self {
            SearchError::Timeout | SearchError::GatewayTimeout => TOO_SLOW_MESSAGE.to_string(),
            SearchError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            SearchError::Upstream { .. } | SearchError::AllMethodsFailed => {
                UNAVAILABLE_MESSAGE.to_string()
            }
            SearchError::Decode(message) | SearchError::Other(message) => message.clone(),
        }
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_connect() || e.is_request() {
            SearchError::Network(e.to_string())
        } else if e.is_decode() {
            SearchError::Decode(e.to_string())
        } else {
            SearchError::Other(e.to_string())
        }
    }
}

/// Anything that can answer a search request
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<RawApiResponse, SearchError>;
}

/// HTTP client for the PodInsight search endpoint
pub struct SearchClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl SearchClient {
    /// Create a client for `{base_url}/api/search`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("podinsight-agent/", env!("PODINSIGHT_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/search", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &SearchRequest) -> Result<RawApiResponse, SearchError> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();

        if status == StatusCode::GATEWAY_TIMEOUT {
            return Err(SearchError::GatewayTimeout);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "search API returned an error");
            return Err(SearchError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| SearchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl SearchBackend for SearchClient {
    async fn search(&self, request: &SearchRequest) -> Result<RawApiResponse, SearchError> {
        // Dropping the send future aborts the request; the deadline does the same
        let raw = tokio::time::timeout(self.timeout, self.send(request))
            .await
            .map_err(|_| SearchError::Timeout)??;

        debug!(
            processing_time_ms = ?raw.processing_time_ms,
            search_method = ?raw.search_method,
            "search API responded"
        );

        Ok(raw)
    }
}

/// One search outside the debounced pipeline: cache first, then the backend.
/// Only successful, non-sentinel responses are cached.
pub async fn cached_search(
    backend: &dyn SearchBackend,
    cache: &ResponseCache,
    request: &SearchRequest,
) -> Result<SearchApiResponse, SearchError> {
    let query = request.query.trim();

    if let Some(raw) = cache.get(query, request.limit, request.offset) {
        debug!(query = %redact_query(query), "search cache hit");
        return Ok(SearchApiResponse {
            cached: true,
            outcome: to_outcome(&raw, query),
            response: raw,
        });
    }

    let request = SearchRequest {
        query: query.to_string(),
        ..request.clone()
    };
    let raw = backend.search(&request).await?;
    if raw.all_methods_failed() {
        warn!(query = %redact_query(query), "search backend reported all methods failed");
        return Err(SearchError::AllMethodsFailed);
    }

    cache.set(query, request.limit, request.offset, raw.clone());
    Ok(SearchApiResponse {
        cached: false,
        outcome: to_outcome(&raw, query),
        response: raw,
    })
}
