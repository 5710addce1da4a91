// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::audio::{AudioClipResponse, EpisodeIdFormat};
use anyhow::{Context, Result};
use axum::http::StatusCode;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const AUDIO_TIMEOUT_MESSAGE: &str =
    "Audio generation timed out. The clip may still be processing, please try again.";

/// Failure of an audio clip lookup
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioClipError {
    #[error("Invalid episode_id format: {0}")]
    InvalidEpisodeId(String),
    #[error("{0}")]
    InvalidRange(String),
    #[error("audio clip request timed out")]
    Timeout,
    #[error("audio API returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid audio clip response: {0}")]
    Decode(String),
}

impl AudioClipError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AudioClipError::InvalidEpisodeId(_) | AudioClipError::InvalidRange(_) => {
                StatusCode::BAD_REQUEST
            }
            AudioClipError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AudioClipError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AudioClipError::Network(_) | AudioClipError::Decode(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Text suitable for the results panel
    pub fn user_message(&self) -> String {
        match self {
            AudioClipError::Timeout => AUDIO_TIMEOUT_MESSAGE.to_string(),
            AudioClipError::Network(_) => {
                "Network error while loading audio. Please try again.".to_string()
            }
            AudioClipError::Upstream { .. } | AudioClipError::Decode(_) => {
                "Audio is temporarily unavailable.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for AudioClipError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            AudioClipError::Timeout
        } else if e.is_decode() {
            AudioClipError::Decode(e.to_string())
        } else {
            AudioClipError::Network(e.to_string())
        }
    }
}

/// Check an episode id before any request is made
pub fn validate_episode_id(episode_id: &str) -> Result<EpisodeIdFormat, AudioClipError> {
    EpisodeIdFormat::detect(episode_id)
        .ok_or_else(|| AudioClipError::InvalidEpisodeId(episode_id.to_string()))
}

/// Client for `GET /api/v1/audio_clips/{episode_id}`
pub struct AudioClipClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl AudioClipClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .with_context(|| format!("Invalid audio API base URL: {}", base_url))?;
        let client = Client::builder()
            .user_agent(concat!("podinsight-agent/", env!("PODINSIGHT_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Full upstream URL for a clip
    pub fn clip_url(
        &self,
        episode_id: &str,
        start_time_ms: i64,
        duration_ms: i64,
    ) -> Result<Url, AudioClipError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AudioClipError::Network("audio API base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["api", "v1", "audio_clips", episode_id]);
        url.query_pairs_mut()
            .append_pair("start_time_ms", &start_time_ms.to_string())
            .append_pair("duration_ms", &duration_ms.to_string());
        Ok(url)
    }

    /// Resolve a playable clip URL. Aborted with [`AudioClipError::Timeout`] after the deadline.
    pub async fn fetch_clip(
        &self,
        episode_id: &str,
        start_time_ms: i64,
        duration_ms: i64,
    ) -> Result<AudioClipResponse, AudioClipError> {
        validate_episode_id(episode_id)?;

        if start_time_ms < 0 {
            return Err(AudioClipError::InvalidRange(
                "start_time_ms must not be negative".to_string(),
            ));
        }
        if duration_ms <= 0 {
            return Err(AudioClipError::InvalidRange(
                "duration_ms must be positive".to_string(),
            ));
        }

        let url = self.clip_url(episode_id, start_time_ms, duration_ms)?;
        debug!(%url, "requesting audio clip");

        tokio::time::timeout(self.timeout, self.send(url))
            .await
            .map_err(|_| {
                warn!(episode_id, start_time_ms, "audio clip request timed out");
                AudioClipError::Timeout
            })?
    }

    async fn send(&self, url: Url) -> Result<AudioClipResponse, AudioClipError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %body, "audio API returned an error");
            return Err(AudioClipError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| AudioClipError::Decode(e.to_string()))
    }
}
