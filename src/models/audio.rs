// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::{IntoParams, ToSchema};

/// Clip length used when the caller does not pass `duration_ms`
pub const DEFAULT_CLIP_DURATION_MS: i64 = 30_000;

static GUID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("static regex")
});
static OBJECT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("static regex"));
static SUBSTACK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^substack:post:[0-9]+$").expect("static regex"));
static FLIGHTCAST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^flightcast:episode:[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    )
    .expect("static regex")
});

/// Episode identifier shapes accepted by the audio clip endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeIdFormat {
    /// `8-4-4-4-12` hex GUID
    Guid,
    /// 24 hex characters
    ObjectId,
    /// `substack:post:<digits>`
    SubstackPost,
    /// `flightcast:episode:<GUID>`
    FlightcastEpisode,
}

impl EpisodeIdFormat {
    pub const ALL: [EpisodeIdFormat; 4] = [
        EpisodeIdFormat::Guid,
        EpisodeIdFormat::ObjectId,
        EpisodeIdFormat::SubstackPost,
        EpisodeIdFormat::FlightcastEpisode,
    ];

    /// Detect which accepted shape an episode id has, if any
    pub fn detect(episode_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.matches(episode_id))
    }

    fn matches(&self, episode_id: &str) -> bool {
        match self {
            EpisodeIdFormat::Guid => GUID_RE.is_match(episode_id),
            EpisodeIdFormat::ObjectId => OBJECT_ID_RE.is_match(episode_id),
            EpisodeIdFormat::SubstackPost => SUBSTACK_RE.is_match(episode_id),
            EpisodeIdFormat::FlightcastEpisode => FLIGHTCAST_RE.is_match(episode_id),
        }
    }

    /// Human readable description used in 400 responses
    pub fn description(&self) -> &'static str {
        match self {
            EpisodeIdFormat::Guid => "GUID (e.g. 0e983347-7815-4b42-b1c6-f2d3e1a1d7e5)",
            EpisodeIdFormat::ObjectId => "ObjectId (24 hex characters, e.g. 1216c2e7b2d7c4a9e8f0a1b2)",
            EpisodeIdFormat::SubstackPost => "Substack post (substack:post:<digits>)",
            EpisodeIdFormat::FlightcastEpisode => "Flightcast episode (flightcast:episode:<GUID>)",
        }
    }

    /// Descriptions of every accepted format, in a stable order
    pub fn accepted_formats() -> Vec<String> {
        Self::ALL
            .iter()
            .map(|format| format.description().to_string())
            .collect()
    }
}

/// Query string of `GET /api/v1/audio_clips/{episode_id}`
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AudioClipQuery {
    /// Clip start offset in milliseconds (required)
    pub start_time_ms: Option<i64>,
    /// Clip length in milliseconds (default: 30000)
    #[serde(default = "default_duration_ms")]
    pub duration_ms: i64,
}

fn default_duration_ms() -> i64 {
    DEFAULT_CLIP_DURATION_MS
}

/// Successful audio clip lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AudioClipResponse {
    /// Pre-signed URL of the generated clip
    pub clip_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    /// Whether the clip already existed upstream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_hit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_time_ms: Option<f64>,
}

/// Transient per-source playback state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioPlaybackState {
    pub is_loading: bool,
    pub url: Option<String>,
    pub error: Option<String>,
}
