// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Per-source audio state with a single shared player.

use crate::models::audio::{AudioPlaybackState, DEFAULT_CLIP_DURATION_MS};
use crate::models::search::Source;
use crate::services::audio::AudioClipClient;
use std::collections::HashMap;
use tracing::{debug, warn};

/// What the shared player has to do after [`AudioPlayback::play`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayCommand {
    /// Source that was playing and must be stopped first
    pub stop: Option<String>,
    pub source_id: String,
    pub url: String,
}

/// Tracks clip URLs per source and which single source is playing
#[derive(Debug, Default)]
pub struct AudioPlayback {
    states: HashMap<String, AudioPlaybackState>,
    playing: Option<String>,
}

impl AudioPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, source_id: &str) -> Option<&AudioPlaybackState> {
        self.states.get(source_id)
    }

    pub fn playing(&self) -> Option<&str> {
        self.playing.as_deref()
    }

    /// Mark a source as loading. Returns `false` when a fetch is already
    /// running or a URL is already known, so callers do not fetch twice.
    pub fn begin_load(&mut self, source_id: &str) -> bool {
        let state = self.states.entry(source_id.to_string()).or_default();
        if state.is_loading || state.url.is_some() {
            return false;
        }

        state.is_loading = true;
        state.error = None;
        true
    }

    pub fn loaded(&mut self, source_id: &str, url: String) {
        let state = self.states.entry(source_id.to_string()).or_default();
        state.is_loading = false;
        state.url = Some(url);
        state.error = None;
    }

    /// Record a failed fetch; the next [`begin_load`](Self::begin_load) retries
    pub fn failed(&mut self, source_id: &str, error: String) {
        let state = self.states.entry(source_id.to_string()).or_default();
        state.is_loading = false;
        state.url = None;
        state.error = Some(error);
    }

    /// Switch the shared player to `source_id`. `None` if its URL is not loaded yet.
    pub fn play(&mut self, source_id: &str) -> Option<PlayCommand> {
        let url = self.states.get(source_id)?.url.clone()?;
        let stop = self
            .playing
            .replace(source_id.to_string())
            .filter(|previous| previous != source_id);

        Some(PlayCommand {
            stop,
            source_id: source_id.to_string(),
            url,
        })
    }

    /// Stop whatever is playing, returning its source id
    pub fn stop(&mut self) -> Option<String> {
        self.playing.take()
    }

    /// Resolve the clip URL for `source` without touching the player.
    /// A no-op when the URL is already known or a fetch is running.
    pub async fn prefetch(
        &mut self,
        client: &AudioClipClient,
        source: &Source,
    ) -> Result<(), String> {
        if !self.begin_load(&source.id) {
            return Ok(());
        }

        debug!(source_id = %source.id, "fetching audio clip");
        match client
            .fetch_clip(
                &source.episode_id,
                source.start_time_ms(),
                DEFAULT_CLIP_DURATION_MS,
            )
            .await
        {
            Ok(clip) => {
                self.loaded(&source.id, clip.clip_url);
                Ok(())
            }
            Err(e) => {
                warn!(source_id = %source.id, error = %e, "audio clip fetch failed");
                let message = e.user_message();
                self.failed(&source.id, message.clone());
                Err(message)
            }
        }
    }

    /// Fetch the clip for `source` if needed, then switch playback to it
    pub async fn load_and_play(
        &mut self,
        client: &AudioClipClient,
        source: &Source,
    ) -> Result<PlayCommand, String> {
        self.prefetch(client, source).await?;
        self.play(&source.id)
            .ok_or_else(|| "Audio is still loading.".to_string())
    }
}
