// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::intelligence::{DashboardResponse, EpisodeBrief};
use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Largest page the dashboard endpoint serves
pub const MAX_DASHBOARD_LIMIT: u32 = 50;

/// Client for the episode intelligence dashboard endpoint
pub struct IntelligenceClient {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl IntelligenceClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("podinsight-agent/", env!("PODINSIGHT_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/intelligence/dashboard", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    /// Fetch the latest episodes with their signals
    pub async fn dashboard(&self, limit: u32) -> Result<DashboardResponse> {
        let limit = limit.clamp(1, MAX_DASHBOARD_LIMIT);
        let url = format!("{}?limit={}", self.endpoint, limit);

        let response = tokio::time::timeout(self.timeout, self.client.get(&url).send())
            .await
            .map_err(|_| anyhow!("Dashboard request timed out"))?
            .context("Failed to reach the intelligence API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Intelligence API returned HTTP {}: {}", status, body));
        }

        let bytes = response.bytes().await?;
        let dashboard: DashboardResponse =
            serde_json::from_slice(&bytes).context("Invalid dashboard response")?;

        debug!(
            episodes = dashboard.episodes.len(),
            total = dashboard.total_episodes,
            "fetched intelligence dashboard"
        );

        Ok(dashboard)
    }

    /// Fetch the dashboard and condense every episode into a card summary
    pub async fn briefs(&self, limit: u32) -> Result<Vec<EpisodeBrief>> {
        let dashboard = self.dashboard(limit).await?;
        Ok(dashboard
            .episodes
            .iter()
            .map(EpisodeBrief::from_episode)
            .collect())
    }
}
