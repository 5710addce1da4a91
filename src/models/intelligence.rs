// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classification the backend assigns to a transcript extract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Investable,
    Competitive,
    Portfolio,
    SoundBite,
    /// Anything newer than this client
    #[serde(other)]
    Unknown,
}

impl SignalType {
    /// Card heading for the signal group
    pub fn label(&self) -> &'static str {
        match self {
            SignalType::Investable => "Investable Signals",
            SignalType::Competitive => "Competitive Intel",
            SignalType::Portfolio => "Portfolio Mentions",
            SignalType::SoundBite => "Sound Bites",
            SignalType::Unknown => "Other Signals",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSignal {
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub content: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEpisode {
    pub episode_id: String,
    pub title: String,
    pub podcast_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
    pub signals: Vec<ApiSignal>,
}

/// Response of `GET /api/intelligence/dashboard`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardResponse {
    pub episodes: Vec<ApiEpisode>,
    pub total_episodes: u64,
    pub generated_at: String,
}

/// Card-sized summary of one episode's signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeBrief {
    pub episode_id: String,
    pub title: String,
    pub podcast_name: String,
    pub published_at: Option<String>,
    /// Number of signals per type
    pub signal_counts: BTreeMap<SignalType, usize>,
    /// Highest-confidence signal per type
    pub top_signals: BTreeMap<SignalType, ApiSignal>,
}

impl EpisodeBrief {
    pub fn from_episode(episode: &ApiEpisode) -> Self {
        let mut signal_counts = BTreeMap::new();
        let mut top_signals: BTreeMap<SignalType, ApiSignal> = BTreeMap::new();

        for signal in &episode.signals {
            *signal_counts.entry(signal.signal_type).or_insert(0) += 1;

            let replace = top_signals
                .get(&signal.signal_type)
                .map_or(true, |current| signal.confidence > current.confidence);
            if replace {
                top_signals.insert(signal.signal_type, signal.clone());
            }
        }

        Self {
            episode_id: episode.episode_id.clone(),
            title: episode.title.clone(),
            podcast_name: episode.podcast_name.clone(),
            published_at: episode.published_at.clone(),
            signal_counts,
            top_signals,
        }
    }

    pub fn total_signals(&self) -> usize {
        self.signal_counts.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(signal_type: SignalType, content: &str, confidence: f64) -> ApiSignal {
        ApiSignal {
            signal_type,
            content: content.to_string(),
            confidence,
            timestamp: None,
        }
    }

    #[test]
    fn test_signal_type_wire_names() {
        let parsed: Vec<SignalType> = serde_json::from_str(
            r#"["investable","competitive","portfolio","sound_bite","hype"]"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            vec![
                SignalType::Investable,
                SignalType::Competitive,
                SignalType::Portfolio,
                SignalType::SoundBite,
                SignalType::Unknown,
            ]
        );
    }

    #[test]
    fn test_dashboard_parses_api_payload() {
        let body = r#"{
            "episodes": [{
                "episode_id": "1216c2e7b2d7c4a9e8f0a1b2",
                "title": "The Agent Economy",
                "podcast_name": "20VC",
                "published_at": "2025-06-20T00:00:00Z",
                "signals": [
                    {"type": "investable", "content": "Series A for agent infra", "confidence": 0.8, "timestamp": "12:01"}
                ]
            }],
            "total_episodes": 1,
            "generated_at": "2025-06-21T10:00:00Z"
        }"#;
        let dashboard: DashboardResponse = serde_json::from_str(body).unwrap();
        assert_eq!(dashboard.total_episodes, 1);
        assert_eq!(dashboard.episodes[0].signals[0].signal_type, SignalType::Investable);
    }

    #[test]
    fn test_brief_counts_and_picks_top_signal() {
        let episode = ApiEpisode {
            episode_id: "e1".to_string(),
            title: "Episode".to_string(),
            podcast_name: "Acquired".to_string(),
            signals: vec![
                signal(SignalType::Investable, "low", 0.4),
                signal(SignalType::Investable, "high", 0.9),
                signal(SignalType::Portfolio, "mention", 0.7),
            ],
            ..Default::default()
        };

        let brief = EpisodeBrief::from_episode(&episode);
        assert_eq!(brief.total_signals(), 3);
        assert_eq!(brief.signal_counts[&SignalType::Investable], 2);
        assert_eq!(brief.top_signals[&SignalType::Investable].content, "high");
        assert!(!brief.signal_counts.contains_key(&SignalType::Competitive));
    }

    #[test]
    fn test_brief_of_episode_without_signals() {
        let brief = EpisodeBrief::from_episode(&ApiEpisode::default());
        assert_eq!(brief.total_signals(), 0);
        assert!(brief.top_signals.is_empty());
    }
}
