// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Text rendering of the results panel and intelligence cards.

use crate::models::intelligence::EpisodeBrief;
use crate::models::search::{AiAnswer, RawResult, SearchOutcome};
use crate::services::orchestrator::SearchState;
use std::fmt::Write;

pub const WAKING_UP_MESSAGE: &str =
    "AI is waking up… the first search after a quiet period can take a few extra seconds.";
pub const MIN_LENGTH_HINT: &str = "Type at least 4 characters to search.";

/// The single thing the results panel shows for a given state
#[derive(Debug, Clone, PartialEq)]
pub enum ResultsView<'a> {
    Hint,
    Typing,
    Loading { waking_up: bool },
    Error(String),
    Answer(&'a AiAnswer),
    Results {
        results: &'a [RawResult],
        notice: &'a str,
    },
    Empty(&'a str),
}

impl<'a> ResultsView<'a> {
    pub fn from_state(state: &'a SearchState) -> Self {
        match state {
            SearchState::Idle => ResultsView::Hint,
            SearchState::Debouncing { .. } => ResultsView::Typing,
            SearchState::Fetching { waking_up, .. } => ResultsView::Loading {
                waking_up: *waking_up,
            },
            SearchState::Failed { error, .. } => ResultsView::Error(error.user_message()),
            SearchState::Success { outcome, .. } => match outcome {
                SearchOutcome::Answer(answer) => ResultsView::Answer(answer),
                SearchOutcome::Results { results, notice } => ResultsView::Results {
                    results,
                    notice,
                },
                SearchOutcome::Empty { notice } => ResultsView::Empty(notice),
            },
        }
    }
}

/// Render the results panel for a state
pub fn render_state(state: &SearchState) -> String {
    match ResultsView::from_state(state) {
        ResultsView::Hint => MIN_LENGTH_HINT.to_string(),
        ResultsView::Typing => "…".to_string(),
        ResultsView::Loading { waking_up: false } => "Searching…".to_string(),
        ResultsView::Loading { waking_up: true } => format!("Searching…\n{}", WAKING_UP_MESSAGE),
        ResultsView::Error(message) => format!("⚠ {}", message),
        ResultsView::Answer(answer) => render_answer(answer),
        ResultsView::Results { results, notice } => render_results(results, notice),
        ResultsView::Empty(notice) => notice.to_string(),
    }
}

pub fn render_answer(answer: &AiAnswer) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", answer.answer.trim());
    let _ = writeln!(out);
    let _ = writeln!(out, "Confidence: {}%", answer.confidence);

    if answer.sources.is_empty() {
        return out;
    }

    let _ = writeln!(out, "Sources:");
    let mut sources: Vec<_> = answer.sources.iter().enumerate().collect();
    sources.sort_by_key(|(_, source)| source.index);
    for (position, source) in sources {
        let _ = writeln!(
            out,
            "  [{}] {} - {} ({})  :play {}",
            source.index,
            source.podcast_name,
            source.episode_title,
            source.timestamp,
            position + 1
        );
    }
    out
}

fn render_results(results: &[RawResult], notice: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", notice);
    for (n, result) in results.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {} - {}",
            n + 1,
            result.podcast_name,
            result.episode_title
        );
        if let Some(excerpt) = &result.excerpt {
            let _ = writeln!(out, "     {}", excerpt.trim());
        }
    }
    out
}

/// Render intelligence cards, one block per episode
pub fn render_briefs(briefs: &[EpisodeBrief]) -> String {
    if briefs.is_empty() {
        return "No episodes with intelligence signals yet.".to_string();
    }

    let mut out = String::new();
    for brief in briefs {
        let _ = writeln!(out, "{} - {}", brief.podcast_name, brief.title);
        if let Some(published_at) = &brief.published_at {
            let _ = writeln!(out, "  published {}", published_at);
        }
        for (signal_type, count) in &brief.signal_counts {
            let _ = write!(out, "  {} ({})", signal_type.label(), count);
            if let Some(top) = brief.top_signals.get(signal_type) {
                let _ = write!(out, ": {}", top.content);
            }
            let _ = writeln!(out);
        }
        let _ = writeln!(out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::intelligence::{ApiEpisode, ApiSignal, SignalType};
    use crate::models::search::Source;
    use crate::services::search::{SearchError, NETWORK_ERROR_MESSAGE};
    use chrono::Utc;
    use uuid::Uuid;

    fn source(index: u32, podcast: &str) -> Source {
        Source {
            id: format!("ep-{index}-0"),
            index,
            episode_id: format!("ep-{index}"),
            episode_title: format!("Episode {index}"),
            podcast_name: podcast.to_string(),
            timestamp: "10:00".to_string(),
            start_seconds: 600.0,
            chunk_index: 0,
            relevance: 95,
        }
    }

    #[test]
    fn test_idle_shows_hint() {
        assert_eq!(render_state(&SearchState::Idle), MIN_LENGTH_HINT);
    }

    #[test]
    fn test_waking_up_notice() {
        let state = SearchState::Fetching {
            query: "AI agents".to_string(),
            request_id: 1,
            waking_up: true,
        };
        assert!(render_state(&state).contains("AI is waking up"));

        let state = SearchState::Fetching {
            query: "AI agents".to_string(),
            request_id: 1,
            waking_up: false,
        };
        assert!(!render_state(&state).contains("waking up"));
    }

    #[test]
    fn test_error_shows_only_user_message() {
        let state = SearchState::Failed {
            query: "AI agents".to_string(),
            error: SearchError::Network("TypeError: Failed to fetch".to_string()),
        };
        let rendered = render_state(&state);
        assert!(rendered.contains(NETWORK_ERROR_MESSAGE));
        assert!(!rendered.contains("TypeError"));
    }

    #[test]
    fn test_answer_sources_in_citation_order() {
        let answer = AiAnswer {
            id: Uuid::now_v7(),
            question: "AI agents".to_string(),
            answer: "Agents are everywhere [1][2].".to_string(),
            confidence: 72,
            sources: vec![source(2, "Acquired"), source(1, "All-In")],
            generated_at: Utc::now(),
        };
        let rendered = render_answer(&answer);

        assert!(rendered.contains("Confidence: 72%"));
        let first = rendered.find("[1] All-In").unwrap();
        let second = rendered.find("[2] Acquired").unwrap();
        assert!(first < second);
        // :play numbers follow the stored source order
        assert!(rendered.contains("[1] All-In - Episode 1 (10:00)  :play 2"));
    }

    #[test]
    fn test_results_fallback_lists_notice_and_hits() {
        let state = SearchState::Success {
            query: "AI agents".to_string(),
            outcome: SearchOutcome::Results {
                results: vec![RawResult {
                    podcast_name: "20VC".to_string(),
                    episode_title: "Agents".to_string(),
                    excerpt: Some(" agents everywhere ".to_string()),
                    ..Default::default()
                }],
                notice: "No synthesis".to_string(),
            },
        };
        let rendered = render_state(&state);
        assert!(rendered.starts_with("No synthesis"));
        assert!(rendered.contains("1. 20VC - Agents"));
        assert!(rendered.contains("agents everywhere"));
    }

    #[test]
    fn test_render_briefs() {
        let episode = ApiEpisode {
            episode_id: "e1".to_string(),
            title: "The Agent Economy".to_string(),
            podcast_name: "20VC".to_string(),
            signals: vec![ApiSignal {
                signal_type: SignalType::Investable,
                content: "Raising a seed round".to_string(),
                confidence: 0.9,
                timestamp: None,
            }],
            ..Default::default()
        };
        let rendered = render_briefs(&[EpisodeBrief::from_episode(&episode)]);
        assert!(rendered.contains("20VC - The Agent Economy"));
        assert!(rendered.contains("Investable Signals (1): Raising a seed round"));
    }

    #[test]
    fn test_render_no_briefs() {
        assert_eq!(render_briefs(&[]), "No episodes with intelligence signals yet.");
    }
}
