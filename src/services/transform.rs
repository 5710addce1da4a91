// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Turns raw search API payloads into the answer shapes the UI renders.

use crate::models::search::{AiAnswer, RawApiResponse, SearchOutcome, Source};
use crate::services::confidence::calculate_confidence;
use chrono::Utc;
use uuid::Uuid;

/// Display relevance given to every cited source
pub const SOURCE_RELEVANCE: u8 = 95;

pub const RESULTS_WITHOUT_SYNTHESIS_NOTICE: &str =
    "AI synthesis is unavailable for this question. Showing the most relevant episode excerpts instead.";
pub const NO_RESULTS_NOTICE: &str =
    "No results found. Try rephrasing your question or using different keywords.";

/// Build an [`AiAnswer`] from the response, or `None` when the API did not synthesize one
pub fn transform(raw: &RawApiResponse, question: &str) -> Option<AiAnswer> {
    let answer = raw.answer.as_ref()?;

    let sources = answer
        .citations
        .iter()
        .map(|citation| Source {
            id: format!("{}-{}", citation.episode_id, citation.chunk_index),
            index: citation.index,
            episode_id: citation.episode_id.clone(),
            episode_title: citation.episode_title.clone(),
            podcast_name: citation.podcast_name.clone(),
            timestamp: citation.timestamp.clone(),
            start_seconds: citation.start_seconds,
            chunk_index: citation.chunk_index,
            relevance: SOURCE_RELEVANCE,
        })
        .collect();

    Some(AiAnswer {
        id: Uuid::now_v7(),
        question: question.to_string(),
        answer: answer.text.clone(),
        confidence: calculate_confidence(&answer.citations),
        sources,
        generated_at: Utc::now(),
    })
}

/// Classify a successful response into answer, bare results, or nothing
pub fn to_outcome(raw: &RawApiResponse, question: &str) -> SearchOutcome {
    if let Some(answer) = transform(raw, question) {
        return SearchOutcome::Answer(answer);
    }

    match &raw.results {
        Some(results) if !results.is_empty() => SearchOutcome::Results {
            results: results.clone(),
            notice: RESULTS_WITHOUT_SYNTHESIS_NOTICE.to_string(),
        },
        _ => SearchOutcome::Empty {
            notice: NO_RESULTS_NOTICE.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::search::{Citation, RawAnswer, RawResult};

    fn citation(index: u32, episode_id: &str, chunk_index: u32) -> Citation {
        Citation {
            index,
            episode_id: episode_id.to_string(),
            episode_title: format!("Episode {episode_id}"),
            podcast_name: "The Twenty Minute VC".to_string(),
            timestamp: "05:00".to_string(),
            start_seconds: 300.0,
            chunk_index,
        }
    }

    fn answer_response(citations: Vec<Citation>) -> RawApiResponse {
        RawApiResponse {
            answer: Some(RawAnswer {
                text: "Agents are eating SaaS [1][2].".to_string(),
                citations,
            }),
            search_method: Some("vector_768d".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_transform_without_answer_is_none() {
        let raw = RawApiResponse {
            results: Some(vec![RawResult::default()]),
            ..Default::default()
        };
        assert!(transform(&raw, "AI agents").is_none());
    }

    #[test]
    fn test_transform_maps_citations_in_order() {
        let raw = answer_response(vec![citation(1, "ep-b", 4), citation(2, "ep-a", 7)]);
        let answer = transform(&raw, "AI agents").unwrap();

        assert_eq!(answer.question, "AI agents");
        assert_eq!(answer.answer, "Agents are eating SaaS [1][2].");
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].id, "ep-b-4");
        assert_eq!(answer.sources[1].id, "ep-a-7");
        assert!(answer.sources.iter().all(|s| s.relevance == 95));
    }

    #[test]
    fn test_transform_same_episode_confidence() {
        let raw = answer_response(vec![citation(1, "ep-1", 1), citation(2, "ep-1", 2)]);
        assert_eq!(transform(&raw, "AI agents").unwrap().confidence, 60);
    }

    #[test]
    fn test_each_transform_gets_fresh_id() {
        let raw = answer_response(vec![citation(1, "ep-1", 1)]);
        let first = transform(&raw, "AI agents").unwrap();
        let second = transform(&raw, "AI agents").unwrap();
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_outcome_prefers_answer() {
        let mut raw = answer_response(vec![]);
        raw.results = Some(vec![RawResult::default()]);
        match to_outcome(&raw, "AI agents") {
            SearchOutcome::Answer(answer) => assert_eq!(answer.confidence, 30),
            other => panic!("expected answer, got {other:?}"),
        }
    }

    #[test]
    fn test_outcome_falls_back_to_results() {
        let raw = RawApiResponse {
            results: Some(vec![RawResult {
                episode_id: "ep-1".to_string(),
                ..Default::default()
            }]),
            ..Default::default()
        };
        match to_outcome(&raw, "AI agents") {
            SearchOutcome::Results { results, notice } => {
                assert_eq!(results.len(), 1);
                assert_eq!(notice, RESULTS_WITHOUT_SYNTHESIS_NOTICE);
            }
            other => panic!("expected results, got {other:?}"),
        }
    }

    #[test]
    fn test_outcome_empty() {
        let raw = RawApiResponse {
            results: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(
            to_outcome(&raw, "AI agents"),
            SearchOutcome::Empty {
                notice: NO_RESULTS_NOTICE.to_string()
            }
        );
    }
}
