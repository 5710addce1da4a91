// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// `search_method` value the API uses when every retrieval strategy failed.
/// The HTTP status is usually 200 when this comes back.
pub const ALL_METHODS_FAILED: &str = "none_all_failed";

/// Result count requested from the search API by default
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Request body for `POST /api/search`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text question typed by the user
    pub query: String,
    /// Maximum number of results (default: 10)
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Pagination offset; only part of the cache key, never sent when zero
    #[serde(default, skip_serializing_if = "is_zero")]
    pub offset: u32,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, limit: u32) -> Self {
        Self {
            query: query.into(),
            limit,
            offset: 0,
        }
    }
}

fn default_limit() -> u32 {
    DEFAULT_SEARCH_LIMIT
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

/// Upstream sends explicit `null` for fields it has no value for
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A reference from a synthesized answer back to an episode chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Citation {
    /// Display position inside the answer text (`[1]`, `[2]`, ...)
    #[serde(deserialize_with = "null_as_default")]
    pub index: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub episode_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub episode_title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub podcast_name: String,
    /// Human readable offset, e.g. "12:34"
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(deserialize_with = "null_as_default")]
    pub start_seconds: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub chunk_index: u32,
}

/// Synthesized answer as returned by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAnswer {
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub citations: Vec<Citation>,
}

/// Raw search hit returned alongside (or instead of) a synthesized answer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawResult {
    #[serde(deserialize_with = "null_as_default")]
    pub episode_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub podcast_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub episode_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// Fields this client does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response body of `POST /api/search`.
///
/// The shape is untrusted: every field is optional and only the transformer
/// interprets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawApiResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<RawAnswer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<RawResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_results: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_method: Option<String>,
}

impl RawApiResponse {
    /// Whether the backend reported that all search methods failed
    pub fn all_methods_failed(&self) -> bool {
        self.search_method.as_deref() == Some(ALL_METHODS_FAILED)
    }
}

/// Source cited by an [`AiAnswer`], derived from a [`Citation`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// `{episode_id}-{chunk_index}`
    pub id: String,
    pub index: u32,
    pub episode_id: String,
    pub episode_title: String,
    pub podcast_name: String,
    pub timestamp: String,
    pub start_seconds: f64,
    pub chunk_index: u32,
    /// Fixed display relevance; the API does not score citations
    pub relevance: u8,
}

impl Source {
    /// Clip offset for the audio endpoint
    pub fn start_time_ms(&self) -> i64 {
        (self.start_seconds.max(0.0) * 1000.0).round() as i64
    }
}

/// Normalized AI answer shown in the results panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiAnswer {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    /// 0..=99
    pub confidence: u8,
    pub sources: Vec<Source>,
    pub generated_at: DateTime<Utc>,
}

/// What a successful search produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// A synthesized answer with citations
    Answer(AiAnswer),
    /// Raw hits without synthesis
    Results {
        results: Vec<RawResult>,
        notice: String,
    },
    /// Nothing matched
    Empty { notice: String },
}

/// Body of `POST /api/search` on the local facade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchApiResponse {
    /// Served from the response cache
    pub cached: bool,
    pub outcome: SearchOutcome,
    /// Upstream payload the outcome was built from
    pub response: RawApiResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_omits_zero_offset() {
        let request = SearchRequest::new("AI agents", 10);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body, serde_json::json!({"query": "AI agents", "limit": 10}));
    }

    #[test]
    fn test_request_default_limit() {
        let request: SearchRequest = serde_json::from_str(r#"{"query":"venture debt"}"#).unwrap();
        assert_eq!(request.limit, DEFAULT_SEARCH_LIMIT);
        assert_eq!(request.offset, 0);
    }

    #[test]
    fn test_raw_response_tolerates_missing_fields() {
        let raw: RawApiResponse = serde_json::from_str(
            r#"{"answer":{"text":"Agents are hot","citations":[{"index":1,"episode_id":"abc"}]}}"#,
        )
        .unwrap();

        let answer = raw.answer.unwrap();
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].episode_id, "abc");
        assert_eq!(answer.citations[0].podcast_name, "");
        assert!(raw.results.is_none());
    }

    #[test]
    fn test_null_citation_fields_fall_back_to_defaults() {
        let raw: RawApiResponse = serde_json::from_str(
            r#"{"answer":{"text":"Agents [1]","citations":[{"index":1,"episode_id":"abc","podcast_name":null,"episode_title":null,"timestamp":null,"start_seconds":null,"chunk_index":null}]}}"#,
        )
        .unwrap();

        let citation = &raw.answer.unwrap().citations[0];
        assert_eq!(citation.episode_id, "abc");
        assert_eq!(citation.podcast_name, "");
        assert_eq!(citation.timestamp, "");
        assert_eq!(citation.start_seconds, 0.0);
        assert_eq!(citation.chunk_index, 0);
    }

    #[test]
    fn test_null_answer_text_and_citations() {
        let raw: RawApiResponse =
            serde_json::from_str(r#"{"answer":{"text":null,"citations":null}}"#).unwrap();
        let answer = raw.answer.unwrap();
        assert_eq!(answer.text, "");
        assert!(answer.citations.is_empty());
    }

    #[test]
    fn test_null_result_fields_fall_back_to_defaults() {
        let raw: RawApiResponse = serde_json::from_str(
            r#"{"results":[{"episode_id":"e1","podcast_name":"20VC","episode_title":null,"excerpt":null}]}"#,
        )
        .unwrap();

        let result = &raw.results.unwrap()[0];
        assert_eq!(result.episode_id, "e1");
        assert_eq!(result.episode_title, "");
        assert!(result.excerpt.is_none());
        assert!(result.extra.is_empty());
    }

    #[test]
    fn test_all_methods_failed_sentinel() {
        let raw = RawApiResponse {
            search_method: Some("none_all_failed".to_string()),
            ..Default::default()
        };
        assert!(raw.all_methods_failed());

        let raw = RawApiResponse {
            search_method: Some("vector_768d".to_string()),
            ..Default::default()
        };
        assert!(!raw.all_methods_failed());
    }

    #[test]
    fn test_raw_result_keeps_unknown_fields() {
        let result: RawResult = serde_json::from_str(
            r#"{"episode_id":"e1","podcast_name":"All-In","episode_title":"E100","topics":["AI"]}"#,
        )
        .unwrap();
        assert_eq!(result.extra["topics"], serde_json::json!(["AI"]));
    }

    #[test]
    fn test_outcome_is_tagged_by_kind() {
        let outcome = SearchOutcome::Empty {
            notice: "nothing".to_string(),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["kind"], "empty");
    }

    #[test]
    fn test_source_start_time_ms() {
        let source = Source {
            id: "e1-3".to_string(),
            index: 1,
            episode_id: "e1".to_string(),
            episode_title: String::new(),
            podcast_name: String::new(),
            timestamp: "01:05".to_string(),
            start_seconds: 65.5,
            chunk_index: 3,
            relevance: 95,
        };
        assert_eq!(source.start_time_ms(), 65_500);
    }
}
