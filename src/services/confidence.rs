// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use crate::models::search::Citation;
use std::collections::HashSet;

/// Score returned when an answer cites nothing
pub const NO_CITATION_CONFIDENCE: u8 = 30;
const BASE_CONFIDENCE: usize = 50;
// Full certainty is never claimed
const MAX_CONFIDENCE: usize = 99;

/// Map citation count and episode diversity to a 0..=99 confidence score
pub fn calculate_confidence(citations: &[Citation]) -> u8 {
    if citations.is_empty() {
        return NO_CITATION_CONFIDENCE;
    }

    let unique_episodes = citations
        .iter()
        .map(|c| c.episode_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let citation_bonus = (citations.len() * 5).min(25);
    let diversity_bonus = ((unique_episodes - 1) * 12).min(24);

    (BASE_CONFIDENCE + citation_bonus + diversity_bonus).min(MAX_CONFIDENCE) as u8
}
