// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Tracing setup and redaction helpers for user-entered text.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Characters of a query kept in log lines
const VISIBLE_QUERY_CHARS: usize = 12;

/// Install the global tracing subscriber. `RUST_LOG` overrides `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if let Err(e) = result {
        eprintln!("Tracing already initialized: {}", e);
    }
}

/// Shorten a search query for logging.
/// Keeps the first characters and the total length: "what are VCs…(41 chars)"
pub fn redact_query(query: &str) -> String {
    let total = query.chars().count();
    if total <= VISIBLE_QUERY_CHARS {
        return query.to_string();
    }

    let visible: String = query.chars().take(VISIBLE_QUERY_CHARS).collect();
    format!("{}…({} chars)", visible, total)
}
