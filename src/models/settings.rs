// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{anyhow, Context, Result};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Upstream used when neither `PODINSIGHT_API_URL` nor `NEXT_PUBLIC_API_URL` is set
pub const DEFAULT_API_URL: &str = "https://podinsight-api.vercel.app";

/// Runtime configuration, read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base_url: String,
    pub listen_addr: SocketAddr,
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
    pub search_limit: u32,
    pub min_query_len: usize,
    pub debounce: Duration,
    pub cold_start_notice: Duration,
    pub search_timeout: Duration,
    pub audio_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cache_ttl: Duration::from_secs(600),
            cache_max_entries: 100,
            search_limit: 10,
            min_query_len: 4,
            debounce: Duration::from_millis(500),
            cold_start_notice: Duration::from_millis(5000),
            search_timeout: Duration::from_secs(30),
            audio_timeout: Duration::from_secs(10),
        }
    }
}

impl Settings {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset keys keep their defaults;
    /// set but unparsable keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // NEXT_PUBLIC_API_URL is honoured for deployments shared with the web dashboard
        let api_base_url = lookup("PODINSIGHT_API_URL")
            .or_else(|| lookup("NEXT_PUBLIC_API_URL"))
            .map(|url| normalize_base_url(&url))
            .transpose()?
            .unwrap_or(defaults.api_base_url);

        let listen_addr = parse_var(&lookup, "PODINSIGHT_LISTEN_ADDR")?.unwrap_or(defaults.listen_addr);

        let cache_ttl = parse_var::<u64, _>(&lookup, "SEARCH_CACHE_TTL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);
        let cache_max_entries =
            parse_var(&lookup, "SEARCH_CACHE_MAX_ENTRIES")?.unwrap_or(defaults.cache_max_entries);
        let search_limit = parse_var(&lookup, "SEARCH_RESULT_LIMIT")?.unwrap_or(defaults.search_limit);
        let debounce = parse_var::<u64, _>(&lookup, "SEARCH_DEBOUNCE_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.debounce);
        let cold_start_notice = parse_var::<u64, _>(&lookup, "SEARCH_COLD_START_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.cold_start_notice);
        let search_timeout = parse_var::<u64, _>(&lookup, "SEARCH_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.search_timeout);
        let audio_timeout = parse_var::<u64, _>(&lookup, "AUDIO_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.audio_timeout);

        if cache_max_entries == 0 {
            return Err(anyhow!("SEARCH_CACHE_MAX_ENTRIES must be at least 1"));
        }

        Ok(Self {
            api_base_url,
            listen_addr,
            cache_ttl,
            cache_max_entries,
            search_limit,
            min_query_len: defaults.min_query_len,
            debounce,
            cold_start_notice,
            search_timeout,
            audio_timeout,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} has an invalid value: {raw:?}"))
        })
        .transpose()
}

/// Strip trailing slashes and default to https when only a host is given
pub fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(anyhow!("API base URL must not be empty"));
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    url::Url::parse(&with_scheme).with_context(|| format!("Invalid API base URL: {raw}"))?;
    Ok(with_scheme)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let settings = Settings::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.debounce, Duration::from_millis(500));
        assert_eq!(settings.search_limit, 10);
    }

    #[test]
    fn test_primary_url_wins_over_legacy() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("PODINSIGHT_API_URL", "http://localhost:8000/"),
            ("NEXT_PUBLIC_API_URL", "https://other.example.com"),
        ]))
        .unwrap();
        assert_eq!(settings.api_base_url, "http://localhost:8000");
    }

    #[test]
    fn test_legacy_url_fallback() {
        let settings =
            Settings::from_lookup(lookup_from(&[("NEXT_PUBLIC_API_URL", "api.example.com")]))
                .unwrap();
        assert_eq!(settings.api_base_url, "https://api.example.com");
    }

    #[test]
    fn test_numeric_overrides() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("SEARCH_CACHE_TTL_SECS", "900"),
            ("SEARCH_CACHE_MAX_ENTRIES", "5"),
            ("SEARCH_DEBOUNCE_MS", "250"),
            ("PODINSIGHT_LISTEN_ADDR", "127.0.0.1:8080"),
        ]))
        .unwrap();
        assert_eq!(settings.cache_ttl, Duration::from_secs(900));
        assert_eq!(settings.cache_max_entries, 5);
        assert_eq!(settings.debounce, Duration::from_millis(250));
        assert_eq!(
            settings.listen_addr,
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_invalid_number_is_error() {
        let err = Settings::from_lookup(lookup_from(&[("SEARCH_CACHE_TTL_SECS", "ten")]))
            .unwrap_err();
        assert!(err.to_string().contains("SEARCH_CACHE_TTL_SECS"));
    }

    #[test]
    fn test_zero_cache_entries_rejected() {
        assert!(Settings::from_lookup(lookup_from(&[("SEARCH_CACHE_MAX_ENTRIES", "0")])).is_err());
    }

    #[test]
    fn test_normalize_base_url_rejects_empty() {
        assert!(normalize_base_url("  ").is_err());
    }
}
