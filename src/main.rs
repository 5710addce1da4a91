// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use podinsight_agent::app::{create_router, AppState, VERSION};
use podinsight_agent::models::search::{SearchOutcome, SearchRequest};
use podinsight_agent::models::settings::Settings;
use podinsight_agent::services::audio::AudioClipClient;
use podinsight_agent::services::cache::ResponseCache;
use podinsight_agent::services::intelligence::IntelligenceClient;
use podinsight_agent::services::logging::{init_tracing, redact_query};
use podinsight_agent::services::orchestrator::{
    OrchestratorConfig, SearchOrchestrator, SearchState,
};
use podinsight_agent::services::playback::AudioPlayback;
use podinsight_agent::services::render::{render_briefs, render_state};
use podinsight_agent::services::search::{cached_search, SearchClient};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(name = "podinsight-agent", version = VERSION, about = "Podcast search and intelligence agent")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve,
    /// Run a single search and print the result
    Search {
        /// Search text; multiple words are joined with spaces
        #[arg(required = true)]
        query: Vec<String>,
    },
    /// Search as you type: every stdin line replaces the query
    Interactive,
    /// Print intelligence cards for recent episodes
    Dashboard {
        #[arg(long, default_value_t = 8)]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Terminal commands keep stdout for results, so only warnings are logged by default
    let default_level = match cli.command {
        Command::Serve => "info",
        _ => "warn",
    };
    init_tracing(default_level);

    let settings = Settings::from_env().context("Invalid configuration")?;

    match cli.command {
        Command::Serve => serve(settings).await,
        Command::Search { query } => search(settings, &query.join(" ")).await,
        Command::Interactive => interactive(settings).await,
        Command::Dashboard { limit } => dashboard(settings, limit).await,
    }
}

async fn serve(settings: Settings) -> Result<()> {
    let addr = settings.listen_addr;
    let api_base_url = settings.api_base_url.clone();
    let app = create_router(AppState::from_settings(settings)?);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(version = VERSION, %addr, upstream = %api_base_url, "podinsight-agent listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn search(settings: Settings, query: &str) -> Result<()> {
    let query = query.trim();
    if query.chars().count() < settings.min_query_len {
        bail!(
            "Query must be at least {} characters",
            settings.min_query_len
        );
    }

    let client = SearchClient::new(&settings.api_base_url, settings.search_timeout)?;
    let cache = ResponseCache::new(settings.cache_ttl, settings.cache_max_entries);
    let request = SearchRequest::new(query, settings.search_limit);

    let state = match cached_search(&client, &cache, &request).await {
        Ok(response) => SearchState::Success {
            query: query.to_string(),
            outcome: response.outcome,
        },
        Err(error) => SearchState::Failed {
            query: query.to_string(),
            error,
        },
    };

    println!("{}", render_state(&state));
    Ok(())
}

async fn dashboard(settings: Settings, limit: u32) -> Result<()> {
    let client = IntelligenceClient::new(&settings.api_base_url, settings.search_timeout)?;
    let briefs = client.briefs(limit).await?;
    println!("{}", render_briefs(&briefs));
    Ok(())
}

/// One line typed in interactive mode
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Query(String),
    Play(usize),
    Stop,
    Quit,
    Unknown(String),
}

impl Line {
    fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let Some(command) = trimmed.strip_prefix(':') else {
            return Line::Query(line.to_string());
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("quit" | "q"), None) => Line::Quit,
            (Some("stop"), None) => Line::Stop,
            (Some("play"), Some(n)) => match n.parse::<usize>() {
                Ok(n) if n > 0 => Line::Play(n),
                _ => Line::Unknown(trimmed.to_string()),
            },
            _ => Line::Unknown(trimmed.to_string()),
        }
    }
}

struct Session {
    audio: AudioClipClient,
    playback: AudioPlayback,
}

impl Session {
    async fn play(&mut self, state: &SearchState, n: usize) {
        let source = match state {
            SearchState::Success {
                outcome: SearchOutcome::Answer(answer),
                ..
            } => answer.sources.get(n - 1),
            _ => None,
        };

        let Some(source) = source else {
            println!("No source {} to play.", n);
            return;
        };

        match self.playback.load_and_play(&self.audio, source).await {
            Ok(command) => {
                if let Some(previous) = command.stop {
                    println!("■ stopped {}", previous);
                }
                println!("▶ {}: {}", source.episode_title, command.url);
            }
            Err(message) => println!("⚠ {}", message),
        }
    }

    /// Warm the clip of the first cited source so `:play 1` starts at once
    async fn prefetch_first(&mut self, state: &SearchState) {
        if let SearchState::Success {
            outcome: SearchOutcome::Answer(answer),
            ..
        } = state
        {
            if let Some(source) = answer.sources.first() {
                if let Err(message) = self.playback.prefetch(&self.audio, source).await {
                    debug!(source_id = %source.id, %message, "audio prefetch failed");
                }
            }
        }
    }

    fn stop(&mut self) {
        match self.playback.stop() {
            Some(source_id) => println!("■ stopped {}", source_id),
            None => println!("Nothing is playing."),
        }
    }
}

async fn interactive(settings: Settings) -> Result<()> {
    let client = SearchClient::new(&settings.api_base_url, settings.search_timeout)?;
    let cache = Arc::new(ResponseCache::new(
        settings.cache_ttl,
        settings.cache_max_entries,
    ));
    let orchestrator =
        SearchOrchestrator::spawn(Arc::new(client), cache, OrchestratorConfig::from(&settings));
    let mut states = orchestrator.subscribe();
    let mut session = Session {
        audio: AudioClipClient::new(&settings.api_base_url, settings.audio_timeout)?,
        playback: AudioPlayback::new(),
    };

    println!("{}", render_state(&states.borrow_and_update()));
    println!("Commands: :play N, :stop, :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Line::parse(&line) {
                    Line::Query(text) => orchestrator.set_query(text),
                    Line::Play(n) => session.play(&current(&states), n).await,
                    Line::Stop => session.stop(),
                    Line::Quit => break,
                    Line::Unknown(command) => println!("Unknown command: {}", command),
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                println!("{}", render_state(&state));
                if let Some(query) = state.query() {
                    debug!(query = %redact_query(query), "search state changed");
                }
                session.prefetch_first(&state).await;
            }
        }
    }

    orchestrator.shutdown().await;
    Ok(())
}

fn current(states: &watch::Receiver<SearchState>) -> SearchState {
    states.borrow().clone()
}
