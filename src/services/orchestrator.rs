// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Debounced, cancellable search pipeline.
//!
//! [`SearchMachine`] holds the state and its transitions and performs no I/O.
//! [`SearchOrchestrator`] drives it from a tokio task: it owns the debounce and
//! cold-start timers and the single in-flight request, and publishes every state
//! change on a `watch` channel. Replacing or dropping the in-flight future aborts
//! the HTTP request, and every response is checked against the current request id
//! before it may touch the state.

use crate::models::search::{RawApiResponse, SearchOutcome, SearchRequest};
use crate::models::settings::Settings;
use crate::services::cache::ResponseCache;
use crate::services::logging::redact_query;
use crate::services::search::{SearchBackend, SearchError};
use crate::services::transform::to_outcome;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Timing and sizing knobs of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub debounce: Duration,
    pub cold_start_notice: Duration,
    pub min_query_len: usize,
    pub limit: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for OrchestratorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            debounce: settings.debounce,
            cold_start_notice: settings.cold_start_notice,
            min_query_len: settings.min_query_len,
            limit: settings.search_limit,
        }
    }
}

/// Observable state of one search box
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState {
    /// Empty or too-short query; nothing pending
    Idle,
    /// Waiting for typing to pause
    Debouncing { query: String },
    /// Request in flight. `waking_up` flips once the backend has been slow long
    /// enough to suggest a cold start.
    Fetching {
        query: String,
        request_id: u64,
        waking_up: bool,
    },
    Success {
        query: String,
        outcome: SearchOutcome,
    },
    Failed { query: String, error: SearchError },
}

impl SearchState {
    pub fn query(&self) -> Option<&str> {
        match self {
            SearchState::Idle => None,
            SearchState::Debouncing { query }
            | SearchState::Fetching { query, .. }
            | SearchState::Success { query, .. }
            | SearchState::Failed { query, .. } => Some(query),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Fetching { .. })
    }
}

/// Side effect the driver must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Clear both timers and abort any in-flight request
    Cancel,
    /// Abort any in-flight request and (re)arm the debounce timer
    Debounce,
    /// Send the request and arm the cold-start timer
    Fetch {
        request_id: u64,
        request: SearchRequest,
    },
    /// The in-flight request finished; clear the cold-start timer
    Settle,
}

/// Pure search state machine
pub struct SearchMachine {
    state: SearchState,
    cache: Arc<ResponseCache>,
    min_query_len: usize,
    limit: u32,
    next_request_id: u64,
}

impl SearchMachine {
    pub fn new(cache: Arc<ResponseCache>, config: &OrchestratorConfig) -> Self {
        Self {
            state: SearchState::Idle,
            cache,
            min_query_len: config.min_query_len,
            limit: config.limit,
            next_request_id: 1,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// The search box changed. Short or empty input clears everything at once.
    pub fn input(&mut self, text: &str) -> Effect {
        let query = text.trim();

        if query.chars().count() < self.min_query_len {
            self.state = SearchState::Idle;
            return Effect::Cancel;
        }

        self.state = SearchState::Debouncing {
            query: query.to_string(),
        };
        Effect::Debounce
    }

    /// Typing paused. Serve from cache or start a request.
    pub fn debounce_elapsed(&mut self) -> Effect {
        let query = match &self.state {
            SearchState::Debouncing { query } => query.clone(),
            _ => return Effect::None,
        };

        if let Some(raw) = self.cache.get(&query, self.limit, 0) {
            debug!(query = %redact_query(&query), "search served from cache");
            self.state = SearchState::Success {
                outcome: to_outcome(&raw, &query),
                query,
            };
            return Effect::None;
        }

        let request_id = self.next_request_id;
        self.next_request_id += 1;

        let request = SearchRequest::new(query.clone(), self.limit);
        self.state = SearchState::Fetching {
            query,
            request_id,
            waking_up: false,
        };

        Effect::Fetch {
            request_id,
            request,
        }
    }

    /// A request finished. Responses for anything but the current request are dropped.
    pub fn resolve(
        &mut self,
        request_id: u64,
        result: Result<RawApiResponse, SearchError>,
    ) -> Effect {
        let query = match &self.state {
            SearchState::Fetching {
                query,
                request_id: current,
                ..
            } if *current == request_id => query.clone(),
            _ => {
                debug!(request_id, "ignoring superseded search response");
                return Effect::None;
            }
        };

        self.state = match result {
            Ok(raw) if raw.all_methods_failed() => {
                warn!(query = %redact_query(&query), "search backend reported all methods failed");
                SearchState::Failed {
                    query,
                    error: SearchError::AllMethodsFailed,
                }
            }
            Ok(raw) => {
                self.cache.set(&query, self.limit, 0, raw.clone());
                SearchState::Success {
                    outcome: to_outcome(&raw, &query),
                    query,
                }
            }
            Err(error) => {
                warn!(query = %redact_query(&query), error = %error, "search failed");
                SearchState::Failed { query, error }
            }
        };

        Effect::Settle
    }

    /// Cold-start timer fired. Only the still-pending request may show the notice.
    pub fn cold_start_elapsed(&mut self, request_id: u64) -> bool {
        match &mut self.state {
            SearchState::Fetching {
                request_id: current,
                waking_up,
                ..
            } if *current == request_id && !*waking_up => {
                *waking_up = true;
                true
            }
            _ => false,
        }
    }
}

type InFlight = Pin<Box<dyn Future<Output = (u64, Result<RawApiResponse, SearchError>)> + Send>>;

#[derive(Debug, Default, Clone, Copy)]
struct Timers {
    debounce_at: Option<Instant>,
    cold_start: Option<(u64, Instant)>,
}

/// Handle to a running search pipeline. Dropping it tears the pipeline down:
/// timers are cleared, the in-flight request is aborted and no further states
/// are published.
pub struct SearchOrchestrator {
    inputs: mpsc::UnboundedSender<String>,
    state: watch::Receiver<SearchState>,
    task: JoinHandle<()>,
}

impl SearchOrchestrator {
    pub fn spawn(
        backend: Arc<dyn SearchBackend>,
        cache: Arc<ResponseCache>,
        config: OrchestratorConfig,
    ) -> Self {
        let (inputs, input_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(SearchState::Idle);
        let machine = SearchMachine::new(cache, &config);

        let task = tokio::spawn(run(machine, backend, config, input_rx, state_tx));

        Self {
            inputs,
            state,
            task,
        }
    }

    /// Report the current contents of the search box
    pub fn set_query(&self, text: impl Into<String>) {
        if self.inputs.send(text.into()).is_err() {
            debug!("search pipeline already stopped");
        }
    }

    pub fn clear(&self) {
        self.set_query(String::new());
    }

    pub fn state(&self) -> SearchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.state.clone()
    }

    /// Stop the pipeline and wait for its task to finish
    pub async fn shutdown(self) {
        let Self { inputs, task, .. } = self;
        drop(inputs);
        if let Err(e) = task.await {
            warn!(error = %e, "search pipeline task ended abnormally");
        }
    }
}

async fn run(
    mut machine: SearchMachine,
    backend: Arc<dyn SearchBackend>,
    config: OrchestratorConfig,
    mut inputs: mpsc::UnboundedReceiver<String>,
    state_tx: watch::Sender<SearchState>,
) {
    let mut timers = Timers::default();
    let mut in_flight: Option<InFlight> = None;

    loop {
        let debounce_at = timers.debounce_at;
        let cold_start = timers.cold_start;

        let effect = tokio::select! {
            input = inputs.recv() => {
                let Some(text) = input else { break };
                machine.input(&text)
            }
            _ = sleep_until(debounce_at.unwrap_or_else(Instant::now)), if debounce_at.is_some() => {
                timers.debounce_at = None;
                machine.debounce_elapsed()
            }
            _ = sleep_until(cold_start.map_or_else(Instant::now, |(_, at)| at)), if cold_start.is_some() => {
                timers.cold_start = None;
                if let Some((request_id, _)) = cold_start {
                    if machine.cold_start_elapsed(request_id) {
                        info!(request_id, "search backend is slow, probably waking up");
                    }
                }
                Effect::None
            }
            (request_id, result) = async {
                match in_flight.as_mut() {
                    Some(request) => request.await,
                    None => std::future::pending().await,
                }
            }, if in_flight.is_some() => {
                in_flight = None;
                machine.resolve(request_id, result)
            }
        };

        apply(effect, &mut timers, &mut in_flight, &backend, &config);

        let next = machine.state().clone();
        state_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    debug!("search pipeline stopped");
}

fn apply(
    effect: Effect,
    timers: &mut Timers,
    in_flight: &mut Option<InFlight>,
    backend: &Arc<dyn SearchBackend>,
    config: &OrchestratorConfig,
) {
    match effect {
        Effect::None => {}
        Effect::Cancel => {
            if in_flight.take().is_some() {
                debug!("aborted in-flight search");
            }
            *timers = Timers::default();
        }
        Effect::Debounce => {
            if in_flight.take().is_some() {
                debug!("aborted in-flight search for newer input");
            }
            timers.cold_start = None;
            timers.debounce_at = Some(Instant::now() + config.debounce);
        }
        Effect::Fetch {
            request_id,
            request,
        } => {
            info!(
                request_id,
                query = %redact_query(&request.query),
                limit = request.limit,
                "sending search request"
            );
            let backend = Arc::clone(backend);
            *in_flight = Some(Box::pin(async move {
                let result = backend.search(&request).await;
                (request_id, result)
            }));
            timers.debounce_at = None;
            timers.cold_start = Some((request_id, Instant::now() + config.cold_start_notice));
        }
        Effect::Settle => {
            timers.cold_start = None;
        }
    }
}
