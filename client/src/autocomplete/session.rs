//! Clock-injected state machine behind the location autocomplete.
//!
//! `LookupSession` does no I/O and owns no timers. The driver tells it what
//! time it is and hands back lookup outcomes tagged with the token that
//! `settle` issued; the session decides whether an outcome still applies.

use shared::models::Place;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupConfig {
    /// Quiet period after the last keystroke before a lookup is issued
    pub settle_delay: Duration,
    /// Trimmed queries shorter than this are treated as empty
    pub min_query_chars: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            min_query_chars: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupState {
    #[default]
    Idle,
    /// Settle timer armed
    Scheduled,
    /// Latest lookup issued, no answer yet
    InFlight,
    /// Showing the result of the latest applied lookup
    Ready,
}

/// Generation number stamped on every issued lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

/// Lookup the driver must perform now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLookup {
    pub token: RequestToken,
    pub query: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryChange {
    /// Query was empty (or too short); suggestions dropped, nothing scheduled
    Cleared,
    /// Settle timer (re)armed
    Scheduled { deadline: Instant },
    /// Same value as before; timer and in-flight lookup left alone
    Unchanged,
}

/// Point-in-time view published to whoever renders the field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub query: String,
    pub suggestions: Vec<Place>,
    pub loading: bool,
    pub state: LookupState,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct LookupSession {
    config: LookupConfig,
    query: String,
    suggestions: Vec<Place>,
    loading: bool,
    deadline: Option<Instant>,
    generation: u64,
    in_flight: Option<RequestToken>,
    /// Trimmed query the in-flight lookup was issued for
    requested: String,
    /// Trimmed query whose results are on display
    results_for: Option<String>,
    last_error: Option<String>,
}

impl LookupSession {
    pub fn new(config: LookupConfig) -> Self {
        Self {
            config,
            query: String::new(),
            suggestions: Vec::new(),
            loading: false,
            deadline: None,
            generation: 0,
            in_flight: None,
            requested: String::new(),
            results_for: None,
            last_error: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn suggestions(&self) -> &[Place] {
        &self.suggestions
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn state(&self) -> LookupState {
        if self.deadline.is_some() {
            LookupState::Scheduled
        } else if self.in_flight.is_some() {
            LookupState::InFlight
        } else if self.results_for.is_some() {
            LookupState::Ready
        } else {
            LookupState::Idle
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            query: self.query.clone(),
            suggestions: self.suggestions.clone(),
            loading: self.loading,
            state: self.state(),
            last_error: self.last_error.clone(),
        }
    }

    fn is_searchable(&self, query: &str) -> bool {
        let trimmed = query.trim();
        !trimmed.is_empty() && trimmed.chars().count() >= self.config.min_query_chars
    }

    pub fn set_query(&mut self, query: &str, now: Instant) -> QueryChange {
        if !self.is_searchable(query) {
            self.query = query.to_string();
            self.reset();
            return QueryChange::Cleared;
        }

        let duplicate = match self.state() {
            LookupState::Scheduled | LookupState::InFlight => query == self.query,
            LookupState::Ready => self.results_for.as_deref() == Some(query.trim()),
            LookupState::Idle => false,
        };
        if duplicate {
            // The list on screen already answers this query.
            if self.state() == LookupState::Ready {
                self.last_error = None;
            }
            self.query = query.to_string();
            return QueryChange::Unchanged;
        }

        self.query = query.to_string();
        let deadline = now + self.config.settle_delay;
        self.deadline = Some(deadline);
        QueryChange::Scheduled { deadline }
    }

    /// Fires the settle timer if it is due, issuing a fresh token.
    pub fn settle(&mut self, now: Instant) -> Option<PendingLookup> {
        match self.deadline {
            Some(deadline) if now >= deadline => {}
            _ => return None,
        }
        self.deadline = None;

        let token = self.next_token();
        self.in_flight = Some(token);
        self.loading = true;
        self.requested = self.query.trim().to_string();
        Some(PendingLookup {
            token,
            query: self.requested.clone(),
        })
    }

    /// Returns false when `token` was superseded and the places were dropped.
    pub fn apply_result(&mut self, token: RequestToken, places: Vec<Place>) -> bool {
        if self.in_flight != Some(token) {
            tracing::debug!(?token, "Discarding superseded lookup result");
            return false;
        }
        self.in_flight = None;
        self.loading = false;
        self.suggestions = places;
        self.results_for = Some(std::mem::take(&mut self.requested));
        self.last_error = None;
        true
    }

    /// Suggestions are kept as they were; only the loading flag and error change.
    pub fn apply_error(&mut self, token: RequestToken, message: impl Into<String>) -> bool {
        if self.in_flight != Some(token) {
            return false;
        }
        self.in_flight = None;
        self.loading = false;
        self.last_error = Some(message.into());
        true
    }

    pub fn select_suggestion(&mut self, index: usize) -> Option<Place> {
        let place = self.suggestions.get(index)?.clone();
        self.query = place.display_name.clone();
        self.reset();
        Some(place)
    }

    /// Drops the timer and forgets any in-flight lookup. Used on teardown.
    pub fn cancel(&mut self) {
        self.deadline = None;
        if self.in_flight.take().is_some() {
            self.generation += 1;
        }
        self.loading = false;
    }

    fn reset(&mut self) {
        self.cancel();
        // Anything issued before this point must not repopulate the list.
        self.generation += 1;
        self.suggestions.clear();
        self.results_for = None;
        self.last_error = None;
    }

    fn next_token(&mut self) -> RequestToken {
        self.generation += 1;
        RequestToken(self.generation)
    }
}
