//! Search-as-you-type location lookup.
//!
//! `LocationAutocomplete` runs one [`LookupSession`] on a dedicated task.
//! Keystrokes and selections arrive as commands, the settle timer and the
//! lookups complete as events on the same `select!` loop, so no two
//! transitions ever run at once. Observers read state through a `watch`
//! channel.

pub mod session;

pub use session::{
    LookupConfig, LookupSession, LookupState, PendingLookup, QueryChange, RequestToken, Snapshot,
};

use async_trait::async_trait;
use futures::FutureExt;
use shared::models::Place;
use std::any::Any;
use std::future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant};

use crate::error::{ClientError, ClientResult};

/// Anything that can turn a free-text query into candidate places
#[async_trait]
pub trait PlaceSearch: Send + Sync + 'static {
    async fn search_places(&self, query: &str) -> ClientResult<Vec<Place>>;
}

#[derive(Debug)]
enum Command {
    SetQuery(String),
    Select(usize),
    Shutdown,
}

type LookupOutcome = (PendingLookup, ClientResult<Vec<Place>>);

/// Handle to a running autocomplete. Dropping it stops the task, its timer
/// and any lookup still in flight.
pub struct LocationAutocomplete {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    selections: mpsc::UnboundedReceiver<Place>,
    task: Option<JoinHandle<()>>,
}

impl LocationAutocomplete {
    /// Must be called from within a tokio runtime.
    pub fn spawn(search: Arc<dyn PlaceSearch>, config: LookupConfig) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(Snapshot::default());
        let (selection_tx, selection_rx) = mpsc::unbounded_channel();

        let session = LookupSession::new(config);
        let task = tokio::spawn(run(session, search, command_rx, snapshot_tx, selection_tx));

        Self {
            commands: command_tx,
            snapshots: snapshot_rx,
            selections: selection_rx,
            task: Some(task),
        }
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.send(Command::SetQuery(query.into()));
    }

    /// Picks the suggestion at `index` of the current list. Out-of-range
    /// indexes are ignored.
    pub fn select_suggestion(&self, index: usize) {
        self.send(Command::Select(index));
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Waits for the next place the user picked. `None` once the task ended.
    pub async fn next_selection(&mut self) -> Option<Place> {
        self.selections.recv().await
    }

    /// Stops the task and waits for it to release its timer and lookups.
    pub async fn shutdown(mut self) {
        self.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Autocomplete task ended abnormally: {:?}", e);
            }
        }
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::debug!("Autocomplete task already stopped");
        }
    }
}

impl Drop for LocationAutocomplete {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn run(
    mut session: LookupSession,
    search: Arc<dyn PlaceSearch>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<Snapshot>,
    selections: mpsc::UnboundedSender<Place>,
) {
    let mut lookups: JoinSet<LookupOutcome> = JoinSet::new();

    loop {
        let deadline = session.deadline();

        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::SetQuery(query)) => {
                    let change = session.set_query(&query, Instant::now());
                    tracing::trace!(?change, "Query changed");
                }
                Some(Command::Select(index)) => {
                    if let Some(place) = session.select_suggestion(index) {
                        tracing::debug!(place = %place.display_name, "Suggestion selected");
                        // Owner may have stopped listening; the field still updates.
                        let _ = selections.send(place);
                    }
                }
                Some(Command::Shutdown) | None => break,
            },
            _ = settle_timer(deadline) => {
                if let Some(pending) = session.settle(Instant::now()) {
                    tracing::debug!(query = %pending.query, token = ?pending.token, "Issuing location lookup");
                    let search = Arc::clone(&search);
                    lookups.spawn(async move {
                        // A panic still has to resolve this token, so it becomes an error here.
                        let result = AssertUnwindSafe(search.search_places(&pending.query))
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|panic| Err(ClientError::Crashed(panic_message(panic))));
                        (pending, result)
                    });
                }
            }
            Some(joined) = lookups.join_next(), if !lookups.is_empty() => match joined {
                Ok((pending, Ok(places))) => {
                    let count = places.len();
                    if session.apply_result(pending.token, places) {
                        tracing::debug!(query = %pending.query, count, "Suggestions updated");
                    }
                }
                Ok((pending, Err(err))) => {
                    tracing::warn!(query = %pending.query, error = %err, "Location lookup failed");
                    session.apply_error(pending.token, err.to_string());
                }
                Err(err) => {
                    // Only abort_all cancels lookups, and it runs after the loop.
                    tracing::error!("Location lookup task failed: {:?}", err);
                }
            },
        }

        publish(&snapshots, session.snapshot());
    }

    session.cancel();
    lookups.abort_all();
    publish(&snapshots, session.snapshot());
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn settle_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}

fn publish(snapshots: &watch::Sender<Snapshot>, next: Snapshot) {
    snapshots.send_if_modified(|current| {
        if *current == next {
            return false;
        }
        *current = next;
        true
    });
}
