//! Reactive `{ value, loading, error }` snapshots.
//!
//! A [`SnapshotSource`] has exactly one logical writer (the resolution task of
//! its provider) and any number of readers. Readers either take the latest
//! snapshot or subscribe and get woken on every change.
//!
//! Every resolution is tagged with a generation. [`SnapshotSource::begin`]
//! starts a new generation; [`SnapshotSource::complete`] only applies a result
//! whose ticket is still current, so a late answer for a superseded request
//! can never overwrite a newer one.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;

/// Failure reported by a resolution collaborator (profile or organization lookup).
///
/// Stored on the snapshot as inert state; this crate never retries.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[error("resolution failed: {message}")]
pub struct ResolutionError {
    message: String,
}

impl ResolutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Point-in-time view of a resolved value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot<T> {
    value: Option<T>,
    loading: bool,
    error: Option<ResolutionError>,
    generation: u64,
}

impl<T> Snapshot<T> {
    /// Nothing to resolve: no value, not loading, no error.
    pub fn empty() -> Self {
        Self {
            value: None,
            loading: false,
            error: None,
            generation: 0,
        }
    }

    /// A resolution is in flight and no value is known yet.
    pub fn pending() -> Self {
        Self {
            loading: true,
            ..Self::empty()
        }
    }

    /// An already-resolved value.
    pub fn ready(value: T) -> Self {
        Self {
            value: Some(value),
            ..Self::empty()
        }
    }

    /// A resolution that finished with an error.
    pub fn failed(error: ResolutionError) -> Self {
        Self {
            error: Some(error),
            ..Self::empty()
        }
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&ResolutionError> {
        self.error.as_ref()
    }

}

/// Proof that a caller started a particular resolution generation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResolutionTicket {
    generation: u64,
}

impl ResolutionTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Single-writer, many-reader snapshot cell.
#[derive(Debug)]
pub struct SnapshotSource<T> {
    tx: watch::Sender<Snapshot<T>>,
}

impl<T> SnapshotSource<T>
where
    T: Clone + Send + Sync,
{
    pub fn new(initial: Snapshot<T>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Start a new resolution generation and mark the snapshot as loading.
    ///
    /// The last known value is kept while the new generation is in flight;
    /// any previous error is cleared.
    pub fn begin(&self) -> ResolutionTicket {
        let mut generation = 0;
        self.tx.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.loading = true;
            snapshot.error = None;
            generation = snapshot.generation;
        });
        ResolutionTicket { generation }
    }

    /// Apply the outcome of the resolution identified by `ticket`.
    ///
    /// Returns `false` (and leaves the snapshot untouched) when a newer
    /// generation has been started since the ticket was issued.
    pub fn complete(
        &self,
        ticket: ResolutionTicket,
        outcome: Result<Option<T>, ResolutionError>,
    ) -> bool {
        let applied = self.tx.send_if_modified(|snapshot| {
            if snapshot.generation != ticket.generation {
                return false;
            }

            snapshot.loading = false;
            match outcome {
                Ok(value) => {
                    snapshot.value = value;
                    snapshot.error = None;
                }
                Err(err) => {
                    snapshot.value = None;
                    snapshot.error = Some(err);
                }
            }
            true
        });

        if !applied {
            tracing::debug!(
                generation = ticket.generation,
                "discarding stale resolution result"
            );
        }
        applied
    }

    /// Whether `ticket` still names the newest generation.
    pub fn is_current(&self, ticket: ResolutionTicket) -> bool {
        self.tx.borrow().generation == ticket.generation
    }

    /// Latest snapshot.
    pub fn snapshot(&self) -> Snapshot<T> {
        self.tx.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot<T>> {
        self.tx.subscribe()
    }
}

impl<T> Default for SnapshotSource<T>
where
    T: Clone + Send + Sync,
{
    fn default() -> Self {
        Self::new(Snapshot::empty())
    }
}
