//! # Event Bus System
//!
//! Provides an event-driven architecture for the transfer core using
//! `tokio::sync::broadcast`. Hosts subscribe to follow loads, transfers and
//! submissions without polling.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies per domain
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  emit   ┌───────────┐
//! │ Transfer engine  ├────────>│           │  subscribe  ┌────────────┐
//! └──────────────────┘         │ EventBus  ├────────────>│ Host UI    │
//! ┌──────────────────┐  emit   │ (broadcast│             └────────────┘
//! │ Coordinator      ├────────>│  channel) │
//! └──────────────────┘         └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Catalog(CatalogEvent::Loaded {
//!         kind: "artist".to_string(),
//!         provider: "Spotify".to_string(),
//!         count: 42,
//!     }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Catalog loaded");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   Non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Emitting with no subscribers returns an error, which publishers ignore.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

pub use crate::config::DEFAULT_EVENT_BUFFER_SIZE;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Snapshot loading, submission and mapping persistence
    Catalog(CatalogEvent),
    /// Transfer runs
    Transfer(TransferEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Catalog(e) => e.description(),
            CoreEvent::Transfer(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Catalog(CatalogEvent::LoadFailed { .. })
            | CoreEvent::Catalog(CatalogEvent::SubmitFailed { .. })
            | CoreEvent::Catalog(CatalogEvent::MappingsSaveFailed { .. }) => EventSeverity::Error,
            CoreEvent::Transfer(TransferEvent::Aborted { .. }) => EventSeverity::Warning,
            CoreEvent::Catalog(CatalogEvent::Submitted { .. })
            | CoreEvent::Transfer(TransferEvent::Completed { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Catalog Events
// ============================================================================

/// Events about snapshots and the mapping file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CatalogEvent {
    /// A snapshot was (re)loaded from its provider.
    Loaded {
        /// Entity kind (`artist`, `album`, `track`, `playlist`).
        kind: String,
        provider: String,
        count: u64,
    },
    /// Listing a provider failed; the snapshot is left empty.
    LoadFailed {
        kind: String,
        provider: String,
        message: String,
    },
    /// Staged entities were committed to a provider.
    Submitted {
        kind: String,
        provider: String,
        count: u64,
        /// Tracks carried inside submitted playlists.
        tracks: u64,
    },
    /// Submission was requested but nothing was staged.
    NothingToSubmit { kind: String, provider: String },
    /// The provider rejected a submission; entities stay staged.
    SubmitFailed {
        kind: String,
        provider: String,
        message: String,
    },
    MappingsSaved { path: String },
    MappingsSaveFailed { path: String, message: String },
}

impl CatalogEvent {
    fn description(&self) -> &str {
        match self {
            CatalogEvent::Loaded { .. } => "Catalog loaded",
            CatalogEvent::LoadFailed { .. } => "Catalog load failed",
            CatalogEvent::Submitted { .. } => "Staged entities submitted",
            CatalogEvent::NothingToSubmit { .. } => "Nothing to submit",
            CatalogEvent::SubmitFailed { .. } => "Submission failed",
            CatalogEvent::MappingsSaved { .. } => "Mappings saved",
            CatalogEvent::MappingsSaveFailed { .. } => "Failed to save mappings",
        }
    }
}

// ============================================================================
// Transfer Events
// ============================================================================

/// Events emitted while a transfer run walks the source snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum TransferEvent {
    Started {
        job_id: String,
        kind: String,
        source: String,
        destination: String,
        /// Number of source entities to process.
        total: u64,
    },
    /// One source entity was handled.
    ItemResolved {
        job_id: String,
        kind: String,
        /// Simplified name of the source entity.
        name: String,
        /// How it was resolved (`already_present`, `restored`, `matched`,
        /// `manual`, `skipped`).
        resolution: String,
    },
    Completed {
        job_id: String,
        kind: String,
        processed: u64,
        transferred: u64,
        skipped: u64,
        duration_ms: u64,
    },
    /// The run stopped early; staged entities remain staged.
    Aborted {
        job_id: String,
        kind: String,
        processed: u64,
        transferred: u64,
        reason: String,
    },
}

impl TransferEvent {
    fn description(&self) -> &str {
        match self {
            TransferEvent::Started { .. } => "Transfer started",
            TransferEvent::ItemResolved { .. } => "Transfer item resolved",
            TransferEvent::Completed { .. } => "Transfer completed",
            TransferEvent::Aborted { .. } => "Transfer aborted",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central broadcast channel for [`CoreEvent`]s.
///
/// Cloning the bus yields another handle to the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// A subscriber that falls behind by more than `capacity` events receives
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let event_bus = EventBus::new(100);
/// let transfers_only = EventStream::new(event_bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Transfer(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` will be returned.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn accepts(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without blocking.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
