//! # Event Bus System
//!
//! Event-driven communication between core modules using
//! `tokio::sync::broadcast`. The session resolver and catalog operations
//! emit typed events; UI surfaces subscribe to refresh their snapshots
//! without polling.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, SessionEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut stream = event_bus.subscribe();
//!
//! let event = CoreEvent::Session(SessionEvent::SignedIn {
//!     user_id: "user-123".to_string(),
//!     email: "user@example.com".to_string(),
//! });
//! event_bus.emit(event).ok();
//! ```
//!
//! ## Error Handling
//!
//! `RecvError::Lagged(n)` means a subscriber missed `n` events and can keep
//! receiving; `RecvError::Closed` means all senders are gone and signals
//! shutdown.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Session and identity events
    Session(SessionEvent),
    /// Catalog content events
    Catalog(CatalogEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Session(e) => e.description(),
            CoreEvent::Catalog(e) => e.description(),
        }
    }
}

/// Events related to session establishment and the resolved user view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SessionEvent {
    /// A session was established and an optimistic user view published.
    SignedIn {
        /// The authenticated user's identifier.
        user_id: String,
        /// The authenticated email.
        email: String,
    },
    /// The session ended.
    SignedOut,
    /// Background confirmation of the admin flag completed.
    ///
    /// Emitted after the profile upsert and admin-grant lookup finish;
    /// `is_admin` is the confirmed value, which may differ from the
    /// optimistic one published at sign-in.
    AdminConfirmed {
        /// The user whose view was refined.
        user_id: String,
        /// The confirmed admin capability.
        is_admin: bool,
    },
}

impl SessionEvent {
    fn description(&self) -> &str {
        match self {
            SessionEvent::SignedIn { .. } => "User signed in",
            SessionEvent::SignedOut => "User signed out",
            SessionEvent::AdminConfirmed { .. } => "Admin capability confirmed",
        }
    }
}

/// Events related to catalog content changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CatalogEvent {
    /// A song (with its initial variants) was added.
    SongAdded {
        /// The new song's identifier.
        song_id: String,
        /// Display name.
        name: String,
    },
    /// A song and its dependents were removed.
    SongDeleted {
        /// The deleted song's identifier.
        song_id: String,
        /// Set when blob-store cleanup failed and manual cleanup is needed.
        storage_warning: Option<String>,
    },
    /// A key variant was added or replaced.
    VariantUpserted {
        /// The owning song.
        song_id: String,
        /// The musical key label.
        key: String,
    },
    /// A favorite was toggled on or off.
    FavoriteToggled {
        /// The song whose favorite state changed.
        song_id: String,
        /// The user who toggled it.
        user_id: String,
        /// The resulting state.
        favorited: bool,
    },
}

impl CatalogEvent {
    fn description(&self) -> &str {
        match self {
            CatalogEvent::SongAdded { .. } => "Song added to catalog",
            CatalogEvent::SongDeleted { .. } => "Song removed from catalog",
            CatalogEvent::VariantUpserted { .. } => "Song variant added or replaced",
            CatalogEvent::FavoriteToggled { .. } => "Favorite toggled",
        }
    }
}

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally: multiple producers (clone the
/// `EventBus`), multiple independent consumers (each `subscribe()` creates a
/// new receiver), non-blocking sends, lagging detection for slow consumers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// When a subscriber falls behind by more than `capacity` events it
    /// receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error when there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver; past events are not
    /// replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}
