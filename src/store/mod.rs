//! Persistence contracts the conversation engine depends on.
//!
//! Implementations re-read their durable state on every call so that a
//! second process (a reminder sweep, another request handler) writing the
//! same records is observed, and each write is applied atomically.

pub mod memory;
pub mod sqlite;

use chrono::NaiveDateTime;

use crate::models::{Booking, ConversationState};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Conversations untouched for this long are treated as new.
pub const DEFAULT_CONVERSATION_TTL_HOURS: i64 = 24;

pub trait ConversationStore: Send + Sync {
    /// The stored record, or a fresh `START` record when none exists or the
    /// stored one has gone stale.
    fn get(&self, user_id: &str, now: NaiveDateTime) -> anyhow::Result<ConversationState>;

    /// Stamps `updated_at` with `now` and persists.
    fn put(&self, state: &mut ConversationState, now: NaiveDateTime) -> anyhow::Result<()>;
}

pub trait BookingStore: Send + Sync {
    fn list(&self) -> anyhow::Result<Vec<Booking>>;

    fn create(&self, booking: &Booking) -> anyhow::Result<()>;

    /// Cancels a booking that is not already cancelled. Returns whether anything changed.
    fn cancel(&self, id: &str) -> anyhow::Result<bool>;

    fn for_customer(&self, phone: &str) -> anyhow::Result<Vec<Booking>>;

    fn mark_reminder_sent(&self, id: &str) -> anyhow::Result<bool>;
}
