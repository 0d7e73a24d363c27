use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

use super::{BookingStore, ConversationStore, DEFAULT_CONVERSATION_TTL_HOURS};
use crate::db::queries;
use crate::models::{Booking, BookingStatus, ConversationState};

/// SQLite-backed stores. Every call goes to the database, so changes made
/// by other connections are always seen.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    ttl: Duration,
}

impl SqliteStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            ttl: Duration::hours(DEFAULT_CONVERSATION_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn db(&self) -> anyhow::Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))
    }

    /// Bookings for the admin API, newest first.
    pub fn recent_bookings(
        &self,
        status: Option<BookingStatus>,
        limit: i64,
    ) -> anyhow::Result<Vec<Booking>> {
        let conn = self.db()?;
        queries::list_bookings(&conn, status, limit)
    }
}

impl ConversationStore for SqliteStore {
    fn get(&self, user_id: &str, now: NaiveDateTime) -> anyhow::Result<ConversationState> {
        let conn = self.db()?;
        let stored = queries::get_conversation(&conn, user_id)?;
        Ok(match stored {
            Some(state) if !state.is_stale(now, self.ttl) => state,
            Some(_) => {
                tracing::debug!(user = %user_id, "conversation expired, starting fresh");
                ConversationState::new(user_id, now)
            }
            None => ConversationState::new(user_id, now),
        })
    }

    fn put(&self, state: &mut ConversationState, now: NaiveDateTime) -> anyhow::Result<()> {
        state.updated_at = now;
        let conn = self.db()?;
        queries::save_conversation(&conn, state)
    }
}

impl BookingStore for SqliteStore {
    fn list(&self) -> anyhow::Result<Vec<Booking>> {
        let conn = self.db()?;
        queries::get_all_bookings(&conn)
    }

    fn create(&self, booking: &Booking) -> anyhow::Result<()> {
        let conn = self.db()?;
        queries::create_booking(&conn, booking)
    }

    fn cancel(&self, id: &str) -> anyhow::Result<bool> {
        let conn = self.db()?;
        queries::cancel_booking(&conn, id)
    }

    fn for_customer(&self, phone: &str) -> anyhow::Result<Vec<Booking>> {
        let conn = self.db()?;
        queries::get_bookings_for_phone(&conn, phone)
    }

    fn mark_reminder_sent(&self, id: &str) -> anyhow::Result<bool> {
        let conn = self.db()?;
        queries::mark_reminder_sent(&conn, id)
    }
}
