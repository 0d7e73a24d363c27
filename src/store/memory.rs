use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, NaiveDateTime};

use super::{BookingStore, ConversationStore, DEFAULT_CONVERSATION_TTL_HOURS};
use crate::models::{Booking, BookingStatus, ConversationState};

/// Process-local stores. Nothing survives a restart.
pub struct MemoryStore {
    conversations: Mutex<HashMap<String, ConversationState>>,
    bookings: Mutex<Vec<Booking>>,
    ttl: Duration,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::hours(DEFAULT_CONVERSATION_TTL_HOURS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            conversations: Mutex::new(HashMap::new()),
            bookings: Mutex::new(Vec::new()),
            ttl,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("memory store lock poisoned")
}

impl ConversationStore for MemoryStore {
    fn get(&self, user_id: &str, now: NaiveDateTime) -> anyhow::Result<ConversationState> {
        let conversations = self.conversations.lock().map_err(poisoned)?;
        Ok(match conversations.get(user_id) {
            Some(state) if !state.is_stale(now, self.ttl) => state.clone(),
            _ => ConversationState::new(user_id, now),
        })
    }

    fn put(&self, state: &mut ConversationState, now: NaiveDateTime) -> anyhow::Result<()> {
        state.updated_at = now;
        let mut conversations = self.conversations.lock().map_err(poisoned)?;
        conversations.insert(state.user_id.clone(), state.clone());
        Ok(())
    }
}

impl BookingStore for MemoryStore {
    fn list(&self) -> anyhow::Result<Vec<Booking>> {
        Ok(self.bookings.lock().map_err(poisoned)?.clone())
    }

    fn create(&self, booking: &Booking) -> anyhow::Result<()> {
        let mut bookings = self.bookings.lock().map_err(poisoned)?;
        anyhow::ensure!(
            bookings.iter().all(|b| b.id != booking.id),
            "duplicate booking id: {}",
            booking.id
        );
        bookings.push(booking.clone());
        Ok(())
    }

    fn cancel(&self, id: &str) -> anyhow::Result<bool> {
        let mut bookings = self.bookings.lock().map_err(poisoned)?;
        match bookings
            .iter_mut()
            .find(|b| b.id == id && b.status != BookingStatus::Cancelled)
        {
            Some(booking) => {
                booking.status = BookingStatus::Cancelled;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn for_customer(&self, phone: &str) -> anyhow::Result<Vec<Booking>> {
        let bookings = self.bookings.lock().map_err(poisoned)?;
        Ok(bookings
            .iter()
            .filter(|b| b.customer_phone == phone)
            .cloned()
            .collect())
    }

    fn mark_reminder_sent(&self, id: &str) -> anyhow::Result<bool> {
        let mut bookings = self.bookings.lock().map_err(poisoned)?;
        match bookings.iter_mut().find(|b| b.id == id) {
            Some(booking) => {
                booking.reminder_sent = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
