use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::{Booking, BookingStatus, ConversationState, ConversationStep, ServiceCatalog};
use crate::services::intent::{self, Hints};
use crate::services::replies;
use crate::services::scheduling::{SlotRejection, SlotValidator};
use crate::store::{BookingStore, ConversationStore};

/// Result of processing one message. Only `Commit` writes the state back.
enum Outcome {
    Reply(String),
    Commit(String),
}

/// Step the conversation should be in given which selections are known.
pub fn next_step(service: bool, date: bool, time: bool) -> ConversationStep {
    match (service, date, time) {
        (true, true, true) => ConversationStep::Confirmation,
        (true, true, false) => ConversationStep::AskTime,
        (true, false, _) => ConversationStep::AskDate,
        (false, _, _) => ConversationStep::AskService,
    }
}

fn step_for(state: &ConversationState) -> ConversationStep {
    next_step(
        state.selected_service.is_some(),
        state.selected_date.is_some(),
        state.selected_time.is_some(),
    )
}

pub struct ConversationEngine {
    conversations: Arc<dyn ConversationStore>,
    bookings: Arc<dyn BookingStore>,
    catalog: Arc<ServiceCatalog>,
    validator: SlotValidator,
}

impl ConversationEngine {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        bookings: Arc<dyn BookingStore>,
        catalog: Arc<ServiceCatalog>,
        validator: SlotValidator,
    ) -> Self {
        Self {
            conversations,
            bookings,
            catalog,
            validator,
        }
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn validator(&self) -> &SlotValidator {
        &self.validator
    }

    pub fn handle_message(&self, user_id: &str, text: &str) -> String {
        self.handle_message_at(user_id, text, Local::now().naive_local())
    }

    /// Processes one inbound message as of `now` and returns the reply.
    /// Store failures are logged and never reach the caller.
    pub fn handle_message_at(&self, user_id: &str, text: &str, now: NaiveDateTime) -> String {
        let mut state = match self.conversations.get(user_id, now) {
            Ok(state) => state,
            Err(e) => {
                tracing::error!(error = %e, user = %user_id, "failed to load conversation, starting fresh");
                ConversationState::new(user_id, now)
            }
        };

        tracing::info!(user = %user_id, step = state.step.as_str(), "processing message");

        let previous = state.step;
        match self.process(&mut state, text.trim(), now) {
            Outcome::Reply(reply) => reply,
            Outcome::Commit(reply) => {
                if state.step != previous {
                    tracing::info!(
                        user = %user_id,
                        from = previous.as_str(),
                        to = state.step.as_str(),
                        "conversation step changed"
                    );
                }
                if let Err(e) = self.conversations.put(&mut state, now) {
                    tracing::error!(error = %e, user = %user_id, "failed to save conversation");
                }
                reply
            }
        }
    }

    fn process(&self, state: &mut ConversationState, text: &str, now: NaiveDateTime) -> Outcome {
        let lower = text.to_lowercase();

        // Global commands
        if state.step.is_idle() && intent::is_booking_trigger(text) {
            return self.restart(state);
        }
        match lower.as_str() {
            "cancel" => {
                // Outside a booking flow, CANCEL answers a reminder and
                // releases the customer's next appointment.
                let released = if state.step.is_idle() {
                    self.cancel_upcoming(&state.user_id, now)
                } else {
                    None
                };
                state.step = ConversationStep::Cancelled;
                let reply = match released {
                    Some(booking) => replies::booking_cancelled(&booking, &self.catalog),
                    None => self.prompt(state),
                };
                return Outcome::Commit(reply);
            }
            "restart" | "start" => return self.restart(state),
            "help" => return Outcome::Reply(replies::HELP.to_string()),
            _ => {}
        }

        if state.step == ConversationStep::AskService {
            return self.choose_service(state, text, now);
        }

        // Shortcuts: any step other than ASK_SERVICE may take hints directly.
        let hints = intent::extract_all(&self.catalog, text, now.date());
        if !hints.is_empty() {
            let fresh_start = state.step.is_idle();
            return self.apply_hints(state, hints, fresh_start, now);
        }

        match state.step {
            ConversationStep::Start | ConversationStep::AskService => {
                state.step = ConversationStep::AskService;
                Outcome::Commit(self.prompt(state))
            }
            ConversationStep::AskDate => match intent::extract_date(text, now.date()) {
                Some(date) => {
                    state.selected_date = Some(date);
                    state.step = ConversationStep::AskTime;
                    Outcome::Commit(self.prompt(state))
                }
                None => Outcome::Reply(replies::DATE_FORMAT_HINT.to_string()),
            },
            ConversationStep::AskTime => match intent::extract_time(text) {
                Some(time) => match self.check_slot(state.selected_date, time, now) {
                    Ok(()) => {
                        state.selected_time = Some(time);
                        state.step = ConversationStep::Confirmation;
                        Outcome::Commit(self.prompt(state))
                    }
                    Err(reason) => self.reject(state, reason, time, state.selected_date),
                },
                None => Outcome::Reply(replies::TIME_FORMAT_HINT.to_string()),
            },
            ConversationStep::Confirmation => match lower.as_str() {
                "yes" | "y" => self.confirm(state, now),
                "no" | "n" => {
                    // Declining a time keeps the service and date.
                    state.selected_time = None;
                    state.step = ConversationStep::AskTime;
                    Outcome::Commit(self.prompt(state))
                }
                _ => Outcome::Reply(self.prompt(state)),
            },
            ConversationStep::Completed | ConversationStep::Cancelled => {
                state.clear_selections();
                state.step = ConversationStep::Start;
                Outcome::Commit(replies::ACKNOWLEDGEMENT.to_string())
            }
        }
    }

    fn restart(&self, state: &mut ConversationState) -> Outcome {
        state.clear_selections();
        state.step = ConversationStep::AskService;
        Outcome::Commit(self.prompt(state))
    }

    fn choose_service(&self, state: &mut ConversationState, text: &str, now: NaiveDateTime) -> Outcome {
        if intent::is_greeting(text) {
            return Outcome::Reply(self.prompt(state));
        }

        let Some(service) = intent::extract_service(&self.catalog, text) else {
            return Outcome::Reply(replies::service_clarification(&self.catalog));
        };

        let hints = Hints {
            service: Some(service),
            date: intent::extract_date(text, now.date()),
            time: intent::extract_time(text),
        };
        self.apply_hints(state, hints, false, now)
    }

    /// Applies extracted hints and moves to the step they imply. A time is
    /// validated whenever it is new or its date changed; a rejected message
    /// leaves the conversation exactly as it was.
    fn apply_hints(
        &self,
        state: &mut ConversationState,
        hints: Hints,
        fresh_start: bool,
        now: NaiveDateTime,
    ) -> Outcome {
        let mut draft = state.clone();
        if fresh_start {
            draft.clear_selections();
        }

        let slot_changed = hints.date.is_some() || hints.time.is_some();
        if hints.service.is_some() {
            draft.selected_service = hints.service;
        }
        if hints.date.is_some() {
            draft.selected_date = hints.date;
        }
        if hints.time.is_some() {
            draft.selected_time = hints.time;
        }

        if let (Some(time), true) = (draft.selected_time, slot_changed) {
            if let Err(reason) = self.check_slot(draft.selected_date, time, now) {
                return self.reject(state, reason, time, draft.selected_date);
            }
        }

        draft.step = step_for(&draft);
        *state = draft;
        Outcome::Commit(self.prompt(state))
    }

    fn confirm(&self, state: &mut ConversationState, now: NaiveDateTime) -> Outcome {
        let (Some(service), Some(date), Some(time)) = (
            state.selected_service.clone(),
            state.selected_date,
            state.selected_time,
        ) else {
            state.step = step_for(state);
            return Outcome::Commit(self.prompt(state));
        };

        // The slot may have been taken (or passed) since it was offered.
        let existing = self.load_bookings();
        if let Err(reason) = self.validator.validate(date, time, &existing, now) {
            tracing::warn!(
                user = %state.user_id,
                reason = reason.as_str(),
                "slot no longer available at confirmation"
            );
            state.selected_time = None;
            state.step = ConversationStep::AskTime;
            return Outcome::Commit(replies::slot_rejection(reason, time, Some(date), &self.validator));
        }

        let booking = Booking::confirmed(&service, date, time, &state.user_id, now);
        match self.bookings.create(&booking) {
            Ok(()) => tracing::info!(
                booking_id = %booking.id,
                user = %state.user_id,
                service = %service,
                date = %date,
                time = %time,
                "booking confirmed"
            ),
            Err(e) => tracing::error!(error = %e, user = %state.user_id, "failed to save booking"),
        }

        state.step = ConversationStep::Completed;
        Outcome::Commit(self.prompt(state))
    }

    /// Cancels the customer's earliest confirmed booking that has not started yet.
    fn cancel_upcoming(&self, user_id: &str, now: NaiveDateTime) -> Option<Booking> {
        let upcoming = match self.bookings.for_customer(user_id) {
            Ok(bookings) => bookings
                .into_iter()
                .filter(|b| b.status == BookingStatus::Confirmed && b.starts_at() > now)
                .min_by_key(|b| b.starts_at())?,
            Err(e) => {
                tracing::error!(error = %e, user = %user_id, "failed to load customer bookings");
                return None;
            }
        };

        match self.bookings.cancel(&upcoming.id) {
            Ok(true) => {
                tracing::info!(booking_id = %upcoming.id, user = %user_id, "booking cancelled by customer");
                Some(upcoming)
            }
            Ok(false) => None,
            Err(e) => {
                tracing::error!(error = %e, booking_id = %upcoming.id, "failed to cancel booking");
                None
            }
        }
    }

    fn check_slot(
        &self,
        date: Option<NaiveDate>,
        time: NaiveTime,
        now: NaiveDateTime,
    ) -> Result<(), SlotRejection> {
        match date {
            Some(date) => self.validator.validate(date, time, &self.load_bookings(), now),
            None => self.validator.check_hours(time),
        }
    }

    fn reject(
        &self,
        state: &ConversationState,
        reason: SlotRejection,
        time: NaiveTime,
        date: Option<NaiveDate>,
    ) -> Outcome {
        tracing::warn!(
            user = %state.user_id,
            reason = reason.as_str(),
            time = %time,
            "requested slot rejected"
        );
        Outcome::Reply(replies::slot_rejection(reason, time, date, &self.validator))
    }

    fn load_bookings(&self) -> Vec<Booking> {
        self.bookings.list().unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to load bookings, treating as empty");
            Vec::new()
        })
    }

    fn prompt(&self, state: &ConversationState) -> String {
        replies::response_for(state, &self.catalog, &self.validator)
    }
}
