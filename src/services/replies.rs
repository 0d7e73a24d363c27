//! Outbound message templates. Everything here is a pure function of the
//! conversation state, the catalog and the validator's slot menu.

use chrono::{NaiveDate, NaiveTime};

use crate::models::{Booking, ConversationState, ConversationStep, ServiceCatalog};
use crate::services::scheduling::{SlotRejection, SlotValidator};

const SLOTS_SHOWN: usize = 3;

pub const HELP: &str = "I can help you book an appointment. You can say 'Restart' to start over or 'Cancel' to stop.";

pub const ACKNOWLEDGEMENT: &str = "No problem 👍\nLet me know if you'd like to book another time.";

pub const DATE_FORMAT_HINT: &str =
    "Sorry, I didn't catch that date. You can say 'Tomorrow', 'Monday', or a date like '25/01'.";

pub const TIME_FORMAT_HINT: &str = "Please reply with a valid time (e.g., 10:00, 2pm).";

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// The prompt for the step the conversation is in.
pub fn response_for(
    state: &ConversationState,
    catalog: &ServiceCatalog,
    validator: &SlotValidator,
) -> String {
    match state.step {
        ConversationStep::AskService => format!(
            "Hi 👋\nI can help you book an appointment.\n\nWhat service do you need?\n{}\n\nReply with the number.",
            catalog.prompt_list()
        ),
        ConversationStep::AskDate => format!(
            "Great 👍\nWhen would you like to book {}?\n\nYou can reply like:\n• Today\n• Tomorrow\n• 25 Jan",
            service_name(state, catalog)
        ),
        ConversationStep::AskTime => format!(
            "Perfect.\n\n{}\n\nReply with a time.",
            slot_listing(validator, state.selected_date)
        ),
        ConversationStep::Confirmation => format!(
            "Please confirm your booking 👇\n\nService: {}\nDate: {}\nTime: {}\n\nReply YES to confirm or NO to choose another time.",
            service_name(state, catalog),
            state.selected_date.map(format_date).unwrap_or_else(|| "not set".to_string()),
            state.selected_time.map(format_time).unwrap_or_else(|| "not set".to_string()),
        ),
        ConversationStep::Completed => format!(
            "✅ Your appointment is confirmed!\n\nWe'll see you on {} at {}.\nThank you 😊",
            state.selected_date.map(format_date).unwrap_or_default(),
            state.selected_time.map(format_time).unwrap_or_default(),
        ),
        ConversationStep::Start | ConversationStep::Cancelled => ACKNOWLEDGEMENT.to_string(),
    }
}

pub fn service_clarification(catalog: &ServiceCatalog) -> String {
    format!(
        "Sorry, I didn't catch that 😊\nPlease reply with:\n{}",
        catalog.prompt_list()
    )
}

pub fn booking_cancelled(booking: &Booking, catalog: &ServiceCatalog) -> String {
    format!(
        "Your {} appointment on {} at {} has been cancelled.\nLet me know if you'd like to book another time.",
        catalog.display_name(&booking.service),
        format_date(booking.date),
        format_time(booking.time)
    )
}

/// Reason-specific reply for a rejected time, with the day's menu to pick from.
pub fn slot_rejection(
    reason: SlotRejection,
    time: NaiveTime,
    date: Option<NaiveDate>,
    validator: &SlotValidator,
) -> String {
    let time = format_time(time);
    let when = match date {
        Some(d) => format!("{time} on {}", format_date(d)),
        None => time.clone(),
    };
    let listing = slot_listing(validator, date);

    match reason {
        SlotRejection::OutsideWorkingHours => format!(
            "Sorry, {time} is outside our working hours ({}).\n\n{listing}\n\nPlease choose a time within working hours.",
            validator.hours().describe()
        ),
        SlotRejection::PastTime => format!(
            "Sorry, {when} has already passed.\n\n{listing}\n\nPlease choose a later time."
        ),
        SlotRejection::AlreadyBooked => format!(
            "Sorry, {when} is already booked.\n\n{listing}\n\nPlease choose a different time."
        ),
    }
}

fn service_name<'a>(state: &'a ConversationState, catalog: &'a ServiceCatalog) -> &'a str {
    state
        .selected_service
        .as_deref()
        .map(|id| catalog.display_name(id))
        .unwrap_or("your appointment")
}

fn slot_listing(validator: &SlotValidator, date: Option<NaiveDate>) -> String {
    let slots = match date {
        Some(d) => validator.available_slots(d),
        None => validator.daily_slots(),
    };
    let mut lines: Vec<String> = slots
        .iter()
        .take(SLOTS_SHOWN)
        .map(|s| format!("• {}", format_time(*s)))
        .collect();
    if slots.len() > SLOTS_SHOWN {
        lines.push("...".to_string());
    }

    let heading = match date {
        Some(d) => format!("Available time slots on {}:", format_date(d)),
        None => "Available time slots:".to_string(),
    };
    format!("{heading}\n{}", lines.join("\n"))
}
