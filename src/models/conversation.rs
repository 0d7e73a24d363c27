use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationStep {
    Start,
    AskService,
    AskDate,
    AskTime,
    Confirmation,
    Completed,
    Cancelled,
}

impl ConversationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStep::Start => "START",
            ConversationStep::AskService => "ASK_SERVICE",
            ConversationStep::AskDate => "ASK_DATE",
            ConversationStep::AskTime => "ASK_TIME",
            ConversationStep::Confirmation => "CONFIRMATION",
            ConversationStep::Completed => "COMPLETED",
            ConversationStep::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "ASK_SERVICE" => ConversationStep::AskService,
            "ASK_DATE" => ConversationStep::AskDate,
            "ASK_TIME" => ConversationStep::AskTime,
            "CONFIRMATION" => ConversationStep::Confirmation,
            "COMPLETED" => ConversationStep::Completed,
            "CANCELLED" => ConversationStep::Cancelled,
            _ => ConversationStep::Start,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationStep::Completed | ConversationStep::Cancelled)
    }

    /// `START` or a terminal step: no booking is in progress.
    pub fn is_idle(&self) -> bool {
        *self == ConversationStep::Start || self.is_terminal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationState {
    pub user_id: String,
    pub step: ConversationStep,
    pub selected_service: Option<String>,
    pub selected_date: Option<NaiveDate>,
    pub selected_time: Option<NaiveTime>,
    pub updated_at: NaiveDateTime,
}

impl ConversationState {
    pub fn new(user_id: &str, now: NaiveDateTime) -> Self {
        Self {
            user_id: user_id.to_string(),
            step: ConversationStep::Start,
            selected_service: None,
            selected_date: None,
            selected_time: None,
            updated_at: now,
        }
    }

    pub fn clear_selections(&mut self) {
        self.selected_service = None;
        self.selected_date = None;
        self.selected_time = None;
    }

    /// Untouched for longer than `ttl`; such a record counts as a fresh start.
    pub fn is_stale(&self, now: NaiveDateTime, ttl: chrono::Duration) -> bool {
        now - self.updated_at > ttl
    }
}
