use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub service: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub customer_phone: String,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub reminder_sent: bool,
}

impl Booking {
    /// A confirmed booking for the given slot with a time-ordered id.
    pub fn confirmed(
        service: &str,
        date: NaiveDate,
        time: NaiveTime,
        customer_phone: &str,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            service: service.to_string(),
            date,
            time,
            customer_phone: customer_phone.to_string(),
            status: BookingStatus::Confirmed,
            created_at: now,
            reminder_sent: false,
        }
    }

    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Whether this booking holds the (date, time) slot.
    pub fn occupies(&self, date: NaiveDate, time: NaiveTime) -> bool {
        self.status == BookingStatus::Confirmed && self.date == date && self.time == time
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Initiated,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Initiated => "initiated",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Initiated,
        }
    }
}
