use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::models::Booking;

/// Daily bookable window with fixed slot granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    open_minute: u32,
    close_minute: u32,
    slot_minutes: u32,
}

impl WorkingHours {
    /// `None` unless `open_hour < close_hour <= 24` and the slot length is positive.
    pub fn new(open_hour: u32, close_hour: u32, slot_minutes: u32) -> Option<Self> {
        if open_hour >= close_hour || close_hour > 24 || slot_minutes == 0 {
            return None;
        }
        Some(Self {
            open_minute: open_hour * 60,
            close_minute: close_hour * 60,
            slot_minutes,
        })
    }

    /// "09:00 - 17:00"
    pub fn describe(&self) -> String {
        format!(
            "{:02}:{:02} - {:02}:{:02}",
            self.open_minute / 60,
            self.open_minute % 60,
            self.close_minute / 60,
            self.close_minute % 60
        )
    }
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            open_minute: 9 * 60,
            close_minute: 17 * 60,
            slot_minutes: 60,
        }
    }
}

/// Why a candidate slot cannot be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SlotRejection {
    #[error("outside working hours")]
    OutsideWorkingHours,
    #[error("time has already passed")]
    PastTime,
    #[error("slot is already booked")]
    AlreadyBooked,
}

impl SlotRejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotRejection::OutsideWorkingHours => "OUTSIDE_WORKING_HOURS",
            SlotRejection::PastTime => "PAST_TIME",
            SlotRejection::AlreadyBooked => "ALREADY_BOOKED",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SlotValidator {
    hours: WorkingHours,
}

impl SlotValidator {
    pub fn new(hours: WorkingHours) -> Self {
        Self { hours }
    }

    pub fn hours(&self) -> &WorkingHours {
        &self.hours
    }

    /// The day's menu of start times. Existing bookings are not consulted.
    pub fn available_slots(&self, _date: NaiveDate) -> Vec<NaiveTime> {
        self.daily_slots()
    }

    /// Start times of every working day.
    pub fn daily_slots(&self) -> Vec<NaiveTime> {
        (self.hours.open_minute..self.hours.close_minute)
            .step_by(self.hours.slot_minutes as usize)
            .filter_map(|m| NaiveTime::from_hms_opt(m / 60, m % 60, 0))
            .collect()
    }

    /// Working-hours check alone, for a time whose date is not known yet.
    pub fn check_hours(&self, time: NaiveTime) -> Result<(), SlotRejection> {
        let minute = time.hour() * 60 + time.minute();
        let on_grid = time.second() == 0
            && minute >= self.hours.open_minute
            && minute < self.hours.close_minute
            && (minute - self.hours.open_minute) % self.hours.slot_minutes == 0;

        if on_grid {
            Ok(())
        } else {
            Err(SlotRejection::OutsideWorkingHours)
        }
    }

    /// Checks run in a fixed order: working hours, then past time, then occupancy.
    pub fn validate(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        existing: &[Booking],
        now: NaiveDateTime,
    ) -> Result<(), SlotRejection> {
        self.check_hours(time)?;

        let today = now.date();
        if date < today || (date == today && time <= now.time()) {
            return Err(SlotRejection::PastTime);
        }

        if existing.iter().any(|b| b.occupies(date, time)) {
            return Err(SlotRejection::AlreadyBooked);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn booking(d: &str, t: &str, status: BookingStatus) -> Booking {
        let mut b = Booking::confirmed("plumbing", date(d), time(t), "+15551110000", dt("2026-10-01 12:00"));
        b.status = status;
        b
    }

    #[test]
    fn test_default_slots() {
        let validator = SlotValidator::default();
        let slots = validator.available_slots(date("2026-10-17"));
        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0], time("09:00"));
        assert_eq!(slots[7], time("16:00"));
    }

    #[test]
    fn test_custom_hours_and_granularity() {
        let validator = SlotValidator::new(WorkingHours::new(8, 10, 30).unwrap());
        let slots = validator.available_slots(date("2026-10-17"));
        assert_eq!(slots, vec![time("08:00"), time("08:30"), time("09:00"), time("09:30")]);
    }

    #[test]
    fn test_invalid_hours_rejected() {
        assert!(WorkingHours::new(17, 9, 60).is_none());
        assert!(WorkingHours::new(9, 25, 60).is_none());
        assert!(WorkingHours::new(9, 17, 0).is_none());
    }

    #[test]
    fn test_describe() {
        assert_eq!(WorkingHours::default().describe(), "09:00 - 17:00");
    }

    #[test]
    fn test_valid_future_slot() {
        let validator = SlotValidator::default();
        let now = dt("2026-10-16 08:00");
        assert!(validator.validate(date("2026-10-17"), time("09:00"), &[], now).is_ok());
        assert!(validator.validate(date("2026-10-16"), time("10:00"), &[], now).is_ok());
    }

    #[test]
    fn test_outside_working_hours() {
        let validator = SlotValidator::default();
        let now = dt("2026-10-16 08:00");
        for t in ["08:00", "17:00", "20:00", "10:30"] {
            assert_eq!(
                validator.validate(date("2026-10-17"), time(t), &[], now),
                Err(SlotRejection::OutsideWorkingHours),
                "{t}"
            );
        }
    }

    #[test]
    fn test_past_time_today() {
        let validator = SlotValidator::default();
        let now = dt("2026-10-16 12:00");
        assert_eq!(
            validator.validate(date("2026-10-16"), time("11:00"), &[], now),
            Err(SlotRejection::PastTime)
        );
        // Current hour is not strictly in the future.
        assert_eq!(
            validator.validate(date("2026-10-16"), time("12:00"), &[], now),
            Err(SlotRejection::PastTime)
        );
        assert!(validator.validate(date("2026-10-16"), time("13:00"), &[], now).is_ok());
    }

    #[test]
    fn test_past_date() {
        let validator = SlotValidator::default();
        let now = dt("2026-10-16 08:00");
        assert_eq!(
            validator.validate(date("2026-10-15"), time("10:00"), &[], now),
            Err(SlotRejection::PastTime)
        );
    }

    #[test]
    fn test_already_booked() {
        let validator = SlotValidator::default();
        let now = dt("2026-10-16 08:00");
        let existing = vec![booking("2026-10-17", "09:00", BookingStatus::Confirmed)];
        assert_eq!(
            validator.validate(date("2026-10-17"), time("09:00"), &existing, now),
            Err(SlotRejection::AlreadyBooked)
        );
        assert!(validator.validate(date("2026-10-17"), time("10:00"), &existing, now).is_ok());
        assert!(validator.validate(date("2026-10-18"), time("09:00"), &existing, now).is_ok());
    }

    #[test]
    fn test_cancelled_and_initiated_do_not_block() {
        let validator = SlotValidator::default();
        let now = dt("2026-10-16 08:00");
        let existing = vec![
            booking("2026-10-17", "09:00", BookingStatus::Cancelled),
            booking("2026-10-17", "09:00", BookingStatus::Initiated),
        ];
        assert!(validator.validate(date("2026-10-17"), time("09:00"), &existing, now).is_ok());
    }

    #[test]
    fn test_hours_checked_before_occupancy() {
        let validator = SlotValidator::default();
        let now = dt("2026-10-16 12:00");
        let existing = vec![
            booking("2026-10-17", "18:00", BookingStatus::Confirmed),
            booking("2026-10-16", "10:00", BookingStatus::Confirmed),
        ];
        assert_eq!(
            validator.validate(date("2026-10-17"), time("18:00"), &existing, now),
            Err(SlotRejection::OutsideWorkingHours)
        );
        assert_eq!(
            validator.validate(date("2026-10-16"), time("10:00"), &existing, now),
            Err(SlotRejection::PastTime)
        );
    }

    #[test]
    fn test_empty_bookings_valid_iff_menu_slot_and_future() {
        let validator = SlotValidator::default();
        let now = dt("2026-10-16 11:30");
        let today = date("2026-10-16");
        let tomorrow = date("2026-10-17");
        for hour in 0..24 {
            let t = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
            let on_menu = validator.available_slots(today).contains(&t);
            assert_eq!(validator.validate(tomorrow, t, &[], now).is_ok(), on_menu);
            assert_eq!(
                validator.validate(today, t, &[], now).is_ok(),
                on_menu && t > now.time()
            );
        }
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(SlotRejection::OutsideWorkingHours.as_str(), "OUTSIDE_WORKING_HOURS");
        assert_eq!(SlotRejection::PastTime.as_str(), "PAST_TIME");
        assert_eq!(SlotRejection::AlreadyBooked.as_str(), "ALREADY_BOOKED");
    }
}
