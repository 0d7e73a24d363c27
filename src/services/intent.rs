use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use regex::{Captures, Regex};

use crate::models::ServiceCatalog;

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "hiya",
    "hola",
    "howdy",
    "yo",
    "greetings",
    "good morning",
    "good afternoon",
    "good evening",
];

const BOOKING_TRIGGERS: &[&str] = &["book", "booking", "appointment", "start", "restart"];

const WEEKDAYS: &[(&str, Weekday)] = &[
    ("sunday", Weekday::Sun),
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
];

const MONTHS: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

// HH:MM with optional meridiem, or HH with a mandatory one. A bare "25" never matches.
static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*(am|pm)?\b|\b(\d{1,2})\s*(am|pm)\b")
        .expect("time pattern is valid")
});

static DAY_MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\b",
    )
    .expect("day-month pattern is valid")
});

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\s+(\d{1,2})(?:st|nd|rd|th)?\b",
    )
    .expect("month-day pattern is valid")
});

static NUMERIC_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/-](\d{1,2})\b").expect("numeric date pattern is valid")
});

/// Structured pieces found in one message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hints {
    pub service: Option<String>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
}

impl Hints {
    pub fn is_empty(&self) -> bool {
        self.service.is_none() && self.date.is_none() && self.time.is_none()
    }
}

/// Time mentions are blanked out first, so the hour in "2 pm" or "3:00" is
/// never read as a numbered service.
pub fn extract_service(catalog: &ServiceCatalog, text: &str) -> Option<String> {
    let masked = TIME_RE.replace_all(text, " ");
    catalog.match_text(&masked).map(|s| s.id.clone())
}

/// Resolves a date mention against `today`. Dates that would fall before today
/// are taken to mean the next year's occurrence.
pub fn extract_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = text.to_lowercase();

    if lower.contains("today") {
        return Some(today);
    }
    if lower.contains("tomorrow") {
        return Some(today + Duration::days(1));
    }

    for (name, weekday) in WEEKDAYS {
        if lower.contains(name) {
            return Some(next_weekday(today, *weekday));
        }
    }

    if let Some(caps) = DAY_MONTH_RE.captures(&lower) {
        return month_date(&caps, 1, 2, today);
    }
    if let Some(caps) = MONTH_DAY_RE.captures(&lower) {
        return month_date(&caps, 2, 1, today);
    }

    if let Some(caps) = NUMERIC_DATE_RE.captures(&lower) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        return resolve_day_month(day, month, today);
    }

    None
}

pub fn extract_time(text: &str) -> Option<NaiveTime> {
    let caps = TIME_RE.captures(text)?;

    let (hour, minute, meridiem) = match caps.get(1) {
        Some(h) => (h.as_str(), caps.get(2).map_or("0", |m| m.as_str()), caps.get(3)),
        None => (caps.get(4)?.as_str(), "0", caps.get(5)),
    };

    let mut hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;

    match meridiem.map(|m| m.as_str().to_lowercase()).as_deref() {
        Some("pm") if hour < 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
}

pub fn extract_all(catalog: &ServiceCatalog, text: &str, today: NaiveDate) -> Hints {
    Hints {
        service: extract_service(catalog, text),
        date: extract_date(text, today),
        time: extract_time(text),
    }
}

/// "hiiii", "Hello!" and "hey 👋" all count.
pub fn is_greeting(text: &str) -> bool {
    let normalized = squeeze(strip_edges(&text.to_lowercase()));
    !normalized.is_empty() && GREETINGS.iter().any(|g| squeeze(g) == normalized)
}

/// Whether an idle conversation should (re)open the booking flow.
pub fn is_booking_trigger(text: &str) -> bool {
    if is_greeting(text) {
        return true;
    }
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .any(|token| BOOKING_TRIGGERS.contains(&token) || is_greeting(token))
}

fn strip_edges(s: &str) -> &str {
    s.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Collapses runs of the same character: "hiiii" -> "hi".
fn squeeze(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last = None;
    for c in s.chars() {
        if last != Some(c) {
            out.push(c);
        }
        last = Some(c);
    }
    out
}

fn next_weekday(today: NaiveDate, target: Weekday) -> NaiveDate {
    let current = today.weekday().num_days_from_sunday() as i64;
    let mut days = target.num_days_from_sunday() as i64 - current;
    if days <= 0 {
        days += 7;
    }
    today + Duration::days(days)
}

fn month_date(caps: &Captures, day_group: usize, month_group: usize, today: NaiveDate) -> Option<NaiveDate> {
    let day: u32 = caps[day_group].parse().ok()?;
    let month_name = caps[month_group].to_lowercase();
    let month = MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;
    resolve_day_month(day, month, today)
}

fn resolve_day_month(day: u32, month: u32, today: NaiveDate) -> Option<NaiveDate> {
    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(today.year(), month, day)?;
    if date < today {
        NaiveDate::from_ymd_opt(today.year() + 1, month, day)
    } else {
        Some(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn time(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    // 2026-10-16 is a Friday.
    fn today() -> NaiveDate {
        date("2026-10-16")
    }

    #[test]
    fn test_service_keywords() {
        let catalog = ServiceCatalog::default();
        assert_eq!(extract_service(&catalog, "I have a LEAK"), Some("plumbing".to_string()));
        assert_eq!(extract_service(&catalog, "wiring issue"), Some("electrical".to_string()));
        assert_eq!(extract_service(&catalog, "general check"), Some("inspection".to_string()));
        assert_eq!(extract_service(&catalog, "nothing relevant"), None);
    }

    #[test]
    fn test_service_numeric_shortcut_whole_token() {
        let catalog = ServiceCatalog::default();
        assert_eq!(extract_service(&catalog, "1"), Some("plumbing".to_string()));
        assert_eq!(extract_service(&catalog, " 2 "), Some("electrical".to_string()));
        assert_eq!(extract_service(&catalog, "125"), None);
        assert_eq!(extract_service(&catalog, "25/01"), None);
    }

    #[test]
    fn test_time_hour_is_not_a_service_number() {
        let catalog = ServiceCatalog::default();
        assert_eq!(extract_service(&catalog, "2 pm"), None);
        assert_eq!(extract_service(&catalog, "3:00"), None);
        assert_eq!(extract_service(&catalog, "1:30pm please"), None);
        // A number outside the time mention still picks the service.
        assert_eq!(extract_service(&catalog, "2 at 11am"), Some("electrical".to_string()));
        assert_eq!(extract_service(&catalog, "3 tomorrow 3pm"), Some("inspection".to_string()));
    }

    #[test]
    fn test_service_priority_order() {
        let catalog = ServiceCatalog::default();
        assert_eq!(
            extract_service(&catalog, "check the light and the sink"),
            Some("plumbing".to_string())
        );
    }

    #[test]
    fn test_date_today_tomorrow() {
        assert_eq!(extract_date("Today please", today()), Some(today()));
        assert_eq!(extract_date("tomorrow", today()), Some(date("2026-10-17")));
    }

    #[test]
    fn test_date_weekday_next_occurrence() {
        assert_eq!(extract_date("monday", today()), Some(date("2026-10-19")));
        assert_eq!(extract_date("Saturday", today()), Some(date("2026-10-17")));
        // Same weekday as today rolls a full week forward.
        assert_eq!(extract_date("friday", today()), Some(date("2026-10-23")));
    }

    #[test]
    fn test_date_day_month_name() {
        assert_eq!(extract_date("25 oct", today()), Some(date("2026-10-25")));
        assert_eq!(extract_date("25th October", today()), Some(date("2026-10-25")));
        assert_eq!(extract_date("1st of dec", today()), Some(date("2026-12-01")));
        assert_eq!(extract_date("nov 3rd", today()), Some(date("2026-11-03")));
    }

    #[test]
    fn test_date_month_name_in_past_rolls_to_next_year() {
        assert_eq!(extract_date("25 jan", today()), Some(date("2027-01-25")));
        assert_eq!(extract_date("15 oct", today()), Some(date("2027-10-15")));
        assert_eq!(extract_date("16 oct", today()), Some(today()));
    }

    #[test]
    fn test_date_invalid_day_rejected() {
        assert_eq!(extract_date("32 jan", today()), None);
        assert_eq!(extract_date("0 jan", today()), None);
        assert_eq!(extract_date("31 feb", today()), None);
    }

    #[test]
    fn test_date_numeric() {
        assert_eq!(extract_date("25/01", today()), Some(date("2027-01-25")));
        assert_eq!(extract_date("20-10", today()), Some(date("2026-10-20")));
        assert_eq!(extract_date("40/01", today()), None);
        assert_eq!(extract_date("10/13", today()), None);
    }

    #[test]
    fn test_date_none() {
        assert_eq!(extract_date("10am", today()), None);
        assert_eq!(extract_date("10:30", today()), None);
        assert_eq!(extract_date("whenever", today()), None);
    }

    #[test]
    fn test_time_formats() {
        assert_eq!(extract_time("10:00"), Some(time("10:00")));
        assert_eq!(extract_time("at 2:30pm"), Some(time("14:30")));
        assert_eq!(extract_time("10am"), Some(time("10:00")));
        assert_eq!(extract_time("3 PM"), Some(time("15:00")));
        assert_eq!(extract_time("12am"), Some(time("00:00")));
        assert_eq!(extract_time("12pm"), Some(time("12:00")));
        assert_eq!(extract_time("13:00pm"), Some(time("13:00")));
    }

    #[test]
    fn test_time_requires_colon_or_meridiem() {
        assert_eq!(extract_time("10"), None);
        assert_eq!(extract_time("1"), None);
        assert_eq!(extract_time("25/01"), None);
        assert_eq!(extract_time("25 jan"), None);
    }

    #[test]
    fn test_time_out_of_range() {
        assert_eq!(extract_time("25:00"), None);
        assert_eq!(extract_time("10:75"), None);
    }

    #[test]
    fn test_extract_all_full_shortcut() {
        let catalog = ServiceCatalog::default();
        let hints = extract_all(&catalog, "Plumbing tomorrow at 10am", today());
        assert_eq!(hints.service.as_deref(), Some("plumbing"));
        assert_eq!(hints.date, Some(date("2026-10-17")));
        assert_eq!(hints.time, Some(time("10:00")));
    }

    #[test]
    fn test_extract_all_date_only() {
        let catalog = ServiceCatalog::default();
        let hints = extract_all(&catalog, "25/01", today());
        assert!(hints.service.is_none());
        assert!(hints.time.is_none());
        assert_eq!(hints.date, Some(date("2027-01-25")));
        assert!(!hints.is_empty());
        assert!(extract_all(&catalog, "yes", today()).is_empty());
    }

    #[test]
    fn test_greeting() {
        assert!(is_greeting("hi"));
        assert!(is_greeting("Hiiiii"));
        assert!(is_greeting("hello!"));
        assert!(is_greeting("Heyyyy 👋"));
        assert!(is_greeting("good morning"));
        assert!(!is_greeting("this"));
        assert!(!is_greeting("plumbing"));
        assert!(!is_greeting(""));
    }

    #[test]
    fn test_booking_trigger() {
        assert!(is_booking_trigger("hi"));
        assert!(is_booking_trigger("I want to book"));
        assert!(is_booking_trigger("Appointment please"));
        assert!(is_booking_trigger("hello there"));
        assert!(!is_booking_trigger("tomorrow"));
        assert!(!is_booking_trigger("this thursday"));
        assert!(!is_booking_trigger("cancel"));
    }
}
