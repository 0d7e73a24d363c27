use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{Booking, BookingStatus, ConversationState, ConversationStep};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str =
    "id, service, date, time, customer_phone, status, created_at, reminder_sent";

// ── Conversations ──

pub fn get_conversation(conn: &Connection, user_id: &str) -> anyhow::Result<Option<ConversationState>> {
    let row = conn
        .query_row(
            "SELECT user_id, step, selected_service, selected_date, selected_time, updated_at
             FROM conversations WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((user_id, step, service, date, time, updated_at)) = row else {
        return Ok(None);
    };

    // An unreadable selection is dropped rather than failing the whole record.
    let selected_date = date.and_then(|d| NaiveDate::parse_from_str(&d, DATE_FMT).ok());
    let selected_time = time.and_then(|t| NaiveTime::parse_from_str(&t, TIME_FMT).ok());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at, DATETIME_FMT)
        .with_context(|| format!("invalid updated_at for conversation {user_id}"))?;

    Ok(Some(ConversationState {
        user_id,
        step: ConversationStep::parse(&step),
        selected_service: service,
        selected_date,
        selected_time: selected_date.and(selected_time),
        updated_at,
    }))
}

pub fn save_conversation(conn: &Connection, state: &ConversationState) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO conversations (user_id, step, selected_service, selected_date, selected_time, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(user_id) DO UPDATE SET
           step = excluded.step,
           selected_service = excluded.selected_service,
           selected_date = excluded.selected_date,
           selected_time = excluded.selected_time,
           updated_at = excluded.updated_at",
        params![
            state.user_id,
            state.step.as_str(),
            state.selected_service,
            state.selected_date.map(|d| d.format(DATE_FMT).to_string()),
            state.selected_time.map(|t| t.format(TIME_FMT).to_string()),
            state.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, service, date, time, customer_phone, status, created_at, reminder_sent)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            booking.id,
            booking.service,
            booking.date.format(DATE_FMT).to_string(),
            booking.time.format(TIME_FMT).to_string(),
            booking.customer_phone,
            booking.status.as_str(),
            booking.created_at.format(DATETIME_FMT).to_string(),
            booking.reminder_sent,
        ],
    )?;
    Ok(())
}

pub fn get_all_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY date ASC, time ASC, created_at ASC"
    ))?;
    let rows = stmt.query_map([], |row| Ok(parse_booking_row(row)))?;
    collect_bookings(rows)
}

/// Newest appointments first, optionally filtered by status.
pub fn list_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE ?1 IS NULL OR status = ?1
         ORDER BY date DESC, time DESC LIMIT ?2"
    ))?;
    let rows = stmt.query_map(
        params![status_filter.map(|s| s.as_str()), limit],
        |row| Ok(parse_booking_row(row)),
    )?;
    collect_bookings(rows)
}

pub fn get_bookings_for_phone(conn: &Connection, phone: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE customer_phone = ?1 ORDER BY date ASC, time ASC"
    ))?;
    let rows = stmt.query_map(params![phone], |row| Ok(parse_booking_row(row)))?;
    collect_bookings(rows)
}

pub fn cancel_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2 AND status != ?1",
        params![BookingStatus::Cancelled.as_str(), id],
    )?;
    Ok(count > 0)
}

pub fn mark_reminder_sent(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET reminder_sent = 1 WHERE id = ?1",
        params![id],
    )?;
    Ok(count > 0)
}

fn collect_bookings(
    rows: impl Iterator<Item = rusqlite::Result<anyhow::Result<Booking>>>,
) -> anyhow::Result<Vec<Booking>> {
    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let date: String = row.get(2)?;
    let time: String = row.get(3)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(6)?;

    Ok(Booking {
        service: row.get(1)?,
        date: NaiveDate::parse_from_str(&date, DATE_FMT)
            .with_context(|| format!("invalid date for booking {id}"))?,
        time: NaiveTime::parse_from_str(&time, TIME_FMT)
            .with_context(|| format!("invalid time for booking {id}"))?,
        customer_phone: row.get(4)?,
        status: BookingStatus::parse(&status),
        created_at: NaiveDateTime::parse_from_str(&created_at, DATETIME_FMT)
            .with_context(|| format!("invalid created_at for booking {id}"))?,
        reminder_sent: row.get(7)?,
        id,
    })
}
