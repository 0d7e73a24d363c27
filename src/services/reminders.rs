//! Appointment reminders, sent once per booking shortly before it starts.

use chrono::{Duration, NaiveDateTime};

use crate::models::{Booking, BookingStatus, ServiceCatalog};
use crate::services::messaging::MessagingProvider;
use crate::services::replies::format_time;
use crate::store::BookingStore;

/// Confirmed bookings without a reminder that start in `(now, now + window]`.
pub fn due_reminders(bookings: &[Booking], now: NaiveDateTime, window: Duration) -> Vec<&Booking> {
    let horizon = now + window;
    bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Confirmed && !b.reminder_sent)
        .filter(|b| {
            let starts = b.starts_at();
            starts > now && starts <= horizon
        })
        .collect()
}

pub fn reminder_text(booking: &Booking, catalog: &ServiceCatalog) -> String {
    format!(
        "🔧 Reminder: You have a {} scheduled today at {}.\nPlease reply CANCEL if you are unable to attend.",
        catalog.display_name(&booking.service),
        format_time(booking.time)
    )
}

/// One pass over the booking store. A booking is marked only after its
/// reminder was delivered, so failed sends are retried on the next pass.
/// Returns the number of reminders sent.
pub async fn run_sweep(
    bookings: &dyn BookingStore,
    messaging: &dyn MessagingProvider,
    catalog: &ServiceCatalog,
    now: NaiveDateTime,
    window: Duration,
) -> anyhow::Result<usize> {
    let all = bookings.list()?;
    let due = due_reminders(&all, now, window);
    if due.is_empty() {
        return Ok(0);
    }

    tracing::info!(count = due.len(), "sending appointment reminders");

    let mut sent = 0;
    for booking in due {
        let text = reminder_text(booking, catalog);
        if let Err(e) = messaging.send_message(&booking.customer_phone, &text).await {
            tracing::error!(error = %e, booking_id = %booking.id, "failed to send reminder");
            continue;
        }
        match bookings.mark_reminder_sent(&booking.id) {
            Ok(_) => sent += 1,
            Err(e) => {
                tracing::error!(error = %e, booking_id = %booking.id, "failed to record reminder")
            }
        }
    }

    Ok(sent)
}
