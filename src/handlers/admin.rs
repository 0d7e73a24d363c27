use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::BookingStatus;
use crate::services::replies::{format_date, format_time};
use crate::state::AppState;
use crate::store::BookingStore;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct BookingResponse {
    id: String,
    service: String,
    service_name: String,
    date: String,
    time: String,
    customer_phone: String,
    status: String,
    reminder_sent: bool,
    created_at: String,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let status_filter = query.status.as_deref().map(BookingStatus::parse);

    let catalog = state.engine.catalog();
    let response = state
        .store
        .recent_bookings(status_filter, limit)?
        .into_iter()
        .map(|b| BookingResponse {
            service_name: catalog.display_name(&b.service).to_string(),
            date: format_date(b.date),
            time: format_time(b.time),
            status: b.status.as_str().to_string(),
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            id: b.id,
            service: b.service,
            customer_phone: b.customer_phone,
            reminder_sent: b.reminder_sent,
        })
        .collect();

    Ok(Json(response))
}

// POST /api/admin/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    if !state.store.cancel(&id)? {
        return Err(AppError::NotFound(format!("booking {id}")));
    }

    tracing::info!(booking_id = %id, "booking cancelled by admin");
    Ok(Json(serde_json::json!({"ok": true})))
}
