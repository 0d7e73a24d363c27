use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

use super::webhook;

#[derive(Deserialize)]
pub struct DevMessage {
    pub from_phone: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct DevResponse {
    pub reply: String,
}

/// Runs a message through the engine and returns the reply instead of
/// sending it over WhatsApp.
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DevMessage>,
) -> Response {
    let from = payload.from_phone.trim();
    if from.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "from_phone is required"})),
        )
            .into_response();
    }

    match webhook::run_engine(Arc::clone(&state), from.to_string(), payload.message).await {
        Ok(reply) => Json(DevResponse { reply }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "conversation processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "conversation processing failed"})),
            )
                .into_response()
        }
    }
}
