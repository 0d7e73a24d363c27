use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::state::AppState;

#[derive(Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

// GET /webhook
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Response {
    let expected = state.config.whatsapp_verify_token.as_str();
    match (query.mode.as_deref(), query.verify_token.as_deref(), query.challenge) {
        (Some("subscribe"), Some(token), Some(challenge))
            if !expected.is_empty() && token == expected =>
        {
            tracing::info!("webhook verified");
            (StatusCode::OK, challenge).into_response()
        }
        _ => {
            tracing::warn!("webhook verification failed");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

// WhatsApp Cloud API notification, reduced to the fields we read.

#[derive(Deserialize, Default)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Deserialize)]
pub struct Change {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Deserialize, Default)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

#[derive(Deserialize)]
pub struct InboundMessage {
    pub from: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub text: Option<TextBody>,
}

#[derive(Deserialize)]
pub struct TextBody {
    pub body: String,
}

impl WebhookPayload {
    /// Sender and body of the first message of the first change, when it is text.
    pub fn first_text(&self) -> Option<(&str, &str)> {
        let message = self.entry.first()?.changes.first()?.value.messages.first()?;
        if message.kind != "text" {
            return None;
        }
        let body = message.text.as_ref()?.body.as_str();
        Some((message.from.as_str(), body))
    }
}

// POST /webhook
pub async fn receive(State(state): State<Arc<AppState>>, body: Bytes) -> StatusCode {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable webhook payload");
            return StatusCode::OK;
        }
    };

    // Status updates and non-text messages are acknowledged and ignored.
    let Some((from, text)) = payload.first_text() else {
        tracing::debug!("webhook without a text message");
        return StatusCode::OK;
    };
    let (from, text) = (from.to_string(), text.to_string());

    tracing::info!(from = %from, body = %text, "incoming WhatsApp message");

    let reply = match run_engine(Arc::clone(&state), from.clone(), text).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, from = %from, "conversation processing failed");
            return StatusCode::OK;
        }
    };

    if let Err(e) = state.messaging.send_message(&from, &reply).await {
        tracing::error!(error = %e, to = %from, "failed to send reply");
    }

    StatusCode::OK
}

/// The engine talks to SQLite synchronously, so it runs on the blocking pool.
pub(crate) async fn run_engine(
    state: Arc<AppState>,
    from: String,
    text: String,
) -> Result<String, tokio::task::JoinError> {
    tokio::task::spawn_blocking(move || state.engine.handle_message(&from, &text)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text_message() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "1",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "messages": [{
                            "from": "15550001111",
                            "id": "wamid.1",
                            "type": "text",
                            "text": { "body": "hi" }
                        }]
                    }
                }]
            }]
        }))
        .unwrap();
        assert_eq!(payload.first_text(), Some(("15550001111", "hi")));
    }

    #[test]
    fn test_status_update_has_no_text() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "entry": [{ "changes": [{ "value": { "statuses": [{ "status": "read" }] } }] }]
        }))
        .unwrap();
        assert_eq!(payload.first_text(), None);
    }

    #[test]
    fn test_image_message_ignored() {
        let payload: WebhookPayload = serde_json::from_value(serde_json::json!({
            "entry": [{ "changes": [{ "value": { "messages": [{
                "from": "15550001111",
                "type": "image",
                "image": { "id": "media-1" }
            }] } }] }]
        }))
        .unwrap();
        assert_eq!(payload.first_text(), None);
    }
}
