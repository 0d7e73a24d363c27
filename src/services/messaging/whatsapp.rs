use anyhow::Context;
use async_trait::async_trait;

use super::MessagingProvider;

/// WhatsApp Cloud API text sender.
pub struct WhatsAppProvider {
    api_url: String,
    api_token: String,
    phone_number_id: String,
    client: reqwest::Client,
}

impl WhatsAppProvider {
    pub fn new(api_url: String, api_token: String, phone_number_id: String) -> Self {
        Self {
            api_url,
            api_token,
            phone_number_id,
            client: reqwest::Client::new(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/messages",
            self.api_url.trim_end_matches('/'),
            self.phone_number_id
        )
    }
}

fn text_payload(to: &str, body: &str) -> serde_json::Value {
    serde_json::json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "text",
        "text": { "body": body },
    })
}

#[async_trait]
impl MessagingProvider for WhatsAppProvider {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()> {
        self.client
            .post(self.messages_url())
            .bearer_auth(&self.api_token)
            .json(&text_payload(to, body))
            .send()
            .await
            .context("failed to send WhatsApp message")?
            .error_for_status()
            .context("WhatsApp API returned error")?;

        tracing::debug!(to = %to, "WhatsApp message sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url() {
        let provider = WhatsAppProvider::new(
            "https://graph.facebook.com/v24.0/".to_string(),
            "token".to_string(),
            "12345".to_string(),
        );
        assert_eq!(
            provider.messages_url(),
            "https://graph.facebook.com/v24.0/12345/messages"
        );
    }

    #[test]
    fn test_text_payload_shape() {
        let payload = text_payload("+15550001111", "hello");
        assert_eq!(payload["messaging_product"], "whatsapp");
        assert_eq!(payload["to"], "+15550001111");
        assert_eq!(payload["type"], "text");
        assert_eq!(payload["text"]["body"], "hello");
    }
}
