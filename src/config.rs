use std::env;

use chrono::Duration;

use crate::services::scheduling::WorkingHours;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub whatsapp_api_url: String,
    pub whatsapp_api_token: String,
    pub whatsapp_phone_number_id: String,
    pub whatsapp_verify_token: String,
    pub services_file: Option<String>,
    pub open_hour: u32,
    pub close_hour: u32,
    pub slot_minutes: u32,
    pub reminder_window_minutes: i64,
    pub reminder_interval_secs: u64,
    pub conversation_ttl_hours: i64,
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: parsed_or("PORT", 3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "garage.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            whatsapp_api_url: env::var("WHATSAPP_API_URL")
                .unwrap_or_else(|_| "https://graph.facebook.com/v24.0".to_string()),
            whatsapp_api_token: env::var("WHATSAPP_API_TOKEN").unwrap_or_default(),
            whatsapp_phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID").unwrap_or_default(),
            whatsapp_verify_token: env::var("WHATSAPP_VERIFY_TOKEN").unwrap_or_default(),
            services_file: env::var("SERVICES_FILE").ok().filter(|p| !p.trim().is_empty()),
            open_hour: parsed_or("OPEN_HOUR", 9),
            close_hour: parsed_or("CLOSE_HOUR", 17),
            slot_minutes: parsed_or("SLOT_MINUTES", 60),
            reminder_window_minutes: parsed_or("REMINDER_WINDOW_MINUTES", 60),
            reminder_interval_secs: parsed_or("REMINDER_INTERVAL_SECS", 300),
            conversation_ttl_hours: parsed_or("CONVERSATION_TTL_HOURS", 24),
        }
    }

    /// Falls back to 09:00-17:00 in hourly slots when the configured values
    /// do not describe a valid day.
    pub fn working_hours(&self) -> WorkingHours {
        WorkingHours::new(self.open_hour, self.close_hour, self.slot_minutes).unwrap_or_else(|| {
            tracing::warn!(
                open = self.open_hour,
                close = self.close_hour,
                slot = self.slot_minutes,
                "invalid working hours, using defaults"
            );
            WorkingHours::default()
        })
    }

    pub fn reminder_window(&self) -> Duration {
        Duration::minutes(self.reminder_window_minutes)
    }

    pub fn conversation_ttl(&self) -> Duration {
        Duration::hours(self.conversation_ttl_hours)
    }
}
