use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use tracing_subscriber::EnvFilter;

use garage_booking::config::AppConfig;
use garage_booking::db;
use garage_booking::errors::AppError;
use garage_booking::models::ServiceCatalog;
use garage_booking::services::conversation::ConversationEngine;
use garage_booking::services::messaging::whatsapp::WhatsAppProvider;
use garage_booking::services::reminders;
use garage_booking::services::scheduling::SlotValidator;
use garage_booking::state::AppState;
use garage_booking::store::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    if config.whatsapp_api_token.is_empty() || config.whatsapp_phone_number_id.is_empty() {
        return Err(AppError::Config(
            "WHATSAPP_API_TOKEN and WHATSAPP_PHONE_NUMBER_ID must be set".to_string(),
        )
        .into());
    }
    if config.whatsapp_verify_token.is_empty() {
        tracing::warn!("WHATSAPP_VERIFY_TOKEN is not set, webhook verification will fail");
    }

    let catalog = match &config.services_file {
        Some(path) => {
            tracing::info!("loading service catalog from {path}");
            ServiceCatalog::load(path)?
        }
        None => ServiceCatalog::default(),
    };
    tracing::info!(services = catalog.services().len(), "service catalog ready");

    let conn = db::init_db(&config.database_url)?;
    let store = SqliteStore::new(Arc::new(Mutex::new(conn))).with_ttl(config.conversation_ttl());

    let hours = config.working_hours();
    tracing::info!("working hours {}", hours.describe());

    let engine = ConversationEngine::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(catalog),
        SlotValidator::new(hours),
    );

    let messaging = WhatsAppProvider::new(
        config.whatsapp_api_url.clone(),
        config.whatsapp_api_token.clone(),
        config.whatsapp_phone_number_id.clone(),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        engine,
        store,
        messaging: Box::new(messaging),
    });

    tokio::spawn(reminder_loop(Arc::clone(&state)));

    let app = garage_booking::build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn reminder_loop(state: Arc<AppState>) {
    let period = Duration::from_secs(state.config.reminder_interval_secs.max(1));
    tracing::info!(
        every_secs = period.as_secs(),
        window_minutes = state.config.reminder_window_minutes,
        "reminder sweep scheduled"
    );

    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        let now = Local::now().naive_local();
        match reminders::run_sweep(
            &state.store,
            state.messaging.as_ref(),
            state.engine.catalog(),
            now,
            state.config.reminder_window(),
        )
        .await
        {
            Ok(0) => {}
            Ok(sent) => tracing::info!(sent, "reminders sent"),
            Err(e) => tracing::error!(error = %e, "reminder sweep failed"),
        }
    }
}
