//! Terminal simulator: talk to the booking engine as a single phone number.

use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use garage_booking::config::AppConfig;
use garage_booking::db;
use garage_booking::models::ServiceCatalog;
use garage_booking::services::conversation::ConversationEngine;
use garage_booking::services::scheduling::SlotValidator;
use garage_booking::store::SqliteStore;

const SIMULATED_PHONE: &str = "1234567890";

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Logs go to stderr and stay quiet unless asked for, so the dialogue stays readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();

    let config = AppConfig::from_env();
    let catalog = match &config.services_file {
        Some(path) => ServiceCatalog::load(path)?,
        None => ServiceCatalog::default(),
    };

    let conn = db::init_db(&config.database_url)?;
    let store = SqliteStore::new(Arc::new(Mutex::new(conn))).with_ttl(config.conversation_ttl());
    let engine = ConversationEngine::new(
        Arc::new(store.clone()),
        Arc::new(store),
        Arc::new(catalog),
        SlotValidator::new(config.working_hours()),
    );

    println!("--- WhatsApp Booking Simulation ---");
    println!("Type 'start' to begin, or just say 'hi'.");
    println!("Type 'exit' to quit simulation.");
    println!("-----------------------------------");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        let reply = engine.handle_message(SIMULATED_PHONE, &line);
        println!("\nBot:\n{reply}\n");
    }

    Ok(())
}
