use crate::config::AppConfig;
use crate::services::conversation::ConversationEngine;
use crate::services::messaging::MessagingProvider;
use crate::store::SqliteStore;

pub struct AppState {
    pub config: AppConfig,
    pub engine: ConversationEngine,
    pub store: SqliteStore,
    pub messaging: Box<dyn MessagingProvider>,
}
