use sqlx::SqlitePool;

use crate::whatsapp::WhatsAppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub whatsapp: WhatsAppConfig,
    /// Shared outbound HTTP client for the messaging provider.
    pub http: reqwest::Client,
}
