use tokio_rusqlite::Connection;

use crate::core::AppConfig;

pub struct AppState {
    // Credential store, refresh tokens keyed by account
    pub db: Connection,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: Connection, config: AppConfig) -> Self {
        Self { db, config }
    }
}
