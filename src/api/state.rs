use chrono::{DateTime, Utc};
use tokio_rusqlite::Connection;

use crate::core::AppConfig;

pub struct AppState {
    pub db: Connection,
    pub config: AppConfig,
    // Only mail received on or after this instant is fetched. Day
    // granularity in practice, the Gmail query syntax can't do better.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: Connection, config: AppConfig) -> Self {
        Self {
            db,
            config,
            started_at: Utc::now(),
        }
    }
}
