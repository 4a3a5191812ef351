use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::calendar::CalendarProvider;
use crate::services::notifications::NotificationSink;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub notifier: Box<dyn NotificationSink>,
    pub calendar: Box<dyn CalendarProvider>,
}

impl AppState {
    /// Locks the shared connection. Never hold the guard across an `.await`.
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Storage(anyhow::anyhow!("database mutex poisoned")))
    }
}
