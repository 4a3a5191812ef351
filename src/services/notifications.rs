use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use crate::db::queries;
use crate::models::NewNotification;
use crate::state::AppState;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, user_id: &str, notification: &NewNotification) -> anyhow::Result<()>;
}

/// Stores notifications in the recipient's inbox table.
pub struct InboxNotifier {
    db: Arc<Mutex<Connection>>,
}

impl InboxNotifier {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationSink for InboxNotifier {
    async fn send(&self, user_id: &str, notification: &NewNotification) -> anyhow::Result<()> {
        let db = self
            .db
            .lock()
            .map_err(|_| anyhow::anyhow!("database mutex poisoned"))?;
        queries::insert_notification(&db, user_id, notification)?;
        Ok(())
    }
}

/// Delivers a notification within `notification_timeout`, logging failures
/// instead of returning them.
pub async fn notify(state: &Arc<AppState>, user_id: &str, notification: NewNotification) {
    if user_id.is_empty() {
        tracing::warn!(kind = notification.kind.as_str(), "no recipient, skipping notification");
        return;
    }

    let timeout = state.config.notification_timeout;
    match tokio::time::timeout(timeout, state.notifier.send(user_id, &notification)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(
                user_id,
                kind = notification.kind.as_str(),
                error = %e,
                "failed to deliver notification"
            );
        }
        Err(_) => {
            tracing::warn!(
                user_id,
                kind = notification.kind.as_str(),
                timeout_ms = timeout.as_millis() as u64,
                "notification delivery abandoned"
            );
        }
    }
}
