pub mod google;
pub mod ics;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;

use crate::db::queries;
use crate::models::{Appointment, CalendarConnection};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl CalendarEvent {
    pub fn for_appointment(appointment: &Appointment, default_minutes: i64) -> Self {
        Self {
            summary: format!("{} - {}", appointment.customer_name, appointment.service_name),
            description: format!(
                "Service: {}\nPrice: {:.2}\nPhone: {}",
                appointment.service_name, appointment.price, appointment.customer_phone
            ),
            start: appointment.starts_at,
            end: appointment.ends_at(default_minutes),
        }
    }
}

/// Display text is what the vendor sees when a sync does not go through.
#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("Calendar not connected")]
    NotConnected,

    #[error("Calendar authorization expired. Please reconnect your calendar.")]
    AuthExpired,

    #[error("Calendar sync timed out after {0:?}")]
    Timeout(Duration),

    #[error("Calendar sync failed: {0}")]
    Provider(String),
}

#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Inserts `event` into the connected calendar and returns the provider's event id.
    async fn insert_event(
        &self,
        credentials: &CalendarConnection,
        event: &CalendarEvent,
    ) -> Result<String, CalendarError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl SyncOutcome {
    fn synced(event_id: String) -> Self {
        Self {
            success: true,
            error: None,
            event_id: Some(event_id),
        }
    }

    fn failed(error: &CalendarError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            event_id: None,
        }
    }
}

/// Pushes `appointment` to the vendor's connected calendar, waiting at most
/// `calendar_sync_timeout`. Never fails: every problem is logged and reported
/// in the returned outcome.
pub async fn sync_appointment(
    state: &Arc<AppState>,
    appointment: &Appointment,
    now: NaiveDateTime,
) -> SyncOutcome {
    if let Some(event_id) = &appointment.calendar_event_id {
        tracing::debug!(appointment_id = %appointment.id, "appointment already synced");
        return SyncOutcome::synced(event_id.clone());
    }

    let connection = state
        .db()
        .and_then(|db| Ok(queries::get_calendar_connection(&db, &appointment.vendor_id)?));

    let connection = match connection {
        Ok(Some(c)) => c,
        Ok(None) => {
            tracing::debug!(vendor_id = %appointment.vendor_id, "no calendar connected, skipping sync");
            return SyncOutcome::failed(&CalendarError::NotConnected);
        }
        Err(e) => {
            tracing::error!(vendor_id = %appointment.vendor_id, error = %e, "failed to load calendar connection");
            return SyncOutcome::failed(&CalendarError::Provider(e.to_string()));
        }
    };

    let event = CalendarEvent::for_appointment(appointment, state.config.default_appointment_minutes);
    let timeout = state.config.calendar_sync_timeout;

    let event_id = match tokio::time::timeout(timeout, state.calendar.insert_event(&connection, &event)).await {
        Ok(Ok(id)) => id,
        Ok(Err(e)) => {
            tracing::warn!(appointment_id = %appointment.id, error = %e, "calendar sync failed");
            return SyncOutcome::failed(&e);
        }
        Err(_) => {
            let e = CalendarError::Timeout(timeout);
            tracing::warn!(appointment_id = %appointment.id, error = %e, "calendar sync abandoned");
            return SyncOutcome::failed(&e);
        }
    };

    let recorded = state.db().and_then(|db| {
        Ok(queries::mark_calendar_synced(
            &db,
            &appointment.vendor_id,
            &appointment.id,
            &event_id,
            &now,
        )?)
    });
    if let Err(e) = recorded {
        tracing::error!(
            appointment_id = %appointment.id,
            event_id = %event_id,
            error = %e,
            "calendar event created but not recorded on appointment"
        );
    }

    tracing::info!(appointment_id = %appointment.id, event_id = %event_id, "appointment synced to calendar");
    SyncOutcome::synced(event_id)
}
