use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::notification::{CUSTOMER_BOOKINGS_LINK, VENDOR_BOOKINGS_LINK};
use crate::models::{Appointment, AppointmentStatus, NewNotification, NotificationKind};
use crate::services::calendar::{self, SyncOutcome};
use crate::services::notifications::notify;
use crate::state::AppState;

/// Party performing a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Vendor,
    Customer,
}

/// The vendor is whoever presents the vendor's id; everyone else, including an
/// unidentified caller, is treated as the customer.
pub fn attribute(caller_id: Option<&str>, vendor_id: &str) -> Actor {
    match caller_id {
        Some(id) if id == vendor_id => Actor::Vendor,
        _ => Actor::Customer,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub success: bool,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncOutcome>,
}

/// Moves an appointment to `next`, then runs that transition's side effects.
///
/// The new status is durable before any notification or calendar sync is
/// attempted, and neither can undo it.
pub async fn update_appointment_status(
    state: &Arc<AppState>,
    appointment_id: &str,
    vendor_id: &str,
    caller_id: Option<&str>,
    next: AppointmentStatus,
    now: NaiveDateTime,
) -> Result<StatusUpdate, AppError> {
    let mut appointment = {
        let db = state.db()?;
        queries::get_appointment(&db, vendor_id, appointment_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("appointment {appointment_id}")))?;

    let from = appointment.status;
    if !from.can_transition_to(next) {
        return Err(AppError::InvalidStateTransition { from, to: next });
    }

    let actor = attribute(caller_id, vendor_id);
    authorize(actor, caller_id, &appointment, next)?;

    let updated = {
        let db = state.db()?;
        if queries::update_appointment_status(&db, vendor_id, appointment_id, from, next, &now)? {
            None
        } else {
            // Someone else changed the status since it was read.
            Some(queries::get_appointment(&db, vendor_id, appointment_id)?.map(|a| a.status))
        }
    };
    match updated {
        None => {}
        Some(Some(current)) => {
            tracing::info!(
                appointment_id,
                vendor_id,
                expected = from.as_str(),
                current = current.as_str(),
                "status changed concurrently, rejecting update"
            );
            return Err(AppError::InvalidStateTransition {
                from: current,
                to: next,
            });
        }
        Some(None) => return Err(AppError::NotFound(format!("appointment {appointment_id}"))),
    }
    appointment.status = next;
    appointment.updated_at = now;

    tracing::info!(
        appointment_id,
        vendor_id,
        from = from.as_str(),
        to = next.as_str(),
        actor = ?actor,
        "appointment status changed"
    );

    let sync = match next {
        AppointmentStatus::Confirmed => {
            notify(state, &appointment.customer_id, confirmed_notice(&appointment)).await;
            Some(calendar::sync_appointment(state, &appointment, now).await)
        }
        AppointmentStatus::Declined => {
            notify(state, &appointment.customer_id, declined_notice(&appointment)).await;
            None
        }
        AppointmentStatus::Cancelled => {
            let (recipient, notice) = match actor {
                Actor::Vendor => (&appointment.customer_id, cancelled_by_vendor_notice(&appointment)),
                Actor::Customer => (&appointment.vendor_id, cancelled_by_customer_notice(&appointment)),
            };
            notify(state, recipient, notice).await;
            None
        }
        AppointmentStatus::Completed | AppointmentStatus::Pending => None,
    };

    Ok(StatusUpdate {
        success: true,
        status: next,
        sync,
    })
}

fn authorize(
    actor: Actor,
    caller_id: Option<&str>,
    appointment: &Appointment,
    next: AppointmentStatus,
) -> Result<(), AppError> {
    if next != AppointmentStatus::Cancelled {
        if actor != Actor::Vendor {
            return Err(AppError::Forbidden(format!(
                "only the vendor can mark an appointment {next}"
            )));
        }
        return Ok(());
    }

    // Either party may cancel. An unidentified caller still may; only a known
    // third party is refused.
    match (actor, caller_id) {
        (Actor::Customer, Some(id)) if id != appointment.customer_id => Err(AppError::Forbidden(
            "only the vendor or the customer can cancel this appointment".to_string(),
        )),
        _ => Ok(()),
    }
}

fn when(appointment: &Appointment) -> String {
    format!(
        "{} at {}",
        appointment.starts_at.format("%Y-%m-%d"),
        appointment.starts_at.format("%H:%M")
    )
}

fn confirmed_notice(appointment: &Appointment) -> NewNotification {
    NewNotification {
        title: "Appointment Confirmed".to_string(),
        message: format!(
            "Your appointment for {} on {} has been confirmed.",
            appointment.service_name,
            when(appointment)
        ),
        kind: NotificationKind::AppointmentConfirmed,
        link: CUSTOMER_BOOKINGS_LINK.to_string(),
    }
}

fn declined_notice(appointment: &Appointment) -> NewNotification {
    NewNotification {
        title: "Appointment Declined".to_string(),
        message: format!(
            "Your appointment request for {} on {} was declined. Please choose another time.",
            appointment.service_name,
            when(appointment)
        ),
        kind: NotificationKind::AppointmentDeclined,
        link: CUSTOMER_BOOKINGS_LINK.to_string(),
    }
}

fn cancelled_by_vendor_notice(appointment: &Appointment) -> NewNotification {
    NewNotification {
        title: "Appointment Cancelled".to_string(),
        message: format!(
            "Your appointment for {} on {} was cancelled by the salon.",
            appointment.service_name,
            when(appointment)
        ),
        kind: NotificationKind::AppointmentCancelled,
        link: CUSTOMER_BOOKINGS_LINK.to_string(),
    }
}

fn cancelled_by_customer_notice(appointment: &Appointment) -> NewNotification {
    NewNotification {
        title: "Appointment Cancelled".to_string(),
        message: format!(
            "{} cancelled their appointment for {} on {}.",
            appointment.customer_name,
            appointment.service_name,
            when(appointment)
        ),
        kind: NotificationKind::AppointmentCancelled,
        link: VENDOR_BOOKINGS_LINK.to_string(),
    }
}
