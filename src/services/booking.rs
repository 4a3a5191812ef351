use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::db::queries::{self, InsertOutcome};
use crate::errors::AppError;
use crate::models::notification::VENDOR_BOOKINGS_LINK;
use crate::models::{
    Appointment, AppointmentStatus, BookingReceipt, BookingRequest, DayName, NewNotification,
    NotificationKind, Vendor, BUNDLE_SERVICE_ID, MAX_DURATION_MINUTES,
};
use crate::services::calendar;
use crate::services::notifications::notify;
use crate::state::AppState;

/// Creates a pending appointment from a customer's booking request.
///
/// The appointment is committed only if its start lies after `now`, it fits the
/// vendor's opening hours, and no active appointment of the vendor claims the
/// same time. Once committed the booking succeeds regardless of what happens to
/// the phone backfill, the vendor notification or the calendar sync.
pub async fn create_booking(
    state: &Arc<AppState>,
    request: BookingRequest,
    now: NaiveDateTime,
) -> Result<BookingReceipt, AppError> {
    let appointment = build_appointment(request, now)?;
    let default_minutes = state.config.default_appointment_minutes;

    let vendor = {
        let db = state.db()?;
        queries::get_vendor(&db, &appointment.vendor_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("vendor {}", appointment.vendor_id)))?;

    check_opening_hours(&vendor, &appointment, default_minutes)?;

    let outcome = {
        let mut db = state.db()?;
        queries::insert_appointment_if_free(&mut db, &appointment, default_minutes)?
    };

    if let InsertOutcome::Conflict { existing_id } = outcome {
        tracing::info!(
            vendor_id = %appointment.vendor_id,
            starts_at = %appointment.starts_at,
            existing_id = existing_id.as_deref().unwrap_or("unknown"),
            "booking rejected, slot taken"
        );
        return Err(AppError::slot_taken());
    }

    tracing::info!(
        appointment_id = %appointment.id,
        vendor_id = %appointment.vendor_id,
        starts_at = %appointment.starts_at,
        "appointment created"
    );

    backfill_customer_phone(state, &appointment);

    notify(
        state,
        &appointment.vendor_id,
        NewNotification {
            title: "New Appointment Request".to_string(),
            message: format!(
                "{} requested {} on {} at {}.",
                appointment.customer_name,
                appointment.service_name,
                appointment.starts_at.format("%Y-%m-%d"),
                appointment.starts_at.format("%H:%M"),
            ),
            kind: NotificationKind::NewAppointment,
            link: VENDOR_BOOKINGS_LINK.to_string(),
        },
    )
    .await;

    let sync = calendar::sync_appointment(state, &appointment, now).await;
    if let Some(error) = &sync.error {
        tracing::debug!(appointment_id = %appointment.id, error = %error, "booking not mirrored to calendar");
    }

    Ok(BookingReceipt {
        success: true,
        id: appointment.id,
    })
}

fn required(value: &str, field: &str) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Validates the request and turns it into a pending appointment.
fn build_appointment(request: BookingRequest, now: NaiveDateTime) -> Result<Appointment, AppError> {
    let vendor_id = required(&request.vendor_id, "vendorId")?;
    let customer_id = required(&request.customer_id, "customerId")?;
    let customer_name = required(&request.customer_name, "customerName")?;
    let customer_phone = required(&request.customer_phone, "customerPhone")?;

    let date = NaiveDate::parse_from_str(request.date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("invalid date: {}", request.date)))?;
    let time = NaiveTime::parse_from_str(request.time.trim(), "%H:%M")
        .map_err(|_| AppError::validation(format!("invalid time: {}", request.time)))?;
    let starts_at = date.and_time(time);

    if starts_at <= now {
        return Err(AppError::validation("Cannot book an appointment in the past"));
    }

    if request.duration <= 0 || request.duration > MAX_DURATION_MINUTES {
        return Err(AppError::validation(format!(
            "duration must be between 1 and {MAX_DURATION_MINUTES} minutes"
        )));
    }
    if !request.price.is_finite() || request.price < 0.0 {
        return Err(AppError::validation("price must be a non-negative amount"));
    }

    let (service_id, service_name) = if request.services.is_empty() {
        (
            required(&request.service_id, "serviceId")?,
            required(&request.service_name, "serviceName")?,
        )
    } else {
        let total = request
            .services
            .iter()
            .try_fold(0i64, |acc, s| acc.checked_add(s.duration));
        if total != Some(request.duration) {
            let total = total.map_or_else(|| "overflow".to_string(), |t| t.to_string());
            return Err(AppError::validation(format!(
                "duration {} does not match selected services ({total} minutes)",
                request.duration
            )));
        }
        let service_id = match request.service_id.trim() {
            "" => BUNDLE_SERVICE_ID.to_string(),
            id => id.to_string(),
        };
        let service_name = match request.service_name.trim() {
            "" => request
                .services
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(" + "),
            name => name.to_string(),
        };
        (service_id, service_name)
    };

    if let Some(status) = request.status.as_deref().filter(|s| *s != "pending") {
        tracing::debug!(status, "ignoring client-supplied status on new booking");
    }

    Ok(Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        vendor_id,
        customer_id,
        customer_name,
        customer_phone,
        customer_email: request
            .customer_email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
        service_id,
        service_name,
        services: request.services,
        duration_minutes: Some(request.duration),
        price: request.price,
        starts_at,
        status: AppointmentStatus::Pending,
        created_at: now,
        updated_at: now,
        calendar_event_id: None,
        calendar_synced: false,
        calendar_synced_at: None,
        notification_read: false,
    })
}

fn check_opening_hours(
    vendor: &Vendor,
    appointment: &Appointment,
    default_minutes: i64,
) -> Result<(), AppError> {
    let date = appointment.starts_at.date();

    let Some(schedule) = &vendor.schedule else {
        return Err(AppError::validation("This vendor is not accepting bookings yet"));
    };
    let Some((open, close)) = schedule.open_interval(date) else {
        return Err(AppError::validation(format!(
            "Closed on {}",
            DayName::of(date).as_str()
        )));
    };

    if appointment.starts_at.time() < open || appointment.ends_at(default_minutes) > date.and_time(close) {
        return Err(AppError::validation(format!(
            "Outside opening hours ({}-{})",
            open.format("%H:%M"),
            close.format("%H:%M")
        )));
    }

    Ok(())
}

fn backfill_customer_phone(state: &Arc<AppState>, appointment: &Appointment) {
    let result = state.db().and_then(|db| {
        Ok(queries::update_user_phone(
            &db,
            &appointment.customer_id,
            &appointment.customer_phone,
        )?)
    });

    match result {
        Ok(true) => {}
        Ok(false) => {
            tracing::debug!(customer_id = %appointment.customer_id, "no customer profile to update");
        }
        Err(e) => {
            tracing::warn!(customer_id = %appointment.customer_id, error = %e, "failed to save customer phone");
        }
    }
}
