use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Appointment, Schedule, Slot, MAX_DURATION_MINUTES};
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
pub struct SlotPolicy {
    pub interval_minutes: i64,
    pub default_appointment_minutes: i64,
}

impl SlotPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            interval_minutes: config.slot_interval_minutes,
            default_appointment_minutes: config.default_appointment_minutes,
        }
    }
}

/// Lists every candidate start time on `date` with its availability.
///
/// Candidates step through the opening interval at `policy.interval_minutes`.
/// A candidate is unavailable when the service would run past closing time,
/// when an active appointment blocks it, or when it does not lie after `now`.
/// Closed days and vendors without a schedule yield no candidates.
pub fn compute_slots(
    schedule: Option<&Schedule>,
    date: NaiveDate,
    duration_minutes: i64,
    existing: &[Appointment],
    now: NaiveDateTime,
    policy: SlotPolicy,
) -> Vec<Slot> {
    let Some((open, close)) = schedule.and_then(|s| s.open_interval(date)) else {
        return vec![];
    };

    let step = Duration::try_minutes(policy.interval_minutes.max(1)).unwrap_or(Duration::days(1));
    // Out-of-range lengths never fit before closing.
    let length = Duration::try_minutes(duration_minutes);
    let closing = date.and_time(close);

    let mut slots = vec![];
    let mut start = date.and_time(open);
    while start < closing {
        let end = length.and_then(|l| start.checked_add_signed(l));
        let available = match end {
            Some(end) => {
                end <= closing
                    && start > now
                    && !existing
                        .iter()
                        .any(|a| a.blocks(start, end, policy.default_appointment_minutes))
            }
            None => false,
        };

        slots.push(Slot {
            time: start.format("%H:%M").to_string(),
            available,
        });
        start = match start.checked_add_signed(step) {
            Some(next) => next,
            None => break,
        };
    }

    slots
}

/// Availability of `vendor_id` on `date`, re-reading its bookings on every call.
pub fn get_availability(
    state: &Arc<AppState>,
    vendor_id: &str,
    date: NaiveDate,
    duration_minutes: i64,
    now: NaiveDateTime,
) -> Result<Vec<Slot>, AppError> {
    if duration_minutes <= 0 || duration_minutes > MAX_DURATION_MINUTES {
        return Err(AppError::validation(format!(
            "duration must be between 1 and {MAX_DURATION_MINUTES} minutes"
        )));
    }

    let (vendor, existing) = {
        let db = state.db()?;
        let vendor = queries::get_vendor(&db, vendor_id)?
            .ok_or_else(|| AppError::NotFound(format!("vendor {vendor_id}")))?;
        let existing = queries::active_appointments_on(&db, vendor_id, date)?;
        (vendor, existing)
    };

    if vendor.schedule.is_none() {
        tracing::debug!(vendor_id, "vendor has no schedule, treating as closed");
    }

    Ok(compute_slots(
        vendor.schedule.as_ref(),
        date,
        duration_minutes,
        &existing,
        now,
        SlotPolicy::from_config(&state.config),
    ))
}
