use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// `service_id` recorded for appointments that combine several services.
pub const BUNDLE_SERVICE_ID: &str = "bundle";

/// Longest service duration accepted from a client, in minutes.
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectedService {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub vendor_id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub service_id: String,
    pub service_name: String,
    pub services: Vec<SelectedService>,
    pub duration_minutes: Option<i64>,
    pub price: f64,
    pub starts_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub calendar_event_id: Option<String>,
    pub calendar_synced: bool,
    pub calendar_synced_at: Option<NaiveDateTime>,
    pub notification_read: bool,
}

impl Appointment {
    pub fn ends_at(&self, default_minutes: i64) -> NaiveDateTime {
        self.starts_at + Duration::minutes(self.duration_minutes.unwrap_or(default_minutes))
    }

    /// Whether this appointment keeps a candidate running from `start` to `end` from
    /// being booked. A candidate ending exactly when this appointment begins is
    /// blocked; one starting exactly when it ends is not.
    pub fn blocks(&self, start: NaiveDateTime, end: NaiveDateTime, default_minutes: i64) -> bool {
        self.status.is_active() && start < self.ends_at(default_minutes) && end >= self.starts_at
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Declined,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Declined => "declined",
        }
    }

    /// Active appointments still occupy calendar time.
    pub fn is_active(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Declined)
                | (Pending, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "declined" => Ok(AppointmentStatus::Declined),
            other => Err(anyhow::anyhow!("unknown appointment status: {other}")),
        }
    }
}

/// Booking payload submitted by the customer flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub vendor_id: String,
    pub customer_id: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    #[serde(default)]
    pub service_id: String,
    #[serde(default)]
    pub service_name: String,
    pub duration: i64,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub price: f64,
    #[serde(default)]
    pub services: Vec<SelectedService>,
    /// Ignored: new appointments always start out pending.
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingReceipt {
    pub success: bool,
    pub id: String,
}
