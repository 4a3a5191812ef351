use serde::{Deserialize, Serialize};

/// Customer-facing bookings page.
pub const CUSTOMER_BOOKINGS_LINK: &str = "/bookings";
/// Vendor dashboard bookings page.
pub const VENDOR_BOOKINGS_LINK: &str = "/dashboard/bookings";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewAppointment,
    AppointmentConfirmed,
    AppointmentDeclined,
    AppointmentCancelled,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::NewAppointment => "new_appointment",
            NotificationKind::AppointmentConfirmed => "appointment_confirmed",
            NotificationKind::AppointmentDeclined => "appointment_declined",
            NotificationKind::AppointmentCancelled => "appointment_cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub link: String,
}

/// A notification as stored in a user's inbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub link: String,
    pub read: bool,
    pub created_at: String,
}
