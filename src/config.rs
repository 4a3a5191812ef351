use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    /// Step between candidate slot start times.
    pub slot_interval_minutes: i64,
    /// Length assumed for appointments that carry no duration.
    pub default_appointment_minutes: i64,
    pub calendar_sync_timeout: Duration,
    /// Upper bound on a single notification delivery.
    pub notification_timeout: Duration,
    pub google_calendar_api_url: String,
    pub calendar_time_zone: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "salonbook.db".to_string()),
            slot_interval_minutes: env::var("SLOT_INTERVAL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &i64| *v > 0)
                .unwrap_or(30),
            default_appointment_minutes: env::var("DEFAULT_APPOINTMENT_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &i64| *v > 0)
                .unwrap_or(60),
            calendar_sync_timeout: Duration::from_secs(
                env::var("CALENDAR_SYNC_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(8),
            ),
            notification_timeout: Duration::from_secs(
                env::var("NOTIFICATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5),
            ),
            google_calendar_api_url: env::var("GOOGLE_CALENDAR_API_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/calendar/v3".to_string()),
            calendar_time_zone: env::var("CALENDAR_TIME_ZONE")
                .unwrap_or_else(|_| "UTC".to_string()),
        }
    }
}
