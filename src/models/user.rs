use serde::{Deserialize, Serialize};

use super::Schedule;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: String,
    pub business_name: String,
    /// `None` until the vendor configures opening hours; treated as closed.
    pub schedule: Option<Schedule>,
}

/// Credentials of a vendor's connected external calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConnection {
    pub vendor_id: String,
    pub calendar_id: String,
    pub access_token: String,
}
