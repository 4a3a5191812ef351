use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;

use super::{CalendarError, CalendarEvent, CalendarProvider};
use crate::models::CalendarConnection;

const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Google Calendar events API (v3).
pub struct GoogleCalendarProvider {
    base_url: String,
    time_zone: String,
    client: reqwest::Client,
}

impl GoogleCalendarProvider {
    pub fn new(base_url: String, time_zone: String) -> Self {
        Self {
            base_url,
            time_zone,
            client: reqwest::Client::new(),
        }
    }

    fn events_url(&self, calendar_id: &str) -> Result<reqwest::Url, CalendarError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| CalendarError::Provider(format!("invalid calendar API url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| CalendarError::Provider("calendar API url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["calendars", calendar_id, "events"]);
        Ok(url)
    }
}

fn event_body(event: &CalendarEvent, time_zone: &str) -> serde_json::Value {
    json!({
        "summary": event.summary,
        "description": event.description,
        "start": {
            "dateTime": event.start.format(DATE_TIME_FORMAT).to_string(),
            "timeZone": time_zone,
        },
        "end": {
            "dateTime": event.end.format(DATE_TIME_FORMAT).to_string(),
            "timeZone": time_zone,
        },
    })
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    async fn insert_event(
        &self,
        credentials: &CalendarConnection,
        event: &CalendarEvent,
    ) -> Result<String, CalendarError> {
        let url = self.events_url(&credentials.calendar_id)?;

        let resp = self
            .client
            .post(url)
            .bearer_auth(&credentials.access_token)
            .json(&event_body(event, &self.time_zone))
            .send()
            .await
            .map_err(|e| CalendarError::Provider(format!("failed to call Google Calendar: {e}")))?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(CalendarError::AuthExpired);
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| CalendarError::Provider(format!("failed to parse Google Calendar response: {e}")))?;

        if !status.is_success() {
            return Err(CalendarError::Provider(format!(
                "Google Calendar API error ({status}): {data}"
            )));
        }

        data["id"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CalendarError::Provider("missing id in Google Calendar response".to_string()))
    }
}
