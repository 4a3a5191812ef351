use crate::models::{Appointment, AppointmentStatus};

use super::CalendarEvent;

const ICS_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Escapes TEXT values per RFC 5545.
fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

pub fn generate_ics(appointment: &Appointment, business_name: &str, default_minutes: i64) -> String {
    let event = CalendarEvent::for_appointment(appointment, default_minutes);
    let dtstart = event.start.format(ICS_FORMAT).to_string();
    let dtend = event.end.format(ICS_FORMAT).to_string();
    let dtstamp = appointment.created_at.format(ICS_FORMAT).to_string();
    let uid = format!("{}@salonbook", appointment.id);

    let summary = escape_text(&format!("{} at {}", appointment.service_name, business_name));
    let description = escape_text(&event.description);
    let status = match appointment.status {
        AppointmentStatus::Pending => "TENTATIVE",
        AppointmentStatus::Confirmed | AppointmentStatus::Completed => "CONFIRMED",
        AppointmentStatus::Cancelled | AppointmentStatus::Declined => "CANCELLED",
    };

    format!(
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Salonbook//Appointments//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:{uid}\r\n\
         DTSTAMP:{dtstamp}\r\n\
         DTSTART:{dtstart}\r\n\
         DTEND:{dtend}\r\n\
         SUMMARY:{summary}\r\n\
         DESCRIPTION:{description}\r\n\
         STATUS:{status}\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR\r\n"
    )
}
