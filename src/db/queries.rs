use anyhow::Context;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};

use crate::models::{
    Appointment, AppointmentStatus, CalendarConnection, NewNotification, Notification, Schedule,
    User, Vendor,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).with_context(|| format!("invalid timestamp: {s}"))
}

// ── Vendors ──

pub fn get_vendor(conn: &Connection, id: &str) -> anyhow::Result<Option<Vendor>> {
    let row = conn
        .query_row(
            "SELECT id, business_name, schedule FROM vendors WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((id, business_name, schedule_json)) = row else {
        return Ok(None);
    };

    let schedule = match schedule_json {
        Some(json) => match Schedule::from_json(&json) {
            Ok(s) => Some(s),
            Err(e) => {
                tracing::warn!(vendor_id = %id, error = %e, "stored schedule is invalid, treating vendor as closed");
                None
            }
        },
        None => None,
    };

    Ok(Some(Vendor {
        id,
        business_name,
        schedule,
    }))
}

pub fn save_vendor(conn: &Connection, vendor: &Vendor) -> anyhow::Result<()> {
    let schedule_json = vendor
        .schedule
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        "INSERT INTO vendors (id, business_name, schedule) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
           business_name = excluded.business_name,
           schedule = excluded.schedule,
           updated_at = datetime('now')",
        params![vendor.id, vendor.business_name, schedule_json],
    )?;
    Ok(())
}

pub fn update_vendor_schedule(
    conn: &Connection,
    vendor_id: &str,
    schedule: &Schedule,
) -> anyhow::Result<bool> {
    let json = serde_json::to_string(schedule)?;
    let count = conn.execute(
        "UPDATE vendors SET schedule = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![json, vendor_id],
    )?;
    Ok(count > 0)
}

// ── Users ──

pub fn get_user(conn: &Connection, id: &str) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, display_name, phone, email FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    display_name: row.get(1)?,
                    phone: row.get(2)?,
                    email: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(user)
}

pub fn save_user(conn: &Connection, user: &User) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO users (id, display_name, phone, email) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
           display_name = excluded.display_name,
           phone = excluded.phone,
           email = excluded.email,
           updated_at = datetime('now')",
        params![user.id, user.display_name, user.phone, user.email],
    )?;
    Ok(())
}

pub fn update_user_phone(conn: &Connection, id: &str, phone: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE users SET phone = ?1, updated_at = datetime('now') WHERE id = ?2",
        params![phone, id],
    )?;
    Ok(count > 0)
}

// ── Appointments ──

const APPOINTMENT_COLUMNS: &str = "id, vendor_id, customer_id, customer_name, customer_phone, customer_email, \
     service_id, service_name, services, duration_minutes, price, starts_at, status, created_at, \
     updated_at, calendar_event_id, calendar_synced, calendar_synced_at, notification_read";

#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// An active appointment already occupies the requested time.
    /// `existing_id` is `None` when the unique index caught the race.
    Conflict { existing_id: Option<String> },
}

/// Inserts `appointment` unless an active appointment of the same vendor starts at
/// the same instant or overlaps it. Check and insert run in one immediate
/// transaction; the partial unique index on `(vendor_id, starts_at)` rejects any
/// writer that slips past the check.
pub fn insert_appointment_if_free(
    conn: &mut Connection,
    appointment: &Appointment,
    default_minutes: i64,
) -> anyhow::Result<InsertOutcome> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let exact: Option<String> = tx
        .query_row(
            "SELECT id FROM appointments
             WHERE vendor_id = ?1 AND starts_at = ?2 AND status IN ('pending', 'confirmed')
             LIMIT 1",
            params![appointment.vendor_id, fmt_ts(&appointment.starts_at)],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(existing_id) = exact {
        return Ok(InsertOutcome::Conflict {
            existing_id: Some(existing_id),
        });
    }

    let end = appointment.ends_at(default_minutes);
    let same_day = active_appointments_on(&tx, &appointment.vendor_id, appointment.starts_at.date())?;
    if let Some(existing) = same_day
        .iter()
        .find(|a| a.blocks(appointment.starts_at, end, default_minutes))
    {
        return Ok(InsertOutcome::Conflict {
            existing_id: Some(existing.id.clone()),
        });
    }

    match insert_appointment(&tx, appointment) {
        Ok(()) => {}
        Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
            return Ok(InsertOutcome::Conflict { existing_id: None });
        }
        Err(e) => return Err(e.into()),
    }

    tx.commit()?;
    Ok(InsertOutcome::Inserted)
}

fn insert_appointment(conn: &Connection, a: &Appointment) -> rusqlite::Result<()> {
    let services = serde_json::to_string(&a.services)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        &format!(
            "INSERT INTO appointments ({APPOINTMENT_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
        ),
        params![
            a.id,
            a.vendor_id,
            a.customer_id,
            a.customer_name,
            a.customer_phone,
            a.customer_email,
            a.service_id,
            a.service_name,
            services,
            a.duration_minutes,
            a.price,
            fmt_ts(&a.starts_at),
            a.status.as_str(),
            fmt_ts(&a.created_at),
            fmt_ts(&a.updated_at),
            a.calendar_event_id,
            a.calendar_synced,
            a.calendar_synced_at.as_ref().map(fmt_ts),
            a.notification_read,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(
    conn: &Connection,
    vendor_id: &str,
    id: &str,
) -> anyhow::Result<Option<Appointment>> {
    let result = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE vendor_id = ?1 AND id = ?2"),
            params![vendor_id, id],
            |row| Ok(parse_appointment_row(row)),
        )
        .optional()?;

    result.transpose()
}

/// Pending and confirmed appointments of a vendor starting on `date`, earliest first.
pub fn active_appointments_on(
    conn: &Connection,
    vendor_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Vec<Appointment>> {
    let day_start = date.and_hms_opt(0, 0, 0).context("invalid day start")?;
    let next_day = day_start + Duration::days(1);

    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE vendor_id = ?1 AND starts_at >= ?2 AND starts_at < ?3
           AND status IN ('pending', 'confirmed')
         ORDER BY starts_at ASC"
    ))?;

    let rows = stmt.query_map(
        params![vendor_id, fmt_ts(&day_start), fmt_ts(&next_day)],
        |row| Ok(parse_appointment_row(row)),
    )?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

/// Moves an appointment from `from` to `to`. Returns false, changing nothing, when
/// the appointment does not exist or no longer has status `from`.
pub fn update_appointment_status(
    conn: &Connection,
    vendor_id: &str,
    id: &str,
    from: AppointmentStatus,
    to: AppointmentStatus,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2
         WHERE vendor_id = ?3 AND id = ?4 AND status = ?5",
        params![to.as_str(), fmt_ts(now), vendor_id, id, from.as_str()],
    )?;
    Ok(count > 0)
}

pub fn mark_calendar_synced(
    conn: &Connection,
    vendor_id: &str,
    id: &str,
    event_id: &str,
    now: &NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments
         SET calendar_event_id = ?1, calendar_synced = 1, calendar_synced_at = ?2
         WHERE vendor_id = ?3 AND id = ?4",
        params![event_id, fmt_ts(now), vendor_id, id],
    )?;
    Ok(count > 0)
}

pub fn list_vendor_appointments(
    conn: &Connection,
    vendor_id: &str,
    status_filter: Option<AppointmentStatus>,
    limit: i64,
) -> anyhow::Result<Vec<Appointment>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
                 WHERE vendor_id = ?1 AND status = ?2 ORDER BY starts_at DESC LIMIT ?3"
            ),
            vec![
                Box::new(vendor_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(status.as_str()),
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
                 WHERE vendor_id = ?1 ORDER BY starts_at DESC LIMIT ?2"
            ),
            vec![
                Box::new(vendor_id.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn list_customer_appointments(
    conn: &Connection,
    customer_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<Appointment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE customer_id = ?1 ORDER BY starts_at DESC LIMIT ?2"
    ))?;

    let rows = stmt.query_map(params![customer_id, limit], |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn count_unread_appointments(conn: &Connection, vendor_id: &str) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments WHERE vendor_id = ?1 AND notification_read = 0",
        params![vendor_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn mark_appointments_read(conn: &Connection, vendor_id: &str) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE appointments SET notification_read = 1 WHERE vendor_id = ?1 AND notification_read = 0",
        params![vendor_id],
    )?;
    Ok(count)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let services_json: String = row.get(8)?;
    let status_str: String = row.get(12)?;
    let starts_at: String = row.get(11)?;
    let created_at: String = row.get(13)?;
    let updated_at: String = row.get(14)?;
    let synced_at: Option<String> = row.get(17)?;

    Ok(Appointment {
        id: row.get(0)?,
        vendor_id: row.get(1)?,
        customer_id: row.get(2)?,
        customer_name: row.get(3)?,
        customer_phone: row.get(4)?,
        customer_email: row.get(5)?,
        service_id: row.get(6)?,
        service_name: row.get(7)?,
        services: serde_json::from_str(&services_json)
            .with_context(|| format!("invalid services column: {services_json}"))?,
        duration_minutes: row.get(9)?,
        price: row.get(10)?,
        starts_at: parse_ts(&starts_at)?,
        status: status_str.parse()?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
        calendar_event_id: row.get(15)?,
        calendar_synced: row.get(16)?,
        calendar_synced_at: synced_at.as_deref().map(parse_ts).transpose()?,
        notification_read: row.get(18)?,
    })
}

// ── Calendar connections ──

pub fn get_calendar_connection(
    conn: &Connection,
    vendor_id: &str,
) -> anyhow::Result<Option<CalendarConnection>> {
    let connection = conn
        .query_row(
            "SELECT vendor_id, calendar_id, access_token FROM calendar_connections WHERE vendor_id = ?1",
            params![vendor_id],
            |row| {
                Ok(CalendarConnection {
                    vendor_id: row.get(0)?,
                    calendar_id: row.get(1)?,
                    access_token: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(connection)
}

pub fn save_calendar_connection(conn: &Connection, connection: &CalendarConnection) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO calendar_connections (vendor_id, calendar_id, access_token) VALUES (?1, ?2, ?3)
         ON CONFLICT(vendor_id) DO UPDATE SET
           calendar_id = excluded.calendar_id,
           access_token = excluded.access_token,
           connected_at = datetime('now')",
        params![connection.vendor_id, connection.calendar_id, connection.access_token],
    )?;
    Ok(())
}

pub fn delete_calendar_connection(conn: &Connection, vendor_id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM calendar_connections WHERE vendor_id = ?1",
        params![vendor_id],
    )?;
    Ok(count > 0)
}

// ── Notifications ──

pub fn insert_notification(
    conn: &Connection,
    user_id: &str,
    notification: &NewNotification,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO notifications (user_id, title, message, kind, link) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id,
            notification.title,
            notification.message,
            notification.kind.as_str(),
            notification.link,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_notifications(
    conn: &Connection,
    user_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<Notification>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, title, message, kind, link, is_read, created_at
         FROM notifications WHERE user_id = ?1
         ORDER BY id DESC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![user_id, limit], |row| {
        Ok(Notification {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            message: row.get(3)?,
            kind: row.get(4)?,
            link: row.get(5)?,
            read: row.get::<_, i32>(6)? != 0,
            created_at: row.get(7)?,
        })
    })?;

    let mut notifications = vec![];
    for row in rows {
        notifications.push(row?);
    }
    Ok(notifications)
}
