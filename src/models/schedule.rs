use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Weekday key of a vendor schedule, serialized as the lowercase English day name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayName {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayName {
    pub const ALL: [DayName; 7] = [
        DayName::Monday,
        DayName::Tuesday,
        DayName::Wednesday,
        DayName::Thursday,
        DayName::Friday,
        DayName::Saturday,
        DayName::Sunday,
    ];

    pub fn of(date: NaiveDate) -> Self {
        DayName::from(date.weekday())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayName::Monday => "monday",
            DayName::Tuesday => "tuesday",
            DayName::Wednesday => "wednesday",
            DayName::Thursday => "thursday",
            DayName::Friday => "friday",
            DayName::Saturday => "saturday",
            DayName::Sunday => "sunday",
        }
    }
}

impl From<Weekday> for DayName {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => DayName::Monday,
            Weekday::Tue => DayName::Tuesday,
            Weekday::Wed => DayName::Wednesday,
            Weekday::Thu => DayName::Thursday,
            Weekday::Fri => DayName::Friday,
            Weekday::Sat => DayName::Saturday,
            Weekday::Sun => DayName::Sunday,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    pub is_open: bool,
    pub start: String,
    pub end: String,
}

impl DaySchedule {
    pub fn open(start: &str, end: &str) -> Self {
        Self {
            is_open: true,
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    pub fn closed() -> Self {
        Self {
            is_open: false,
            start: "09:00".to_string(),
            end: "17:00".to_string(),
        }
    }

    /// Opening interval of the day, `None` when closed or malformed.
    pub fn open_interval(&self) -> Option<(NaiveTime, NaiveTime)> {
        if !self.is_open {
            return None;
        }
        let start = parse_time(&self.start).ok()?;
        let end = parse_time(&self.end).ok()?;
        (start < end).then_some((start, end))
    }
}

/// A vendor's recurring weekly opening hours: one interval per open day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schedule {
    pub days: BTreeMap<DayName, DaySchedule>,
}

impl Schedule {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let schedule: Schedule = serde_json::from_str(s)?;
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (day, entry) in &self.days {
            let start = parse_time(&entry.start)?;
            let end = parse_time(&entry.end)?;
            if entry.is_open && start >= end {
                anyhow::bail!(
                    "{}: opening time {} must be before closing time {}",
                    day.as_str(),
                    entry.start,
                    entry.end
                );
            }
        }
        Ok(())
    }

    pub fn with_day(mut self, day: DayName, entry: DaySchedule) -> Self {
        self.days.insert(day, entry);
        self
    }

    /// Same hours on every day of the week.
    pub fn every_day(start: &str, end: &str) -> Self {
        DayName::ALL
            .iter()
            .fold(Schedule::default(), |s, day| s.with_day(*day, DaySchedule::open(start, end)))
    }

    pub fn for_date(&self, date: NaiveDate) -> Option<&DaySchedule> {
        self.days.get(&DayName::of(date))
    }

    /// Opening interval on `date`; a day missing from the schedule is closed.
    pub fn open_interval(&self, date: NaiveDate) -> Option<(NaiveTime, NaiveTime)> {
        self.for_date(date).and_then(DaySchedule::open_interval)
    }
}

pub fn parse_time(s: &str) -> anyhow::Result<NaiveTime> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| anyhow::anyhow!("time out of range: {s}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_valid_json() {
        let json = r#"{"monday":{"isOpen":true,"start":"09:00","end":"17:00"},"sunday":{"isOpen":false,"start":"09:00","end":"17:00"}}"#;
        let schedule = Schedule::from_json(json).unwrap();
        assert_eq!(schedule.days.len(), 2);
        assert!(schedule.days[&DayName::Monday].is_open);
        assert!(!schedule.days[&DayName::Sunday].is_open);
    }

    #[test]
    fn test_parse_invalid_day() {
        let json = r#"{"someday":{"isOpen":true,"start":"09:00","end":"17:00"}}"#;
        assert!(Schedule::from_json(json).is_err());
    }

    #[test]
    fn test_parse_invalid_time() {
        let json = r#"{"monday":{"isOpen":true,"start":"25:00","end":"17:00"}}"#;
        assert!(Schedule::from_json(json).is_err());
        let json = r#"{"monday":{"isOpen":true,"start":"9am","end":"17:00"}}"#;
        assert!(Schedule::from_json(json).is_err());
    }

    #[test]
    fn test_open_day_requires_start_before_end() {
        let json = r#"{"monday":{"isOpen":true,"start":"17:00","end":"09:00"}}"#;
        assert!(Schedule::from_json(json).is_err());

        // Inverted hours are tolerated on a closed day
        let json = r#"{"monday":{"isOpen":false,"start":"17:00","end":"09:00"}}"#;
        assert!(Schedule::from_json(json).is_ok());
    }

    #[test]
    fn test_open_interval_by_weekday() {
        let schedule = Schedule::default()
            .with_day(DayName::Monday, DaySchedule::open("09:00", "17:00"))
            .with_day(DayName::Tuesday, DaySchedule::closed());

        // 2025-06-16 is a Monday
        let (start, end) = schedule.open_interval(date("2025-06-16")).unwrap();
        assert_eq!(start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(end, NaiveTime::from_hms_opt(17, 0, 0).unwrap());

        assert!(schedule.open_interval(date("2025-06-17")).is_none());
        // Wednesday is not configured at all
        assert!(schedule.open_interval(date("2025-06-18")).is_none());
    }

    #[test]
    fn test_every_day_round_trips_through_json() {
        let schedule = Schedule::every_day("10:00", "18:00");
        let json = serde_json::to_string(&schedule).unwrap();
        assert!(json.contains(r#""friday":{"isOpen":true,"start":"10:00","end":"18:00"}"#));
        assert_eq!(Schedule::from_json(&json).unwrap(), schedule);
    }
}
