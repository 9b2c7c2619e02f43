//! Input validation and day normalization
//!
//! Every write and every day-addressed query passes through here before any
//! store is touched, so a rejected request never has side effects.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::config::CalendarConfig;
use crate::errors::{PresenceError, Result};
use crate::storage::EntryKey;

pub const MAX_HOUR: i64 = 23;
pub const MAX_PERCENTAGE: i64 = 100;

/// A day as it arrives over the wire.
///
/// `Millis` is tried first so that bare JSON numbers are never read as text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DayInput {
    /// Epoch milliseconds
    Millis(i64),
    /// `YYYY-MM-DD`, or a full timestamp
    Text(String),
}

impl From<&str> for DayInput {
    fn from(value: &str) -> Self {
        DayInput::Text(value.to_string())
    }
}

/// Upsert request body before validation.
///
/// All fields are optional at this stage so that missing fields surface as
/// `InvalidInput` instead of a deserializer error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    #[serde(default, alias = "date")]
    pub day: Option<DayInput>,
    #[serde(default)]
    pub hour: Option<i64>,
    #[serde(default)]
    pub present_percentage: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A draft that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEntry {
    pub key: EntryKey,
    pub present_percentage: u8,
    pub notes: String,
}

/// Validate and normalize an upsert request.
///
/// Checks run in a fixed order: required fields, value ranges, day parsing,
/// then the future-date rule against `today`.
pub fn validate_entry(
    draft: EntryDraft,
    calendar: &CalendarConfig,
    today: NaiveDate,
) -> Result<ValidEntry> {
    let (Some(day), Some(hour), Some(present_percentage)) =
        (draft.day, draft.hour, draft.present_percentage)
    else {
        return Err(PresenceError::invalid_input(
            "Missing required fields: date, hour, presentPercentage",
        ));
    };

    let present_percentage = check_percentage(present_percentage)?;
    let hour = check_hour(hour)?;
    let day = normalize_day(&day, calendar)?;

    if day > today {
        return Err(PresenceError::future_date(
            "Cannot add entries for future dates. Please select today or earlier.",
        ));
    }

    Ok(ValidEntry {
        key: EntryKey::new(day, hour),
        present_percentage,
        notes: draft.notes.unwrap_or_default(),
    })
}

pub fn check_percentage(value: i64) -> Result<u8> {
    if !(0..=MAX_PERCENTAGE).contains(&value) {
        return Err(PresenceError::out_of_range(
            "presentPercentage must be between 0 and 100",
        ));
    }
    Ok(value as u8)
}

pub fn check_hour(value: i64) -> Result<u8> {
    if !(0..=MAX_HOUR).contains(&value) {
        return Err(PresenceError::out_of_range("hour must be between 0 and 23"));
    }
    Ok(value as u8)
}

/// Reduce any accepted day form to a calendar date.
pub fn normalize_day(input: &DayInput, calendar: &CalendarConfig) -> Result<NaiveDate> {
    match input {
        DayInput::Millis(ms) => DateTime::<Utc>::from_timestamp_millis(*ms)
            .map(|instant| calendar_date(instant, calendar.fixed_offset()))
            .ok_or_else(|| PresenceError::invalid_input(format!("Invalid timestamp: {}", ms))),
        DayInput::Text(text) => parse_day_str(text, calendar),
    }
}

/// Parse a textual day.
///
/// `YYYY-MM-DD` is taken literally. An RFC 3339 timestamp is converted to the
/// configured calendar timezone first. A timestamp without offset keeps its
/// own date.
pub fn parse_day_str(text: &str, calendar: &CalendarConfig) -> Result<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PresenceError::invalid_input("Date must not be empty"));
    }

    if let Ok(day) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(day);
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(calendar_date(instant.with_timezone(&Utc), calendar.fixed_offset()));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.date());
    }

    Err(PresenceError::invalid_input(format!(
        "Invalid date '{}': expected YYYY-MM-DD",
        text
    )))
}

fn calendar_date(instant: DateTime<Utc>, offset: Option<FixedOffset>) -> NaiveDate {
    match offset {
        Some(offset) => instant.with_timezone(&offset).date_naive(),
        None => instant.with_timezone(&Local).date_naive(),
    }
}

/// A required day query parameter.
pub fn require_day(value: Option<&str>, calendar: &CalendarConfig) -> Result<NaiveDate> {
    match value {
        Some(text) if !text.trim().is_empty() => parse_day_str(text, calendar),
        _ => Err(PresenceError::invalid_input(
            "Missing required query parameter: date",
        )),
    }
}

/// Required, inclusive `[startDate, endDate]` query parameters.
pub fn require_range(
    start: Option<&str>,
    end: Option<&str>,
    calendar: &CalendarConfig,
) -> Result<(NaiveDate, NaiveDate)> {
    let (Some(start), Some(end)) = (
        start.filter(|s| !s.trim().is_empty()),
        end.filter(|s| !s.trim().is_empty()),
    ) else {
        return Err(PresenceError::invalid_input(
            "Missing required query parameters: startDate, endDate",
        ));
    };

    let start = parse_day_str(start, calendar)?;
    let end = parse_day_str(end, calendar)?;
    if start > end {
        return Err(PresenceError::invalid_input(
            "startDate must not be after endDate",
        ));
    }
    Ok((start, end))
}

/// Required `(date, hour)` key for deletion.
pub fn require_key(
    day: Option<&str>,
    hour: Option<i64>,
    calendar: &CalendarConfig,
) -> Result<EntryKey> {
    let (Some(day), Some(hour)) = (day.filter(|d| !d.trim().is_empty()), hour) else {
        return Err(PresenceError::invalid_input(
            "Missing required query parameters: date, hour",
        ));
    };
    let hour = check_hour(hour)?;
    let day = parse_day_str(day, calendar)?;
    Ok(EntryKey::new(day, hour))
}
