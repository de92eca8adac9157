//! Identity types for worktrail entities

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Entity identifier using UUIDv7 for timestamp-sortable IDs.
/// UUIDv7 embeds a Unix timestamp, making IDs naturally sortable by creation time.
pub type EntityId = Uuid;

pub type ColumnId = EntityId;
pub type ExperienceId = EntityId;
pub type TagId = EntityId;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Calendar date without a time zone, used for experience date ranges.
pub type Date = NaiveDate;

/// Generate a new UUIDv7 EntityId (timestamp-sortable).
pub fn new_entity_id() -> EntityId {
    Uuid::now_v7()
}

/// Parse a calendar date from user input.
///
/// Accepts `YYYY-MM-DD` and full RFC 3339 timestamps (the date part is kept).
pub fn parse_date(input: &str) -> Option<Date> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_plain() {
        assert_eq!(
            parse_date("2021-06-01"),
            NaiveDate::from_ymd_opt(2021, 6, 1)
        );
    }

    #[test]
    fn test_parse_date_rfc3339_keeps_date_part() {
        assert_eq!(
            parse_date("2021-06-01T23:10:00+00:00"),
            NaiveDate::from_ymd_opt(2021, 6, 1)
        );
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("last tuesday"), None);
        assert_eq!(parse_date("2021-13-01"), None);
    }
}
