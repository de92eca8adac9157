//! Enum types for worktrail entities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CORE ENUMS
// ============================================================================

/// Entity type discriminator used in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum EntityType {
    Column,
    Experience,
    Tag,
    ExperienceTag,
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            EntityType::Column => "Column",
            EntityType::Experience => "Experience",
            EntityType::Tag => "Tag",
            EntityType::ExperienceTag => "ExperienceTag",
        };
        write!(f, "{}", value)
    }
}

/// Type of a user-defined column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum ColumnType {
    /// Calendar date, stored as a string
    Date,
    /// Single-line text
    #[default]
    ShortText,
    /// Multi-line text
    LongText,
    /// Pick from a fixed option list (single or multi-select)
    Dropdown,
}

impl ColumnType {
    /// Convert to database string representation.
    pub fn as_db_str(&self) -> &'static str {
        match self {
            ColumnType::Date => "date",
            ColumnType::ShortText => "short-text",
            ColumnType::LongText => "long-text",
            ColumnType::Dropdown => "dropdown",
        }
    }

    /// Parse from database string representation.
    pub fn from_db_str(s: &str) -> Result<Self, ColumnTypeParseError> {
        match normalize_token(s).as_str() {
            "date" => Ok(ColumnType::Date),
            "shorttext" => Ok(ColumnType::ShortText),
            "longtext" => Ok(ColumnType::LongText),
            "dropdown" => Ok(ColumnType::Dropdown),
            _ => Err(ColumnTypeParseError(s.to_string())),
        }
    }

    pub fn is_dropdown(&self) -> bool {
        matches!(self, ColumnType::Dropdown)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db_str())
    }
}

impl FromStr for ColumnType {
    type Err = ColumnTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_str(s)
    }
}

/// Error when parsing an invalid column type string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTypeParseError(pub String);

impl fmt::Display for ColumnTypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid column type: {}", self.0)
    }
}

impl std::error::Error for ColumnTypeParseError {}

/// Direction for moving a column one slot in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

fn normalize_token(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_type_db_roundtrip() {
        for ty in [
            ColumnType::Date,
            ColumnType::ShortText,
            ColumnType::LongText,
            ColumnType::Dropdown,
        ] {
            assert_eq!(ColumnType::from_db_str(ty.as_db_str()), Ok(ty));
        }
    }

    #[test]
    fn test_column_type_parse_is_lenient_on_separators() {
        assert_eq!("short_text".parse::<ColumnType>(), Ok(ColumnType::ShortText));
        assert_eq!("Long Text".parse::<ColumnType>(), Ok(ColumnType::LongText));
        assert!("number".parse::<ColumnType>().is_err());
    }

    #[test]
    fn test_column_type_serde_uses_kebab_case() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&ColumnType::ShortText)?;
        assert_eq!(json, "\"short-text\"");
        let parsed: ColumnType = serde_json::from_str("\"dropdown\"")?;
        assert_eq!(parsed, ColumnType::Dropdown);
        Ok(())
    }

    #[test]
    fn test_move_direction_serde() -> Result<(), serde_json::Error> {
        let parsed: MoveDirection = serde_json::from_str("\"up\"")?;
        assert_eq!(parsed, MoveDirection::Up);
        Ok(())
    }
}
