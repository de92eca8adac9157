//! Core entity structures

use crate::{
    new_entity_id, ColumnId, ColumnType, CustomFields, Date, ExperienceId, FieldValue, TagId,
    Timestamp,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

static ABSENT: FieldValue = FieldValue::Absent;

/// Column - a user-defined custom field definition.
/// The `key` is the stable identity used inside experience custom fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Column {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub column_id: ColumnId,
    pub name: String,
    pub key: String,
    pub column_type: ColumnType,
    /// Ordered option list (dropdown only)
    pub dropdown_options: Vec<String>,
    /// Multi-select flag (dropdown only)
    pub allow_multiple: bool,
    pub is_visible: bool,
    /// Display and export order
    pub order: i32,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Column {
    /// Create a visible column with no dropdown options.
    pub fn new(name: impl Into<String>, key: impl Into<String>, column_type: ColumnType, order: i32) -> Self {
        let now = Utc::now();
        Self {
            column_id: new_entity_id(),
            name: name.into(),
            key: key.into(),
            column_type,
            dropdown_options: Vec::new(),
            allow_multiple: false,
            is_visible: true,
            order,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dropdown_options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_allow_multiple(mut self, allow_multiple: bool) -> Self {
        self.allow_multiple = allow_multiple;
        self
    }

    pub fn with_visible(mut self, is_visible: bool) -> Self {
        self.is_visible = is_visible;
        self
    }

    /// True for a dropdown column that accepts several options.
    pub fn is_multi_select(&self) -> bool {
        self.column_type.is_dropdown() && self.allow_multiple
    }
}

/// Tag - a named label attachable to experiences.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Tag {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub tag_id: TagId,
    pub name: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            tag_id: new_entity_id(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Join row between an experience and a tag. Unique per pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ExperienceTag {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub experience_id: ExperienceId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub tag_id: TagId,
}

/// Experience - a dated record with custom field values and resolved tags.
///
/// `end_date`, when present, is expected to be on or after `start_date`;
/// nothing in this type enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Experience {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub experience_id: ExperienceId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub start_date: Date,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub end_date: Option<Date>,
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub custom_fields: CustomFields,
    /// Tags resolved through the join table; not stored on the record itself.
    pub tags: Vec<Tag>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub updated_at: Timestamp,
}

impl Experience {
    pub fn new(start_date: Date, end_date: Option<Date>) -> Self {
        let now = Utc::now();
        Self {
            experience_id: new_entity_id(),
            start_date,
            end_date,
            custom_fields: CustomFields::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.custom_fields.insert(key.into(), value.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }

    /// Value stored under `key`; stale or missing keys read as `Absent`.
    pub fn field(&self, key: &str) -> &FieldValue {
        self.custom_fields.get(key).unwrap_or(&ABSENT)
    }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tags.iter().any(|t| t.tag_id == tag_id)
    }

    pub fn tag_ids(&self) -> Vec<TagId> {
        self.tags.iter().map(|t| t.tag_id).collect()
    }

    /// True when the experience has no end date.
    pub fn is_ongoing(&self) -> bool {
        self.end_date.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    #[test]
    fn test_missing_field_reads_absent() {
        let exp = Experience::new(date(2020, 1, 1), None).with_field("title", "Engineer");
        assert_eq!(exp.field("title"), &FieldValue::scalar("Engineer"));
        assert_eq!(exp.field("deleted_column"), &FieldValue::Absent);
    }

    #[test]
    fn test_has_tag() {
        let rust = Tag::new("rust");
        let go = Tag::new("go");
        let exp = Experience::new(date(2020, 1, 1), None).with_tags(vec![rust.clone()]);
        assert!(exp.has_tag(rust.tag_id));
        assert!(!exp.has_tag(go.tag_id));
        assert_eq!(exp.tag_ids(), vec![rust.tag_id]);
    }

    #[test]
    fn test_multi_select_requires_dropdown() {
        let text = Column::new("Notes", "notes", ColumnType::LongText, 1).with_allow_multiple(true);
        assert!(!text.is_multi_select());
        let skills = Column::new("Skills", "skills", ColumnType::Dropdown, 2).with_allow_multiple(true);
        assert!(skills.is_multi_select());
    }

    #[test]
    fn test_experience_serializes_dates_as_iso() -> Result<(), serde_json::Error> {
        let exp = Experience::new(date(2021, 6, 1), Some(date(2022, 1, 31)));
        let json = serde_json::to_value(&exp)?;
        assert_eq!(json["start_date"], "2021-06-01");
        assert_eq!(json["end_date"], "2022-01-31");
        Ok(())
    }
}
