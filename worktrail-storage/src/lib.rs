//! Worktrail Storage - persistence boundary and record management
//!
//! Defines the [`ExperienceStore`] trait every backend implements, an
//! in-memory [`MemoryStore`], and the management operations (column
//! creation and ordering, default seeding, experience and tag upkeep,
//! search and export) that sit between the HTTP layer and a store.

pub mod columns;
pub mod experiences;
pub mod memory;
pub mod store;
pub mod tags;

pub use columns::{
    create_column, delete_column, ensure_default_columns, load_registry, move_column,
    update_column, NewColumn,
};
pub use experiences::{
    create_experience, delete_experience, export_experiences_csv, get_experience,
    link_experience_tag, replace_experience_tags, search_experiences, unlink_experience_tag,
    update_experience, validate_date_range, NewExperience,
};
pub use memory::MemoryStore;
pub use store::{ExperienceStore, StorageStatistics};
pub use tags::{create_tag, delete_tag, get_tag, update_tag};

use chrono::Utc;
use worktrail_core::{Column, ColumnType, CustomFields, Date, Experience, Tag, TagId};

// ============================================================================
// UPDATE TYPES
// ============================================================================

/// Update payload for columns.
#[derive(Debug, Clone, Default)]
pub struct ColumnUpdate {
    /// New display name
    pub name: Option<String>,
    /// New key; validated, never derived
    pub key: Option<String>,
    pub column_type: Option<ColumnType>,
    pub dropdown_options: Option<Vec<String>>,
    pub allow_multiple: Option<bool>,
    pub is_visible: Option<bool>,
    pub order: Option<i32>,
}

impl ColumnUpdate {
    /// Apply the set fields to `column` and bump `updated_at`.
    pub fn apply_to(self, column: &mut Column) {
        if let Some(name) = self.name {
            column.name = name;
        }
        if let Some(key) = self.key {
            column.key = key.trim().to_string();
        }
        if let Some(column_type) = self.column_type {
            column.column_type = column_type;
        }
        if let Some(options) = self.dropdown_options {
            column.dropdown_options = options;
        }
        if let Some(allow_multiple) = self.allow_multiple {
            column.allow_multiple = allow_multiple;
        }
        if let Some(is_visible) = self.is_visible {
            column.is_visible = is_visible;
        }
        if let Some(order) = self.order {
            column.order = order;
        }
        column.updated_at = Utc::now();
    }
}

/// Update payload for experiences.
#[derive(Debug, Clone, Default)]
pub struct ExperienceUpdate {
    pub start_date: Option<Date>,
    /// `Some(None)` clears the end date
    pub end_date: Option<Option<Date>>,
    /// Replaces the whole custom-fields bag
    pub custom_fields: Option<CustomFields>,
    /// Replaces the tag set
    pub tag_ids: Option<Vec<TagId>>,
}

impl ExperienceUpdate {
    /// Apply date and field changes to `experience`. Tags are handled by the store.
    pub fn apply_to(&self, experience: &mut Experience) {
        if let Some(start) = self.start_date {
            experience.start_date = start;
        }
        if let Some(end) = self.end_date {
            experience.end_date = end;
        }
        if let Some(fields) = &self.custom_fields {
            experience.custom_fields = fields.clone();
        }
        experience.updated_at = Utc::now();
    }
}

/// Update payload for tags.
#[derive(Debug, Clone, Default)]
pub struct TagUpdate {
    pub name: Option<String>,
}

impl TagUpdate {
    pub fn apply_to(self, tag: &mut Tag) {
        if let Some(name) = self.name {
            tag.name = name.trim().to_string();
        }
    }
}
