//! Column-related API types

use serde::{Deserialize, Serialize};
use worktrail_core::{Column, ColumnType, MoveDirection};
use worktrail_storage::{ColumnUpdate, NewColumn};

fn default_visible() -> bool {
    true
}

/// Request to create a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateColumnRequest {
    /// Display name
    pub name: String,
    /// Field key; derived from the name when absent or blank
    #[serde(default)]
    pub key: Option<String>,
    pub column_type: ColumnType,
    /// Option list (dropdown only)
    #[serde(default)]
    pub dropdown_options: Vec<String>,
    /// Multi-select (dropdown only)
    #[serde(default)]
    pub allow_multiple: bool,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
    /// Display order; appended after the last column when absent
    #[serde(default)]
    pub order: Option<i32>,
}

impl From<CreateColumnRequest> for NewColumn {
    fn from(req: CreateColumnRequest) -> Self {
        NewColumn {
            name: req.name,
            key: req.key,
            column_type: req.column_type,
            dropdown_options: req.dropdown_options,
            allow_multiple: req.allow_multiple,
            is_visible: req.is_visible,
            order: req.order,
        }
    }
}

/// Request to update a column. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateColumnRequest {
    pub name: Option<String>,
    pub key: Option<String>,
    pub column_type: Option<ColumnType>,
    pub dropdown_options: Option<Vec<String>>,
    pub allow_multiple: Option<bool>,
    pub is_visible: Option<bool>,
    pub order: Option<i32>,
}

impl From<UpdateColumnRequest> for ColumnUpdate {
    fn from(req: UpdateColumnRequest) -> Self {
        ColumnUpdate {
            name: req.name,
            key: req.key,
            column_type: req.column_type,
            dropdown_options: req.dropdown_options,
            allow_multiple: req.allow_multiple,
            is_visible: req.is_visible,
            order: req.order,
        }
    }
}

/// Request to move a column one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MoveColumnRequest {
    pub direction: MoveDirection,
}

/// Columns in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListColumnsResponse {
    pub columns: Vec<Column>,
    pub total: usize,
}

impl From<Vec<Column>> for ListColumnsResponse {
    fn from(columns: Vec<Column>) -> Self {
        let total = columns.len();
        Self { columns, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_defaults() -> Result<(), serde_json::Error> {
        let req: CreateColumnRequest =
            serde_json::from_value(json!({"name": "Job Title", "column_type": "short-text"}))?;
        assert!(req.key.is_none());
        assert!(req.is_visible);
        assert!(req.dropdown_options.is_empty());

        let new: NewColumn = req.into();
        assert_eq!(new.name, "Job Title");
        assert_eq!(new.column_type, ColumnType::ShortText);
        Ok(())
    }

    #[test]
    fn test_move_request_direction() -> Result<(), serde_json::Error> {
        let req: MoveColumnRequest = serde_json::from_value(json!({"direction": "down"}))?;
        assert_eq!(req.direction, MoveDirection::Down);
        assert!(serde_json::from_value::<MoveColumnRequest>(json!({"direction": "left"})).is_err());
        Ok(())
    }
}
