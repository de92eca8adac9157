//! Schema registry for user-defined columns
//!
//! Holds the current column definitions in display order, derives column keys
//! from names, and shapes custom-field bags to match each column's type.

use crate::{
    Column, ColumnId, ColumnType, CustomFields, FieldValue, FilterSpec, MoveDirection,
    ValidationError, WorktrailError, WorktrailResult,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static NON_KEY_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Invalid key regex"));

/// Derive a column key from a display name.
///
/// Lower-cases the name, strips every character outside `[a-z0-9]`, and
/// trims. Uniqueness is not guaranteed here; stores reject duplicates.
pub fn derive_key(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_KEY_CHARS.replace_all(&lowered, "").trim().to_string()
}

/// True when `key` is a non-empty string of `[a-z0-9]`.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !NON_KEY_CHARS.is_match(key)
}

/// Order for a newly created column: one past the current maximum, or 1.
pub fn next_column_order(columns: &[Column]) -> i32 {
    columns
        .iter()
        .map(|c| c.order)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Check and tidy a column definition before it is stored.
///
/// Trims the name and dropdown options, rejects blank or duplicate options,
/// and clears dropdown-only settings on non-dropdown columns.
pub fn prepare_column(mut column: Column) -> WorktrailResult<Column> {
    column.name = column.name.trim().to_string();
    if column.name.is_empty() {
        return Err(WorktrailError::required("name"));
    }
    if !is_valid_key(&column.key) {
        return Err(WorktrailError::invalid_value(
            "key",
            format!("'{}' must be non-empty and contain only a-z and 0-9", column.key),
        ));
    }

    if column.column_type.is_dropdown() {
        let mut seen = HashSet::new();
        let mut options = Vec::with_capacity(column.dropdown_options.len());
        for option in column.dropdown_options {
            let option = option.trim().to_string();
            if option.is_empty() {
                return Err(WorktrailError::invalid_value(
                    "dropdown_options",
                    "options cannot be blank",
                ));
            }
            if !seen.insert(option.to_lowercase()) {
                return Err(WorktrailError::Validation(ValidationError::ConstraintViolation {
                    constraint: "dropdown_options_unique".to_string(),
                    reason: format!("option '{}' is listed more than once", option),
                }));
            }
            options.push(option);
        }
        column.dropdown_options = options;
    } else {
        column.dropdown_options.clear();
        column.allow_multiple = false;
    }

    Ok(column)
}

/// Starter column set seeded when no columns exist.
pub fn default_columns() -> Vec<Column> {
    vec![
        Column::new("Title", "title", ColumnType::ShortText, 1),
        Column::new("Company", "company", ColumnType::ShortText, 2),
        Column::new("Location", "location", ColumnType::ShortText, 3),
        Column::new("Description", "description", ColumnType::LongText, 4),
        Column::new("Skills", "skills", ColumnType::Dropdown, 5).with_allow_multiple(true),
    ]
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Read-only view over the current column definitions.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    columns: Vec<Column>,
    by_key: HashMap<String, usize>,
}

impl SchemaRegistry {
    /// Build a registry; columns are sorted by `order`, ties by key.
    pub fn new(mut columns: Vec<Column>) -> Self {
        columns.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.key.cmp(&b.key)));
        let by_key = columns
            .iter()
            .enumerate()
            .map(|(idx, c)| (c.key.clone(), idx))
            .collect();
        Self { columns, by_key }
    }

    /// All columns in display order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_visible)
    }

    pub fn dropdown_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.column_type.is_dropdown())
    }

    pub fn get(&self, key: &str) -> Option<&Column> {
        self.by_key.get(key).map(|&idx| &self.columns[idx])
    }

    pub fn get_by_id(&self, column_id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| c.column_id == column_id)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn next_order(&self) -> i32 {
        next_column_order(&self.columns)
    }

    /// The column to swap with when moving `column_id` one slot.
    ///
    /// Returns `Ok(None)` when the column is already first (up) or last (down).
    pub fn neighbor(
        &self,
        column_id: ColumnId,
        direction: MoveDirection,
    ) -> WorktrailResult<Option<(&Column, &Column)>> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.column_id == column_id)
            .ok_or_else(|| WorktrailError::not_found(crate::EntityType::Column, column_id))?;

        let other = match direction {
            MoveDirection::Up => idx.checked_sub(1),
            MoveDirection::Down => Some(idx + 1).filter(|&i| i < self.columns.len()),
        };

        Ok(other.map(|other| (&self.columns[idx], &self.columns[other])))
    }

    /// Shape custom-field values to their column's declared type.
    ///
    /// Multi-select dropdowns hold sequences; every other column holds a
    /// scalar. Keys without a column pass through untouched.
    pub fn normalize_fields(&self, fields: CustomFields) -> CustomFields {
        fields
            .into_iter()
            .map(|(key, value)| {
                let shaped = match self.get(&key) {
                    Some(column) if column.is_multi_select() => into_sequence(value),
                    Some(_) => into_scalar(value),
                    None => value,
                };
                (key, shaped)
            })
            .collect()
    }

    /// Dropdown filter keys that do not name a dropdown column.
    pub fn unknown_dropdown_filter_keys<'a>(&self, spec: &'a FilterSpec) -> Vec<&'a str> {
        spec.dropdown_filters
            .keys()
            .filter(|key| {
                self.get(key)
                    .map(|c| !c.column_type.is_dropdown())
                    .unwrap_or(true)
            })
            .map(String::as_str)
            .collect()
    }
}

fn into_sequence(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Scalar(s) if s.is_empty() => FieldValue::Sequence(Vec::new()),
        FieldValue::Scalar(s) => FieldValue::Sequence(vec![s]),
        other => other,
    }
}

fn into_scalar(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::Sequence(items) => items
            .into_iter()
            .next()
            .map(FieldValue::Scalar)
            .unwrap_or(FieldValue::Absent),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(vec![
            Column::new("Skills", "skills", ColumnType::Dropdown, 3)
                .with_options(["React", "Python"])
                .with_allow_multiple(true),
            Column::new("Title", "title", ColumnType::ShortText, 1),
            Column::new("Level", "level", ColumnType::Dropdown, 2)
                .with_options(["Junior", "Senior"])
                .with_visible(false),
        ])
    }

    #[test]
    fn test_derive_key_examples() {
        assert_eq!(derive_key("Client Name!!"), "clientname");
        assert_eq!(derive_key("  Foo_Bar "), "foobar");
        assert_eq!(derive_key("Start Date 2"), "startdate2");
        assert_eq!(derive_key("!!!"), "");
    }

    #[test]
    fn test_derive_key_drops_non_ascii() {
        assert_eq!(derive_key("Café Ünit"), "cafnit");
    }

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("clientname"));
        assert!(is_valid_key("a1"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("client_name"));
        assert!(!is_valid_key("Client"));
    }

    #[test]
    fn test_next_column_order() {
        assert_eq!(next_column_order(&[]), 1);
        let reg = registry();
        assert_eq!(next_column_order(reg.columns()), 4);
    }

    #[test]
    fn test_registry_orders_columns() {
        let reg = registry();
        let keys: Vec<_> = reg.columns().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["title", "level", "skills"]);
        let visible: Vec<_> = reg.visible_columns().map(|c| c.key.as_str()).collect();
        assert_eq!(visible, vec!["title", "skills"]);
        assert_eq!(reg.dropdown_columns().count(), 2);
    }

    #[test]
    fn test_neighbor_at_edges_is_none() -> WorktrailResult<()> {
        let reg = registry();
        let first = reg.columns()[0].column_id;
        let last = reg.columns()[2].column_id;
        assert!(reg.neighbor(first, MoveDirection::Up)?.is_none());
        assert!(reg.neighbor(last, MoveDirection::Down)?.is_none());

        let (moving, other) = reg
            .neighbor(first, MoveDirection::Down)?
            .ok_or_else(|| WorktrailError::required("neighbor"))?;
        assert_eq!(moving.key, "title");
        assert_eq!(other.key, "level");
        Ok(())
    }

    #[test]
    fn test_neighbor_unknown_column() {
        let reg = registry();
        let err = reg
            .neighbor(crate::new_entity_id(), MoveDirection::Up)
            .err();
        assert!(matches!(err, Some(ref e) if e.is_not_found()));
    }

    #[test]
    fn test_normalize_fields_shapes_values() {
        let reg = registry();
        let mut fields = CustomFields::new();
        fields.insert("skills".to_string(), FieldValue::scalar("React"));
        fields.insert("title".to_string(), FieldValue::sequence(["Engineer", "Lead"]));
        fields.insert("level".to_string(), FieldValue::Sequence(vec![]));
        fields.insert("legacy".to_string(), FieldValue::sequence(["kept"]));

        let shaped = reg.normalize_fields(fields);
        assert_eq!(shaped["skills"], FieldValue::sequence(["React"]));
        assert_eq!(shaped["title"], FieldValue::scalar("Engineer"));
        assert_eq!(shaped["level"], FieldValue::Absent);
        assert_eq!(shaped["legacy"], FieldValue::sequence(["kept"]));
    }

    #[test]
    fn test_prepare_column_trims_and_clears() -> WorktrailResult<()> {
        let text = Column::new("  Notes ", "notes", ColumnType::LongText, 1)
            .with_options(["a"])
            .with_allow_multiple(true);
        let text = prepare_column(text)?;
        assert_eq!(text.name, "Notes");
        assert!(text.dropdown_options.is_empty());
        assert!(!text.allow_multiple);

        let dd = Column::new("Stack", "stack", ColumnType::Dropdown, 2).with_options([" Rust ", "Go"]);
        let dd = prepare_column(dd)?;
        assert_eq!(dd.dropdown_options, vec!["Rust", "Go"]);
        Ok(())
    }

    #[test]
    fn test_prepare_column_rejects_bad_input() {
        let blank = Column::new("   ", "x", ColumnType::ShortText, 1);
        assert!(prepare_column(blank).is_err());

        let bad_key = Column::new("X", "has space", ColumnType::ShortText, 1);
        assert!(prepare_column(bad_key).is_err());

        let dup = Column::new("Stack", "stack", ColumnType::Dropdown, 1).with_options(["Rust", "rust"]);
        assert!(matches!(
            prepare_column(dup),
            Err(WorktrailError::Validation(ValidationError::ConstraintViolation { .. }))
        ));
    }

    #[test]
    fn test_default_columns_are_valid_and_ordered() -> WorktrailResult<()> {
        let defaults = default_columns();
        for (idx, column) in defaults.iter().enumerate() {
            assert_eq!(column.order, idx as i32 + 1);
            assert_eq!(derive_key(&column.name), column.key);
            prepare_column(column.clone())?;
        }
        Ok(())
    }

    #[test]
    fn test_unknown_dropdown_filter_keys() {
        let reg = registry();
        let mut spec = FilterSpec::default();
        spec.dropdown_filters
            .insert("skills".to_string(), vec!["React".to_string()]);
        spec.dropdown_filters
            .insert("title".to_string(), vec!["x".to_string()]);
        spec.dropdown_filters
            .insert("gone".to_string(), vec!["x".to_string()]);
        let mut unknown = reg.unknown_dropdown_filter_keys(&spec);
        unknown.sort();
        assert_eq!(unknown, vec!["gone", "title"]);
    }
}

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Derived keys only ever contain lowercase ASCII letters and digits.
        #[test]
        fn prop_derive_key_charset(name in ".{0,40}") {
            let key = derive_key(&name);
            prop_assert!(key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }

        /// Deriving a key from a key is a no-op.
        #[test]
        fn prop_derive_key_idempotent(name in ".{0,40}") {
            let once = derive_key(&name);
            prop_assert_eq!(derive_key(&once), once.clone());
        }

        /// A new column always sorts after every existing one.
        #[test]
        fn prop_next_order_exceeds_existing(orders in proptest::collection::vec(-50i32..500, 0..20)) {
            let columns: Vec<Column> = orders
                .iter()
                .enumerate()
                .map(|(i, &o)| Column::new(format!("C{i}"), format!("c{i}"), ColumnType::ShortText, o))
                .collect();
            let next = next_column_order(&columns);
            prop_assert!(columns.iter().all(|c| c.order < next));
            if columns.is_empty() {
                prop_assert_eq!(next, 1);
            }
        }
    }
}
