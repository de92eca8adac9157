//! Custom field values
//!
//! The custom-fields bag on an experience is schema-less: its shape depends on
//! how each column is configured. Values are held as a small sum type so the
//! filter engine can tell scalars from sequences without inspecting JSON.

use serde::de::Deserializer;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Value stored under one column key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FieldValue {
    /// No value (missing key, JSON null)
    #[default]
    Absent,
    /// Text, date, or single-select dropdown value
    Scalar(String),
    /// Multi-select dropdown value
    Sequence(Vec<String>),
}

/// Custom fields keyed by column key.
pub type CustomFields = BTreeMap<String, FieldValue>;

impl FieldValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        FieldValue::Scalar(value.into())
    }

    pub fn sequence<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::Sequence(values.into_iter().map(Into::into).collect())
    }

    /// Convert an arbitrary JSON value into a field value.
    ///
    /// Non-string scalars are stringified; objects become their JSON text.
    /// Nulls inside arrays are dropped.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => FieldValue::Absent,
            JsonValue::Array(items) => FieldValue::Sequence(
                items
                    .iter()
                    .filter_map(|item| match item {
                        JsonValue::Null => None,
                        other => Some(json_scalar_to_string(other)),
                    })
                    .collect(),
            ),
            other => FieldValue::Scalar(json_scalar_to_string(other)),
        }
    }

    /// Convert back to JSON (`null`, string, or array of strings).
    pub fn to_json(&self) -> JsonValue {
        match self {
            FieldValue::Absent => JsonValue::Null,
            FieldValue::Scalar(s) => JsonValue::String(s.clone()),
            FieldValue::Sequence(items) => {
                JsonValue::Array(items.iter().cloned().map(JsonValue::String).collect())
            }
        }
    }

    /// True for `Absent`, an empty scalar, or an empty sequence.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Absent => true,
            FieldValue::Scalar(s) => s.is_empty(),
            FieldValue::Sequence(items) => items.is_empty(),
        }
    }

    /// Iterate the textual values: one for a scalar, each element for a sequence.
    pub fn values(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            FieldValue::Absent => Box::new(std::iter::empty()),
            FieldValue::Scalar(s) => Box::new(std::iter::once(s.as_str())),
            FieldValue::Sequence(items) => Box::new(items.iter().map(String::as_str)),
        }
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            FieldValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[String]> {
        match self {
            FieldValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Render for display or export, joining sequence elements with `separator`.
    pub fn display_joined(&self, separator: &str) -> String {
        match self {
            FieldValue::Absent => String::new(),
            FieldValue::Scalar(s) => s.clone(),
            FieldValue::Sequence(items) => items.join(separator),
        }
    }
}

fn json_scalar_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Scalar(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Scalar(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        FieldValue::Sequence(value)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Absent => serializer.serialize_none(),
            FieldValue::Scalar(s) => serializer.serialize_str(s),
            FieldValue::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Ok(FieldValue::from_json(&value))
    }
}

/// Build a custom-fields bag from a JSON object. Non-object input yields an empty bag.
pub fn custom_fields_from_json(value: &JsonValue) -> CustomFields {
    match value {
        JsonValue::Object(map) => map
            .iter()
            .map(|(key, value)| (key.clone(), FieldValue::from_json(value)))
            .collect(),
        _ => CustomFields::new(),
    }
}

/// Serialize a custom-fields bag to a JSON object.
pub fn custom_fields_to_json(fields: &CustomFields) -> JsonValue {
    JsonValue::Object(
        fields
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_shapes() {
        assert_eq!(FieldValue::from_json(&json!(null)), FieldValue::Absent);
        assert_eq!(
            FieldValue::from_json(&json!("React")),
            FieldValue::scalar("React")
        );
        assert_eq!(
            FieldValue::from_json(&json!(["React", "Python"])),
            FieldValue::sequence(["React", "Python"])
        );
    }

    #[test]
    fn test_from_json_stringifies_non_strings() {
        assert_eq!(FieldValue::from_json(&json!(42)), FieldValue::scalar("42"));
        assert_eq!(FieldValue::from_json(&json!(true)), FieldValue::scalar("true"));
        assert_eq!(
            FieldValue::from_json(&json!([1, null, "x"])),
            FieldValue::sequence(["1", "x"])
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(FieldValue::Absent.is_empty());
        assert!(FieldValue::scalar("").is_empty());
        assert!(FieldValue::Sequence(vec![]).is_empty());
        assert!(!FieldValue::scalar("x").is_empty());
    }

    #[test]
    fn test_values_iterates_scalar_and_sequence() {
        let scalar = FieldValue::scalar("a");
        assert_eq!(scalar.values().collect::<Vec<_>>(), vec!["a"]);
        let seq = FieldValue::sequence(["a", "b"]);
        assert_eq!(seq.values().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(FieldValue::Absent.values().count(), 0);
    }

    #[test]
    fn test_serde_matches_json_shape() -> Result<(), serde_json::Error> {
        let mut fields = CustomFields::new();
        fields.insert("title".to_string(), FieldValue::scalar("Engineer"));
        fields.insert("skills".to_string(), FieldValue::sequence(["Rust"]));
        fields.insert("notes".to_string(), FieldValue::Absent);

        let json = serde_json::to_value(&fields)?;
        assert_eq!(
            json,
            json!({"title": "Engineer", "skills": ["Rust"], "notes": null})
        );

        let parsed: CustomFields = serde_json::from_value(json)?;
        assert_eq!(parsed, fields);
        Ok(())
    }

    #[test]
    fn test_custom_fields_from_non_object_is_empty() {
        assert!(custom_fields_from_json(&json!([1, 2])).is_empty());
        assert!(custom_fields_from_json(&json!(null)).is_empty());
    }
}
