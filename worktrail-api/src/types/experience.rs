//! Experience-related API types

use serde::{Deserialize, Deserializer, Serialize};
use worktrail_core::{CustomFields, Date, Experience, TagId};
use worktrail_storage::{ExperienceUpdate, NewExperience};

/// Distinguish an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request to create an experience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateExperienceRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date"))]
    pub start_date: Date,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub end_date: Option<Date>,
    /// Values keyed by column key
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub custom_fields: CustomFields,
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub tag_ids: Vec<TagId>,
}

impl From<CreateExperienceRequest> for NewExperience {
    fn from(req: CreateExperienceRequest) -> Self {
        NewExperience {
            start_date: req.start_date,
            end_date: req.end_date,
            custom_fields: req.custom_fields,
            tag_ids: req.tag_ids,
        }
    }
}

/// Request to update an experience. Absent fields are left unchanged;
/// `"end_date": null` clears the end date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateExperienceRequest {
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub start_date: Option<Date>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub end_date: Option<Option<Date>>,
    /// Replaces the whole custom-fields bag
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub custom_fields: Option<CustomFields>,
    /// Replaces the tag set
    #[serde(default)]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Vec<String>>))]
    pub tag_ids: Option<Vec<TagId>>,
}

impl From<UpdateExperienceRequest> for ExperienceUpdate {
    fn from(req: UpdateExperienceRequest) -> Self {
        ExperienceUpdate {
            start_date: req.start_date,
            end_date: req.end_date,
            custom_fields: req.custom_fields,
            tag_ids: req.tag_ids,
        }
    }
}

/// Request to replace an experience's tag set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ReplaceTagsRequest {
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub tag_ids: Vec<TagId>,
}

/// Experiences with the number returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListExperiencesResponse {
    pub experiences: Vec<Experience>,
    pub total: usize,
}

impl From<Vec<Experience>> for ListExperiencesResponse {
    fn from(experiences: Vec<Experience>) -> Self {
        let total = experiences.len();
        Self { experiences, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use worktrail_core::FieldValue;

    #[test]
    fn test_update_end_date_absent_vs_null() -> Result<(), serde_json::Error> {
        let absent: UpdateExperienceRequest = serde_json::from_value(json!({}))?;
        assert_eq!(absent.end_date, None);

        let cleared: UpdateExperienceRequest = serde_json::from_value(json!({"end_date": null}))?;
        assert_eq!(cleared.end_date, Some(None));

        let set: UpdateExperienceRequest =
            serde_json::from_value(json!({"end_date": "2022-01-31"}))?;
        assert_eq!(set.end_date, Some(chrono::NaiveDate::from_ymd_opt(2022, 1, 31)));
        Ok(())
    }

    #[test]
    fn test_create_request_fields() -> Result<(), serde_json::Error> {
        let req: CreateExperienceRequest = serde_json::from_value(json!({
            "start_date": "2020-02-01",
            "custom_fields": {"title": "Engineer", "skills": ["Rust", "Go"], "gone": null}
        }))?;
        assert!(req.end_date.is_none());
        assert!(req.tag_ids.is_empty());
        assert_eq!(req.custom_fields.get("title"), Some(&FieldValue::scalar("Engineer")));
        assert_eq!(
            req.custom_fields.get("skills"),
            Some(&FieldValue::sequence(["Rust", "Go"]))
        );
        assert_eq!(req.custom_fields.get("gone"), Some(&FieldValue::Absent));
        Ok(())
    }

    #[test]
    fn test_list_response_total() {
        let response = ListExperiencesResponse::from(Vec::new());
        assert_eq!(response.total, 0);
    }
}
