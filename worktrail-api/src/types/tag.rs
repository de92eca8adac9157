//! Tag-related API types

use serde::{Deserialize, Serialize};
use worktrail_core::Tag;
use worktrail_storage::TagUpdate;

/// Request to create a tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreateTagRequest {
    pub name: String,
}

/// Request to rename a tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UpdateTagRequest {
    pub name: Option<String>,
}

impl From<UpdateTagRequest> for TagUpdate {
    fn from(req: UpdateTagRequest) -> Self {
        TagUpdate { name: req.name }
    }
}

/// Tags ordered by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ListTagsResponse {
    pub tags: Vec<Tag>,
    pub total: usize,
}

impl From<Vec<Tag>> for ListTagsResponse {
    fn from(tags: Vec<Tag>) -> Self {
        let total = tags.len();
        Self { tags, total }
    }
}
