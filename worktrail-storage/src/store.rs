//! Async storage trait for the persistence boundary.
//!
//! Every backend (in-memory, PostgreSQL) implements [`ExperienceStore`].
//! Record-level operations take whole entities; partial updates are applied
//! by the management functions in this crate before they reach a store.

use async_trait::async_trait;
use serde::Serialize;
use worktrail_core::{Column, ColumnId, Experience, ExperienceId, Tag, TagId, WorktrailResult};

/// Async storage trait for worktrail records.
///
/// Uniqueness violations (column key, tag name) are reported as
/// `StorageError::Conflict`; operations on a missing id report
/// `StorageError::NotFound`.
#[async_trait]
pub trait ExperienceStore: Send + Sync {
    // ========================================================================
    // COLUMN OPERATIONS
    // ========================================================================

    /// Insert a new column.
    async fn column_insert(&self, c: &Column) -> WorktrailResult<()>;

    /// Get a column by ID.
    async fn column_get(&self, id: ColumnId) -> WorktrailResult<Option<Column>>;

    /// List all columns ordered by `order`, ties by key.
    async fn column_list(&self) -> WorktrailResult<Vec<Column>>;

    /// Replace a stored column with `c`.
    async fn column_update(&self, c: &Column) -> WorktrailResult<()>;

    /// Delete a column. Experience field values are left in place.
    async fn column_delete(&self, id: ColumnId) -> WorktrailResult<()>;

    /// Exchange the `order` values of two columns in one atomic step.
    async fn column_swap_order(&self, a: ColumnId, b: ColumnId) -> WorktrailResult<()>;

    // ========================================================================
    // TAG OPERATIONS
    // ========================================================================

    /// Insert a new tag.
    async fn tag_insert(&self, t: &Tag) -> WorktrailResult<()>;

    /// Get a tag by ID.
    async fn tag_get(&self, id: TagId) -> WorktrailResult<Option<Tag>>;

    /// Get a tag by exact name.
    async fn tag_get_by_name(&self, name: &str) -> WorktrailResult<Option<Tag>>;

    /// List all tags ordered by name.
    async fn tag_list(&self) -> WorktrailResult<Vec<Tag>>;

    /// Replace a stored tag with `t`.
    async fn tag_update(&self, t: &Tag) -> WorktrailResult<()>;

    /// Delete a tag and every link to it.
    async fn tag_delete(&self, id: TagId) -> WorktrailResult<()>;

    // ========================================================================
    // EXPERIENCE OPERATIONS
    // ========================================================================

    /// Insert a new experience and link the tags it carries.
    async fn experience_insert(&self, e: &Experience) -> WorktrailResult<()>;

    /// Get an experience by ID with its tags resolved.
    async fn experience_get(&self, id: ExperienceId) -> WorktrailResult<Option<Experience>>;

    /// Replace the stored dates and custom fields of `e`. Tags are not touched.
    async fn experience_update(&self, e: &Experience) -> WorktrailResult<()>;

    /// Delete an experience and its tag links.
    async fn experience_delete(&self, id: ExperienceId) -> WorktrailResult<()>;

    /// Every experience with tags resolved, newest start date first, ties by id.
    async fn experience_list_with_tags(&self) -> WorktrailResult<Vec<Experience>>;

    // ========================================================================
    // EXPERIENCE-TAG LINKS
    // ========================================================================

    /// Link a tag to an experience. Linking an existing pair is a no-op.
    async fn experience_tag_link(&self, experience_id: ExperienceId, tag_id: TagId)
        -> WorktrailResult<()>;

    /// Remove a link. Returns whether a link was removed.
    async fn experience_tag_unlink(
        &self,
        experience_id: ExperienceId,
        tag_id: TagId,
    ) -> WorktrailResult<bool>;

    /// Replace the full tag set of an experience in one atomic step.
    async fn experience_set_tags(
        &self,
        experience_id: ExperienceId,
        tag_ids: &[TagId],
    ) -> WorktrailResult<()>;

    // ========================================================================
    // HEALTH & DIAGNOSTICS
    // ========================================================================

    /// Check if the storage backend is healthy.
    async fn health_check(&self) -> WorktrailResult<bool>;

    /// Get record counts.
    async fn statistics(&self) -> WorktrailResult<StorageStatistics>;
}

/// Storage statistics for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageStatistics {
    pub column_count: i64,
    pub experience_count: i64,
    pub tag_count: i64,
    pub link_count: i64,
}
