//! In-memory store
//!
//! Backs the test suites and the `memory` storage backend. A single lock
//! guards all tables so multi-record operations (order swaps, tag-set
//! replacement, cascades) are atomic.

use crate::{ExperienceStore, StorageStatistics};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use worktrail_core::{
    Column, ColumnId, EntityType, Experience, ExperienceId, ExperienceTag, StorageError, Tag,
    TagId, WorktrailError, WorktrailResult,
};

#[derive(Debug, Default)]
struct Tables {
    columns: HashMap<ColumnId, Column>,
    tags: HashMap<TagId, Tag>,
    /// Records are kept with an empty `tags` list; tags come from `links`.
    experiences: HashMap<ExperienceId, Experience>,
    links: BTreeSet<ExperienceTag>,
}

impl Tables {
    fn key_taken(&self, key: &str, except: ColumnId) -> bool {
        self.columns
            .values()
            .any(|c| c.key == key && c.column_id != except)
    }

    fn tag_name_taken(&self, name: &str, except: TagId) -> bool {
        self.tags.values().any(|t| t.name == name && t.tag_id != except)
    }

    fn require_experience(&self, id: ExperienceId) -> WorktrailResult<()> {
        if self.experiences.contains_key(&id) {
            Ok(())
        } else {
            Err(WorktrailError::not_found(EntityType::Experience, id))
        }
    }

    fn require_tags<'a>(&self, ids: impl IntoIterator<Item = &'a TagId>) -> WorktrailResult<()> {
        match ids.into_iter().find(|id| !self.tags.contains_key(id)) {
            Some(missing) => Err(WorktrailError::not_found(EntityType::Tag, *missing)),
            None => Ok(()),
        }
    }

    /// Copy of a stored experience with its linked tags, ordered by name.
    fn hydrate(&self, record: &Experience) -> Experience {
        let mut tags: Vec<Tag> = self
            .links
            .iter()
            .filter(|link| link.experience_id == record.experience_id)
            .filter_map(|link| self.tags.get(&link.tag_id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));

        let mut experience = record.clone();
        experience.tags = tags;
        experience
    }

    fn unlink_experience(&mut self, experience_id: ExperienceId) {
        self.links.retain(|link| link.experience_id != experience_id);
    }
}

/// In-memory implementation of [`ExperienceStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        *tables = Tables::default();
    }
}

fn conflict(entity_type: EntityType, field: &str, value: &str) -> WorktrailError {
    WorktrailError::Storage(StorageError::Conflict {
        entity_type,
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn already_exists(entity_type: EntityType) -> WorktrailError {
    WorktrailError::Storage(StorageError::InsertFailed {
        entity_type,
        reason: "already exists".to_string(),
    })
}

#[async_trait]
impl ExperienceStore for MemoryStore {
    // === Column Operations ===

    async fn column_insert(&self, c: &Column) -> WorktrailResult<()> {
        let mut tables = self.tables.write().await;
        if tables.columns.contains_key(&c.column_id) {
            return Err(already_exists(EntityType::Column));
        }
        if tables.key_taken(&c.key, c.column_id) {
            return Err(conflict(EntityType::Column, "key", &c.key));
        }
        tables.columns.insert(c.column_id, c.clone());
        Ok(())
    }

    async fn column_get(&self, id: ColumnId) -> WorktrailResult<Option<Column>> {
        let tables = self.tables.read().await;
        Ok(tables.columns.get(&id).cloned())
    }

    async fn column_list(&self) -> WorktrailResult<Vec<Column>> {
        let tables = self.tables.read().await;
        let mut columns: Vec<Column> = tables.columns.values().cloned().collect();
        columns.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.key.cmp(&b.key)));
        Ok(columns)
    }

    async fn column_update(&self, c: &Column) -> WorktrailResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.columns.contains_key(&c.column_id) {
            return Err(WorktrailError::not_found(EntityType::Column, c.column_id));
        }
        if tables.key_taken(&c.key, c.column_id) {
            return Err(conflict(EntityType::Column, "key", &c.key));
        }
        tables.columns.insert(c.column_id, c.clone());
        Ok(())
    }

    async fn column_delete(&self, id: ColumnId) -> WorktrailResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .columns
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| WorktrailError::not_found(EntityType::Column, id))
    }

    async fn column_swap_order(&self, a: ColumnId, b: ColumnId) -> WorktrailResult<()> {
        let mut tables = self.tables.write().await;
        let order_a = tables
            .columns
            .get(&a)
            .map(|c| c.order)
            .ok_or_else(|| WorktrailError::not_found(EntityType::Column, a))?;
        let order_b = tables
            .columns
            .get(&b)
            .map(|c| c.order)
            .ok_or_else(|| WorktrailError::not_found(EntityType::Column, b))?;

        let now = Utc::now();
        for (id, order) in [(a, order_b), (b, order_a)] {
            if let Some(column) = tables.columns.get_mut(&id) {
                column.order = order;
                column.updated_at = now;
            }
        }
        Ok(())
    }

    // === Tag Operations ===

    async fn tag_insert(&self, t: &Tag) -> WorktrailResult<()> {
        let mut tables = self.tables.write().await;
        if tables.tags.contains_key(&t.tag_id) {
            return Err(already_exists(EntityType::Tag));
        }
        if tables.tag_name_taken(&t.name, t.tag_id) {
            return Err(conflict(EntityType::Tag, "name", &t.name));
        }
        tables.tags.insert(t.tag_id, t.clone());
        Ok(())
    }

    async fn tag_get(&self, id: TagId) -> WorktrailResult<Option<Tag>> {
        let tables = self.tables.read().await;
        Ok(tables.tags.get(&id).cloned())
    }

    async fn tag_get_by_name(&self, name: &str) -> WorktrailResult<Option<Tag>> {
        let tables = self.tables.read().await;
        Ok(tables.tags.values().find(|t| t.name == name).cloned())
    }

    async fn tag_list(&self) -> WorktrailResult<Vec<Tag>> {
        let tables = self.tables.read().await;
        let mut tags: Vec<Tag> = tables.tags.values().cloned().collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn tag_update(&self, t: &Tag) -> WorktrailResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.tags.contains_key(&t.tag_id) {
            return Err(WorktrailError::not_found(EntityType::Tag, t.tag_id));
        }
        if tables.tag_name_taken(&t.name, t.tag_id) {
            return Err(conflict(EntityType::Tag, "name", &t.name));
        }
        tables.tags.insert(t.tag_id, t.clone());
        Ok(())
    }

    async fn tag_delete(&self, id: TagId) -> WorktrailResult<()> {
        let mut tables = self.tables.write().await;
        if tables.tags.remove(&id).is_none() {
            return Err(WorktrailError::not_found(EntityType::Tag, id));
        }
        tables.links.retain(|link| link.tag_id != id);
        Ok(())
    }

    // === Experience Operations ===

    async fn experience_insert(&self, e: &Experience) -> WorktrailResult<()> {
        let mut tables = self.tables.write().await;
        if tables.experiences.contains_key(&e.experience_id) {
            return Err(already_exists(EntityType::Experience));
        }
        tables.require_tags(e.tags.iter().map(|t| &t.tag_id))?;

        for tag in &e.tags {
            tables.links.insert(ExperienceTag {
                experience_id: e.experience_id,
                tag_id: tag.tag_id,
            });
        }
        let mut record = e.clone();
        record.tags.clear();
        tables.experiences.insert(record.experience_id, record);
        Ok(())
    }

    async fn experience_get(&self, id: ExperienceId) -> WorktrailResult<Option<Experience>> {
        let tables = self.tables.read().await;
        Ok(tables.experiences.get(&id).map(|record| tables.hydrate(record)))
    }

    async fn experience_update(&self, e: &Experience) -> WorktrailResult<()> {
        let mut tables = self.tables.write().await;
        let record = tables
            .experiences
            .get_mut(&e.experience_id)
            .ok_or_else(|| WorktrailError::not_found(EntityType::Experience, e.experience_id))?;

        record.start_date = e.start_date;
        record.end_date = e.end_date;
        record.custom_fields = e.custom_fields.clone();
        record.updated_at = e.updated_at;
        Ok(())
    }

    async fn experience_delete(&self, id: ExperienceId) -> WorktrailResult<()> {
        let mut tables = self.tables.write().await;
        if tables.experiences.remove(&id).is_none() {
            return Err(WorktrailError::not_found(EntityType::Experience, id));
        }
        tables.unlink_experience(id);
        Ok(())
    }

    async fn experience_list_with_tags(&self) -> WorktrailResult<Vec<Experience>> {
        let tables = self.tables.read().await;
        let mut experiences: Vec<Experience> = tables
            .experiences
            .values()
            .map(|record| tables.hydrate(record))
            .collect();
        experiences.sort_by(|a, b| {
            b.start_date
                .cmp(&a.start_date)
                .then_with(|| a.experience_id.cmp(&b.experience_id))
        });
        Ok(experiences)
    }

    // === Link Operations ===

    async fn experience_tag_link(
        &self,
        experience_id: ExperienceId,
        tag_id: TagId,
    ) -> WorktrailResult<()> {
        let mut tables = self.tables.write().await;
        tables.require_experience(experience_id)?;
        tables.require_tags([&tag_id])?;
        tables.links.insert(ExperienceTag {
            experience_id,
            tag_id,
        });
        Ok(())
    }

    async fn experience_tag_unlink(
        &self,
        experience_id: ExperienceId,
        tag_id: TagId,
    ) -> WorktrailResult<bool> {
        let mut tables = self.tables.write().await;
        tables.require_experience(experience_id)?;
        Ok(tables.links.remove(&ExperienceTag {
            experience_id,
            tag_id,
        }))
    }

    async fn experience_set_tags(
        &self,
        experience_id: ExperienceId,
        tag_ids: &[TagId],
    ) -> WorktrailResult<()> {
        let mut tables = self.tables.write().await;
        tables.require_experience(experience_id)?;
        tables.require_tags(tag_ids)?;

        tables.unlink_experience(experience_id);
        for &tag_id in tag_ids {
            tables.links.insert(ExperienceTag {
                experience_id,
                tag_id,
            });
        }
        Ok(())
    }

    // === Health ===

    async fn health_check(&self) -> WorktrailResult<bool> {
        Ok(true)
    }

    async fn statistics(&self) -> WorktrailResult<StorageStatistics> {
        let tables = self.tables.read().await;
        Ok(StorageStatistics {
            column_count: tables.columns.len() as i64,
            experience_count: tables.experiences.len() as i64,
            tag_count: tables.tags.len() as i64,
            link_count: tables.links.len() as i64,
        })
    }
}
