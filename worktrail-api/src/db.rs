//! Database Connection Pool Module
//!
//! This module provides PostgreSQL connection pooling using deadpool-postgres
//! and [`PgStore`], the PostgreSQL implementation of [`ExperienceStore`].
//!
//! Multi-row writes (order swaps, tag-set replacement, inserts that link
//! tags) run inside a single transaction.

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use deadpool_postgres::{
    Config, GenericClient, ManagerConfig, Object, Pool, PoolConfig, RecyclingMethod, Runtime,
};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::types::FromSql;
use tokio_postgres::{NoTls, Row};
use tracing::{debug, info};
use worktrail_core::{
    custom_fields_from_json, custom_fields_to_json, Column, ColumnId, ColumnType, EntityType,
    Experience, ExperienceId, StorageError, Tag, TagId, WorktrailError, WorktrailResult,
};
use worktrail_storage::{ExperienceStore, StorageStatistics};

/// Idempotent schema applied by [`PgStore::migrate`].
const SCHEMA_SQL: &str = include_str!("sql/schema.sql");

const COLUMN_FIELDS: &str = "column_id, name, column_key, column_type, dropdown_options, \
     allow_multiple, is_visible, sort_order, created_at, updated_at";

const EXPERIENCE_FIELDS: &str =
    "experience_id, start_date, end_date, custom_fields, created_at, updated_at";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "worktrail".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("WORKTRAIL_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("WORKTRAIL_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("WORKTRAIL_DB_NAME").unwrap_or_else(|_| "worktrail".to_string()),
            user: std::env::var("WORKTRAIL_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("WORKTRAIL_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("WORKTRAIL_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("WORKTRAIL_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());
        cfg.connect_timeout = Some(self.timeout);

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_config = PoolConfig::new(self.max_size);
        pool_config.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn backend(err: impl std::fmt::Display) -> WorktrailError {
    StorageError::Backend {
        reason: err.to_string(),
    }
    .into()
}

/// Map a write error. Unique violations on a named constraint become
/// `Conflict`; on a primary key they mean the id already exists.
fn write_error(
    err: tokio_postgres::Error,
    entity_type: EntityType,
    unique: Option<(&str, &str)>,
) -> WorktrailError {
    if let Some(db) = err.as_db_error() {
        if *db.code() == SqlState::UNIQUE_VIOLATION {
            let primary_key = db.constraint().is_some_and(|c| c.ends_with("_pkey"));
            return match unique {
                Some((field, value)) if !primary_key => StorageError::Conflict {
                    entity_type,
                    field: field.to_string(),
                    value: value.to_string(),
                }
                .into(),
                _ => StorageError::InsertFailed {
                    entity_type,
                    reason: "already exists".to_string(),
                }
                .into(),
            };
        }
    }
    backend(err)
}

fn get<'a, T: FromSql<'a>>(row: &'a Row, name: &str) -> WorktrailResult<T> {
    row.try_get(name).map_err(backend)
}

fn column_from_row(row: &Row) -> WorktrailResult<Column> {
    let column_type: String = get(row, "column_type")?;
    Ok(Column {
        column_id: get(row, "column_id")?,
        name: get(row, "name")?,
        key: get(row, "column_key")?,
        column_type: ColumnType::from_db_str(&column_type).map_err(backend)?,
        dropdown_options: get(row, "dropdown_options")?,
        allow_multiple: get(row, "allow_multiple")?,
        is_visible: get(row, "is_visible")?,
        order: get(row, "sort_order")?,
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

fn tag_from_row(row: &Row) -> WorktrailResult<Tag> {
    Ok(Tag {
        tag_id: get(row, "tag_id")?,
        name: get(row, "name")?,
        created_at: get(row, "created_at")?,
    })
}

fn experience_from_row(row: &Row) -> WorktrailResult<Experience> {
    let custom_fields: serde_json::Value = get(row, "custom_fields")?;
    Ok(Experience {
        experience_id: get(row, "experience_id")?,
        start_date: get(row, "start_date")?,
        end_date: get(row, "end_date")?,
        custom_fields: custom_fields_from_json(&custom_fields),
        tags: Vec::new(),
        created_at: get(row, "created_at")?,
        updated_at: get(row, "updated_at")?,
    })
}

// ============================================================================
// POSTGRES STORE
// ============================================================================

/// PostgreSQL-backed [`ExperienceStore`] over a deadpool connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Create a new store with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new store from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> WorktrailResult<Object> {
        self.pool
            .get()
            .await
            .map_err(|e| backend(format!("Connection pool: {}", e)))
    }

    /// Apply the schema. Safe to run on every startup.
    pub async fn migrate(&self) -> WorktrailResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(SCHEMA_SQL).await.map_err(backend)?;
        info!("Database schema applied");
        Ok(())
    }

    /// Ensure every id in `tag_ids` names an existing tag.
    async fn require_tags(
        client: &impl GenericClient,
        tag_ids: &[TagId],
    ) -> WorktrailResult<()> {
        if tag_ids.is_empty() {
            return Ok(());
        }
        let rows = client
            .query("SELECT tag_id FROM tags WHERE tag_id = ANY($1)", &[&tag_ids])
            .await
            .map_err(backend)?;
        let found = rows
            .iter()
            .map(|row| get::<TagId>(row, "tag_id"))
            .collect::<WorktrailResult<BTreeSet<_>>>()?;
        match tag_ids.iter().find(|id| !found.contains(id)) {
            Some(&missing) => Err(WorktrailError::not_found(EntityType::Tag, missing)),
            None => Ok(()),
        }
    }

    async fn require_experience(
        client: &impl GenericClient,
        id: ExperienceId,
    ) -> WorktrailResult<()> {
        let row = client
            .query_opt(
                "SELECT 1 FROM experiences WHERE experience_id = $1",
                &[&id],
            )
            .await
            .map_err(backend)?;
        row.map(|_| ())
            .ok_or_else(|| WorktrailError::not_found(EntityType::Experience, id))
    }

    /// Resolve tags for the given experiences, grouped by experience and
    /// sorted by name. `None` resolves every link.
    async fn tags_by_experience(
        conn: &Object,
        ids: Option<&[ExperienceId]>,
    ) -> WorktrailResult<HashMap<ExperienceId, Vec<Tag>>> {
        let base = "SELECT et.experience_id, t.tag_id, t.name, t.created_at \
                    FROM experience_tags et JOIN tags t ON t.tag_id = et.tag_id";
        let rows = match ids {
            Some(ids) => {
                let sql = format!("{} WHERE et.experience_id = ANY($1) ORDER BY t.name", base);
                conn.query(&sql, &[&ids]).await
            }
            None => {
                let sql = format!("{} ORDER BY t.name", base);
                conn.query(&sql, &[]).await
            }
        }
        .map_err(backend)?;

        let mut grouped: HashMap<ExperienceId, Vec<Tag>> = HashMap::new();
        for row in &rows {
            let experience_id: ExperienceId = get(row, "experience_id")?;
            grouped.entry(experience_id).or_default().push(tag_from_row(row)?);
        }
        Ok(grouped)
    }
}

#[async_trait]
impl ExperienceStore for PgStore {
    // === Column Operations ===

    async fn column_insert(&self, c: &Column) -> WorktrailResult<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO columns (column_id, name, column_key, column_type, dropdown_options, \
             allow_multiple, is_visible, sort_order, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            &[
                &c.column_id,
                &c.name,
                &c.key,
                &c.column_type.as_db_str(),
                &c.dropdown_options,
                &c.allow_multiple,
                &c.is_visible,
                &c.order,
                &c.created_at,
                &c.updated_at,
            ],
        )
        .await
        .map_err(|e| write_error(e, EntityType::Column, Some(("key", &c.key))))?;
        debug!(column_id = %c.column_id, key = %c.key, "Column inserted");
        Ok(())
    }

    async fn column_get(&self, id: ColumnId) -> WorktrailResult<Option<Column>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT {} FROM columns WHERE column_id = $1", COLUMN_FIELDS);
        let row = conn.query_opt(&sql, &[&id]).await.map_err(backend)?;
        row.as_ref().map(column_from_row).transpose()
    }

    async fn column_list(&self) -> WorktrailResult<Vec<Column>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM columns ORDER BY sort_order, column_key",
            COLUMN_FIELDS
        );
        let rows = conn.query(&sql, &[]).await.map_err(backend)?;
        rows.iter().map(column_from_row).collect()
    }

    async fn column_update(&self, c: &Column) -> WorktrailResult<()> {
        let conn = self.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE columns SET name = $2, column_key = $3, column_type = $4, \
                 dropdown_options = $5, allow_multiple = $6, is_visible = $7, \
                 sort_order = $8, updated_at = $9 WHERE column_id = $1",
                &[
                    &c.column_id,
                    &c.name,
                    &c.key,
                    &c.column_type.as_db_str(),
                    &c.dropdown_options,
                    &c.allow_multiple,
                    &c.is_visible,
                    &c.order,
                    &c.updated_at,
                ],
            )
            .await
            .map_err(|e| write_error(e, EntityType::Column, Some(("key", &c.key))))?;
        if updated == 0 {
            return Err(WorktrailError::not_found(EntityType::Column, c.column_id));
        }
        Ok(())
    }

    async fn column_delete(&self, id: ColumnId) -> WorktrailResult<()> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM columns WHERE column_id = $1", &[&id])
            .await
            .map_err(backend)?;
        if deleted == 0 {
            return Err(WorktrailError::not_found(EntityType::Column, id));
        }
        Ok(())
    }

    async fn column_swap_order(&self, a: ColumnId, b: ColumnId) -> WorktrailResult<()> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(backend)?;

        // Lock both rows so concurrent swaps serialize.
        let rows = tx
            .query(
                "SELECT column_id, sort_order FROM columns \
                 WHERE column_id = ANY($1) ORDER BY column_id FOR UPDATE",
                &[&vec![a, b]],
            )
            .await
            .map_err(backend)?;
        let mut orders: HashMap<ColumnId, i32> = HashMap::new();
        for row in &rows {
            orders.insert(get(row, "column_id")?, get(row, "sort_order")?);
        }
        let order_a = *orders
            .get(&a)
            .ok_or_else(|| WorktrailError::not_found(EntityType::Column, a))?;
        let order_b = *orders
            .get(&b)
            .ok_or_else(|| WorktrailError::not_found(EntityType::Column, b))?;

        for (id, order) in [(a, order_b), (b, order_a)] {
            tx.execute(
                "UPDATE columns SET sort_order = $2, updated_at = NOW() WHERE column_id = $1",
                &[&id, &order],
            )
            .await
            .map_err(backend)?;
        }

        tx.commit().await.map_err(|e| {
            WorktrailError::from(StorageError::TransactionFailed {
                reason: e.to_string(),
            })
        })?;
        debug!(%a, %b, "Column orders swapped");
        Ok(())
    }

    // === Tag Operations ===

    async fn tag_insert(&self, t: &Tag) -> WorktrailResult<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO tags (tag_id, name, created_at) VALUES ($1, $2, $3)",
            &[&t.tag_id, &t.name, &t.created_at],
        )
        .await
        .map_err(|e| write_error(e, EntityType::Tag, Some(("name", &t.name))))?;
        Ok(())
    }

    async fn tag_get(&self, id: TagId) -> WorktrailResult<Option<Tag>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT tag_id, name, created_at FROM tags WHERE tag_id = $1",
                &[&id],
            )
            .await
            .map_err(backend)?;
        row.as_ref().map(tag_from_row).transpose()
    }

    async fn tag_get_by_name(&self, name: &str) -> WorktrailResult<Option<Tag>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT tag_id, name, created_at FROM tags WHERE name = $1",
                &[&name],
            )
            .await
            .map_err(backend)?;
        row.as_ref().map(tag_from_row).transpose()
    }

    async fn tag_list(&self) -> WorktrailResult<Vec<Tag>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query("SELECT tag_id, name, created_at FROM tags ORDER BY name", &[])
            .await
            .map_err(backend)?;
        rows.iter().map(tag_from_row).collect()
    }

    async fn tag_update(&self, t: &Tag) -> WorktrailResult<()> {
        let conn = self.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE tags SET name = $2 WHERE tag_id = $1",
                &[&t.tag_id, &t.name],
            )
            .await
            .map_err(|e| write_error(e, EntityType::Tag, Some(("name", &t.name))))?;
        if updated == 0 {
            return Err(WorktrailError::not_found(EntityType::Tag, t.tag_id));
        }
        Ok(())
    }

    async fn tag_delete(&self, id: TagId) -> WorktrailResult<()> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM tags WHERE tag_id = $1", &[&id])
            .await
            .map_err(backend)?;
        if deleted == 0 {
            return Err(WorktrailError::not_found(EntityType::Tag, id));
        }
        Ok(())
    }

    // === Experience Operations ===

    async fn experience_insert(&self, e: &Experience) -> WorktrailResult<()> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(backend)?;

        let tag_ids = e.tag_ids();
        Self::require_tags(&tx, &tag_ids).await?;

        let custom_fields = custom_fields_to_json(&e.custom_fields);
        tx.execute(
            "INSERT INTO experiences (experience_id, start_date, end_date, custom_fields, \
             created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6)",
            &[
                &e.experience_id,
                &e.start_date,
                &e.end_date,
                &custom_fields,
                &e.created_at,
                &e.updated_at,
            ],
        )
        .await
        .map_err(|err| write_error(err, EntityType::Experience, None))?;

        for tag_id in &tag_ids {
            tx.execute(
                "INSERT INTO experience_tags (experience_id, tag_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
                &[&e.experience_id, tag_id],
            )
            .await
            .map_err(backend)?;
        }

        tx.commit().await.map_err(|err| {
            WorktrailError::from(StorageError::TransactionFailed {
                reason: err.to_string(),
            })
        })?;
        debug!(experience_id = %e.experience_id, tags = tag_ids.len(), "Experience inserted");
        Ok(())
    }

    async fn experience_get(&self, id: ExperienceId) -> WorktrailResult<Option<Experience>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM experiences WHERE experience_id = $1",
            EXPERIENCE_FIELDS
        );
        let Some(row) = conn.query_opt(&sql, &[&id]).await.map_err(backend)? else {
            return Ok(None);
        };
        let mut experience = experience_from_row(&row)?;
        let mut tags = Self::tags_by_experience(&conn, Some(std::slice::from_ref(&id))).await?;
        experience.tags = tags.remove(&id).unwrap_or_default();
        Ok(Some(experience))
    }

    async fn experience_update(&self, e: &Experience) -> WorktrailResult<()> {
        let conn = self.get_conn().await?;
        let custom_fields = custom_fields_to_json(&e.custom_fields);
        let updated = conn
            .execute(
                "UPDATE experiences SET start_date = $2, end_date = $3, custom_fields = $4, \
                 updated_at = $5 WHERE experience_id = $1",
                &[
                    &e.experience_id,
                    &e.start_date,
                    &e.end_date,
                    &custom_fields,
                    &e.updated_at,
                ],
            )
            .await
            .map_err(backend)?;
        if updated == 0 {
            return Err(WorktrailError::not_found(
                EntityType::Experience,
                e.experience_id,
            ));
        }
        Ok(())
    }

    async fn experience_delete(&self, id: ExperienceId) -> WorktrailResult<()> {
        let conn = self.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM experiences WHERE experience_id = $1", &[&id])
            .await
            .map_err(backend)?;
        if deleted == 0 {
            return Err(WorktrailError::not_found(EntityType::Experience, id));
        }
        Ok(())
    }

    async fn experience_list_with_tags(&self) -> WorktrailResult<Vec<Experience>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT {} FROM experiences ORDER BY start_date DESC, experience_id",
            EXPERIENCE_FIELDS
        );
        let rows = conn.query(&sql, &[]).await.map_err(backend)?;
        let mut tags = Self::tags_by_experience(&conn, None).await?;

        rows.iter()
            .map(|row| {
                let mut experience = experience_from_row(row)?;
                experience.tags = tags.remove(&experience.experience_id).unwrap_or_default();
                Ok(experience)
            })
            .collect()
    }

    // === Link Operations ===

    async fn experience_tag_link(
        &self,
        experience_id: ExperienceId,
        tag_id: TagId,
    ) -> WorktrailResult<()> {
        let conn = self.get_conn().await?;
        Self::require_experience(&conn, experience_id).await?;
        Self::require_tags(&conn, &[tag_id]).await?;
        conn.execute(
            "INSERT INTO experience_tags (experience_id, tag_id) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
            &[&experience_id, &tag_id],
        )
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn experience_tag_unlink(
        &self,
        experience_id: ExperienceId,
        tag_id: TagId,
    ) -> WorktrailResult<bool> {
        let conn = self.get_conn().await?;
        Self::require_experience(&conn, experience_id).await?;
        let deleted = conn
            .execute(
                "DELETE FROM experience_tags WHERE experience_id = $1 AND tag_id = $2",
                &[&experience_id, &tag_id],
            )
            .await
            .map_err(backend)?;
        Ok(deleted > 0)
    }

    async fn experience_set_tags(
        &self,
        experience_id: ExperienceId,
        tag_ids: &[TagId],
    ) -> WorktrailResult<()> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(backend)?;

        Self::require_experience(&tx, experience_id).await?;
        Self::require_tags(&tx, tag_ids).await?;

        tx.execute(
            "DELETE FROM experience_tags WHERE experience_id = $1",
            &[&experience_id],
        )
        .await
        .map_err(backend)?;
        for tag_id in tag_ids {
            tx.execute(
                "INSERT INTO experience_tags (experience_id, tag_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
                &[&experience_id, tag_id],
            )
            .await
            .map_err(backend)?;
        }

        tx.commit().await.map_err(|e| {
            WorktrailError::from(StorageError::TransactionFailed {
                reason: e.to_string(),
            })
        })?;
        Ok(())
    }

    // === Health ===

    async fn health_check(&self) -> WorktrailResult<bool> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await.map_err(backend)?;
        Ok(true)
    }

    async fn statistics(&self) -> WorktrailResult<StorageStatistics> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "SELECT (SELECT COUNT(*) FROM columns) AS column_count, \
                        (SELECT COUNT(*) FROM experiences) AS experience_count, \
                        (SELECT COUNT(*) FROM tags) AS tag_count, \
                        (SELECT COUNT(*) FROM experience_tags) AS link_count",
                &[],
            )
            .await
            .map_err(backend)?;
        Ok(StorageStatistics {
            column_count: get(&row, "column_count")?,
            experience_count: get(&row, "experience_count")?,
            tag_count: get(&row, "tag_count")?,
            link_count: get(&row, "link_count")?,
        })
    }
}
