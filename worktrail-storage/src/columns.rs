//! Column management: creation, updates, ordering and default seeding

use crate::{ColumnUpdate, ExperienceStore};
use tracing::{debug, info};
use worktrail_core::{
    default_columns, derive_key, next_column_order, prepare_column, Column, ColumnId, ColumnType,
    EntityType, MoveDirection, SchemaRegistry, WorktrailError, WorktrailResult,
};

/// Request to create a column.
#[derive(Debug, Clone)]
pub struct NewColumn {
    pub name: String,
    /// Explicit key; derived from `name` when absent or blank
    pub key: Option<String>,
    pub column_type: ColumnType,
    pub dropdown_options: Vec<String>,
    pub allow_multiple: bool,
    pub is_visible: bool,
    /// Explicit order; defaults to one past the current maximum
    pub order: Option<i32>,
}

impl NewColumn {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            key: None,
            column_type,
            dropdown_options: Vec::new(),
            allow_multiple: false,
            is_visible: true,
            order: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
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

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Key to store: the explicit key if non-blank, otherwise derived from the name.
    fn resolve_key(&self) -> WorktrailResult<String> {
        let key = match self.key.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => explicit.to_string(),
            _ => derive_key(&self.name),
        };
        if key.is_empty() {
            return Err(WorktrailError::invalid_value(
                "key",
                format!("no key can be derived from name '{}'", self.name),
            ));
        }
        Ok(key)
    }
}

/// Current columns as a registry.
pub async fn load_registry<S>(store: &S) -> WorktrailResult<SchemaRegistry>
where
    S: ExperienceStore + ?Sized,
{
    Ok(SchemaRegistry::new(store.column_list().await?))
}

/// Create a column, deriving its key and order when not supplied.
///
/// A key already in use surfaces as `StorageError::Conflict` from the store.
pub async fn create_column<S>(store: &S, new: NewColumn) -> WorktrailResult<Column>
where
    S: ExperienceStore + ?Sized,
{
    let key = new.resolve_key()?;
    let order = match new.order {
        Some(order) => order,
        None => next_column_order(&store.column_list().await?),
    };

    let column = Column::new(new.name, key, new.column_type, order)
        .with_options(new.dropdown_options)
        .with_allow_multiple(new.allow_multiple)
        .with_visible(new.is_visible);
    let column = prepare_column(column)?;

    store.column_insert(&column).await?;
    debug!(column_id = %column.column_id, key = %column.key, order = column.order, "Column created");
    Ok(column)
}

/// Apply a partial update to a column.
pub async fn update_column<S>(
    store: &S,
    id: ColumnId,
    update: ColumnUpdate,
) -> WorktrailResult<Column>
where
    S: ExperienceStore + ?Sized,
{
    let mut column = store
        .column_get(id)
        .await?
        .ok_or_else(|| WorktrailError::not_found(EntityType::Column, id))?;
    update.apply_to(&mut column);
    let column = prepare_column(column)?;

    store.column_update(&column).await?;
    debug!(column_id = %id, key = %column.key, "Column updated");
    Ok(column)
}

/// Delete a column. Values stored under its key stay on experiences.
pub async fn delete_column<S>(store: &S, id: ColumnId) -> WorktrailResult<()>
where
    S: ExperienceStore + ?Sized,
{
    store.column_delete(id).await?;
    debug!(column_id = %id, "Column deleted");
    Ok(())
}

/// Move a column one slot up or down by swapping orders with its neighbor.
///
/// Moving the first column up or the last column down changes nothing.
/// Returns the column list after the move.
pub async fn move_column<S>(
    store: &S,
    id: ColumnId,
    direction: MoveDirection,
) -> WorktrailResult<Vec<Column>>
where
    S: ExperienceStore + ?Sized,
{
    let registry = load_registry(store).await?;
    let pair = registry
        .neighbor(id, direction)?
        .map(|(moving, other)| (moving.column_id, other.column_id));

    match pair {
        Some((moving, other)) => {
            store.column_swap_order(moving, other).await?;
            debug!(column_id = %id, ?direction, "Column moved");
            store.column_list().await
        }
        None => Ok(registry.into_columns()),
    }
}

/// Seed the starter columns when none exist.
///
/// Idempotent: returns the number of columns created, zero when columns
/// were already present. A seed that loses a uniqueness race to a
/// concurrent seeder counts as already seeded.
pub async fn ensure_default_columns<S>(store: &S) -> WorktrailResult<usize>
where
    S: ExperienceStore + ?Sized,
{
    if !store.column_list().await?.is_empty() {
        debug!("Columns present, skipping default seeding");
        return Ok(0);
    }

    let mut created = 0;
    for column in default_columns() {
        match store.column_insert(&column).await {
            Ok(()) => created += 1,
            Err(e) if e.is_conflict() => {
                debug!(key = %column.key, "Default column already seeded");
            }
            Err(e) => return Err(e),
        }
    }
    info!(created, "Default columns seeded");
    Ok(created)
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::MemoryStore;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        /// Any sequence of moves only permutes the existing order values.
        #[test]
        fn prop_moves_permute_orders(
            count in 1usize..6,
            moves in proptest::collection::vec((0usize..6, any::<bool>()), 0..20),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            let result: WorktrailResult<(Vec<i32>, Vec<i32>)> = rt.block_on(async {
                let store = MemoryStore::new();
                let mut ids = Vec::new();
                for i in 0..count {
                    let column = create_column(
                        &store,
                        NewColumn::new(format!("Column {i}"), ColumnType::ShortText),
                    )
                    .await?;
                    ids.push(column.column_id);
                }
                let before: Vec<i32> = store.column_list().await?.iter().map(|c| c.order).collect();

                for (idx, up) in moves {
                    let direction = if up { MoveDirection::Up } else { MoveDirection::Down };
                    move_column(&store, ids[idx % ids.len()], direction).await?;
                }

                let mut after: Vec<i32> = store.column_list().await?.iter().map(|c| c.order).collect();
                after.sort_unstable();
                Ok((before, after))
            });
            let (before, after) = result.map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(before, after);
        }
    }
}
