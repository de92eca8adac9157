//! PostgreSQL store tests. Require a reachable database configured through
//! the `WORKTRAIL_DB_*` variables; run with `--features db-tests`.
#![cfg(feature = "db-tests")]

use worktrail_api::{ApiResult, DbConfig, PgStore};
use worktrail_core::*;
use worktrail_storage::*;

async fn test_store() -> ApiResult<PgStore> {
    let store = PgStore::from_config(&DbConfig::from_env())?;
    store.migrate().await?;
    Ok(store)
}

fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, uuid::Uuid::now_v7().simple())
}

#[tokio::test]
async fn pg_experience_roundtrip_with_tags() -> ApiResult<()> {
    let store = test_store().await?;
    let tag = create_tag(&store, &unique("tag-")).await?;
    let start = chrono::NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();

    let created = create_experience(
        &store,
        NewExperience::new(start).with_tags(vec![tag.tag_id]),
    )
    .await?;
    let fetched = get_experience(&store, created.experience_id).await?;
    assert_eq!(fetched.start_date, start);
    assert_eq!(fetched.tags.len(), 1);

    let unlinked = unlink_experience_tag(&store, created.experience_id, tag.tag_id).await?;
    assert!(unlinked.tags.is_empty());

    delete_experience(&store, created.experience_id).await?;
    delete_tag(&store, tag.tag_id).await?;
    Ok(())
}

#[tokio::test]
async fn pg_duplicate_column_key_conflicts() -> ApiResult<()> {
    let store = test_store().await?;
    let name = unique("col");
    let column = create_column(&store, NewColumn::new(name.clone(), ColumnType::ShortText)).await?;

    let duplicate = create_column(&store, NewColumn::new(name, ColumnType::Date)).await;
    assert!(matches!(duplicate, Err(ref e) if e.is_conflict()));

    delete_column(&store, column.column_id).await?;
    Ok(())
}

#[tokio::test]
async fn pg_migrate_is_idempotent() -> ApiResult<()> {
    let store = test_store().await?;
    store.migrate().await?;
    store.migrate().await?;
    Ok(())
}
