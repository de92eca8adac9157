//! Tag management

use crate::{ExperienceStore, TagUpdate};
use tracing::debug;
use worktrail_core::{EntityType, Tag, TagId, WorktrailError, WorktrailResult};

fn checked_name(name: &str) -> WorktrailResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(WorktrailError::required("name"));
    }
    Ok(name.to_string())
}

/// Create a tag. Names are trimmed and must be unique.
pub async fn create_tag<S>(store: &S, name: &str) -> WorktrailResult<Tag>
where
    S: ExperienceStore + ?Sized,
{
    let tag = Tag::new(checked_name(name)?);
    store.tag_insert(&tag).await?;
    debug!(tag_id = %tag.tag_id, name = %tag.name, "Tag created");
    Ok(tag)
}

/// Get a tag, or a not-found error.
pub async fn get_tag<S>(store: &S, id: TagId) -> WorktrailResult<Tag>
where
    S: ExperienceStore + ?Sized,
{
    store
        .tag_get(id)
        .await?
        .ok_or_else(|| WorktrailError::not_found(EntityType::Tag, id))
}

/// Rename a tag.
pub async fn update_tag<S>(store: &S, id: TagId, update: TagUpdate) -> WorktrailResult<Tag>
where
    S: ExperienceStore + ?Sized,
{
    let mut tag = get_tag(store, id).await?;
    update.apply_to(&mut tag);
    tag.name = checked_name(&tag.name)?;
    store.tag_update(&tag).await?;
    debug!(tag_id = %id, name = %tag.name, "Tag updated");
    Ok(tag)
}

/// Delete a tag and its links.
pub async fn delete_tag<S>(store: &S, id: TagId) -> WorktrailResult<()>
where
    S: ExperienceStore + ?Sized,
{
    store.tag_delete(id).await?;
    debug!(tag_id = %id, "Tag deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn test_create_trims_and_rejects_blank() -> WorktrailResult<()> {
        let store = MemoryStore::new();
        let tag = create_tag(&store, "  rust ").await?;
        assert_eq!(tag.name, "rust");
        assert!(create_tag(&store, "   ").await.is_err());
        let dup = create_tag(&store, "rust").await.err();
        assert!(matches!(dup, Some(ref e) if e.is_conflict()));
        Ok(())
    }

    #[tokio::test]
    async fn test_rename_conflict() -> WorktrailResult<()> {
        let store = MemoryStore::new();
        let rust = create_tag(&store, "rust").await?;
        create_tag(&store, "go").await?;

        let renamed = update_tag(
            &store,
            rust.tag_id,
            TagUpdate {
                name: Some("systems".to_string()),
            },
        )
        .await?;
        assert_eq!(renamed.name, "systems");

        let err = update_tag(
            &store,
            rust.tag_id,
            TagUpdate {
                name: Some("go".to_string()),
            },
        )
        .await
        .err();
        assert!(matches!(err, Some(ref e) if e.is_conflict()));

        let blank = update_tag(
            &store,
            rust.tag_id,
            TagUpdate {
                name: Some(" ".to_string()),
            },
        )
        .await
        .err();
        assert!(matches!(blank, Some(WorktrailError::Validation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = delete_tag(&store, uuid::Uuid::now_v7()).await.err();
        assert!(matches!(err, Some(ref e) if e.is_not_found()));
    }
}
