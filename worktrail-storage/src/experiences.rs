//! Experience management, search and export

use crate::{load_registry, ExperienceStore, ExperienceUpdate};
use std::collections::HashSet;
use tracing::debug;
use worktrail_core::{
    render_csv, search_owned, CustomFields, Date, EntityType, Experience, ExperienceId,
    FilterSpec, Tag, TagId, ValidationError, WorktrailError, WorktrailResult,
};

/// Request to create an experience.
#[derive(Debug, Clone)]
pub struct NewExperience {
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub custom_fields: CustomFields,
    pub tag_ids: Vec<TagId>,
}

impl NewExperience {
    pub fn new(start_date: Date) -> Self {
        Self {
            start_date,
            end_date: None,
            custom_fields: CustomFields::new(),
            tag_ids: Vec::new(),
        }
    }

    pub fn with_end_date(mut self, end_date: Date) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_fields(mut self, custom_fields: CustomFields) -> Self {
        self.custom_fields = custom_fields;
        self
    }

    pub fn with_tags(mut self, tag_ids: Vec<TagId>) -> Self {
        self.tag_ids = tag_ids;
        self
    }
}

/// Reject an end date that falls before the start date.
pub fn validate_date_range(start_date: Date, end_date: Option<Date>) -> WorktrailResult<()> {
    match end_date {
        Some(end) if end < start_date => Err(WorktrailError::Validation(
            ValidationError::ConstraintViolation {
                constraint: "end_date_after_start_date".to_string(),
                reason: format!("end date {} is before start date {}", end, start_date),
            },
        )),
        _ => Ok(()),
    }
}

/// Look up every tag id, dropping duplicates. Unknown ids are not-found errors.
async fn resolve_tags<S>(store: &S, tag_ids: &[TagId]) -> WorktrailResult<Vec<Tag>>
where
    S: ExperienceStore + ?Sized,
{
    let mut seen = HashSet::new();
    let mut tags = Vec::with_capacity(tag_ids.len());
    for &tag_id in tag_ids {
        if !seen.insert(tag_id) {
            continue;
        }
        let tag = store
            .tag_get(tag_id)
            .await?
            .ok_or_else(|| WorktrailError::not_found(EntityType::Tag, tag_id))?;
        tags.push(tag);
    }
    tags.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tags)
}

fn dedup_ids(tag_ids: &[TagId]) -> Vec<TagId> {
    let mut seen = HashSet::new();
    tag_ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Get an experience with tags, or a not-found error.
pub async fn get_experience<S>(store: &S, id: ExperienceId) -> WorktrailResult<Experience>
where
    S: ExperienceStore + ?Sized,
{
    store
        .experience_get(id)
        .await?
        .ok_or_else(|| WorktrailError::not_found(EntityType::Experience, id))
}

/// Create an experience with its custom fields shaped to the current columns.
pub async fn create_experience<S>(store: &S, new: NewExperience) -> WorktrailResult<Experience>
where
    S: ExperienceStore + ?Sized,
{
    validate_date_range(new.start_date, new.end_date)?;
    let registry = load_registry(store).await?;
    let tags = resolve_tags(store, &new.tag_ids).await?;

    let mut experience = Experience::new(new.start_date, new.end_date).with_tags(tags);
    experience.custom_fields = registry.normalize_fields(new.custom_fields);

    store.experience_insert(&experience).await?;
    debug!(
        experience_id = %experience.experience_id,
        tags = experience.tags.len(),
        "Experience created"
    );
    Ok(experience)
}

/// Apply a partial update; a tag set in the update replaces the current one.
pub async fn update_experience<S>(
    store: &S,
    id: ExperienceId,
    update: ExperienceUpdate,
) -> WorktrailResult<Experience>
where
    S: ExperienceStore + ?Sized,
{
    let mut experience = get_experience(store, id).await?;
    update.apply_to(&mut experience);
    validate_date_range(experience.start_date, experience.end_date)?;

    if update.custom_fields.is_some() {
        let registry = load_registry(store).await?;
        experience.custom_fields = registry.normalize_fields(experience.custom_fields);
    }

    // Unknown tags must fail before anything is written.
    let tag_ids = match &update.tag_ids {
        Some(ids) => Some(
            resolve_tags(store, ids)
                .await?
                .into_iter()
                .map(|t| t.tag_id)
                .collect::<Vec<_>>(),
        ),
        None => None,
    };

    store.experience_update(&experience).await?;
    if let Some(tag_ids) = &tag_ids {
        store.experience_set_tags(id, tag_ids).await?;
    }
    debug!(experience_id = %id, "Experience updated");
    get_experience(store, id).await
}

/// Delete an experience and its tag links.
pub async fn delete_experience<S>(store: &S, id: ExperienceId) -> WorktrailResult<()>
where
    S: ExperienceStore + ?Sized,
{
    store.experience_delete(id).await?;
    debug!(experience_id = %id, "Experience deleted");
    Ok(())
}

/// Replace the tag set of an experience.
pub async fn replace_experience_tags<S>(
    store: &S,
    id: ExperienceId,
    tag_ids: &[TagId],
) -> WorktrailResult<Experience>
where
    S: ExperienceStore + ?Sized,
{
    store.experience_set_tags(id, &dedup_ids(tag_ids)).await?;
    get_experience(store, id).await
}

/// Link one tag. Linking an already linked tag is accepted.
pub async fn link_experience_tag<S>(
    store: &S,
    id: ExperienceId,
    tag_id: TagId,
) -> WorktrailResult<Experience>
where
    S: ExperienceStore + ?Sized,
{
    store.experience_tag_link(id, tag_id).await?;
    get_experience(store, id).await
}

/// Unlink one tag. Unlinking a tag that was not linked is accepted.
pub async fn unlink_experience_tag<S>(
    store: &S,
    id: ExperienceId,
    tag_id: TagId,
) -> WorktrailResult<Experience>
where
    S: ExperienceStore + ?Sized,
{
    let removed = store.experience_tag_unlink(id, tag_id).await?;
    debug!(experience_id = %id, tag_id = %tag_id, removed, "Experience tag unlinked");
    get_experience(store, id).await
}

/// Load every experience and keep those matching `spec`.
pub async fn search_experiences<S>(store: &S, spec: &FilterSpec) -> WorktrailResult<Vec<Experience>>
where
    S: ExperienceStore + ?Sized,
{
    if !spec.dropdown_filters.is_empty() {
        let registry = load_registry(store).await?;
        let unknown = registry.unknown_dropdown_filter_keys(spec);
        if !unknown.is_empty() {
            debug!(?unknown, "Dropdown filter keys without a dropdown column");
        }
    }

    let all = store.experience_list_with_tags().await?;
    let total = all.len();
    let found = search_owned(all, spec);
    debug!(total, matched = found.len(), "Experience search");
    Ok(found)
}

/// Render the experiences matching `spec` as CSV.
pub async fn export_experiences_csv<S>(store: &S, spec: &FilterSpec) -> WorktrailResult<String>
where
    S: ExperienceStore + ?Sized,
{
    let registry = load_registry(store).await?;
    let found = search_owned(store.experience_list_with_tags().await?, spec);
    render_csv(&registry, &found)
}
