//! Worktrail Test Utilities
//!
//! Shared test infrastructure for the worktrail workspace:
//! - Proptest generators for columns, tags, experiences and filter specs
//! - Fixtures for common scenarios, including a seeded in-memory store
//! - Assertions for worktrail error variants

// Re-export the in-memory store from its source crate
pub use worktrail_storage::MemoryStore;

// Re-export core types for convenience
pub use worktrail_core::{
    Column, ColumnType, CustomFields, Date, EntityType, Experience, FieldValue, FilterSpec,
    StorageError, Tag, TagId, ValidationError, WorktrailError, WorktrailResult,
};

use chrono::NaiveDate;
use uuid::Uuid;

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for worktrail entity types.

    use super::*;
    use proptest::prelude::*;

    /// Options used by the generated `skills` dropdown values.
    pub const SKILL_OPTIONS: [&str; 5] = ["React", "Python", "Rust", "Go", "SQL"];

    /// Generate a random UUID.
    pub fn arb_uuid() -> impl Strategy<Value = Uuid> {
        any::<[u8; 16]>().prop_map(Uuid::from_bytes)
    }

    /// Generate a calendar date between 1995 and 2030.
    pub fn arb_date() -> impl Strategy<Value = Date> {
        (1995i32..2031, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
            NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
        })
    }

    /// Generate a ColumnType variant.
    pub fn arb_column_type() -> impl Strategy<Value = ColumnType> {
        prop_oneof![
            Just(ColumnType::Date),
            Just(ColumnType::ShortText),
            Just(ColumnType::LongText),
            Just(ColumnType::Dropdown),
        ]
    }

    /// Generate a column display name that always yields a non-empty key.
    pub fn arb_column_name() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z0-9 _!-]{0,20}"
    }

    /// Generate a column with a key derived from its name.
    pub fn arb_column() -> impl Strategy<Value = Column> {
        (
            arb_column_name(),
            arb_column_type(),
            proptest::sample::subsequence(SKILL_OPTIONS.to_vec(), 0..=SKILL_OPTIONS.len()),
            any::<bool>(),
            any::<bool>(),
            1i32..100,
        )
            .prop_map(|(name, column_type, options, multi, visible, order)| {
                let key = worktrail_core::derive_key(&name);
                let column = Column::new(name, key, column_type, order).with_visible(visible);
                if column_type.is_dropdown() {
                    column.with_options(options).with_allow_multiple(multi)
                } else {
                    column
                }
            })
    }

    /// Generate a custom field value of any shape.
    pub fn arb_field_value() -> impl Strategy<Value = FieldValue> {
        prop_oneof![
            Just(FieldValue::Absent),
            "[A-Za-z ]{0,16}".prop_map(FieldValue::Scalar),
            proptest::sample::subsequence(SKILL_OPTIONS.to_vec(), 0..=3)
                .prop_map(FieldValue::sequence),
        ]
    }

    /// Generate a tag with a short lowercase name.
    pub fn arb_tag() -> impl Strategy<Value = Tag> {
        "[a-z]{2,10}".prop_map(Tag::new)
    }

    /// Generate an experience whose tags are drawn from `pool`.
    ///
    /// End dates, when present, are on or after the start date.
    pub fn arb_experience(pool: Vec<Tag>) -> impl Strategy<Value = Experience> {
        let max_tags = pool.len();
        (
            arb_date(),
            proptest::option::of(0i64..4000),
            "[A-Za-z ]{0,20}",
            proptest::sample::subsequence(SKILL_OPTIONS.to_vec(), 0..=3),
            proptest::sample::subsequence(pool, 0..=max_tags),
        )
            .prop_map(|(start, span, title, skills, tags)| {
                let end = span.map(|days| start + chrono::Duration::days(days));
                Experience::new(start, end)
                    .with_field("title", title)
                    .with_field("skills", FieldValue::sequence(skills))
                    .with_tags(tags)
            })
    }

    /// Generate a filter spec over `pool` tag ids and the `skills` column.
    pub fn arb_filter_spec(pool: Vec<TagId>) -> impl Strategy<Value = FilterSpec> {
        let max_tags = pool.len();
        (
            proptest::option::of(arb_date()),
            proptest::option::of(arb_date()),
            proptest::sample::subsequence(pool, 0..=max_tags),
            proptest::option::of("[a-zA-Z]{0,4}"),
            proptest::sample::subsequence(SKILL_OPTIONS.to_vec(), 0..=2),
        )
            .prop_map(|(start, end, tags, term, skills)| {
                let mut spec = FilterSpec {
                    start_date: start,
                    end_date: end,
                    search_term: term,
                    ..Default::default()
                };
                spec.tag_ids.extend(tags);
                if !skills.is_empty() {
                    spec = spec.with_dropdown("skills", skills);
                }
                spec
            })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records for common test scenarios.

    use super::*;
    use worktrail_storage::{
        create_column, create_experience, create_tag, ExperienceStore, NewColumn, NewExperience,
    };

    /// Build a date, falling back to the epoch default for impossible input.
    pub fn date(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    /// Multi-select skills dropdown with React and Python options.
    pub fn skills_column() -> Column {
        Column::new("Skills", "skills", ColumnType::Dropdown, 1)
            .with_options(["React", "Python"])
            .with_allow_multiple(true)
    }

    /// Single-select seniority dropdown.
    pub fn level_column() -> Column {
        Column::new("Level", "level", ColumnType::Dropdown, 2).with_options(["Junior", "Senior"])
    }

    /// Experience with the given skills and no end date.
    pub fn experience_with_skills(start: Date, skills: &[&str]) -> Experience {
        Experience::new(start, None).with_field("skills", FieldValue::sequence(skills.iter().copied()))
    }

    /// Records created by [`seeded_store`].
    #[derive(Debug, Clone)]
    pub struct Seeded {
        pub rust: Tag,
        pub frontend: Tag,
        pub platform: Experience,
        pub webapp: Experience,
    }

    /// Store holding a skills column, two tags and two experiences.
    pub async fn seeded_store() -> WorktrailResult<(MemoryStore, Seeded)> {
        let store = MemoryStore::new();
        create_column(
            &store,
            NewColumn::new("Title", ColumnType::ShortText),
        )
        .await?;
        create_column(
            &store,
            NewColumn::new("Skills", ColumnType::Dropdown)
                .with_options(["React", "Python", "Rust"])
                .with_allow_multiple(true),
        )
        .await?;

        let rust = create_tag(&store, "rust").await?;
        let frontend = create_tag(&store, "frontend").await?;

        let platform = create_experience(
            &store,
            NewExperience::new(date(2019, 3, 1))
                .with_end_date(date(2021, 6, 30))
                .with_fields(
                    [
                        ("title".to_string(), FieldValue::scalar("Platform Engineer")),
                        ("skills".to_string(), FieldValue::sequence(["Rust", "Python"])),
                    ]
                    .into_iter()
                    .collect(),
                )
                .with_tags(vec![rust.tag_id]),
        )
        .await?;
        let webapp = create_experience(
            &store,
            NewExperience::new(date(2021, 7, 1))
                .with_fields(
                    [
                        ("title".to_string(), FieldValue::scalar("Frontend Lead")),
                        ("skills".to_string(), FieldValue::sequence(["React"])),
                    ]
                    .into_iter()
                    .collect(),
                )
                .with_tags(vec![frontend.tag_id]),
        )
        .await?;

        debug_assert_eq!(store.statistics().await?.experience_count, 2);
        Ok((
            store,
            Seeded {
                rust,
                frontend,
                platform,
                webapp,
            },
        ))
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for worktrail-specific results.

    use super::*;

    /// Assert that a WorktrailResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &WorktrailResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a WorktrailResult is Err.
    #[track_caller]
    pub fn assert_err<T: std::fmt::Debug>(result: &WorktrailResult<T>) {
        assert!(result.is_err(), "Expected Err, got Ok: {:?}", result);
    }

    /// Assert a not-found error for the given entity type.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &WorktrailResult<T>, entity_type: EntityType) {
        match result {
            Err(WorktrailError::Storage(StorageError::NotFound { entity_type: et, .. }))
                if *et == entity_type => {}
            other => panic!("Expected NotFound for {:?}, got: {:?}", entity_type, other),
        }
    }

    /// Assert a uniqueness conflict.
    #[track_caller]
    pub fn assert_conflict<T: std::fmt::Debug>(result: &WorktrailResult<T>) {
        match result {
            Err(WorktrailError::Storage(StorageError::Conflict { .. })) => {}
            other => panic!("Expected Conflict, got: {:?}", other),
        }
    }

    /// Assert a validation error of any kind.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &WorktrailResult<T>) {
        match result {
            Err(WorktrailError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    /// Assert `found` appears in `all` in the same relative order.
    #[track_caller]
    pub fn assert_subsequence(found: &[Experience], all: &[Experience]) {
        let mut cursor = all.iter();
        for hit in found {
            assert!(
                cursor.any(|e| e.experience_id == hit.experience_id),
                "experience {} out of order or missing from input",
                hit.experience_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_seeded_store() -> WorktrailResult<()> {
        let (store, seeded) = fixtures::seeded_store().await?;
        let all = worktrail_storage::search_experiences(&store, &FilterSpec::default()).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].experience_id, seeded.webapp.experience_id);
        assert!(all[1].has_tag(seeded.rust.tag_id));
        assert!(!all[1].has_tag(seeded.frontend.tag_id));
        assert_eq!(seeded.platform.experience_id, all[1].experience_id);
        Ok(())
    }

    #[test]
    fn test_assertion_not_found() {
        let result: WorktrailResult<()> = Err(WorktrailError::not_found(EntityType::Tag, Uuid::now_v7()));
        assertions::assert_not_found(&result, EntityType::Tag);
    }

    #[test]
    fn test_assertion_conflict() {
        let result: WorktrailResult<()> = Err(WorktrailError::Storage(StorageError::Conflict {
            entity_type: EntityType::Column,
            field: "key".to_string(),
            value: "title".to_string(),
        }));
        assertions::assert_conflict(&result);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_column_is_valid(column in generators::arb_column()) {
            prop_assert!(worktrail_core::prepare_column(column).is_ok());
        }

        #[test]
        fn prop_generated_experience_dates_ordered(
            exp in generators::arb_experience(vec![Tag::new("a"), Tag::new("b")])
        ) {
            if let Some(end) = exp.end_date {
                prop_assert!(end >= exp.start_date);
            }
        }

        #[test]
        fn prop_search_returns_subsequence(
            exps in proptest::collection::vec(generators::arb_experience(vec![Tag::new("a")]), 0..20),
            spec in generators::arb_filter_spec(vec![Uuid::now_v7()]),
        ) {
            let found = worktrail_core::search(&exps, &spec);
            assertions::assert_subsequence(&found, &exps);
        }
    }
}
