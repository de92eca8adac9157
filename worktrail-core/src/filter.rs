//! Experience filter and search engine
//!
//! A [`FilterSpec`] is compiled into a list of rules, one per active predicate
//! category. An experience is kept only when every rule accepts it; an empty
//! spec keeps everything. Evaluation is in-memory over a materialized
//! snapshot and preserves the input order.

use crate::{parse_date, Date, Experience, TagId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Filter request. Every field is optional; absent fields impose no constraint.
///
/// Deserialization is lenient: malformed values (an unparsable date, a
/// non-UUID tag id, a dropdown entry that is not a string or list) are
/// dropped and the corresponding predicate is simply inactive.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FilterSpec {
    /// Keep experiences starting on or after this date
    #[serde(
        default,
        alias = "startDate",
        deserialize_with = "lenient::date",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub start_date: Option<Date>,

    /// Keep experiences with no end date or ending on or before this date
    #[serde(
        default,
        alias = "endDate",
        deserialize_with = "lenient::date",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "date"))]
    pub end_date: Option<Date>,

    /// Keep experiences carrying at least one of these tags
    #[serde(
        default,
        alias = "tagIds",
        deserialize_with = "lenient::ids",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<String>))]
    pub tag_ids: BTreeSet<TagId>,

    /// Case-insensitive substring matched against field values and tag names
    #[serde(
        default,
        alias = "searchTerm",
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub search_term: Option<String>,

    /// Column key to accepted options; AND across keys, OR within a key
    #[serde(
        default,
        alias = "dropdownFilters",
        deserialize_with = "lenient::dropdowns",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub dropdown_filters: BTreeMap<String, Vec<String>>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_date(mut self, date: Date) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_end_date(mut self, date: Date) -> Self {
        self.end_date = Some(date);
        self
    }

    pub fn with_tag(mut self, tag_id: TagId) -> Self {
        self.tag_ids.insert(tag_id);
        self
    }

    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = Some(term.into());
        self
    }

    pub fn with_dropdown<I, S>(mut self, key: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dropdown_filters
            .insert(key.into(), options.into_iter().map(Into::into).collect());
        self
    }

    /// Build a spec from flat query-string pairs.
    ///
    /// Recognizes `start_date`, `end_date`, `tag_ids` (comma-separated),
    /// `search_term`, and `dropdown.<key>=<opt>[,<opt>]`. camelCase names are
    /// accepted too. Unknown or malformed pairs are ignored.
    pub fn from_query_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut spec = FilterSpec::default();
        for (name, value) in pairs {
            match name {
                "start_date" | "startDate" => spec.start_date = parse_date(value),
                "end_date" | "endDate" => spec.end_date = parse_date(value),
                "tag_ids" | "tagIds" => {
                    spec.tag_ids.extend(lenient::split_ids(value));
                }
                "search_term" | "searchTerm" => spec.search_term = lenient::non_blank(value),
                other => {
                    let key = other
                        .strip_prefix("dropdown.")
                        .or_else(|| other.strip_prefix("dropdownFilters."));
                    if let Some(key) = key.filter(|k| !k.is_empty()) {
                        let options = value
                            .split(',')
                            .map(str::trim)
                            .filter(|o| !o.is_empty())
                            .map(str::to_string);
                        spec.dropdown_filters
                            .entry(key.to_string())
                            .or_default()
                            .extend(options);
                    }
                }
            }
        }
        spec
    }

    /// True when no predicate is active.
    pub fn is_unconstrained(&self) -> bool {
        CompiledFilter::compile(self).is_unconstrained()
    }
}

// ============================================================================
// RULES
// ============================================================================

/// One active predicate, with its comparison values pre-normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    StartsOnOrAfter(Date),
    EndsOnOrBefore(Date),
    HasAnyTag(HashSet<TagId>),
    DropdownMatches { key: String, options: HashSet<String> },
    Contains(String),
}

impl Rule {
    fn matches(&self, experience: &Experience) -> bool {
        match self {
            Rule::StartsOnOrAfter(bound) => experience.start_date >= *bound,
            Rule::EndsOnOrBefore(bound) => match experience.end_date {
                Some(end) => end <= *bound,
                None => true,
            },
            Rule::HasAnyTag(ids) => experience.tags.iter().any(|t| ids.contains(&t.tag_id)),
            Rule::DropdownMatches { key, options } => experience
                .field(key)
                .values()
                .any(|v| options.contains(&v.to_lowercase())),
            Rule::Contains(needle) => {
                let in_fields = experience
                    .custom_fields
                    .values()
                    .flat_map(|value| value.values())
                    .any(|v| v.to_lowercase().contains(needle.as_str()));
                in_fields
                    || experience
                        .tags
                        .iter()
                        .any(|t| t.name.to_lowercase().contains(needle.as_str()))
            }
        }
    }
}

/// A filter spec compiled into rules, ready to evaluate many experiences.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilter {
    rules: Vec<Rule>,
}

impl CompiledFilter {
    pub fn compile(spec: &FilterSpec) -> Self {
        let mut rules = Vec::new();

        if let Some(start) = spec.start_date {
            rules.push(Rule::StartsOnOrAfter(start));
        }
        if let Some(end) = spec.end_date {
            rules.push(Rule::EndsOnOrBefore(end));
        }
        if !spec.tag_ids.is_empty() {
            rules.push(Rule::HasAnyTag(spec.tag_ids.iter().copied().collect()));
        }
        for (key, selected) in &spec.dropdown_filters {
            // An entry with nothing selected does not constrain its column.
            if selected.is_empty() {
                continue;
            }
            rules.push(Rule::DropdownMatches {
                key: key.clone(),
                options: selected.iter().map(|o| o.to_lowercase()).collect(),
            });
        }
        // An all-blank term is inactive; otherwise the term is matched as given.
        if let Some(term) = spec.search_term.as_deref() {
            if !term.trim().is_empty() {
                rules.push(Rule::Contains(term.to_lowercase()));
            }
        }

        Self { rules }
    }

    /// True when every experience passes.
    pub fn is_unconstrained(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of active predicates.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn matches(&self, experience: &Experience) -> bool {
        self.rules.iter().all(|rule| rule.matches(experience))
    }

    /// Lazily yield matching experiences in input order.
    pub fn apply<'a>(
        &'a self,
        experiences: &'a [Experience],
    ) -> impl Iterator<Item = &'a Experience> + 'a {
        experiences.iter().filter(move |e| self.matches(e))
    }
}

/// Return the experiences satisfying every active predicate of `spec`,
/// in their original relative order.
pub fn search(experiences: &[Experience], spec: &FilterSpec) -> Vec<Experience> {
    let filter = CompiledFilter::compile(spec);
    if filter.is_unconstrained() {
        return experiences.to_vec();
    }
    filter.apply(experiences).cloned().collect()
}

/// Owned variant of [`search`] that avoids cloning records.
pub fn search_owned(experiences: Vec<Experience>, spec: &FilterSpec) -> Vec<Experience> {
    let filter = CompiledFilter::compile(spec);
    if filter.is_unconstrained() {
        return experiences;
    }
    experiences.into_iter().filter(|e| filter.matches(e)).collect()
}

// ============================================================================
// LENIENT DESERIALIZERS
// ============================================================================

mod lenient {
    use super::*;
    use serde::Deserializer;
    use serde_json::Value as JsonValue;
    use uuid::Uuid;

    pub(super) fn date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
        let value = JsonValue::deserialize(d)?;
        Ok(value.as_str().and_then(parse_date))
    }

    pub(super) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = JsonValue::deserialize(d)?;
        Ok(value.as_str().and_then(non_blank))
    }

    pub(super) fn ids<'de, D: Deserializer<'de>>(d: D) -> Result<BTreeSet<TagId>, D::Error> {
        let value = JsonValue::deserialize(d)?;
        Ok(match value {
            JsonValue::Array(items) => items
                .iter()
                .filter_map(JsonValue::as_str)
                .filter_map(|s| Uuid::parse_str(s.trim()).ok())
                .collect(),
            JsonValue::String(s) => split_ids(&s).collect(),
            _ => BTreeSet::new(),
        })
    }

    pub(super) fn dropdowns<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<BTreeMap<String, Vec<String>>, D::Error> {
        let value = JsonValue::deserialize(d)?;
        let JsonValue::Object(map) = value else {
            return Ok(BTreeMap::new());
        };
        Ok(map
            .into_iter()
            .filter(|(key, _)| !key.is_empty())
            .filter_map(|(key, value)| {
                let options = match value {
                    JsonValue::Array(items) => items
                        .into_iter()
                        .filter_map(|item| match item {
                            JsonValue::String(s) => Some(s),
                            JsonValue::Number(n) => Some(n.to_string()),
                            JsonValue::Bool(b) => Some(b.to_string()),
                            _ => None,
                        })
                        .collect(),
                    JsonValue::String(s) => vec![s],
                    _ => return None,
                };
                Some((key, options))
            })
            .collect())
    }

    pub(super) fn split_ids(raw: &str) -> impl Iterator<Item = TagId> + '_ {
        raw.split(',')
            .filter_map(|part| Uuid::parse_str(part.trim()).ok())
    }

    pub(super) fn non_blank(raw: &str) -> Option<String> {
        if raw.trim().is_empty() {
            None
        } else {
            Some(raw.to_string())
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Column, ColumnType, FieldValue, SchemaRegistry, Tag};
    use chrono::NaiveDate;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn ids(found: &[Experience]) -> Vec<uuid::Uuid> {
        found.iter().map(|e| e.experience_id).collect()
    }

    #[test]
    fn test_empty_spec_is_identity() {
        let exps = vec![
            Experience::new(date(2020, 1, 1), None),
            Experience::new(date(2019, 1, 1), Some(date(2019, 6, 1))),
        ];
        assert_eq!(search(&exps, &FilterSpec::default()), exps);
    }

    #[test]
    fn test_start_date_bound() {
        let exp = Experience::new(date(2021, 6, 1), None);
        let exps = vec![exp.clone()];

        let later = FilterSpec::new().with_start_date(date(2021, 7, 1));
        assert!(search(&exps, &later).is_empty());

        let earlier = FilterSpec::new().with_start_date(date(2021, 1, 1));
        assert_eq!(ids(&search(&exps, &earlier)), vec![exp.experience_id]);

        let same_day = FilterSpec::new().with_start_date(date(2021, 6, 1));
        assert_eq!(search(&exps, &same_day).len(), 1);
    }

    #[test]
    fn test_end_date_bound_keeps_ongoing() {
        let ongoing = Experience::new(date(2010, 1, 1), None);
        let ended_early = Experience::new(date(2010, 1, 1), Some(date(2012, 1, 1)));
        let ended_late = Experience::new(date(2010, 1, 1), Some(date(2020, 1, 1)));
        let exps = vec![ongoing.clone(), ended_early.clone(), ended_late];

        let spec = FilterSpec::new().with_end_date(date(2015, 1, 1));
        assert_eq!(
            ids(&search(&exps, &spec)),
            vec![ongoing.experience_id, ended_early.experience_id]
        );
    }

    #[test]
    fn test_tag_filter_is_or_within_set() {
        let rust = Tag::new("rust");
        let go = Tag::new("go");
        let java = Tag::new("java");
        let a = Experience::new(date(2020, 1, 1), None).with_tags(vec![rust.clone()]);
        let b = Experience::new(date(2020, 1, 1), None).with_tags(vec![go.clone(), java.clone()]);
        let c = Experience::new(date(2020, 1, 1), None).with_tags(vec![java.clone()]);
        let exps = vec![a.clone(), b.clone(), c];

        let only_rust = FilterSpec::new().with_tag(rust.tag_id);
        assert_eq!(ids(&search(&exps, &only_rust)), vec![a.experience_id]);

        let rust_or_go = FilterSpec::new().with_tag(rust.tag_id).with_tag(go.tag_id);
        assert_eq!(
            ids(&search(&exps, &rust_or_go)),
            vec![a.experience_id, b.experience_id]
        );
    }

    #[test]
    fn test_dropdown_multi_select_intersection() {
        let bc = Experience::new(date(2020, 1, 1), None)
            .with_field("skills", FieldValue::sequence(["B", "C"]));
        let c = Experience::new(date(2020, 1, 1), None)
            .with_field("skills", FieldValue::sequence(["C"]));
        let exps = vec![bc.clone(), c];

        let spec = FilterSpec::new().with_dropdown("skills", ["A", "B"]);
        assert_eq!(ids(&search(&exps, &spec)), vec![bc.experience_id]);
    }

    #[test]
    fn test_dropdown_scalar_is_case_insensitive_equality() {
        let senior = Experience::new(date(2020, 1, 1), None).with_field("level", "Senior");
        let seniority = Experience::new(date(2020, 1, 1), None).with_field("level", "Seniority");
        let exps = vec![senior.clone(), seniority];

        let spec = FilterSpec::new().with_dropdown("level", ["senior"]);
        assert_eq!(ids(&search(&exps, &spec)), vec![senior.experience_id]);
    }

    #[test]
    fn test_dropdown_absent_or_empty_value_is_excluded() {
        let missing = Experience::new(date(2020, 1, 1), None);
        let empty = Experience::new(date(2020, 1, 1), None)
            .with_field("skills", FieldValue::Sequence(vec![]));
        let blank = Experience::new(date(2020, 1, 1), None).with_field("skills", "");
        let spec = FilterSpec::new().with_dropdown("skills", ["React"]);
        assert!(search(&[missing, empty, blank], &spec).is_empty());
    }

    #[test]
    fn test_dropdown_with_empty_selection_is_inactive() {
        let exps = vec![Experience::new(date(2020, 1, 1), None)];
        let spec = FilterSpec::new().with_dropdown("skills", Vec::<String>::new());
        assert!(spec.is_unconstrained());
        assert_eq!(search(&exps, &spec).len(), 1);
    }

    #[test]
    fn test_dropdown_keys_are_anded() {
        let both = Experience::new(date(2020, 1, 1), None)
            .with_field("skills", FieldValue::sequence(["React"]))
            .with_field("level", "Senior");
        let skills_only = Experience::new(date(2020, 1, 1), None)
            .with_field("skills", FieldValue::sequence(["React"]))
            .with_field("level", "Junior");
        let exps = vec![both.clone(), skills_only];

        let spec = FilterSpec::new()
            .with_dropdown("skills", ["react"])
            .with_dropdown("level", ["Senior"]);
        assert_eq!(ids(&search(&exps, &spec)), vec![both.experience_id]);
    }

    #[test]
    fn test_search_term_matches_fields_and_tags_case_insensitively() {
        let by_field = Experience::new(date(2020, 1, 1), None)
            .with_field("skills", FieldValue::sequence(["React", "Go"]));
        let by_tag = Experience::new(date(2020, 1, 1), None).with_tags(vec![Tag::new("REACT")]);
        let by_scalar = Experience::new(date(2020, 1, 1), None).with_field("title", "Reactor engineer");
        let neither = Experience::new(date(2020, 1, 1), None).with_field("title", "Backend");
        let exps = vec![by_field.clone(), by_tag.clone(), by_scalar.clone(), neither];

        let spec = FilterSpec::new().with_search_term("react");
        assert_eq!(
            ids(&search(&exps, &spec)),
            vec![by_field.experience_id, by_tag.experience_id, by_scalar.experience_id]
        );
    }

    #[test]
    fn test_blank_search_term_is_inactive() {
        let exps = vec![Experience::new(date(2020, 1, 1), None)];
        let spec = FilterSpec::new().with_search_term("   ");
        assert_eq!(search(&exps, &spec).len(), 1);
    }

    #[test]
    fn test_search_term_is_not_trimmed() {
        let plain = Experience::new(date(2020, 1, 1), None).with_field("skills", "React");
        let spaced = Experience::new(date(2020, 1, 1), None).with_field("title", "React developer");
        let exps = vec![plain, spaced.clone()];

        let spec = FilterSpec::new().with_search_term("react ");
        assert_eq!(ids(&search(&exps, &spec)), vec![spaced.experience_id]);
    }

    #[test]
    fn test_categories_combine_with_and() {
        let tag = Tag::new("consulting");
        let hit = Experience::new(date(2021, 3, 1), Some(date(2021, 9, 1)))
            .with_field("company", "Acme")
            .with_tags(vec![tag.clone()]);
        let wrong_date = Experience::new(date(2018, 3, 1), None)
            .with_field("company", "Acme")
            .with_tags(vec![tag.clone()]);
        let wrong_text = Experience::new(date(2021, 3, 1), None)
            .with_field("company", "Globex")
            .with_tags(vec![tag.clone()]);
        let exps = vec![wrong_date, hit.clone(), wrong_text];

        let spec = FilterSpec::new()
            .with_start_date(date(2020, 1, 1))
            .with_tag(tag.tag_id)
            .with_search_term("acme");
        assert_eq!(ids(&search(&exps, &spec)), vec![hit.experience_id]);
    }

    #[test]
    fn test_skills_scenario_with_registry() {
        let registry = SchemaRegistry::new(vec![Column::new("Skills", "skills", ColumnType::Dropdown, 1)
            .with_options(["React", "Python"])
            .with_allow_multiple(true)]);

        let mut react = Experience::new(date(2020, 1, 1), None);
        react.custom_fields.insert("skills".into(), FieldValue::scalar("React"));
        react.custom_fields = registry.normalize_fields(react.custom_fields);
        let python = Experience::new(date(2020, 1, 1), None)
            .with_field("skills", FieldValue::sequence(["Python"]));

        let spec = FilterSpec::new().with_dropdown("skills", ["React"]);
        assert!(registry.unknown_dropdown_filter_keys(&spec).is_empty());
        assert_eq!(
            ids(&search(&[react.clone(), python], &spec)),
            vec![react.experience_id]
        );
    }

    #[test]
    fn test_deserialize_camel_case_aliases() -> Result<(), serde_json::Error> {
        let tag = uuid::Uuid::now_v7();
        let spec: FilterSpec = serde_json::from_value(json!({
            "startDate": "2021-01-01",
            "endDate": "2022-12-31",
            "tagIds": [tag.to_string()],
            "searchTerm": "rust",
            "dropdownFilters": {"skills": ["React"]}
        }))?;
        assert_eq!(spec.start_date, Some(date(2021, 1, 1)));
        assert_eq!(spec.end_date, Some(date(2022, 12, 31)));
        assert!(spec.tag_ids.contains(&tag));
        assert_eq!(spec.search_term.as_deref(), Some("rust"));
        assert_eq!(spec.dropdown_filters["skills"], vec!["React".to_string()]);
        Ok(())
    }

    #[test]
    fn test_deserialize_malformed_fields_become_inactive() -> Result<(), serde_json::Error> {
        let spec: FilterSpec = serde_json::from_value(json!({
            "start_date": "not a date",
            "end_date": 12,
            "tag_ids": ["nope", 7],
            "search_term": {"x": 1},
            "dropdown_filters": {"skills": {"nested": true}, "level": "Senior"}
        }))?;
        assert_eq!(spec.start_date, None);
        assert_eq!(spec.end_date, None);
        assert!(spec.tag_ids.is_empty());
        assert_eq!(spec.search_term, None);
        assert!(!spec.dropdown_filters.contains_key("skills"));
        assert_eq!(spec.dropdown_filters["level"], vec!["Senior".to_string()]);
        Ok(())
    }

    #[test]
    fn test_deserialize_nulls() -> Result<(), serde_json::Error> {
        let spec: FilterSpec = serde_json::from_value(json!({
            "start_date": null,
            "tag_ids": null,
            "dropdown_filters": null
        }))?;
        assert!(spec.is_unconstrained());
        Ok(())
    }

    #[test]
    fn test_from_query_pairs() {
        let tag = uuid::Uuid::now_v7();
        let tag_str = format!("{},garbage", tag);
        let spec = FilterSpec::from_query_pairs([
            ("start_date", "2020-01-01"),
            ("tag_ids", tag_str.as_str()),
            ("search_term", "lead"),
            ("dropdown.skills", "React, Python"),
            ("dropdown.", "ignored"),
            ("unknown", "ignored"),
        ]);
        assert_eq!(spec.start_date, Some(date(2020, 1, 1)));
        assert_eq!(spec.tag_ids.len(), 1);
        assert_eq!(spec.search_term.as_deref(), Some("lead"));
        assert_eq!(
            spec.dropdown_filters["skills"],
            vec!["React".to_string(), "Python".to_string()]
        );
        assert_eq!(spec.dropdown_filters.len(), 1);
    }

    #[test]
    fn test_compiled_filter_rule_count() {
        let spec = FilterSpec::new()
            .with_start_date(date(2020, 1, 1))
            .with_search_term("x")
            .with_dropdown("a", ["1"])
            .with_dropdown("b", Vec::<String>::new());
        assert_eq!(CompiledFilter::compile(&spec).rule_count(), 3);
    }

    #[test]
    fn test_search_owned_matches_search() {
        let exps = vec![
            Experience::new(date(2020, 1, 1), None).with_field("title", "Lead"),
            Experience::new(date(2020, 1, 1), None).with_field("title", "Intern"),
        ];
        let spec = FilterSpec::new().with_search_term("lead");
        assert_eq!(search(&exps, &spec), search_owned(exps.clone(), &spec));
    }
}
