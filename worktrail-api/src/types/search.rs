//! Search and export API types

use serde::{Deserialize, Serialize};
use worktrail_core::FilterSpec;

/// Content type of CSV exports.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// Attachment name of CSV exports.
pub const CSV_FILE_NAME: &str = "experiences.csv";

/// Raw query pairs of `GET /api/v1/experiences` and the CSV download.
///
/// Kept as pairs so `dropdown.<key>` parameters survive extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterQuery(pub Vec<(String, String)>);

impl FilterQuery {
    pub fn to_filter(&self) -> FilterSpec {
        FilterSpec::from_query_pairs(self.0.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn query(pairs: &[(&str, &str)]) -> FilterQuery {
        FilterQuery(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_query_to_filter() {
        let spec = query(&[
            ("start_date", "2020-01-01"),
            ("search_term", "rust"),
            ("dropdown.skills", "Rust, Go"),
        ])
        .to_filter();
        assert_eq!(spec.start_date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(spec.search_term.as_deref(), Some("rust"));
        assert_eq!(
            spec.dropdown_filters.get("skills"),
            Some(&vec!["Rust".to_string(), "Go".to_string()])
        );
    }

    #[test]
    fn test_empty_query_is_unconstrained() {
        assert!(FilterQuery::default().to_filter().is_unconstrained());
    }
}
