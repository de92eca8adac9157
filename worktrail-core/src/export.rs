//! CSV export of experiences

use crate::{Experience, SchemaRegistry, WorktrailError, WorktrailResult};

/// Separator used for multi-select values and tag lists inside one cell.
pub const CELL_LIST_SEPARATOR: &str = ", ";

/// Header row: the two date columns, every visible column by name, then tags.
pub fn csv_header(registry: &SchemaRegistry) -> Vec<String> {
    let mut header = vec!["Start Date".to_string(), "End Date".to_string()];
    header.extend(registry.visible_columns().map(|c| c.name.clone()));
    header.push("Tags".to_string());
    header
}

/// One data row for `experience`, aligned with [`csv_header`].
pub fn csv_row(registry: &SchemaRegistry, experience: &Experience) -> Vec<String> {
    let mut row = vec![
        experience.start_date.format("%Y-%m-%d").to_string(),
        experience
            .end_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
    ];
    row.extend(
        registry
            .visible_columns()
            .map(|c| experience.field(&c.key).display_joined(CELL_LIST_SEPARATOR)),
    );

    let mut tag_names: Vec<&str> = experience.tags.iter().map(|t| t.name.as_str()).collect();
    tag_names.sort_unstable();
    row.push(tag_names.join(CELL_LIST_SEPARATOR));
    row
}

/// Render experiences as CSV text, in the order given.
pub fn render_csv(registry: &SchemaRegistry, experiences: &[Experience]) -> WorktrailResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(csv_header(registry)).map_err(export_error)?;
    for experience in experiences {
        writer
            .write_record(csv_row(registry, experience))
            .map_err(export_error)?;
    }

    let bytes = writer.into_inner().map_err(|e| WorktrailError::Export {
        reason: e.error().to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| WorktrailError::Export {
        reason: e.to_string(),
    })
}

fn export_error(err: csv::Error) -> WorktrailError {
    WorktrailError::Export {
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Column, ColumnType, Date, FieldValue, Tag};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> Date {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new(vec![
            Column::new("Title", "title", ColumnType::ShortText, 1),
            Column::new("Secret", "secret", ColumnType::ShortText, 2).with_visible(false),
            Column::new("Skills", "skills", ColumnType::Dropdown, 3)
                .with_options(["Rust", "Go"])
                .with_allow_multiple(true),
        ])
    }

    #[test]
    fn test_header_skips_hidden_columns() {
        assert_eq!(
            csv_header(&registry()),
            vec!["Start Date", "End Date", "Title", "Skills", "Tags"]
        );
    }

    #[test]
    fn test_row_joins_lists_and_sorts_tags() {
        let exp = Experience::new(date(2020, 2, 1), None)
            .with_field("title", "Lead, Platform")
            .with_field("secret", "hidden")
            .with_field("skills", FieldValue::sequence(["Rust", "Go"]))
            .with_tags(vec![Tag::new("zeta"), Tag::new("alpha")]);
        assert_eq!(
            csv_row(&registry(), &exp),
            vec!["2020-02-01", "", "Lead, Platform", "Rust, Go", "alpha, zeta"]
        );
    }

    #[test]
    fn test_render_csv_quotes_embedded_commas() -> WorktrailResult<()> {
        let exp = Experience::new(date(2019, 1, 1), Some(date(2019, 12, 31)))
            .with_field("title", "Lead, Platform");
        let text = render_csv(&registry(), &[exp])?;
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Start Date,End Date,Title,Skills,Tags"));
        assert_eq!(lines.next(), Some("2019-01-01,2019-12-31,\"Lead, Platform\",,"));
        assert_eq!(lines.next(), None);
        Ok(())
    }

    #[test]
    fn test_render_csv_empty_is_header_only() -> WorktrailResult<()> {
        let text = render_csv(&SchemaRegistry::default(), &[])?;
        assert_eq!(text, "Start Date,End Date,Tags\n");
        Ok(())
    }
}
