//! Export the current selection as spreadsheet-compatible CSV.
//!
//! One row per selection, in ledger order. Each selection is resolved back
//! to its [`MediaItem`] through the matching person's results; rows that no
//! longer resolve are dropped silently.

use chrono::{DateTime, NaiveDateTime};
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::{PersonResults, Selection};

pub const CSV_HEADER: &str =
    "Person Name,Getty File ID,Media Type,Title,Date Created,Download URL";

/// Renders `selections` as CSV text.
///
/// Fails only when there is nothing to export.
pub fn compile(selections: &[Selection], results: &[PersonResults]) -> Result<String> {
    if selections.is_empty() {
        return Err(Error::Export("no media selected".into()));
    }

    let mut out = String::with_capacity(64 * (selections.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');

    for selection in selections {
        let Some(media) = results
            .get(selection.entity_index)
            .and_then(|r| r.find(selection.kind, &selection.media_id))
        else {
            continue;
        };

        let row = [
            field(&selection.entity_name),
            field(&media.id),
            field(selection.kind.label()),
            quoted(&media.title),
            field(&format_date(&media.date_created)),
            field(&media.comp_url),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }

    Ok(out)
}

/// Number of data rows in compiled CSV text.
pub fn row_count(csv: &str) -> usize {
    csv.lines().skip(1).filter(|l| !l.is_empty()).count()
}

/// Always quotes, doubling internal quotes.
fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Bare unless the value would break the row.
fn field(value: &str) -> String {
    if value.contains(|c| matches!(c, ',' | '"' | '\n' | '\r')) {
        quoted(value)
    } else {
        value.to_string()
    }
}

/// Renders a provider timestamp as a US short date (`M/D/YYYY`).
///
/// Unparseable values are returned unchanged.
pub fn format_date(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%-m/%-d/%Y").to_string();
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%-m/%-d/%Y").to_string();
    }
    raw.to_string()
}

/// Writes compiled CSV to `output`, or to stdout when `None`.
pub fn write_export(csv: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, csv)?;
            eprintln!("Exported {} rows to {}", row_count(csv), path.display());
        }
        None => {
            print!("{}", csv);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaItem, MediaKind, Person};

    fn media(id: &str, title: &str) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            title: title.to_string(),
            thumbnail_url: String::new(),
            preview_url: String::new(),
            comp_url: format!("https://comp/{}", id),
            date_created: "2019-05-01T12:00:00-07:00".to_string(),
        }
    }

    fn fixture() -> Vec<PersonResults> {
        vec![PersonResults {
            person: Person {
                name: "Jane Doe".into(),
                search_term: String::new(),
            },
            videos: vec![media("v1", "Jane arrives")],
            photos: vec![media("p1", r#"He said "Hi""#)],
        }]
    }

    #[test]
    fn empty_selection_is_export_error() {
        let err = compile(&[], &fixture()).unwrap_err();
        assert!(matches!(err, Error::Export(_)));
    }

    #[test]
    fn header_and_rows() {
        let results = fixture();
        let selections = vec![
            Selection::new(0, "Jane Doe", &results[0].videos[0], MediaKind::Video),
            Selection::new(0, "Jane Doe", &results[0].photos[0], MediaKind::Photo),
        ];
        let csv = compile(&selections, &results).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "Jane Doe,v1,video,\"Jane arrives\",5/1/2019,https://comp/v1"
        );
        assert_eq!(
            lines[2],
            "Jane Doe,p1,photo,\"He said \"\"Hi\"\"\",5/1/2019,https://comp/p1"
        );
        assert_eq!(row_count(&csv), 2);
    }

    #[test]
    fn unresolved_rows_are_skipped() {
        let results = fixture();
        let stale = Selection::new(0, "Jane Doe", &media("gone", "x"), MediaKind::Video);
        let wrong_kind = Selection::new(0, "Jane Doe", &results[0].videos[0], MediaKind::Photo);
        let wrong_person = Selection::new(7, "Nobody", &results[0].videos[0], MediaKind::Video);
        let good = Selection::new(0, "Jane Doe", &results[0].photos[0], MediaKind::Photo);

        let csv = compile(&[stale, wrong_kind, wrong_person, good], &results).unwrap();
        assert_eq!(row_count(&csv), 1);
        assert!(csv.contains(",p1,photo,"));
    }

    #[test]
    fn names_with_commas_are_quoted() {
        let results = fixture();
        let selection = Selection::new(0, "Doe, Jane", &results[0].videos[0], MediaKind::Video);
        let csv = compile(&[selection], &results).unwrap();
        assert!(csv.lines().nth(1).unwrap().starts_with("\"Doe, Jane\",v1,"));
    }

    #[test]
    fn dates() {
        assert_eq!(format_date("2019-05-01T12:00:00-07:00"), "5/1/2019");
        assert_eq!(format_date("2021-12-31T23:59:59"), "12/31/2021");
        assert_eq!(format_date("2019-05-01T12:00:00.123"), "5/1/2019");
        assert_eq!(format_date("2019-05-01T12:00:00.123Z"), "5/1/2019");
        assert_eq!(format_date("sometime"), "sometime");
        assert_eq!(format_date(""), "");
    }

    #[test]
    fn writes_to_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("out").join("selection.csv");
        write_export("a\nb\n", Some(&path)).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\nb\n");
    }
}
