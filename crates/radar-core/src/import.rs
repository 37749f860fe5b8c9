//! Issue import from CSV and JSON exports
//!
//! Columns are matched by header name, case-insensitively; unknown columns
//! are ignored and absent ones leave the field empty. JSON input is either an
//! array of issue objects or an issues document (`{"issues": [...]}`).

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::Issue;

/// Issue fields that can be read from an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Key,
    Summary,
    Status,
    Priority,
    Assignee,
    Created,
    Updated,
    Resolved,
    SourceId,
    Country,
}

impl Field {
    /// Map a column name to a field
    fn from_column(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace(['-', ' '], "_");
        let field = match normalized.as_str() {
            "key" | "issue_key" | "id" => Field::Key,
            "summary" | "title" => Field::Summary,
            "status" => Field::Status,
            "priority" => Field::Priority,
            "assignee" => Field::Assignee,
            "created" | "created_at" => Field::Created,
            "updated" | "updated_at" => Field::Updated,
            "resolved" | "resolved_at" | "resolution_date" | "resolutiondate" => Field::Resolved,
            "source_id" | "source" => Field::SourceId,
            "country" => Field::Country,
            _ => return None,
        };
        Some(field)
    }
}

fn set_field(issue: &mut Issue, field: Field, raw: &str) {
    let value = raw.trim();
    if value.is_empty() {
        return;
    }
    let text = Some(value.to_string());
    match field {
        Field::Key => issue.key = text,
        Field::Summary => issue.summary = text,
        Field::Status => issue.status = text,
        Field::Priority => issue.priority = text,
        Field::Assignee => issue.assignee = text,
        Field::SourceId => issue.source_id = text,
        Field::Country => issue.country = text,
        Field::Created => issue.created = parse_timestamp(value),
        Field::Updated => issue.updated = parse_timestamp(value),
        Field::Resolved => issue.resolved = parse_timestamp(value),
    }
}

/// Parse a timestamp in any of the accepted layouts.
///
/// Accepts RFC 3339, Jira's `2024-01-02T10:00:00.000+0000`,
/// `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS(.fff)` and `YYYY-MM-DD`.
/// Naive values are taken as UTC. Anything else gives `None`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a CSV export into issues
pub fn parse_issues_csv<R: Read>(reader: R) -> Result<Vec<Issue>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: StringRecord = rdr.headers()?.clone();
    let columns: Vec<(usize, Field)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, name)| Field::from_column(name).map(|f| (i, f)))
        .collect();

    let mut issues = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let mut issue = Issue::default();
        for &(idx, field) in &columns {
            if let Some(raw) = record.get(idx) {
                set_field(&mut issue, field, raw);
            }
        }
        issues.push(issue);
    }

    debug!(
        rows = issues.len(),
        columns = columns.len(),
        "Parsed issue CSV"
    );
    Ok(issues)
}

/// Parse a JSON export into issues
pub fn parse_issues_json<R: Read>(reader: R) -> Result<Vec<Issue>> {
    let root: Value = serde_json::from_reader(reader)?;
    let rows = match &root {
        Value::Array(rows) => rows,
        Value::Object(doc) => match doc.get("issues") {
            Some(Value::Array(rows)) => rows,
            _ => {
                return Err(Error::InvalidData(
                    "JSON object has no \"issues\" array".into(),
                ))
            }
        },
        _ => {
            return Err(Error::InvalidData(
                "expected a JSON array of issues".into(),
            ))
        }
    };

    let mut issues = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let Some(obj) = row.as_object() else {
            return Err(Error::InvalidData(format!(
                "issue #{} is not a JSON object",
                idx
            )));
        };

        let fields: HashMap<Field, String> = obj
            .iter()
            .filter_map(|(name, value)| {
                let field = Field::from_column(name)?;
                let text = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    _ => return None,
                };
                Some((field, text))
            })
            .collect();

        let mut issue = Issue::default();
        for (field, raw) in &fields {
            set_field(&mut issue, *field, raw);
        }
        issues.push(issue);
    }

    debug!(rows = issues.len(), "Parsed issue JSON");
    Ok(issues)
}

/// Load issues from a `.csv` or `.json` file
pub fn load_issues(path: &Path) -> Result<Vec<Issue>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let file = File::open(path)
        .map_err(|e| Error::Import(format!("cannot open {}: {}", path.display(), e)))?;
    let reader = BufReader::new(file);

    let issues = match extension.as_str() {
        "csv" => parse_issues_csv(reader)?,
        "json" => parse_issues_json(reader)?,
        other => {
            return Err(Error::Import(format!(
                "unsupported file type '{}' (expected .csv or .json)",
                other
            )))
        }
    };

    info!(path = %path.display(), issues = issues.len(), "Loaded issues");
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-05T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T12:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T10:30:00.000+0000"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-05"),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        assert!(parse_timestamp("2024-03-05T10:30:00.250")
            .is_some_and(|dt| dt.timestamp_subsec_millis() == 250));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("05/03/2024"), None);
    }

    #[test]
    fn test_parse_issues_csv() {
        let csv = "\
Key,Summary,STATUS,Priority,Created,Resolved,Extra
A-1,Login fails,New,High,2024-01-01,,ignored
A-2,Payment timeout,Accepted,Low,2024-01-02 08:00:00,2024-01-05,
A-3,,Blocked,,not a date,,
";
        let issues = parse_issues_csv(csv.as_bytes()).unwrap();
        assert_eq!(issues.len(), 3);

        assert_eq!(issues[0].key_str(), Some("A-1"));
        assert_eq!(issues[0].status_str(), Some("New"));
        assert!(issues[0].is_open());
        assert!(issues[0].created.is_some());

        assert!(!issues[1].is_open());
        let days = issues[1].resolution_days().unwrap();
        assert!((days - (2.0 + 16.0 / 24.0)).abs() < 1e-9);

        assert_eq!(issues[2].summary, None);
        assert_eq!(issues[2].created, None);
    }

    #[test]
    fn test_parse_issues_csv_without_known_columns() {
        let csv = "foo,bar\n1,2\n";
        let issues = parse_issues_csv(csv.as_bytes()).unwrap();
        assert_eq!(issues, vec![Issue::default()]);
    }

    #[test]
    fn test_parse_issues_json() {
        let json = r#"[
            {"key": "B-1", "summary": "Crash", "status": "Test", "resolved": null, "country": "Spain"},
            {"Key": 42, "Summary": "Numbers as keys", "source_id": "jira:es"}
        ]"#;
        let issues = parse_issues_json(json.as_bytes()).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].country.as_deref(), Some("Spain"));
        assert!(issues[0].is_open());
        assert_eq!(issues[1].key_str(), Some("42"));
        assert_eq!(issues[1].source_id.as_deref(), Some("jira:es"));

        let doc = r#"{"schema_version": "1.0", "issues": [{"key": "C-1"}]}"#;
        assert_eq!(parse_issues_json(doc.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_issues_json_rejects_bad_shapes() {
        assert!(matches!(
            parse_issues_json("42".as_bytes()),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            parse_issues_json("[1]".as_bytes()),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            parse_issues_json("{oops".as_bytes()),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_load_issues_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let csv_path = dir.path().join("issues.CSV");
        let mut file = File::create(&csv_path).unwrap();
        writeln!(file, "key,summary\nK-1,hello").unwrap();
        assert_eq!(load_issues(&csv_path).unwrap().len(), 1);

        let txt_path = dir.path().join("issues.txt");
        std::fs::write(&txt_path, "key\n").unwrap();
        assert!(matches!(load_issues(&txt_path), Err(Error::Import(_))));

        assert!(matches!(
            load_issues(&dir.path().join("missing.csv")),
            Err(Error::Import(_))
        ));
    }
}
