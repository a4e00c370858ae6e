use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::model::entity::{EntityType, Record};

/// Error type for record sources
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("query failed: {0}")]
    QueryFailed(String),
}

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

/// Parent reference as returned by the paged query (`Parent: {externalid}`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParentRef {
    #[serde(rename = "externalid", default)]
    pub external_id: Option<String>,
}

/// One row from the project-data API, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    #[serde(rename = "externalid", default)]
    pub external_id: Option<String>,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "EntityType", default)]
    pub entity_type: Option<String>,
    #[serde(rename = "StartDate", default)]
    pub start_date: Option<String>,
    #[serde(rename = "C_CRStartDate", default)]
    pub cr_start_date: Option<String>,
    #[serde(rename = "DueDate", default)]
    pub due_date: Option<String>,
    #[serde(rename = "C_CRDueDate", default)]
    pub cr_due_date: Option<String>,
    #[serde(rename = "PercentCompleted", default)]
    pub percent_completed: Option<f64>,
    /// Nested form used by query results
    #[serde(rename = "Parent", default)]
    pub parent: Option<ParentRef>,
    /// Flat form used by the context's direct children
    #[serde(rename = "Parent.externalid", default)]
    pub parent_external_id: Option<String>,
}

impl SourceRecord {
    /// Parent id from either the flat or the nested column.
    pub fn parent_id(&self) -> Option<&str> {
        non_empty(self.parent_external_id.as_deref()).or_else(|| {
            self.parent
                .as_ref()
                .and_then(|p| non_empty(p.external_id.as_deref()))
        })
    }

    /// Normalize into an upsert record. `fallback_parent` is used when the
    /// row carries no parent reference.
    pub fn into_record(self, fallback_parent: Option<&str>) -> Record {
        let id = non_empty(self.external_id.as_deref()).map(str::to_string);
        let parent_id = self
            .parent_id()
            .or(fallback_parent)
            .map(str::to_string);
        let start = first_date(
            id.as_deref(),
            &[self.start_date.as_deref(), self.cr_start_date.as_deref()],
        );
        let end = first_date(
            id.as_deref(),
            &[self.due_date.as_deref(), self.cr_due_date.as_deref()],
        );
        Record {
            id,
            name: self.name.filter(|n| !n.is_empty()),
            entity_type: non_empty(self.entity_type.as_deref()).map(EntityType::new),
            start,
            end,
            progress: self.percent_completed,
            parent_id,
        }
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// First candidate that parses as a date. Unparseable values are logged and
/// treated as absent.
fn first_date(id: Option<&str>, candidates: &[Option<&str>]) -> Option<NaiveDate> {
    for raw in candidates.iter().filter_map(|c| non_empty(*c)) {
        match parse_date(raw) {
            Some(date) => return Some(date),
            None => tracing::warn!(id = id.unwrap_or("?"), value = raw, "ignoring unparseable date"),
        }
    }
    None
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive `YYYY-MM-DDTHH:MM:SS`
/// timestamps. Only the date part is kept.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Supplies the project being charted and its direct children.
pub trait ContextProvider {
    fn project(&self) -> SourceRecord;
    fn direct_children(&self) -> Vec<SourceRecord>;
}

/// One page of query results.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<SourceRecord>,
    /// Offset of the next page, `None` once the result set is exhausted
    pub next: Option<usize>,
}

/// Paged query service.
#[async_trait]
pub trait PagedQuery: Send + Sync {
    async fn fetch_page(&self, query: &str, from: usize) -> Result<Page, SourceError>;
}

/// Query for every descendant of `container_id` except its direct children
/// (those come from the context). The offset is appended per page.
pub fn build_descendant_query(container_id: &str, page_size: usize) -> String {
    format!(
        "Select Name,SYSID,externalid,EntityType,Parent.externalid,Parent.Name,Parent.SYSID,\
         StartDate,DueDate,C_CRStartDate,C_CRDueDate,PercentCompleted from Task \
         where Project='/Project/{id}' and Parent<>'/Project/{id}' limit {page_size} offset ",
        id = container_id,
    )
}

/// Page size encoded in a query built by [`build_descendant_query`].
pub fn query_page_size(query: &str) -> Option<usize> {
    let mut words = query.split_whitespace();
    words.find(|w| w.eq_ignore_ascii_case("limit"))?;
    words.next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(parse_date("2024-03-05"), Some(date("2024-03-05")));
        assert_eq!(parse_date("2024-03-05T10:00:00Z"), Some(date("2024-03-05")));
        assert_eq!(parse_date("2024-03-05T23:30:00+02:00"), Some(date("2024-03-05")));
        assert_eq!(parse_date("2024-03-05T08:15:00"), Some(date("2024-03-05")));
        assert_eq!(parse_date("next tuesday"), None);
    }

    #[test]
    fn test_query_row_with_nested_parent() {
        let row: SourceRecord = serde_json::from_str(
            r#"{
                "externalid": "T1",
                "Name": "Wire up API",
                "EntityType": "Task",
                "StartDate": null,
                "C_CRStartDate": "2024-02-01",
                "DueDate": "2024-02-10T00:00:00Z",
                "PercentCompleted": 0,
                "Parent": {"externalid": "A"}
            }"#,
        )
        .unwrap();
        let record = row.into_record(None);
        assert_eq!(
            record,
            Record {
                id: Some("T1".into()),
                name: Some("Wire up API".into()),
                entity_type: Some(EntityType::new("task")),
                start: Some(date("2024-02-01")),
                end: Some(date("2024-02-10")),
                progress: Some(0.0),
                parent_id: Some("A".into()),
            }
        );
    }

    #[test]
    fn test_direct_child_falls_back_to_project() {
        let row: SourceRecord =
            serde_json::from_str(r#"{"externalid": "A", "Name": "Alpha", "EntityType": "Project"}"#)
                .unwrap();
        let record = row.into_record(Some("P"));
        assert_eq!(record.parent_id.as_deref(), Some("P"));
        assert_eq!(record.progress, None);
    }

    #[test]
    fn test_flat_parent_column_wins() {
        let row: SourceRecord = serde_json::from_str(
            r#"{"externalid": "M", "Parent.externalid": "A", "Parent": {"externalid": "B"}}"#,
        )
        .unwrap();
        assert_eq!(row.into_record(Some("P")).parent_id.as_deref(), Some("A"));
    }

    #[test]
    fn test_bad_date_falls_through_to_alternate() {
        let row = SourceRecord {
            external_id: Some("x".into()),
            start_date: Some("someday".into()),
            cr_start_date: Some("2024-05-01".into()),
            ..SourceRecord::default()
        };
        assert_eq!(row.into_record(None).start, Some(date("2024-05-01")));
    }

    #[test]
    fn test_missing_id_survives_normalization() {
        let row = SourceRecord {
            external_id: Some("".into()),
            name: Some("nameless".into()),
            ..SourceRecord::default()
        };
        assert_eq!(row.into_record(None).id, None);
    }

    #[test]
    fn test_descendant_query() {
        let query = build_descendant_query("P-42", 5000);
        assert!(query.contains("Project='/Project/P-42'"));
        assert!(query.contains("Parent<>'/Project/P-42'"));
        assert!(query.ends_with("limit 5000 offset "));
        assert_eq!(query_page_size(&query), Some(5000));
        assert_eq!(query_page_size("select 1"), None);
    }
}
