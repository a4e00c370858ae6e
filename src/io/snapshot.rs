use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::source::{ContextProvider, Page, PagedQuery, SourceError, SourceRecord, query_page_size};

/// A captured load: the project, its direct children, and the rows the
/// descendant query returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub project: SourceRecord,
    #[serde(default)]
    pub direct_children: Vec<SourceRecord>,
    #[serde(default)]
    pub records: Vec<SourceRecord>,
}

/// File-backed stand-in for the project-data API. Serves the context
/// directly and pages `records` by the query's `limit`.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    snapshot: Snapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: Snapshot) -> Self {
        SnapshotSource { snapshot }
    }

    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let text = fs::read_to_string(path).map_err(|e| SourceError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let snapshot = serde_json::from_str(&text).map_err(|e| SourceError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(SnapshotSource::new(snapshot))
    }
}

impl ContextProvider for SnapshotSource {
    fn project(&self) -> SourceRecord {
        self.snapshot.project.clone()
    }

    fn direct_children(&self) -> Vec<SourceRecord> {
        self.snapshot.direct_children.clone()
    }
}

#[async_trait]
impl PagedQuery for SnapshotSource {
    async fn fetch_page(&self, query: &str, from: usize) -> Result<Page, SourceError> {
        let rows = &self.snapshot.records;
        let limit = query_page_size(query).unwrap_or(rows.len()).max(1);
        let start = from.min(rows.len());
        let end = start.saturating_add(limit).min(rows.len());
        Ok(Page {
            records: rows[start..end].to_vec(),
            next: (end < rows.len()).then_some(end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::source::build_descendant_query;
    use tempfile::TempDir;

    fn row(id: &str) -> SourceRecord {
        SourceRecord {
            external_id: Some(id.to_string()),
            ..SourceRecord::default()
        }
    }

    fn ids(page: &Page) -> Vec<&str> {
        page.records
            .iter()
            .filter_map(|r| r.external_id.as_deref())
            .collect()
    }

    #[tokio::test]
    async fn test_pages_by_limit() {
        let source = SnapshotSource::new(Snapshot {
            project: row("P"),
            direct_children: vec![],
            records: vec![row("a"), row("b"), row("c")],
        });
        let query = build_descendant_query("P", 2);

        let first = source.fetch_page(&query, 0).await.unwrap();
        assert_eq!(ids(&first), vec!["a", "b"]);
        assert_eq!(first.next, Some(2));

        let second = source.fetch_page(&query, 2).await.unwrap();
        assert_eq!(ids(&second), vec!["c"]);
        assert_eq!(second.next, None);
    }

    #[tokio::test]
    async fn test_offset_past_end_is_empty() {
        let source = SnapshotSource::new(Snapshot {
            project: row("P"),
            ..Snapshot::default()
        });
        let page = source
            .fetch_page(&build_descendant_query("P", 10), 40)
            .await
            .unwrap();
        assert!(page.records.is_empty());
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_open_reads_context() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("snap.json");
        fs::write(
            &path,
            r#"{
                "project": {"externalid": "P", "Name": "Portfolio", "EntityType": "Program"},
                "direct_children": [{"externalid": "A", "EntityType": "Project"}]
            }"#,
        )
        .unwrap();
        let source = SnapshotSource::open(&path).unwrap();
        assert_eq!(source.project().name.as_deref(), Some("Portfolio"));
        assert_eq!(source.direct_children().len(), 1);
    }

    #[test]
    fn test_open_reports_parse_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let err = SnapshotSource::open(&path).unwrap_err();
        assert!(matches!(err, SourceError::ParseError { .. }));
    }
}
