use serde::Serialize;

use crate::model::timeline::RenderRecord;
use crate::ops::hierarchy::PendingEntry;
use crate::ops::load::LoadReport;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct CheckJson<'a> {
    pub valid: bool,
    pub entities: usize,
    pub rendered: usize,
    pub pages: usize,
    pub skipped: usize,
    pub attached: usize,
    pub pending: &'a [PendingEntry],
}

impl<'a> CheckJson<'a> {
    pub fn new(report: &'a LoadReport, entities: usize, rendered: usize) -> Self {
        CheckJson {
            valid: report.pending.is_empty(),
            entities,
            rendered,
            pages: report.pages,
            skipped: report.skipped,
            attached: report.attached,
            pending: &report.pending,
        }
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

/// `id  name  start..end  progress%  [style]`
pub fn format_record_line(record: &RenderRecord) -> String {
    let dates = match (record.start, record.end) {
        (None, None) => "unscheduled".to_string(),
        (start, end) => format!(
            "{}..{}",
            start.map(|d| d.to_string()).unwrap_or_default(),
            end.map(|d| d.to_string()).unwrap_or_default()
        ),
    };
    let mut line = format!("{}  {}  {}  {}%", record.id, record.name, dates, record.progress);
    if !record.style.as_str().is_empty() {
        line.push_str(&format!("  [{}]", record.style.as_str()));
    }
    line
}

pub fn format_pending_line(entry: &PendingEntry) -> String {
    if entry.name.is_empty() {
        format!("{} waits for {}", entry.id, entry.parent_id)
    } else {
        format!("{} ({}) waits for {}", entry.id, entry.name, entry.parent_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::EntityType;
    use crate::model::timeline::StyleTag;
    use chrono::NaiveDate;

    #[test]
    fn test_record_line() {
        let record = RenderRecord {
            id: "M1".into(),
            name: "🔷 Beta".into(),
            start: NaiveDate::from_ymd_opt(2024, 3, 1),
            end: None,
            progress: 40.0,
            style: StyleTag::for_type(&EntityType::new("milestone")),
        };
        assert_eq!(format_record_line(&record), "M1  🔷 Beta  2024-03-01..  40%  [milestone]");
    }

    #[test]
    fn test_unscheduled_untyped_line() {
        let record = RenderRecord {
            id: "x".into(),
            name: "X".into(),
            start: None,
            end: None,
            progress: 0.0,
            style: StyleTag::for_type(&EntityType::default()),
        };
        assert_eq!(format_record_line(&record), "x  X  unscheduled  0%");
    }

    #[test]
    fn test_pending_line() {
        let entry = PendingEntry {
            id: "T2".into(),
            name: "".into(),
            parent_id: "Z".into(),
        };
        assert_eq!(format_pending_line(&entry), "T2 waits for Z");
    }
}
