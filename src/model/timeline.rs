use chrono::NaiveDate;
use serde::Serialize;

use super::entity::EntityType;

/// Visual category carried alongside each render record, so the chart can be
/// styled without parsing decorations back out of the label text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct StyleTag(String);

impl StyleTag {
    pub fn for_type(entity_type: &EntityType) -> Self {
        StyleTag(entity_type.as_str().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// CSS-style class for the main bar, e.g. `milestone-bar`.
    /// Untyped entities get no class.
    pub fn bar_class(&self) -> Option<String> {
        (!self.0.is_empty()).then(|| format!("{}-bar", self.0))
    }

    /// Class for the progress overlay, e.g. `milestone-progress`.
    pub fn progress_class(&self) -> Option<String> {
        (!self.0.is_empty()).then(|| format!("{}-progress", self.0))
    }
}

/// One row handed to the timeline widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRecord {
    pub id: String,
    /// Display name, decoration-prefixed
    pub name: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub progress: f64,
    #[serde(rename = "custom_class")]
    pub style: StyleTag,
}

/// Classes to apply to one rendered bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarStyle {
    pub id: String,
    pub bar_class: String,
    pub progress_class: String,
}

impl BarStyle {
    pub fn for_record(record: &RenderRecord) -> Option<BarStyle> {
        Some(BarStyle {
            id: record.id.clone(),
            bar_class: record.style.bar_class()?,
            progress_class: record.style.progress_class()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_classes() {
        let tag = StyleTag::for_type(&EntityType::new("Program"));
        assert_eq!(tag.bar_class().as_deref(), Some("program-bar"));
        assert_eq!(tag.progress_class().as_deref(), Some("program-progress"));
    }

    #[test]
    fn test_untyped_has_no_bar_style() {
        let record = RenderRecord {
            id: "x".into(),
            name: "X".into(),
            start: None,
            end: None,
            progress: 0.0,
            style: StyleTag::for_type(&EntityType::default()),
        };
        assert_eq!(BarStyle::for_record(&record), None);
    }

    #[test]
    fn test_render_record_json_uses_custom_class() {
        let record = RenderRecord {
            id: "t1".into(),
            name: "✅ Write docs".into(),
            start: NaiveDate::from_ymd_opt(2024, 1, 2),
            end: None,
            progress: 25.0,
            style: StyleTag::for_type(&EntityType::new("task")),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["custom_class"], "task");
        assert_eq!(json["start"], "2024-01-02");
        assert!(json["end"].is_null());
    }
}
