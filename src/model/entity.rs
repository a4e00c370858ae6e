use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Category tag of a schedule item (program, project, milestone, task, ...).
///
/// The set is open: any lowercase tag is accepted, the well-known ones just
/// get a decoration and a style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl<'de> Deserialize<'de> for EntityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(EntityType::new(&tag))
    }
}

impl EntityType {
    pub const PROGRAM: &'static str = "program";
    pub const PROJECT: &'static str = "project";
    pub const MILESTONE: &'static str = "milestone";
    pub const TASK: &'static str = "task";

    pub fn new(tag: &str) -> Self {
        EntityType(tag.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for EntityType {
    fn from(tag: &str) -> Self {
        EntityType::new(tag)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node in the schedule hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub entity_type: EntityType,
    /// `None` means unscheduled
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub progress: f64,
    /// `None` means the entity belongs to the root sequence
    pub parent_id: Option<String>,
    /// Child ids in insertion order
    pub children: Vec<String>,
}

impl Entity {
    /// Build a fresh entity from a record, applying defaults for absent fields.
    pub(crate) fn from_record(id: String, record: Record) -> Self {
        Entity {
            id,
            name: record.name.unwrap_or_default(),
            entity_type: record.entity_type.unwrap_or_default(),
            start: record.start,
            end: record.end,
            progress: record.progress.unwrap_or(0.0),
            parent_id: record.parent_id.filter(|p| !p.is_empty()),
            children: Vec::new(),
        }
    }

    /// Overwrite only the fields present in `record`. Empty strings count as
    /// absent; an explicit progress of zero is a real value.
    pub(crate) fn merge(&mut self, record: &Record) {
        if let Some(name) = record.name.as_ref().filter(|n| !n.is_empty()) {
            self.name = name.clone();
        }
        if let Some(ty) = record.entity_type.as_ref().filter(|t| !t.is_empty()) {
            self.entity_type = ty.clone();
        }
        if record.start.is_some() {
            self.start = record.start;
        }
        if record.end.is_some() {
            self.end = record.end;
        }
        if let Some(progress) = record.progress {
            self.progress = progress;
        }
    }
}

/// Upsert input. Every field except `id` is optional; `id` itself is
/// optional here so that malformed input can be reported instead of
/// rejected at deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub entity_type: Option<EntityType>,
    #[serde(default)]
    pub start: Option<NaiveDate>,
    #[serde(default)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl Record {
    pub fn new(id: &str) -> Self {
        Record {
            id: Some(id.to_string()),
            ..Record::default()
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn kind(mut self, tag: &str) -> Self {
        self.entity_type = Some(EntityType::new(tag));
        self
    }

    pub fn start(mut self, date: NaiveDate) -> Self {
        self.start = Some(date);
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn parent(mut self, parent_id: &str) -> Self {
        self.parent_id = Some(parent_id.to_string());
        self
    }
}
