use std::fmt::Write;

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::config::{OrphanPolicy, UnknownIdPolicy};
use crate::model::entity::{Entity, Record};
use crate::model::timeline::{RenderRecord, StyleTag};
use crate::ops::decorate::decorated_name;

/// Error type for hierarchy store operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("invalid record: missing id{}", name_suffix(.name))]
    InvalidRecord { name: Option<String> },
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
    #[error("cannot move {id} under {parent}: it would become its own ancestor")]
    Cycle { id: String, parent: String },
}

fn name_suffix(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" (name: {name})"),
        None => String::new(),
    }
}

/// Result of a successful upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    /// A new entity was created
    Inserted { attached: usize },
    /// An existing entity was merged
    Updated { attached: usize },
}

impl Upserted {
    /// Number of pending entities that found their parent during this upsert.
    pub fn attached(self) -> usize {
        match self {
            Upserted::Inserted { attached } | Upserted::Updated { attached } => attached,
        }
    }
}

/// Where an entity currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Root,
    Child(String),
    Pending,
}

/// An entity still waiting for its parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingEntry {
    pub id: String,
    pub name: String,
    pub parent_id: String,
}

/// In-memory schedule hierarchy for one load session.
///
/// The id-keyed arena owns every entity; the tree is expressed through the
/// root sequence and each entity's ordered child ids. An entity is listed in
/// exactly one of: `roots`, one parent's `children`, or `pending`.
#[derive(Debug, Default)]
pub struct HierarchyStore {
    entities: IndexMap<String, Entity>,
    roots: Vec<String>,
    pending: Vec<String>,
    unknown_ids: UnknownIdPolicy,
}

impl HierarchyStore {
    pub fn new() -> Self {
        HierarchyStore::default()
    }

    pub fn with_policy(unknown_ids: UnknownIdPolicy) -> Self {
        HierarchyStore {
            unknown_ids,
            ..HierarchyStore::default()
        }
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Insert a new entity or merge into an existing one, then try to attach
    /// everything still pending.
    pub fn upsert(&mut self, record: Record) -> Result<Upserted, StoreError> {
        let Some(id) = clean_id(record.id.as_deref()) else {
            return Err(StoreError::InvalidRecord {
                name: record.name.clone(),
            });
        };
        let record = Record {
            parent_id: clean_id(record.parent_id.as_deref()),
            ..record
        };

        let inserted = match self.entities.get(&id) {
            Some(existing) => {
                let moved_to = record
                    .parent_id
                    .clone()
                    .filter(|p| existing.parent_id.as_ref() != Some(p));
                // The move can be refused; nothing is merged until it succeeds.
                if let Some(new_parent) = moved_to {
                    self.move_under(&id, new_parent)?;
                }
                if let Some(existing) = self.entities.get_mut(&id) {
                    existing.merge(&record);
                }
                false
            }
            None => {
                let entity = Entity::from_record(id.clone(), record);
                match entity.parent_id.as_deref() {
                    None => self.roots.push(id.clone()),
                    Some(parent_id) => match self.entities.get_mut(parent_id) {
                        Some(parent) => parent.children.push(id.clone()),
                        None => self.pending.push(id.clone()),
                    },
                }
                self.entities.insert(id, entity);
                true
            }
        };

        let attached = self.resolve_pending();
        Ok(if inserted {
            Upserted::Inserted { attached }
        } else {
            Upserted::Updated { attached }
        })
    }

    /// Move `id` to the end of `new_parent_id`'s children.
    ///
    /// Returns `Ok(false)` when nothing moved under the `ignore` policy
    /// (unknown id, or a move that would create a cycle).
    pub fn reparent(&mut self, id: &str, new_parent_id: &str) -> Result<bool, StoreError> {
        let (id, new_parent_id) = (id.trim(), new_parent_id.trim());
        if !self.entities.contains_key(id) {
            return self.refuse(StoreError::UnknownEntity(id.to_string()));
        }
        if !self.entities.contains_key(new_parent_id) {
            return self.refuse(StoreError::UnknownEntity(new_parent_id.to_string()));
        }
        if self.would_cycle(id, new_parent_id) {
            return self.refuse(StoreError::Cycle {
                id: id.to_string(),
                parent: new_parent_id.to_string(),
            });
        }

        self.detach(id);
        if let Some(entity) = self.entities.get_mut(id) {
            entity.parent_id = Some(new_parent_id.to_string());
        }
        if let Some(parent) = self.entities.get_mut(new_parent_id) {
            parent.children.push(id.to_string());
        }
        tracing::debug!(id, parent = new_parent_id, "reparented");
        Ok(true)
    }

    /// Apply the end-of-load policy to entities whose parent never arrived.
    /// Returns the entities that were pending when called.
    pub fn resolve_orphans(&mut self, policy: OrphanPolicy) -> Vec<PendingEntry> {
        let orphans = self.pending_entries();
        match policy {
            OrphanPolicy::Keep => {}
            OrphanPolicy::Warn => {
                for orphan in &orphans {
                    tracing::warn!(
                        id = %orphan.id,
                        parent = %orphan.parent_id,
                        "parent never loaded; entity left out of the timeline"
                    );
                }
            }
            OrphanPolicy::AttachToRoot => {
                if !orphans.is_empty() {
                    tracing::info!(count = orphans.len(), "attaching orphans to root");
                }
                let pending = std::mem::take(&mut self.pending);
                self.roots.extend(pending);
            }
        }
        orphans
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn children(&self, id: &str) -> Option<&[String]> {
        self.entities.get(id).map(|e| e.children.as_slice())
    }

    pub fn pending_entries(&self) -> Vec<PendingEntry> {
        self.pending
            .iter()
            .filter_map(|id| self.entities.get(id))
            .map(|e| PendingEntry {
                id: e.id.clone(),
                name: e.name.clone(),
                parent_id: e.parent_id.clone().unwrap_or_default(),
            })
            .collect()
    }

    pub fn location(&self, id: &str) -> Option<Location> {
        let entity = self.entities.get(id)?;
        if self.pending.iter().any(|p| p == id) {
            return Some(Location::Pending);
        }
        if let Some(parent_id) = entity.parent_id.as_deref()
            && self
                .entities
                .get(parent_id)
                .is_some_and(|p| p.children.iter().any(|c| c == id))
        {
            return Some(Location::Child(parent_id.to_string()));
        }
        if self.roots.iter().any(|r| r == id) {
            return Some(Location::Root);
        }
        None
    }

    /// Pre-order projection of the tree in sibling insertion order.
    /// Pending entities are not part of the output.
    pub fn flatten(&self) -> Vec<RenderRecord> {
        let mut out = Vec::with_capacity(self.entities.len());
        self.walk(&self.roots, 0, &mut |entity, _| {
            out.push(RenderRecord {
                id: entity.id.clone(),
                name: decorated_name(&entity.entity_type, &entity.name),
                start: entity.start,
                end: entity.end,
                progress: entity.progress,
                style: StyleTag::for_type(&entity.entity_type),
            });
        });
        out
    }

    /// Human-readable tree for debugging.
    pub fn dump(&self) -> String {
        let mut out = String::from("📊 Schedule hierarchy:\n");
        self.walk(&self.roots, 0, &mut |entity, depth| {
            let _ = writeln!(
                out,
                "{}📌 {} ({})",
                "  ".repeat(depth),
                entity.name,
                entity.entity_type
            );
        });
        if !self.pending.is_empty() {
            out.push_str("pending:\n");
            for entry in self.pending_entries() {
                let _ = writeln!(out, "  {} -> {}", entry.id, entry.parent_id);
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn walk(&self, ids: &[String], depth: usize, f: &mut dyn FnMut(&Entity, usize)) {
        for id in ids {
            if let Some(entity) = self.entities.get(id) {
                f(entity, depth);
                self.walk(&entity.children, depth + 1, f);
            }
        }
    }

    /// Attach every pending entity whose parent is now known. Order of the
    /// entities left pending is preserved.
    fn resolve_pending(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let mut attached = 0;
        for id in std::mem::take(&mut self.pending) {
            let parent_id = self.entities.get(&id).and_then(|e| e.parent_id.clone());
            match parent_id {
                Some(parent_id)
                    if self.entities.contains_key(&parent_id)
                        && !self.would_cycle(&id, &parent_id) =>
                {
                    if let Some(parent) = self.entities.get_mut(&parent_id) {
                        parent.children.push(id);
                        attached += 1;
                    }
                }
                _ => self.pending.push(id),
            }
        }
        attached
    }

    /// Parent change requested through upsert. A known parent goes through
    /// `reparent`; an unknown one parks the entity in pending until it shows up.
    fn move_under(&mut self, id: &str, new_parent_id: String) -> Result<(), StoreError> {
        if self.entities.contains_key(&new_parent_id) {
            self.reparent(id, &new_parent_id)?;
            return Ok(());
        }
        self.detach(id);
        if let Some(entity) = self.entities.get_mut(id) {
            entity.parent_id = Some(new_parent_id);
        }
        self.pending.push(id.to_string());
        Ok(())
    }

    /// Remove `id` from the root sequence, every child list and pending.
    fn detach(&mut self, id: &str) {
        self.roots.retain(|r| r != id);
        self.pending.retain(|p| p != id);
        for entity in self.entities.values_mut() {
            entity.children.retain(|c| c != id);
        }
    }

    /// True if making `parent_id` the parent of `id` would put `id` among
    /// its own ancestors.
    fn would_cycle(&self, id: &str, parent_id: &str) -> bool {
        let mut current = Some(parent_id);
        let mut steps = 0;
        while let Some(ancestor) = current {
            if ancestor == id || steps > self.entities.len() {
                return true;
            }
            steps += 1;
            current = self
                .entities
                .get(ancestor)
                .and_then(|e| e.parent_id.as_deref());
        }
        false
    }

    fn refuse(&self, err: StoreError) -> Result<bool, StoreError> {
        match self.unknown_ids {
            UnknownIdPolicy::Ignore => {
                tracing::debug!(error = %err, "reparent ignored");
                Ok(false)
            }
            UnknownIdPolicy::Reject => Err(err),
        }
    }
}

/// Ids are compared trimmed; a blank id counts as absent.
fn clean_id(id: Option<&str>) -> Option<String> {
    id.map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
