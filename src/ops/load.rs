use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::io::source::{ContextProvider, PagedQuery, SourceError, build_descendant_query};
use crate::model::config::{InvalidRecordPolicy, LoadConfig, StoreConfig};
use crate::model::entity::Record;
use crate::model::timeline::RenderRecord;
use crate::ops::hierarchy::{HierarchyStore, PendingEntry, StoreError, Upserted};

/// Error type for a load session
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("page fetch at offset {from} failed: {source}")]
    Source { from: usize, source: SourceError },
    #[error("query did not advance past offset {from}")]
    Stalled { from: usize },
    #[error("gave up after {0} pages")]
    TooManyPages(usize),
    #[error("load cancelled")]
    Cancelled,
}

/// Counters collected while loading.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Children adopted by a parent that arrived after them
    pub attached: usize,
    pub pages: usize,
    /// Entities whose parent never arrived
    pub pending: Vec<PendingEntry>,
}

/// Everything a finished load hands to the renderer.
#[derive(Debug)]
pub struct LoadOutcome {
    pub store: HierarchyStore,
    pub records: Vec<RenderRecord>,
    pub report: LoadReport,
}

/// One load session: owns a fresh store and feeds it batch by batch.
pub struct Loader {
    config: LoadConfig,
    store: HierarchyStore,
    report: LoadReport,
}

impl Loader {
    pub fn new(config: LoadConfig, store: StoreConfig) -> Self {
        Loader {
            config,
            store: HierarchyStore::with_policy(store.unknown_ids),
            report: LoadReport::default(),
        }
    }

    pub fn store(&self) -> &HierarchyStore {
        &self.store
    }

    /// Context, then every page, then flatten.
    pub async fn run(
        mut self,
        context: &dyn ContextProvider,
        query: &dyn PagedQuery,
        cancel: &CancellationToken,
    ) -> Result<LoadOutcome, LoadError> {
        let project_id = self.load_context(context)?;
        let query_text = build_descendant_query(&project_id, self.config.page_size);
        self.load_pages(query, &query_text, cancel).await?;
        Ok(self.finish())
    }

    /// Upsert the project and its direct children. Returns the project id.
    pub fn load_context(&mut self, context: &dyn ContextProvider) -> Result<String, LoadError> {
        let project = context.project().into_record(None);
        // Without a project id there is nothing to query against.
        let project_id = project
            .id
            .clone()
            .ok_or_else(|| StoreError::InvalidRecord {
                name: project.name.clone(),
            })?;
        self.upsert_one(project)?;

        let children = context
            .direct_children()
            .into_iter()
            .map(|child| child.into_record(Some(&project_id)));
        self.ingest(children)?;
        tracing::debug!(project = %project_id, entities = self.store.len(), "context loaded");
        Ok(project_id)
    }

    /// Request pages from offset 0 until the service reports no more,
    /// upserting each batch as it arrives.
    pub async fn load_pages(
        &mut self,
        query: &dyn PagedQuery,
        query_text: &str,
        cancel: &CancellationToken,
    ) -> Result<(), LoadError> {
        let mut from = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(LoadError::Cancelled);
            }
            if self.report.pages >= self.config.max_pages {
                return Err(LoadError::TooManyPages(self.report.pages));
            }

            let page = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(LoadError::Cancelled),
                page = query.fetch_page(query_text, from) => {
                    page.map_err(|source| LoadError::Source { from, source })?
                }
            };
            self.report.pages += 1;
            tracing::debug!(from, rows = page.records.len(), next = ?page.next, "page received");

            self.ingest(page.records.into_iter().map(|row| row.into_record(None)))?;

            match page.next {
                None => return Ok(()),
                Some(next) if next > from => from = next,
                Some(_) => return Err(LoadError::Stalled { from }),
            }
        }
    }

    /// Upsert a batch, applying the invalid-record policy.
    pub fn ingest(&mut self, records: impl IntoIterator<Item = Record>) -> Result<(), LoadError> {
        for record in records {
            self.upsert_one(record)?;
        }
        Ok(())
    }

    /// Apply the orphan policy and flatten.
    pub fn finish(mut self) -> LoadOutcome {
        self.report.pending = self.store.resolve_orphans(self.config.orphans);
        let records = self.store.flatten();
        tracing::debug!("{}", self.store.dump());
        tracing::info!(
            entities = self.store.len(),
            rendered = records.len(),
            pending = self.report.pending.len(),
            pages = self.report.pages,
            "load finished"
        );
        LoadOutcome {
            store: self.store,
            records,
            report: self.report,
        }
    }

    fn upsert_one(&mut self, record: Record) -> Result<(), LoadError> {
        match self.store.upsert(record) {
            Ok(upserted) => {
                match upserted {
                    Upserted::Inserted { .. } => self.report.inserted += 1,
                    Upserted::Updated { .. } => self.report.updated += 1,
                }
                self.report.attached += upserted.attached();
            }
            Err(err @ StoreError::InvalidRecord { .. })
                if self.config.invalid_records == InvalidRecordPolicy::Skip =>
            {
                tracing::warn!(error = %err, "skipping record");
                self.report.skipped += 1;
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }
}
