use serde::{Deserialize, Serialize};

use super::view::ViewMode;

/// Configuration from schedview.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Rows requested per page of the descendant query
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Upper bound on pages fetched in one load
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default)]
    pub invalid_records: InvalidRecordPolicy,
    #[serde(default)]
    pub orphans: OrphanPolicy,
}

impl Default for LoadConfig {
    fn default() -> Self {
        LoadConfig {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            invalid_records: InvalidRecordPolicy::default(),
            orphans: OrphanPolicy::default(),
        }
    }
}

fn default_page_size() -> usize {
    5000
}

fn default_max_pages() -> usize {
    1000
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub unknown_ids: UnknownIdPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            view_mode: ViewMode::default(),
            language: default_language(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Readiness polls before giving up on styling the chart
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay between readiness polls
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            max_attempts: default_max_attempts(),
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    10
}

fn default_interval_ms() -> u64 {
    16
}

/// What to do with a record that has no id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidRecordPolicy {
    /// Log and continue with the next record
    #[default]
    Skip,
    /// Abort the load
    Fail,
}

/// What to do with entities whose parent never arrived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanPolicy {
    /// Leave them pending without comment
    Keep,
    /// Leave them pending and report each one
    #[default]
    Warn,
    /// Append them to the root sequence so they are rendered
    AttachToRoot,
}

/// How reparent reacts to ids the store has never seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownIdPolicy {
    #[default]
    Ignore,
    Reject,
}
