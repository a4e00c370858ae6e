use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Zoom granularity of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl ViewMode {
    /// The granularity the widget actually draws. Quarter and year have no
    /// native scale and fall back to month.
    pub fn effective(self) -> ViewMode {
        match self {
            ViewMode::Quarter | ViewMode::Year => ViewMode::Month,
            other => other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Hour => "Hour",
            ViewMode::Day => "Day",
            ViewMode::Week => "Week",
            ViewMode::Month => "Month",
            ViewMode::Quarter => "Quarter",
            ViewMode::Year => "Year",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown view mode: {0} (expected hour, day, week, month, quarter or year)")]
pub struct UnknownViewMode(pub String);

impl FromStr for ViewMode {
    type Err = UnknownViewMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hour" => Ok(ViewMode::Hour),
            "day" => Ok(ViewMode::Day),
            "week" => Ok(ViewMode::Week),
            "month" => Ok(ViewMode::Month),
            "quarter" => Ok(ViewMode::Quarter),
            "year" => Ok(ViewMode::Year),
            _ => Err(UnknownViewMode(s.to_string())),
        }
    }
}
