use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ActivityCategory {
    Productive,
    Neutral,
    Distracting,
    Other,
}

impl Default for ActivityCategory {
    fn default() -> Self {
        ActivityCategory::Other
    }
}

impl ActivityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityCategory::Productive => "productive",
            ActivityCategory::Neutral => "neutral",
            ActivityCategory::Distracting => "distracting",
            ActivityCategory::Other => "other",
        }
    }
}

/// The application/window that currently has focus, as reported by the
/// remote service. Superseded wholesale by the next snapshot; the engine
/// only advances `duration_seconds` locally between snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySample {
    pub app_identity: String,
    pub window_title: String,
    pub category: ActivityCategory,
    pub is_productive: bool,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub duration_seconds: u64,
}

impl ActivitySample {
    pub fn record_tick(&mut self) {
        self.duration_seconds = self.duration_seconds.saturating_add(1);
    }
}

/// Which underlying mechanism is supplying activity samples. Purely
/// informational; never drives control flow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DataSourceMode {
    Native,
    ThirdPartyWatcher,
    Simulated,
    None,
}

impl Default for DataSourceMode {
    fn default() -> Self {
        DataSourceMode::None
    }
}

impl DataSourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSourceMode::Native => "native",
            DataSourceMode::ThirdPartyWatcher => "thirdPartyWatcher",
            DataSourceMode::Simulated => "simulated",
            DataSourceMode::None => "none",
        }
    }
}
