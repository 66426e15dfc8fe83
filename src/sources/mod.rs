pub mod http;
pub mod simulated;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{ActivitySample, DataSourceMode, TimeStats};

pub use http::HttpSnapshotSource;
pub use simulated::{SimulatedIdleSource, SimulatedSnapshotSource};

/// One idle-duration observation. `activity_key` identifies the focused
/// window/app for logging; it never drives AFK decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdleSample {
    pub activity_key: String,
    pub idle_seconds: u64,
}

/// Authoritative remote view of the tracked session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSnapshot {
    pub current_activity: Option<ActivitySample>,
    pub stats: TimeStats,
    pub tracking_enabled: bool,
    #[serde(default)]
    pub data_source_mode: DataSourceMode,
}

/// Supplies idle-duration samples on demand. Implementations wrap
/// whatever OS hook actually measures input idleness.
#[async_trait]
pub trait IdleSampleSource: Send + Sync {
    async fn idle_sample(&self) -> Result<IdleSample>;
}

/// The remote service the engine reconciles against.
///
/// `set_tracking_enabled` and `finalize_session` are best-effort: the
/// engine logs failures and relies on the next resync to converge.
#[async_trait]
pub trait RemoteSnapshotSource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<RemoteSnapshot>;

    async fn set_tracking_enabled(&self, enabled: bool) -> Result<()>;

    async fn finalize_session(&self, run_id: &str) -> Result<()>;
}
