use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::afk::AfkState;
use crate::models::{ActivitySample, DataSourceMode, TimeStats, TrackingState};

use super::controller::ReconciliationEngine;
use super::state::EngineState;

/// Whether recent resyncs have been landing. `Stale` is the only signal
/// consumers get about persistent network trouble; transient failures
/// stay invisible.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionHealth {
    Fresh,
    Stale,
}

/// Immutable value projection of the engine for UI and notification
/// layers. Mutating a snapshot has no effect on the engine.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub current_activity: Option<ActivitySample>,
    pub stats: TimeStats,
    pub tracking: TrackingState,
    pub afk: AfkState,
    pub afk_warning_visible: bool,
    pub data_source_mode: DataSourceMode,
    pub connection: ConnectionHealth,
    pub commands_delivered: u64,
    pub last_command_error: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// The read/command boundary handed to consumers. Holds no logic; every
/// call delegates to the engine so timers are never touched directly.
#[derive(Clone)]
pub struct EngineHandle {
    engine: ReconciliationEngine,
}

impl EngineHandle {
    pub(crate) fn new(engine: ReconciliationEngine) -> Self {
        Self { engine }
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        let state = self.engine.state_view().await;
        let stale_budget = self.engine.config().stale_after_failures;
        project(state, stale_budget)
    }

    pub async fn toggle_tracking(&self) -> Result<TrackingState> {
        self.engine.toggle_tracking().await
    }

    pub async fn dismiss_afk_warning(&self) {
        self.engine.dismiss_afk_warning().await;
    }

    pub async fn resume_from_afk(&self) -> Result<()> {
        self.engine.resume_from_afk().await
    }

    pub async fn stop(&self) -> Result<()> {
        self.engine.stop().await
    }
}

fn project(state: EngineState, stale_budget: u32) -> EngineSnapshot {
    let connection = if state.is_stale(stale_budget) {
        ConnectionHealth::Stale
    } else {
        ConnectionHealth::Fresh
    };

    EngineSnapshot {
        current_activity: state.current_activity,
        stats: state.stats,
        tracking: state.tracking,
        afk: state.afk,
        afk_warning_visible: state.afk_warning_visible,
        data_source_mode: state.data_source_mode,
        connection,
        commands_delivered: state.commands_delivered,
        last_command_error: state.last_command_error,
        last_synced_at: state.last_synced_at,
    }
}
