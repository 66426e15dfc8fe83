use chrono::{DateTime, Utc};
use log::warn;

use crate::afk::AfkState;
use crate::models::{ActivitySample, DataSourceMode, TimeStats, TrackingState};
use crate::sources::RemoteSnapshot;

/// The engine's single owned view of the tracked session. All mutation
/// happens through the methods below while the controller holds the lock;
/// readers only ever see cloned snapshots.
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    pub stats: TimeStats,
    pub tracking: TrackingState,
    pub current_activity: Option<ActivitySample>,
    pub afk: AfkState,
    pub afk_warning_visible: bool,
    pub data_source_mode: DataSourceMode,

    /// Set only by an explicit user toggle. Wins every arbitration.
    pub manual_pause_requested: bool,
    /// Set only by the AFK detector's auto-pause signal.
    pub auto_pause_requested: bool,

    pub consecutive_resync_failures: u32,
    pub commands_delivered: u64,
    pub last_command_error: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// One second of tracked time. No-op outside `Active`; the ticker is
    /// expected to be cancelled by then, this is the last line of defense.
    pub fn apply_tick(&mut self) {
        if !self.tracking.is_active() {
            return;
        }

        match &mut self.current_activity {
            Some(activity) => {
                activity.record_tick();
                let productive = activity.is_productive;
                self.stats.record_tick(productive);
            }
            None => self.stats.record_tick(false),
        }
    }

    /// Replace the aggregate view with the server's wholesale, preserving
    /// engine-local intent. `tracking_enabled` is honored only when no
    /// local pause intent is pending: a resync that was in flight when the
    /// user paused must not silently un-pause, and auto-pause can only be
    /// exited by an explicit resume.
    pub fn apply_snapshot(&mut self, snapshot: RemoteSnapshot) {
        self.enforce_pause_invariant();

        self.stats = snapshot.stats;
        self.stats.recompute_percent();
        self.current_activity = snapshot.current_activity;
        self.data_source_mode = snapshot.data_source_mode;
        self.consecutive_resync_failures = 0;
        self.last_synced_at = Some(Utc::now());

        if !self.manual_pause_requested && !self.auto_pause_requested {
            self.tracking = if snapshot.tracking_enabled {
                TrackingState::Active
            } else {
                // Paused from another surface; a later snapshot may resume it.
                TrackingState::ManuallyPaused
            };
        }
    }

    /// Both intent flags true must never happen. If it does, manual wins.
    pub fn enforce_pause_invariant(&mut self) {
        if self.manual_pause_requested && self.auto_pause_requested {
            warn!("both manual and auto pause flags set; keeping manual pause");
            self.auto_pause_requested = false;
            if self.tracking == TrackingState::AutoPausedByAfk {
                self.tracking = TrackingState::ManuallyPaused;
            }
        }
    }

    pub fn begin_manual_pause(&mut self) {
        self.tracking = TrackingState::ManuallyPaused;
        self.manual_pause_requested = true;
        self.enforce_pause_invariant();
    }

    pub fn end_manual_pause(&mut self) {
        self.tracking = TrackingState::Active;
        self.manual_pause_requested = false;
    }

    /// Auto-pause is skipped entirely while a manual pause is pending.
    /// Returns whether the transition happened.
    pub fn begin_auto_pause(&mut self) -> bool {
        if self.manual_pause_requested {
            return false;
        }
        self.tracking = TrackingState::AutoPausedByAfk;
        self.auto_pause_requested = true;
        true
    }

    pub fn apply_resume_from_afk(&mut self) {
        self.tracking = TrackingState::Active;
        self.manual_pause_requested = false;
        self.auto_pause_requested = false;
        self.afk = AfkState::default();
        self.afk_warning_visible = false;
    }

    pub fn record_resync_failure(&mut self) {
        self.consecutive_resync_failures = self.consecutive_resync_failures.saturating_add(1);
    }

    pub fn is_stale(&self, failure_budget: u32) -> bool {
        self.consecutive_resync_failures >= failure_budget
    }

    pub fn record_command_delivered(&mut self) {
        self.commands_delivered += 1;
        self.last_command_error = None;
    }

    pub fn record_command_error(&mut self, error: String) {
        self.last_command_error = Some(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityCategory;

    fn productive_activity() -> ActivitySample {
        ActivitySample {
            app_identity: "VS Code".into(),
            window_title: "main.rs".into(),
            category: ActivityCategory::Productive,
            is_productive: true,
            started_at: Utc::now(),
            duration_seconds: 0,
        }
    }

    fn snapshot(total: u64, productive: u64, tracking_enabled: bool) -> RemoteSnapshot {
        RemoteSnapshot {
            current_activity: Some(productive_activity()),
            stats: TimeStats {
                total_seconds: total,
                productive_seconds: productive,
                ..TimeStats::default()
            },
            tracking_enabled,
            data_source_mode: DataSourceMode::Native,
        }
    }

    #[test]
    fn test_ticks_accumulate_exactly_once_per_second() {
        let mut state = EngineState::new();
        state.apply_snapshot(snapshot(100, 60, true));
        assert_eq!(state.stats.productivity_percent, 60);

        for _ in 0..10 {
            state.apply_tick();
        }
        assert_eq!(state.stats.total_seconds, 110);
        assert_eq!(state.stats.productive_seconds, 70);
        assert_eq!(state.current_activity.as_ref().unwrap().duration_seconds, 10);
    }

    #[test]
    fn test_snapshot_replaces_counters_wholesale() {
        let mut state = EngineState::new();
        state.apply_snapshot(snapshot(100, 60, true));
        for _ in 0..10 {
            state.apply_tick();
        }

        // Server totals win outright; local smoothing is discarded.
        state.apply_snapshot(snapshot(300, 150, true));
        assert_eq!(state.stats.total_seconds, 300);
        assert_eq!(state.stats.productivity_percent, 50);

        for _ in 0..5 {
            state.apply_tick();
        }
        assert_eq!(state.stats.total_seconds, 305);
    }

    #[test]
    fn test_no_ticks_outside_active() {
        let mut state = EngineState::new();
        state.apply_snapshot(snapshot(50, 10, true));
        state.begin_manual_pause();
        state.apply_tick();
        state.apply_tick();
        assert_eq!(state.stats.total_seconds, 50);
    }

    #[test]
    fn test_manual_pause_survives_stale_resync() {
        let mut state = EngineState::new();
        state.apply_snapshot(snapshot(100, 60, true));
        state.begin_manual_pause();

        // A stale response still reporting tracking-on lands afterwards
        state.apply_snapshot(snapshot(120, 70, true));
        assert_eq!(state.tracking, TrackingState::ManuallyPaused);
        assert!(state.manual_pause_requested);
        // ...but its counters still apply
        assert_eq!(state.stats.total_seconds, 120);
    }

    #[test]
    fn test_auto_pause_survives_stale_resync() {
        let mut state = EngineState::new();
        state.apply_snapshot(snapshot(100, 60, true));
        assert!(state.begin_auto_pause());

        state.apply_snapshot(snapshot(130, 80, true));
        assert_eq!(state.tracking, TrackingState::AutoPausedByAfk);
        assert!(state.auto_pause_requested);
    }

    #[test]
    fn test_auto_pause_skipped_during_manual_pause() {
        let mut state = EngineState::new();
        state.begin_manual_pause();
        assert!(!state.begin_auto_pause());
        assert_eq!(state.tracking, TrackingState::ManuallyPaused);
        assert!(!state.auto_pause_requested);
    }

    #[test]
    fn test_server_side_pause_maps_without_local_intent() {
        let mut state = EngineState::new();
        state.apply_snapshot(snapshot(10, 5, false));
        assert_eq!(state.tracking, TrackingState::ManuallyPaused);
        assert!(!state.manual_pause_requested);

        // Server resumes; no local intent holds it paused
        state.apply_snapshot(snapshot(20, 10, true));
        assert_eq!(state.tracking, TrackingState::Active);
    }

    #[test]
    fn test_conflicting_flags_resolve_to_manual() {
        let mut state = EngineState::new();
        state.manual_pause_requested = true;
        state.auto_pause_requested = true;
        state.tracking = TrackingState::AutoPausedByAfk;

        state.enforce_pause_invariant();
        assert!(state.manual_pause_requested);
        assert!(!state.auto_pause_requested);
        assert_eq!(state.tracking, TrackingState::ManuallyPaused);
    }

    #[test]
    fn test_resume_from_afk_clears_all_intent() {
        let mut state = EngineState::new();
        state.begin_auto_pause();
        state.afk_warning_visible = true;

        state.apply_resume_from_afk();
        assert_eq!(state.tracking, TrackingState::Active);
        assert!(!state.auto_pause_requested);
        assert!(!state.manual_pause_requested);
        assert!(!state.afk_warning_visible);
        assert_eq!(state.afk, AfkState::default());

        // Idempotent: a second resume changes nothing
        let before = state.clone().stats;
        state.apply_resume_from_afk();
        assert_eq!(state.tracking, TrackingState::Active);
        assert_eq!(state.stats, before);
    }

    #[test]
    fn test_resync_failures_turn_stale_after_budget() {
        let mut state = EngineState::new();
        assert!(!state.is_stale(3));
        state.record_resync_failure();
        state.record_resync_failure();
        assert!(!state.is_stale(3));
        state.record_resync_failure();
        assert!(state.is_stale(3));

        state.apply_snapshot(snapshot(1, 1, true));
        assert!(!state.is_stale(3));
    }
}
