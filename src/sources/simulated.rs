use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use rand::Rng;

use super::{IdleSample, IdleSampleSource, RemoteSnapshot, RemoteSnapshotSource};
use crate::models::{ActivityCategory, ActivitySample, DataSourceMode, TimeStats};

const MOCK_ACTIVITIES: &[(&str, &str, ActivityCategory)] = &[
    ("VS Code", "engine/controller.rs - focusflow", ActivityCategory::Productive),
    ("Google Chrome", "Pull request review - GitHub", ActivityCategory::Productive),
    ("Terminal", "zsh - cargo watch", ActivityCategory::Productive),
    ("Slack", "#engineering", ActivityCategory::Neutral),
    ("Figma", "Dashboard mockups", ActivityCategory::Neutral),
    ("Google Chrome", "YouTube - lofi beats", ActivityCategory::Distracting),
];

struct SimulatedState {
    stats: TimeStats,
    tracking_enabled: bool,
    activity_index: usize,
    current: ActivitySample,
}

/// In-memory stand-in for the tracking backend. Rotates through a small
/// set of mock activities and accumulates stats between fetches, so the
/// engine can be exercised without any service running.
pub struct SimulatedSnapshotSource {
    state: Mutex<SimulatedState>,
}

fn sample_at(index: usize) -> ActivitySample {
    let (app, title, category) = MOCK_ACTIVITIES[index % MOCK_ACTIVITIES.len()];
    ActivitySample {
        app_identity: app.to_string(),
        window_title: title.to_string(),
        category,
        is_productive: category == ActivityCategory::Productive,
        started_at: Utc::now(),
        duration_seconds: 0,
    }
}

impl SimulatedSnapshotSource {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SimulatedState {
                stats: TimeStats::default(),
                tracking_enabled: true,
                activity_index: 0,
                current: sample_at(0),
            }),
        }
    }
}

impl Default for SimulatedSnapshotSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteSnapshotSource for SimulatedSnapshotSource {
    async fn fetch_snapshot(&self) -> Result<RemoteSnapshot> {
        let mut state = self.state.lock().unwrap();

        if state.tracking_enabled {
            // Advance the authoritative counters by roughly one resync
            // window, tagged with the current activity's category.
            let elapsed = 5;
            state.stats.total_seconds += elapsed;
            state.stats.week_seconds += elapsed;
            state.stats.month_seconds += elapsed;
            match state.current.category {
                ActivityCategory::Productive => state.stats.productive_seconds += elapsed,
                ActivityCategory::Distracting => state.stats.distracting_seconds += elapsed,
                _ => {}
            }
            state.stats.recompute_percent();
            state.current.duration_seconds += elapsed;

            // Occasionally switch focus to the next mock activity
            if rand::thread_rng().gen_bool(0.25) {
                state.activity_index += 1;
                state.current = sample_at(state.activity_index);
            }
        }

        Ok(RemoteSnapshot {
            current_activity: Some(state.current.clone()),
            stats: state.stats.clone(),
            tracking_enabled: state.tracking_enabled,
            data_source_mode: DataSourceMode::Simulated,
        })
    }

    async fn set_tracking_enabled(&self, enabled: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.tracking_enabled = enabled;
        debug!("simulated backend: tracking_enabled={enabled}");
        Ok(())
    }

    async fn finalize_session(&self, run_id: &str) -> Result<()> {
        debug!("simulated backend: finalized run {run_id}");
        Ok(())
    }
}

/// Idle source that always reports presence, with a little jitter so the
/// noise floor actually gets exercised.
pub struct SimulatedIdleSource;

#[async_trait]
impl IdleSampleSource for SimulatedIdleSource {
    async fn idle_sample(&self) -> Result<IdleSample> {
        Ok(IdleSample {
            activity_key: "simulated".to_string(),
            idle_seconds: rand::thread_rng().gen_range(0..5),
        })
    }
}
