use std::{sync::Arc, time::Duration};

use anyhow::{bail, Result};
use log::{debug, info, warn};
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::afk::{AfkDetector, AfkSignal, AfkThresholds};
use crate::config::EngineConfig;
use crate::models::TrackingState;
use crate::sources::{IdleSample, IdleSampleSource, RemoteSnapshotSource};

use super::facade::EngineHandle;
use super::state::EngineState;

/// Orchestrates the three timers (resync, AFK check, local tick) over a
/// single mutex-guarded [`EngineState`]. One instance per authenticated
/// session; tear down with [`stop`](Self::stop).
///
/// Cloning is cheap and shares the underlying state.
#[derive(Clone)]
pub struct ReconciliationEngine {
    run_id: String,
    config: EngineConfig,
    state: Arc<Mutex<EngineState>>,
    detector: Arc<Mutex<AfkDetector>>,
    remote: Arc<dyn RemoteSnapshotSource>,
    idle: Arc<dyn IdleSampleSource>,
    /// Tick + AFK-check loop; armed only while tracking is `Active`.
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    resync_task: Arc<Mutex<Option<JoinHandle<()>>>>,
    shutdown: CancellationToken,
}

impl ReconciliationEngine {
    /// Validate the config, seed local state, and start the timers.
    /// Tracking begins `Active` pending the first resync, which may
    /// immediately override it.
    pub async fn start(
        config: EngineConfig,
        remote: Arc<dyn RemoteSnapshotSource>,
        idle: Arc<dyn IdleSampleSource>,
    ) -> Result<Self> {
        config.validate()?;

        let thresholds = AfkThresholds {
            warning_seconds: config.afk_warning_threshold_seconds(),
            auto_pause_seconds: config.afk_auto_pause_threshold_seconds,
        };

        let engine = Self {
            run_id: Uuid::new_v4().to_string(),
            config,
            state: Arc::new(Mutex::new(EngineState::new())),
            detector: Arc::new(Mutex::new(AfkDetector::new(thresholds))),
            remote,
            idle,
            ticker: Arc::new(Mutex::new(None)),
            resync_task: Arc::new(Mutex::new(None)),
            shutdown: CancellationToken::new(),
        };

        info!("reconciliation engine {} starting", engine.run_id);
        engine.spawn_resync_loop().await;
        engine.spawn_ticker().await;

        Ok(engine)
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn handle(&self) -> EngineHandle {
        EngineHandle::new(self.clone())
    }

    pub(crate) fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub(crate) async fn state_view(&self) -> EngineState {
        self.state.lock().await.clone()
    }

    /// Flip tracking optimistically, then tell the server. The new intent
    /// is recorded before the remote call so an in-flight resync cannot
    /// undo it; a dropped call self-heals on a later resync.
    pub async fn toggle_tracking(&self) -> Result<TrackingState> {
        let new_state = {
            let mut guard = self.state.lock().await;
            match guard.tracking {
                TrackingState::Active => guard.begin_manual_pause(),
                TrackingState::ManuallyPaused => guard.end_manual_pause(),
                TrackingState::AutoPausedByAfk => {
                    bail!("tracking is auto-paused; use resume_from_afk")
                }
            }
            guard.tracking
        };

        info!("tracking toggled: {}", new_state.as_str());

        let enabled = new_state.is_active();
        deliver_tracking_toggle(
            self.remote.clone(),
            self.state.clone(),
            self.request_timeout(),
            enabled,
        );

        if enabled {
            self.spawn_ticker().await;
        } else {
            self.cancel_ticker().await;
        }

        Ok(new_state)
    }

    /// Explicit acknowledgment that time was auto-paused. The only way out
    /// of `AutoPausedByAfk`; renewed input alone never resumes. Calling it
    /// when not auto-paused is a no-op.
    pub async fn resume_from_afk(&self) -> Result<()> {
        {
            let guard = self.state.lock().await;
            if guard.tracking != TrackingState::AutoPausedByAfk && !guard.auto_pause_requested {
                debug!("resume_from_afk: not auto-paused, nothing to do");
                return Ok(());
            }
        }

        self.detector.lock().await.reset_on_resume();
        self.state.lock().await.apply_resume_from_afk();

        info!("resumed from AFK pause");

        deliver_tracking_toggle(
            self.remote.clone(),
            self.state.clone(),
            self.request_timeout(),
            true,
        );

        self.spawn_ticker().await;
        Ok(())
    }

    /// Hide the AFK warning affordance. The detector keeps its internal
    /// flag so the same absence cannot re-raise the warning.
    pub async fn dismiss_afk_warning(&self) {
        self.state.lock().await.afk_warning_visible = false;
    }

    /// Cancel all timers, then make one best-effort finalize call so
    /// partially-elapsed local time is not silently lost. Finalize
    /// failures are logged and swallowed.
    pub async fn stop(&self) -> Result<()> {
        info!("reconciliation engine {} stopping", self.run_id);

        self.shutdown.cancel();
        self.cancel_ticker().await;

        if let Some(handle) = self.resync_task.lock().await.take() {
            if let Err(err) = handle.await {
                warn!("resync loop failed to join: {err}");
            }
        }

        match time::timeout(self.request_timeout(), self.remote.finalize_session(&self.run_id)).await
        {
            Ok(Ok(())) => info!("session {} finalized", self.run_id),
            Ok(Err(err)) => warn!("session finalize failed: {err:#}"),
            Err(_) => warn!("session finalize timed out"),
        }

        Ok(())
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.config.request_timeout_ms)
    }

    async fn spawn_resync_loop(&self) {
        let engine = self.clone();
        let resync_interval = Duration::from_millis(self.config.resync_interval_ms);

        let handle = tokio::spawn(async move {
            // First tick fires immediately, seeding state from the server.
            let mut interval = time::interval(resync_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        engine.run_resync_cycle().await;
                    }
                    _ = engine.shutdown.cancelled() => {
                        debug!("resync loop shutting down");
                        break;
                    }
                }
            }
        });

        *self.resync_task.lock().await = Some(handle);
    }

    async fn run_resync_cycle(&self) {
        match time::timeout(self.request_timeout(), self.remote.fetch_snapshot()).await {
            Ok(Ok(snapshot)) => {
                let (was_active, now_active) = {
                    let mut guard = self.state.lock().await;
                    let was_active = guard.tracking.is_active();
                    guard.apply_snapshot(snapshot);
                    (was_active, guard.tracking.is_active())
                };

                if now_active && !was_active {
                    self.spawn_ticker().await;
                } else if !now_active && was_active {
                    self.cancel_ticker().await;
                }
            }
            Ok(Err(err)) => self.record_resync_failure(format!("{err:#}")).await,
            Err(_) => self.record_resync_failure("request timed out".into()).await,
        }
    }

    async fn record_resync_failure(&self, reason: String) {
        let mut guard = self.state.lock().await;
        guard.record_resync_failure();
        let failures = guard.consecutive_resync_failures;
        if failures == self.config.stale_after_failures {
            warn!("resync failed {failures} times in a row, reporting stale data: {reason}");
        } else {
            debug!("resync failed ({failures} consecutive): {reason}");
        }
    }

    /// Arm the tick + AFK-check loop. Every fire re-reads the live
    /// tracking state; a pause requested between schedule and fire stops
    /// the loop before it counts anything.
    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let detector = self.detector.clone();
        let remote = self.remote.clone();
        let idle = self.idle.clone();
        let tick_interval = Duration::from_millis(self.config.tick_interval_ms);
        let afk_enabled = self.config.afk_detection_enabled;
        let request_timeout = self.request_timeout();

        let handle = tokio::spawn(async move {
            // Skip the immediate first fire; a tick represents one whole
            // elapsed interval.
            let mut interval =
                time::interval_at(time::Instant::now() + tick_interval, tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                {
                    let guard = state.lock().await;
                    if guard.tracking != TrackingState::Active {
                        break;
                    }
                }

                // AFK is evaluated before the tick is applied, so an
                // auto-pause decided this cycle suppresses this cycle's
                // tick.
                if afk_enabled {
                    let sample = fetch_idle_sample(idle.as_ref(), request_timeout).await;
                    if !sample.activity_key.is_empty() {
                        debug!("focus sample: {}", sample.activity_key);
                    }

                    let (signal, afk_view) = {
                        let mut det = detector.lock().await;
                        let signal = det.observe(sample.idle_seconds);
                        (signal, det.state())
                    };

                    let paused = {
                        let mut guard = state.lock().await;
                        guard.afk = afk_view;
                        if !afk_view.is_afk {
                            // Fresh input resets the detector; the warning
                            // affordance goes with it.
                            guard.afk_warning_visible = false;
                        }
                        match signal {
                            AfkSignal::Warning => {
                                guard.afk_warning_visible = true;
                                info!(
                                    "AFK warning after {}s idle",
                                    afk_view.afk_duration_seconds
                                );
                                false
                            }
                            AfkSignal::AutoPause => {
                                let paused = guard.begin_auto_pause();
                                if paused {
                                    info!(
                                        "auto-pausing tracking after {}s idle",
                                        afk_view.afk_duration_seconds
                                    );
                                }
                                paused
                            }
                            AfkSignal::None => false,
                        }
                    };

                    if paused {
                        deliver_tracking_toggle(
                            remote.clone(),
                            state.clone(),
                            request_timeout,
                            false,
                        );
                        break;
                    }
                }

                let mut guard = state.lock().await;
                guard.apply_tick();
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

/// Unavailable idle samples count as presence; wrongly auto-pausing
/// active work is worse than missing an absence.
async fn fetch_idle_sample(idle: &dyn IdleSampleSource, timeout: Duration) -> IdleSample {
    let present = IdleSample {
        activity_key: String::new(),
        idle_seconds: 0,
    };

    match time::timeout(timeout, idle.idle_sample()).await {
        Ok(Ok(sample)) => sample,
        Ok(Err(err)) => {
            debug!("idle sample failed, assuming presence: {err:#}");
            present
        }
        Err(_) => {
            debug!("idle sample timed out, assuming presence");
            present
        }
    }
}

/// Fire-and-forget delivery of the tracking toggle. Failure is recorded
/// for diagnostics, never retried synchronously; the next resync cycle
/// reconciles.
fn deliver_tracking_toggle(
    remote: Arc<dyn RemoteSnapshotSource>,
    state: Arc<Mutex<EngineState>>,
    timeout: Duration,
    enabled: bool,
) {
    tokio::spawn(async move {
        match time::timeout(timeout, remote.set_tracking_enabled(enabled)).await {
            Ok(Ok(())) => state.lock().await.record_command_delivered(),
            Ok(Err(err)) => {
                warn!("failed to deliver tracking_enabled={enabled}: {err:#}");
                state.lock().await.record_command_error(err.to_string());
            }
            Err(_) => {
                warn!("tracking_enabled={enabled} delivery timed out");
                state
                    .lock()
                    .await
                    .record_command_error("delivery timed out".to_string());
            }
        }
    });
}
