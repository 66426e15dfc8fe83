use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::info;

use focusflow::{
    EngineConfig, ReconciliationEngine, SimulatedIdleSource, SimulatedSnapshotSource,
};

/// Headless demo runner: wires the engine to the simulated sources and
/// prints facade snapshots until interrupted.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("focusflow starting up...");

    let remote = Arc::new(SimulatedSnapshotSource::new());
    let idle = Arc::new(SimulatedIdleSource);

    let engine = ReconciliationEngine::start(EngineConfig::default(), remote, idle).await?;
    let handle = engine.handle();

    let mut report = tokio::time::interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = report.tick() => {
                let snapshot = handle.snapshot().await;
                let activity = snapshot
                    .current_activity
                    .as_ref()
                    .map(|a| format!("{} - {}", a.app_identity, a.window_title))
                    .unwrap_or_else(|| "(no activity)".to_string());
                info!(
                    "[{}] {} | total {}s, productive {}s ({}%), source {}",
                    snapshot.tracking.as_str(),
                    activity,
                    snapshot.stats.total_seconds,
                    snapshot.stats.productive_seconds,
                    snapshot.stats.productivity_percent,
                    snapshot.data_source_mode.as_str(),
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                break;
            }
        }
    }

    handle.stop().await?;
    Ok(())
}
