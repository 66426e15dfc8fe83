pub mod afk;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod sources;

pub use afk::{AfkDetector, AfkSignal, AfkState, AfkThresholds};
pub use config::EngineConfig;
pub use engine::{ConnectionHealth, EngineHandle, EngineSnapshot, ReconciliationEngine};
pub use error::ConfigError;
pub use models::{ActivityCategory, ActivitySample, DataSourceMode, TimeStats, TrackingState};
pub use sources::{
    HttpSnapshotSource, IdleSample, IdleSampleSource, RemoteSnapshot, RemoteSnapshotSource,
    SimulatedIdleSource, SimulatedSnapshotSource,
};
