pub mod detector;

pub use detector::{AfkDetector, AfkSignal, AfkState, AfkThresholds, PRESENCE_NOISE_FLOOR_SECONDS};
