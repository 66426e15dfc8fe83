use serde::{Deserialize, Serialize};

use crate::afk::PRESENCE_NOISE_FLOOR_SECONDS;
use crate::error::ConfigError;

/// Engine configuration with tunable intervals and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// How often the authoritative remote snapshot is fetched.
    pub resync_interval_ms: u64,

    /// Local tick cadence; the AFK check runs on the same cadence.
    pub tick_interval_ms: u64,

    /// Continuous idle time that suspends tracking automatically.
    pub afk_auto_pause_threshold_seconds: u64,

    pub afk_detection_enabled: bool,

    /// Upper bound on any single remote call.
    pub request_timeout_ms: u64,

    /// Consecutive resync failures before the facade reports stale data.
    pub stale_after_failures: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resync_interval_ms: 5_000,
            tick_interval_ms: 1_000,
            afk_auto_pause_threshold_seconds: 600,
            afk_detection_enabled: true,
            request_timeout_ms: 3_000,
            stale_after_failures: 3,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resync_interval_ms == 0 {
            return Err(ConfigError::ZeroResyncInterval);
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroRequestTimeout);
        }
        if self.stale_after_failures == 0 {
            return Err(ConfigError::ZeroFailureBudget);
        }
        if self.afk_auto_pause_threshold_seconds < PRESENCE_NOISE_FLOOR_SECONDS {
            return Err(ConfigError::AutoPauseThresholdTooLow(
                self.afk_auto_pause_threshold_seconds,
                PRESENCE_NOISE_FLOOR_SECONDS,
            ));
        }
        Ok(())
    }

    /// Warning threshold is derived, not independently configurable:
    /// two minutes before auto-pause, but never under a minute.
    pub fn afk_warning_threshold_seconds(&self) -> u64 {
        self.afk_auto_pause_threshold_seconds
            .saturating_sub(120)
            .max(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.resync_interval_ms, 5_000);
        assert_eq!(config.afk_auto_pause_threshold_seconds, 600);
        assert!(config.afk_detection_enabled);
    }

    #[test]
    fn test_warning_threshold_derivation() {
        let mut config = EngineConfig::default();
        assert_eq!(config.afk_warning_threshold_seconds(), 480);

        config.afk_auto_pause_threshold_seconds = 150;
        assert_eq!(config.afk_warning_threshold_seconds(), 60);

        config.afk_auto_pause_threshold_seconds = 1_000;
        assert_eq!(config.afk_warning_threshold_seconds(), 880);
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut config = EngineConfig::default();
        config.resync_interval_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroResyncInterval));

        let mut config = EngineConfig::default();
        config.tick_interval_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroTickInterval));

        let mut config = EngineConfig::default();
        config.request_timeout_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroRequestTimeout));

        let mut config = EngineConfig::default();
        config.stale_after_failures = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroFailureBudget));
    }

    #[test]
    fn test_auto_pause_below_noise_floor_rejected() {
        let mut config = EngineConfig::default();
        config.afk_auto_pause_threshold_seconds = 10;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AutoPauseThresholdTooLow(10, _))
        ));
    }
}
