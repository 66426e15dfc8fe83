use thiserror::Error;

/// Construction-time configuration problems. The engine refuses to start
/// on any of these; there is no runtime recovery path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("resync interval must be greater than zero")]
    ZeroResyncInterval,

    #[error("tick interval must be greater than zero")]
    ZeroTickInterval,

    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,

    #[error("stale-after-failures must be greater than zero")]
    ZeroFailureBudget,

    #[error("AFK auto-pause threshold {0}s is below the {1}s presence noise floor")]
    AutoPauseThresholdTooLow(u64, u64),
}
