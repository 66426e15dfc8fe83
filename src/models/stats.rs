use serde::{Deserialize, Serialize};

/// Aggregate time counters. The remote service is authoritative for these;
/// the local ticker only advances `total_seconds`/`productive_seconds`
/// between resyncs so the visible counter does not stall.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeStats {
    pub total_seconds: u64,
    pub productive_seconds: u64,
    pub distracting_seconds: u64,
    pub afk_seconds: u64,
    pub week_seconds: u64,
    pub month_seconds: u64,
    pub productivity_percent: u8,
}

impl TimeStats {
    /// Apply one second of tracked time.
    pub fn record_tick(&mut self, productive: bool) {
        self.total_seconds = self.total_seconds.saturating_add(1);
        if productive {
            self.productive_seconds = self.productive_seconds.saturating_add(1);
        }
        self.recompute_percent();
    }

    pub fn recompute_percent(&mut self) {
        self.productivity_percent = if self.total_seconds > 0 {
            let ratio = self.productive_seconds as f64 / self.total_seconds as f64;
            (ratio * 100.0).round() as u8
        } else {
            0
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_is_zero_without_time() {
        let mut stats = TimeStats::default();
        stats.recompute_percent();
        assert_eq!(stats.productivity_percent, 0);
    }

    #[test]
    fn test_record_tick_updates_percent() {
        let mut stats = TimeStats {
            total_seconds: 100,
            productive_seconds: 60,
            ..TimeStats::default()
        };
        stats.recompute_percent();
        assert_eq!(stats.productivity_percent, 60);

        // One unproductive second: 60/101 rounds to 59
        stats.record_tick(false);
        assert_eq!(stats.total_seconds, 101);
        assert_eq!(stats.productive_seconds, 60);
        assert_eq!(stats.productivity_percent, 59);

        stats.record_tick(true);
        assert_eq!(stats.productive_seconds, 61);
    }

    #[test]
    fn test_percent_rounds_half_up() {
        let mut stats = TimeStats {
            total_seconds: 300,
            productive_seconds: 150,
            ..TimeStats::default()
        };
        stats.recompute_percent();
        assert_eq!(stats.productivity_percent, 50);

        let mut stats = TimeStats {
            total_seconds: 3,
            productive_seconds: 2,
            ..TimeStats::default()
        };
        stats.recompute_percent();
        assert_eq!(stats.productivity_percent, 67);
    }
}
