use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Idle durations under this are treated as presence. Distinguishes brief
/// pauses (reading, thinking) from real absence.
pub const PRESENCE_NOISE_FLOOR_SECONDS: u64 = 30;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AfkState {
    pub is_afk: bool,
    pub afk_duration_seconds: u64,
    pub warning_shown: bool,
    pub auto_pause_triggered: bool,
}

/// Edge-triggered outcome of one idle observation. `Warning` and
/// `AutoPause` each fire at most once per absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfkSignal {
    None,
    Warning,
    AutoPause,
}

#[derive(Debug, Clone, Copy)]
pub struct AfkThresholds {
    pub warning_seconds: u64,
    pub auto_pause_seconds: u64,
}

/// Pure AFK state machine fed with OS idle-duration samples.
///
/// Window-change activity keys are deliberately not consulted here; the
/// OS idle counter is the single authority for absence.
#[derive(Debug)]
pub struct AfkDetector {
    thresholds: AfkThresholds,
    state: AfkState,
    /// Set on an explicit resume. Idle samples observed afterwards are
    /// clamped to the time since resume, so a stale sample still carrying
    /// the pre-resume idle duration cannot immediately re-trigger.
    resume_anchor: Option<Instant>,
}

impl AfkDetector {
    pub fn new(thresholds: AfkThresholds) -> Self {
        Self {
            thresholds,
            state: AfkState::default(),
            resume_anchor: None,
        }
    }

    pub fn state(&self) -> AfkState {
        self.state
    }

    /// Feed one idle sample (seconds since last physical input).
    pub fn observe(&mut self, idle_seconds: u64) -> AfkSignal {
        let effective = match &self.resume_anchor {
            Some(anchor) => idle_seconds.min(anchor.elapsed().as_secs()),
            None => idle_seconds,
        };

        if effective < PRESENCE_NOISE_FLOOR_SECONDS {
            // Drop the rebase anchor only once a genuinely fresh sample
            // arrives; a clamped stale sample keeps it.
            if idle_seconds < PRESENCE_NOISE_FLOOR_SECONDS {
                self.resume_anchor = None;
            }
            self.state = AfkState::default();
            return AfkSignal::None;
        }

        self.resume_anchor = None;
        self.state.afk_duration_seconds = effective;

        let mut signal = AfkSignal::None;

        if effective >= self.thresholds.warning_seconds
            && !self.state.warning_shown
            && !self.state.auto_pause_triggered
        {
            self.state.is_afk = true;
            self.state.warning_shown = true;
            signal = AfkSignal::Warning;
        }

        if effective >= self.thresholds.auto_pause_seconds && !self.state.auto_pause_triggered {
            self.state.is_afk = true;
            self.state.auto_pause_triggered = true;
            signal = AfkSignal::AutoPause;
        }

        signal
    }

    /// User-initiated resume: clear all flags regardless of the current
    /// idle sample and rebase against now.
    pub fn reset_on_resume(&mut self) {
        self.state = AfkState::default();
        self.resume_anchor = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> AfkDetector {
        AfkDetector::new(AfkThresholds {
            warning_seconds: 480,
            auto_pause_seconds: 600,
        })
    }

    #[test]
    fn test_idle_progression_warning_then_auto_pause() {
        let mut d = detector();

        assert_eq!(d.observe(0), AfkSignal::None);
        assert!(!d.state().is_afk);

        assert_eq!(d.observe(29), AfkSignal::None);
        assert_eq!(d.state(), AfkState::default());

        // Past the noise floor but under the warning threshold
        assert_eq!(d.observe(31), AfkSignal::None);
        assert!(!d.state().is_afk);
        assert_eq!(d.state().afk_duration_seconds, 31);
        assert!(!d.state().warning_shown);

        assert_eq!(d.observe(500), AfkSignal::Warning);
        assert!(d.state().is_afk);
        assert!(d.state().warning_shown);
        assert!(!d.state().auto_pause_triggered);

        assert_eq!(d.observe(601), AfkSignal::AutoPause);
        assert!(d.state().auto_pause_triggered);
    }

    #[test]
    fn test_warning_fires_once() {
        let mut d = detector();
        assert_eq!(d.observe(500), AfkSignal::Warning);
        assert_eq!(d.observe(510), AfkSignal::None);
        assert_eq!(d.observe(520), AfkSignal::None);
    }

    #[test]
    fn test_auto_pause_fires_once_even_while_idle_continues() {
        let mut d = detector();
        assert_eq!(d.observe(650), AfkSignal::AutoPause);
        assert_eq!(d.observe(700), AfkSignal::None);
        assert_eq!(d.observe(800), AfkSignal::None);
        assert!(d.state().auto_pause_triggered);
    }

    #[test]
    fn test_jump_straight_past_both_thresholds_reports_auto_pause() {
        let mut d = detector();
        assert_eq!(d.observe(601), AfkSignal::AutoPause);
        assert!(d.state().warning_shown);
        assert!(d.state().auto_pause_triggered);
    }

    #[test]
    fn test_fresh_input_resets_everything() {
        let mut d = detector();
        d.observe(650);
        assert_eq!(d.observe(2), AfkSignal::None);
        assert_eq!(d.state(), AfkState::default());

        // A new absence starts the cycle over
        assert_eq!(d.observe(500), AfkSignal::Warning);
    }

    #[test]
    fn test_resume_rebases_against_stale_samples() {
        let mut d = detector();
        d.observe(650);
        d.reset_on_resume();
        assert_eq!(d.state(), AfkState::default());

        // The OS counter has not been refreshed yet; the stale 700s sample
        // is clamped to the near-zero time since resume.
        assert_eq!(d.observe(700), AfkSignal::None);
        assert!(!d.state().is_afk);
        assert!(!d.state().auto_pause_triggered);
    }
}
