use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TrackingState {
    Active,
    ManuallyPaused,
    AutoPausedByAfk,
}

impl Default for TrackingState {
    fn default() -> Self {
        TrackingState::Active
    }
}

impl TrackingState {
    pub fn is_active(&self) -> bool {
        matches!(self, TrackingState::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingState::Active => "Active",
            TrackingState::ManuallyPaused => "ManuallyPaused",
            TrackingState::AutoPausedByAfk => "AutoPausedByAfk",
        }
    }
}
