//! Animation tokens

use std::time::Duration;

/// Durations for UI motion
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationTokens {
    pub duration_fast_ms: u64,
    pub duration_normal_ms: u64,
    pub duration_slow_ms: u64,
    /// Length of the window bracketing a light/dark switch
    pub theme_transition_ms: u64,
    pub easing: String,
}

impl AnimationTokens {
    pub fn theme_transition(&self) -> Duration {
        Duration::from_millis(self.theme_transition_ms)
    }
}

impl Default for AnimationTokens {
    fn default() -> Self {
        Self {
            duration_fast_ms: 150,
            duration_normal_ms: 250,
            duration_slow_ms: 400,
            theme_transition_ms: 300,
            easing: "cubic-bezier(0.4, 0, 0.2, 1)".to_string(),
        }
    }
}
