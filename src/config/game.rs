//! Game pacing and validation limits.

use super::defaults::{
    default_code_allocation_attempts, default_countdown_secs, default_max_deadline_secs,
    default_max_name_length, default_min_deadline_secs, default_podium_finale_ms,
    default_podium_step_ms, default_question_deadline_secs,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the game coordinator. The defaults match the product
/// behavior; tests compress the timings.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GameConfig {
    /// Length of the pre-question countdown (seconds)
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u64,
    /// Deadline applied when a question does not specify one (seconds)
    #[serde(default = "default_question_deadline_secs")]
    pub default_deadline_secs: u64,
    /// Smallest accepted per-question deadline (seconds)
    #[serde(default = "default_min_deadline_secs")]
    pub min_deadline_secs: u64,
    /// Largest accepted per-question deadline (seconds)
    #[serde(default = "default_max_deadline_secs")]
    pub max_deadline_secs: u64,
    /// Pause before each podium position reveal (milliseconds)
    #[serde(default = "default_podium_step_ms")]
    pub podium_step_ms: u64,
    /// Pause between the final reveal and `podium_complete` (milliseconds)
    #[serde(default = "default_podium_finale_ms")]
    pub podium_finale_ms: u64,
    /// Longest accepted display name (characters)
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    /// Room code collision retries before `CapacityExhausted`
    #[serde(default = "default_code_allocation_attempts")]
    pub code_allocation_attempts: usize,
}

impl GameConfig {
    pub fn countdown(&self) -> Duration {
        Duration::from_secs(self.countdown_secs)
    }

    pub fn podium_step(&self) -> Duration {
        Duration::from_millis(self.podium_step_ms)
    }

    pub fn podium_finale(&self) -> Duration {
        Duration::from_millis(self.podium_finale_ms)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown_secs(),
            default_deadline_secs: default_question_deadline_secs(),
            min_deadline_secs: default_min_deadline_secs(),
            max_deadline_secs: default_max_deadline_secs(),
            podium_step_ms: default_podium_step_ms(),
            podium_finale_ms: default_podium_finale_ms(),
            max_name_length: default_max_name_length(),
            code_allocation_attempts: default_code_allocation_attempts(),
        }
    }
}
