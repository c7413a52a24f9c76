//! Engine settings.

use serde::{Deserialize, Serialize};

/// Tunable engine parameters. Every field has a default, so partial
/// configuration files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the default [`SimRng`](crate::rng::SimRng) draw source.
    pub seed: u64,
    /// Probability that a dispatch over a `Damaged` route is lost (0.0 to 1.0).
    pub damaged_failure_probability: f64,
    /// Demand nodes whose remaining need drops below this (but not to zero)
    /// after a delivery become `Recovering`.
    pub recovering_threshold: u32,
    /// Most events the log holds. Oldest events are evicted first.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            damaged_failure_probability: 0.5,
            recovering_threshold: 50,
            event_capacity: 256,
        }
    }
}

/// Settings the engine refuses to start with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("damaged_failure_probability must be within 0..=1, got {0}")]
    FailureProbability(f64),
}

impl EngineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// NaN and values outside `0..=1` are rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = self.damaged_failure_probability;
        if (0.0..=1.0).contains(&p) {
            Ok(())
        } else {
            Err(ConfigError::FailureProbability(p))
        }
    }
}
