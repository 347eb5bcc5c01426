use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;

use crate::errors::{DemoError, Result};
use crate::generator::seeded_rng;

pub const DEFAULT_MIN_DELAY_SECS: u64 = 5;
pub const DEFAULT_MAX_DELAY_SECS: u64 = 37;

/// Half-open range of seconds to wait between bookings. An empty range
/// (`min == max`) means a fixed wait of `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl Default for DelayRange {
    fn default() -> Self {
        Self {
            min_secs: DEFAULT_MIN_DELAY_SECS,
            max_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    pub delay: DelayRange,
    /// Stop after this many cycles; run forever when unset.
    pub max_cycles: Option<u64>,
    pub identities: bool,
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn validate(self) -> Result<Self> {
        if self.delay.min_secs > self.delay.max_secs {
            return Err(DemoError::InvalidConfig(format!(
                "min delay {}s exceeds max delay {}s",
                self.delay.min_secs, self.delay.max_secs
            )));
        }
        if self.max_cycles == Some(0) {
            return Err(DemoError::InvalidConfig(
                "cycle limit must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

pub struct DelaySampler {
    rng: StdRng,
    range: DelayRange,
}

impl DelaySampler {
    pub fn new(range: DelayRange, seed: Option<u64>) -> Result<Self> {
        Ok(Self {
            rng: seeded_rng(seed.map(|s| s.wrapping_add(1)))?,
            range,
        })
    }

    pub fn next_delay(&mut self) -> Duration {
        let secs = if self.range.min_secs >= self.range.max_secs {
            self.range.min_secs
        } else {
            self.rng.gen_range(self.range.min_secs..self.range.max_secs)
        };
        Duration::from_secs(secs)
    }
}
