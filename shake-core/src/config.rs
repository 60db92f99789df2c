//! Shake effect configuration.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Default effect length in seconds.
pub const DEFAULT_DURATION: f64 = 0.5;
/// Default maximum per-axis offset in pixels.
pub const DEFAULT_MAGNITUDE: f64 = 200.0;
/// Default update-rate hint in updates per second.
pub const DEFAULT_FREQUENCY: f64 = 30.0;

/// Range accepted for `duration` by the settings UI.
pub const DURATION_RANGE: RangeInclusive<f64> = 0.05..=10.0;
/// Range accepted for `magnitude` by the settings UI.
pub const MAGNITUDE_RANGE: RangeInclusive<f64> = 0.0..=1000.0;
/// Range accepted for `frequency` by the settings UI.
pub const FREQUENCY_RANGE: RangeInclusive<f64> = 1.0..=120.0;

/// Configuration for the shake effect.
///
/// Can be replaced at any time; an in-progress session keeps the end time it
/// was started with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeConfig {
    /// Effect length in seconds.
    pub duration: f64,

    /// Maximum per-axis offset in pixels at the start of the effect.
    pub magnitude: f64,

    /// Update-rate hint for the host, in updates per second.
    ///
    /// Informational only: the controller moves items on every tick it gets.
    pub frequency: f64,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            magnitude: DEFAULT_MAGNITUDE,
            frequency: DEFAULT_FREQUENCY,
        }
    }
}

impl ShakeConfig {
    /// Create a config with the default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the effect length in seconds.
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = seconds;
        self
    }

    /// Set the maximum per-axis offset in pixels.
    pub fn with_magnitude(mut self, pixels: f64) -> Self {
        self.magnitude = pixels;
        self
    }

    /// Set the update-rate hint.
    pub fn with_frequency(mut self, per_second: f64) -> Self {
        self.frequency = per_second;
        self
    }

    /// Clamp every field into the range the settings UI accepts.
    ///
    /// NaN values fall back to the defaults.
    pub fn clamped(self) -> Self {
        Self {
            duration: clamp_or(self.duration, DURATION_RANGE, DEFAULT_DURATION),
            magnitude: clamp_or(self.magnitude, MAGNITUDE_RANGE, DEFAULT_MAGNITUDE),
            frequency: clamp_or(self.frequency, FREQUENCY_RANGE, DEFAULT_FREQUENCY),
        }
    }

    /// Interval between updates implied by `frequency`.
    pub fn update_interval(&self) -> Duration {
        let frequency = clamp_or(self.frequency, FREQUENCY_RANGE, DEFAULT_FREQUENCY);
        Duration::from_secs_f64(1.0 / frequency)
    }
}

fn clamp_or(value: f64, range: RangeInclusive<f64>, fallback: f64) -> f64 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(*range.start(), *range.end())
    }
}
