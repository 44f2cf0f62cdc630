use serde::{Deserialize, Serialize};

use crate::{session::COORDINATES_MAX_AGE_MS, throttle::ThrottleConfig};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
/// Options passed to the platform geolocation capability per request
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout_ms: u32,
    /// Maximum age of a cached result the platform may hand back
    pub maximum_age_ms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Settings for a tracking session
pub struct TrackerConfig {
    pub throttle: ThrottleConfig,
    /// Fixes with worse accuracy than this are discarded outright, before the
    /// throttle ever sees them
    pub accuracy_floor_meters: f64,
    /// Timeout for the initial one-shot position request
    pub oneshot_timeout_ms: u32,
    /// Timeout for the continuous watch
    pub watch_timeout_ms: u32,
    /// Cached-result reuse window, 0 to always demand a fresh fix
    pub maximum_age_ms: u32,
    pub high_accuracy: bool,
    /// How long a persisted coordinate stays usable as a fallback
    pub coordinates_max_age_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            throttle: ThrottleConfig::default(),
            accuracy_floor_meters: 1000.0,
            oneshot_timeout_ms: 15_000,
            watch_timeout_ms: 10_000,
            maximum_age_ms: 0,
            high_accuracy: true,
            coordinates_max_age_ms: COORDINATES_MAX_AGE_MS,
        }
    }
}

impl TrackerConfig {
    pub fn oneshot_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: self.high_accuracy,
            timeout_ms: self.oneshot_timeout_ms,
            maximum_age_ms: self.maximum_age_ms,
        }
    }

    pub fn watch_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: self.high_accuracy,
            timeout_ms: self.watch_timeout_ms,
            maximum_age_ms: self.maximum_age_ms,
        }
    }
}
