use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::fix::PositionFix;

/// How many recent fixes are kept for deriving heading and speed
pub const HISTORY_CAPACITY: usize = 5;

/// Motion derived from the recent position history, recomputed on demand and
/// never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DerivedMotion {
    /// Compass heading of travel in degrees, `None` with fewer than 2 fixes
    pub heading: Option<f64>,
    /// Smoothed speed in m/s, 0 when undeterminable
    pub average_speed: f64,
}

/// Bounded FIFO of recent position fixes, oldest first.
///
/// Entries are appended in callback-arrival order and never re-sorted; the
/// platform may in principle deliver out-of-order timestamps and the speed
/// computation guards against the resulting non-positive elapsed time.
#[derive(Debug, Clone, Default)]
pub struct PositionHistory {
    fixes: VecDeque<PositionFix>,
}

impl PositionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fix, evicting the oldest entry once at capacity.
    pub fn append(&mut self, fix: PositionFix) {
        if self.fixes.len() >= HISTORY_CAPACITY {
            self.fixes.pop_front();
        }
        self.fixes.push_back(fix);
    }

    /// Empty the buffer. Called whenever tracking restarts.
    pub fn reset(&mut self) {
        self.fixes.clear();
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    pub fn latest(&self) -> Option<&PositionFix> {
        self.fixes.back()
    }

    /// Smoothed speed over the whole buffer: distance between the oldest and
    /// newest fixes divided by their elapsed time. 0 with fewer than 2 fixes
    /// or when elapsed time is not positive (clock anomalies, duplicates).
    pub fn average_speed(&self) -> f64 {
        let (Some(oldest), Some(latest)) = (self.fixes.front(), self.fixes.back()) else {
            return 0.0;
        };
        if self.fixes.len() < 2 {
            return 0.0;
        }

        let meters = oldest.location.distance_km(latest.location) * 1000.0;
        let elapsed = latest
            .timestamp
            .signed_duration_since(oldest.timestamp)
            .num_milliseconds() as f64
            / 1000.0;

        if elapsed > 0.0 { meters / elapsed } else { 0.0 }
    }

    /// Bearing from the second-to-last fix to the last one, if we have both.
    pub fn latest_heading(&self) -> Option<f64> {
        let len = self.fixes.len();
        if len < 2 {
            return None;
        }
        let previous = self.fixes[len - 2];
        let current = self.fixes[len - 1];
        Some(previous.location.bearing_degrees(current.location))
    }

    pub fn derived_motion(&self) -> DerivedMotion {
        DerivedMotion {
            heading: self.latest_heading(),
            average_speed: self.average_speed(),
        }
    }
}
