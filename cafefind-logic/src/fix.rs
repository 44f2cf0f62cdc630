use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Location;

/// Convenience alias for UTC DT
pub type UtcDT = DateTime<Utc>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// One observed location sample from the platform. Never mutated after creation.
pub struct PositionFix {
    pub location: Location,
    /// Reported uncertainty radius in meters
    pub accuracy: f64,
    /// When the platform observed this sample
    pub timestamp: UtcDT,
    /// Speed in m/s if the platform could determine it, `None` means unknown (not zero)
    pub speed: Option<f64>,
}

impl PositionFix {
    pub fn new(location: Location, accuracy: f64, timestamp: UtcDT) -> Self {
        Self {
            location,
            accuracy,
            timestamp,
            speed: None,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }
}
