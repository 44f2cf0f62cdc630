use serde::{Deserialize, Serialize};

use crate::fix::{PositionFix, UtcDT};

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Tuning for the update-throttle policy. These thresholds are untuned field
/// values, kept as configuration rather than constants at the call sites.
pub struct ThrottleConfig {
    /// Movement below this many meters is a candidate for rejection
    pub min_move_meters: f64,
    /// Small movements are rejected only when accuracy is worse than this
    pub noise_accuracy_meters: f64,
    /// Force acceptance once the last accepted update is older than this,
    /// so the UI never stalls on a stationary noisy signal
    pub force_refresh_ms: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_move_meters: 5.0,
            noise_accuracy_meters: 20.0,
            force_refresh_ms: 10_000,
        }
    }
}

impl ThrottleConfig {
    /// Decide whether `candidate` is significant enough to act upon.
    ///
    /// Pure function of the candidate and the last accepted update; all side
    /// effects of an acceptance belong to the caller.
    pub fn should_accept(
        &self,
        candidate: &PositionFix,
        last_accepted: Option<&PositionFix>,
        last_accepted_time: Option<UtcDT>,
        now: UtcDT,
    ) -> bool {
        let Some(last) = last_accepted else {
            // Nothing accepted yet, take anything
            return true;
        };

        let moved_meters = last.location.distance_km(candidate.location) * 1000.0;

        let mut accept =
            !(moved_meters < self.min_move_meters && candidate.accuracy > self.noise_accuracy_meters);

        if !accept && let Some(last_time) = last_accepted_time {
            let since_update = now.signed_duration_since(last_time).num_milliseconds();
            if since_update > self.force_refresh_ms as i64 {
                accept = true;
            }
        }

        accept
    }
}
