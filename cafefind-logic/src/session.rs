use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    fix::{PositionFix, UtcDT},
    geo::Location,
    history::{DerivedMotion, PositionHistory},
    store::KvStore,
    throttle::ThrottleConfig,
};

/// Store key for the persisted permission state
pub const PERMISSION_KEY: &str = "locationPermissionStatus";
/// Store key for the last known coordinates
pub const COORDINATES_KEY: &str = "cafeFinderUserCoordinates";
/// Saved coordinates older than this are stale and never reused
pub const COORDINATES_MAX_AGE_MS: u64 = 30 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    /// Load the state persisted by a previous session; anything unreadable is
    /// `Unknown`.
    pub fn load(store: &impl KvStore) -> Self {
        match store.get(PERMISSION_KEY).as_deref() {
            Some("granted") => Self::Granted,
            Some("denied") => Self::Denied,
            _ => Self::Unknown,
        }
    }

    /// Persist this state. `Unknown` is represented by absence.
    pub fn persist(self, store: &impl KvStore) {
        match self {
            Self::Granted => store.set(PERMISSION_KEY, "granted"),
            Self::Denied => store.set(PERMISSION_KEY, "denied"),
            Self::Unknown => store.remove(PERMISSION_KEY),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// Last known coordinate, persisted so the next session can render something
/// before the first fresh fix arrives.
pub struct StoredCoordinates {
    pub lat: f64,
    pub long: f64,
    pub accuracy: f64,
    pub timestamp: UtcDT,
}

impl StoredCoordinates {
    pub fn location(&self) -> Location {
        Location::new(self.lat, self.long)
    }

    /// The saved coordinate, if one exists and is still fresh. A position the
    /// device left half an hour ago says nothing useful about where it is now.
    pub fn load(store: &impl KvStore, now: UtcDT, max_age_ms: u64) -> Option<Self> {
        let raw = store.get(COORDINATES_KEY)?;
        let coords: Self = serde_json::from_str(&raw).ok()?;

        let age_ms = now.signed_duration_since(coords.timestamp).num_milliseconds();
        if age_ms > max_age_ms as i64 {
            debug!("Saved coordinates are too old, ignoring them");
            return None;
        }

        Some(coords)
    }

    pub fn persist(&self, store: &impl KvStore) {
        match serde_json::to_string(self) {
            Ok(raw) => store.set(COORDINATES_KEY, &raw),
            Err(why) => warn!("Failed to serialize coordinates: {why:?}"),
        }
    }
}

impl From<&PositionFix> for StoredCoordinates {
    fn from(fix: &PositionFix) -> Self {
        Self {
            lat: fix.location.lat,
            long: fix.location.long,
            accuracy: fix.accuracy,
            timestamp: fix.timestamp,
        }
    }
}

/// Session-wide tracking state.
///
/// One explicit record owned by the [Tracker](crate::Tracker), mutated only
/// through these methods. The position history lives inside it because both
/// share a lifecycle: a (re)started session empties the buffer.
#[derive(Debug)]
pub struct TrackingSession {
    pub is_active: bool,
    pub auto_center: bool,
    pub permission: PermissionState,
    last_accepted: Option<PositionFix>,
    last_accepted_time: Option<UtcDT>,
    had_first_fix: bool,
    history: PositionHistory,
}

impl TrackingSession {
    pub fn new(permission: PermissionState) -> Self {
        Self {
            is_active: false,
            auto_center: true,
            permission,
            last_accepted: None,
            last_accepted_time: None,
            had_first_fix: false,
            history: PositionHistory::new(),
        }
    }

    /// Begin a fresh tracking run: clears the history buffer and the
    /// first-fix latch, keeps the last accepted fix so the throttle still has
    /// a baseline.
    pub fn restart(&mut self) {
        self.history.reset();
        self.had_first_fix = false;
        self.is_active = true;
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn last_accepted(&self) -> Option<&PositionFix> {
        self.last_accepted.as_ref()
    }

    pub fn should_accept(&self, candidate: &PositionFix, now: UtcDT, config: &ThrottleConfig) -> bool {
        config.should_accept(
            candidate,
            self.last_accepted.as_ref(),
            self.last_accepted_time,
            now,
        )
    }

    /// Record an accepted fix and return the motion derived from the updated
    /// history.
    pub fn accept_fix(&mut self, fix: PositionFix, now: UtcDT) -> DerivedMotion {
        self.last_accepted = Some(fix);
        self.last_accepted_time = Some(now);
        self.history.append(fix);
        self.history.derived_motion()
    }

    /// Latch the first accepted fix of this run. Returns true exactly once
    /// per (re)start, the trigger for the initial place search.
    pub fn mark_first_fix(&mut self) -> bool {
        if self.had_first_fix {
            false
        } else {
            self.had_first_fix = true;
            true
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{geo::Location, tests::MemoryStore};

    #[test]
    fn permission_round_trips_through_store() {
        let store = MemoryStore::default();
        assert_eq!(PermissionState::load(&store), PermissionState::Unknown);

        PermissionState::Granted.persist(&store);
        assert_eq!(PermissionState::load(&store), PermissionState::Granted);

        PermissionState::Denied.persist(&store);
        assert_eq!(PermissionState::load(&store), PermissionState::Denied);

        PermissionState::Unknown.persist(&store);
        assert_eq!(PermissionState::load(&store), PermissionState::Unknown);
    }

    #[test]
    fn corrupt_coordinates_read_as_absent() {
        let store = MemoryStore::default();
        store.set(COORDINATES_KEY, "not json");
        let now = Utc.timestamp_opt(0, 0).unwrap();
        assert!(StoredCoordinates::load(&store, now, COORDINATES_MAX_AGE_MS).is_none());
    }

    #[test]
    fn coordinates_round_trip() {
        let store = MemoryStore::default();
        let fix = PositionFix::new(
            Location::new(-6.2088, 106.8456),
            25.0,
            Utc.timestamp_opt(1000, 0).unwrap(),
        );
        StoredCoordinates::from(&fix).persist(&store);

        let now = fix.timestamp + chrono::Duration::seconds(60);
        let loaded = StoredCoordinates::load(&store, now, COORDINATES_MAX_AGE_MS).unwrap();
        assert_eq!(loaded.location(), fix.location);
        assert_eq!(loaded.accuracy, 25.0);
    }

    #[test]
    fn stale_coordinates_are_not_reused() {
        let store = MemoryStore::default();
        let saved_at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let fix = PositionFix::new(Location::new(-6.2088, 106.8456), 25.0, saved_at);
        StoredCoordinates::from(&fix).persist(&store);

        // Two days later the saved position is useless
        let much_later = saved_at + chrono::Duration::days(2);
        assert!(StoredCoordinates::load(&store, much_later, COORDINATES_MAX_AGE_MS).is_none());

        // Just inside the window it still counts
        let just_inside = saved_at + chrono::Duration::minutes(29);
        assert!(StoredCoordinates::load(&store, just_inside, COORDINATES_MAX_AGE_MS).is_some());

        // Exactly at the boundary is still fresh, the original rejects
        // strictly-older only
        let boundary = saved_at + chrono::Duration::milliseconds(COORDINATES_MAX_AGE_MS as i64);
        assert!(StoredCoordinates::load(&store, boundary, COORDINATES_MAX_AGE_MS).is_some());
    }

    #[test]
    fn restart_clears_history_and_first_fix_latch() {
        let mut session = TrackingSession::new(PermissionState::Unknown);
        let now = Utc.timestamp_opt(0, 0).unwrap();
        let fix = PositionFix::new(Location::new(0.0, 0.0), 10.0, now);

        session.restart();
        session.accept_fix(fix, now);
        assert!(session.mark_first_fix());
        assert!(!session.mark_first_fix());
        assert_eq!(session.history_len(), 1);

        session.restart();
        assert_eq!(session.history_len(), 0);
        assert!(session.mark_first_fix());
        // The throttle baseline survives the restart
        assert!(session.last_accepted().is_some());
    }
}
