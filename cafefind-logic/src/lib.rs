mod favorites;
mod fix;
mod geo;
mod history;
mod place;
mod session;
mod settings;
mod store;
mod throttle;
mod tracker;
mod visit_history;

pub use favorites::{FAVORITES_KEY, FavoriteEntry, is_favorite, load_favorites, remove_favorite, toggle_favorite};
pub use fix::{PositionFix, UtcDT};
pub use geo::{DEFAULT_LOCATION, Location};
pub use history::{DerivedMotion, HISTORY_CAPACITY, PositionHistory};
pub use place::Place;
pub use session::{COORDINATES_MAX_AGE_MS, PermissionState, StoredCoordinates, TrackingSession};
pub use settings::{PositionOptions, TrackerConfig};
pub use store::KvStore;
pub use throttle::ThrottleConfig;
pub use tracker::{GeoError, GeoErrorKind, Geolocator, Tracker, TrackerObserver, WatchUpdate};
pub use visit_history::{
    HISTORY_KEY, HISTORY_LIMIT, VisitEntry, clear_history, grouped_by_day, load_history,
    record_visit, remove_visit,
};

pub mod prelude {
    use anyhow::Error as AnyhowError;
    use std::result::Result as StdResult;
    pub type Result<T = (), E = AnyhowError> = StdResult<T, E>;
    pub use anyhow::Context;
}
