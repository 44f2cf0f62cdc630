use std::fmt;

use chrono::Utc;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use crate::{
    fix::{PositionFix, UtcDT},
    geo::{DEFAULT_LOCATION, Location},
    history::DerivedMotion,
    session::{PermissionState, StoredCoordinates, TrackingSession},
    settings::{PositionOptions, TrackerConfig},
    store::KvStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// Why a position request failed
pub enum GeoErrorKind {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    /// The platform has no geolocation capability at all
    Unsupported,
}

impl fmt::Display for GeoErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PermissionDenied => "permission-denied",
            Self::PositionUnavailable => "position-unavailable",
            Self::Timeout => "timeout",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone)]
pub struct GeoError {
    pub kind: GeoErrorKind,
    pub message: String,
}

impl GeoError {
    pub fn new(kind: GeoErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for GeoError {}

/// One delivery from a continuous watch
pub type WatchUpdate = Result<PositionFix, GeoError>;

/// The platform geolocation seam. Implementations wrap whatever the host
/// actually provides (a browser API, a mobile plugin, a recorded trace).
pub trait Geolocator: Send + Sync {
    /// One-shot position request.
    fn current_position(
        &self,
        options: PositionOptions,
    ) -> impl Future<Output = WatchUpdate> + Send;

    /// Start a continuous watch. Updates arrive on the returned channel, in
    /// platform callback order, until `cancel` fires or the platform ends the
    /// watch (sender dropped). Implementations must not keep more than one
    /// watch alive; the tracker cancels the previous one before asking for
    /// the next.
    fn watch(
        &self,
        options: PositionOptions,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<mpsc::Receiver<WatchUpdate>, GeoError>> + Send;
}

/// Downstream consumer of tracking output, implemented by the presentation
/// layer (marker rendering, notifications, place search).
pub trait TrackerObserver: Send + Sync {
    /// The throttle accepted an update
    fn fix_accepted(&self, fix: &PositionFix, motion: &DerivedMotion);
    /// First accepted fix of a run, fired exactly once per (re)start. The
    /// trigger for the initial place search.
    fn first_fix(&self, location: Location);
    fn tracking_error(&self, kind: GeoErrorKind, message: &str);
    /// No usable position will arrive; render this coordinate instead
    fn fallback(&self, location: Location);
}

#[cfg(test)]
fn get_now() -> UtcDT {
    let fake = tokio::time::Instant::now();
    let real = std::time::Instant::now();
    Utc::now() + (fake.into_std().duration_since(real) + std::time::Duration::from_secs(1))
}

#[cfg(not(test))]
fn get_now() -> UtcDT {
    Utc::now()
}

/// Owns the [TrackingSession] and runs the acquisition loop: issues the
/// one-shot and continuous requests through a [Geolocator], filters and
/// throttles incoming fixes, persists permission state and the last known
/// coordinate, and emits accepted updates to a [TrackerObserver].
pub struct Tracker<G: Geolocator, K: KvStore, O: TrackerObserver> {
    session: RwLock<TrackingSession>,
    geolocator: G,
    store: K,
    observer: O,
    config: TrackerConfig,
    watch_cancel: Mutex<CancellationToken>,
}

impl<G: Geolocator, K: KvStore, O: TrackerObserver> Tracker<G, K, O> {
    pub fn new(config: TrackerConfig, geolocator: G, store: K, observer: O) -> Self {
        let permission = PermissionState::load(&store);
        Self {
            session: RwLock::new(TrackingSession::new(permission)),
            geolocator,
            store,
            observer,
            config,
            watch_cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Last known coordinate for the fallback path: the persisted one if a
    /// prior session saved it recently enough, the default otherwise.
    fn fallback_location(&self) -> Location {
        StoredCoordinates::load(&self.store, get_now(), self.config.coordinates_max_age_ms)
            .map(|coords| coords.location())
            .unwrap_or(DEFAULT_LOCATION)
    }

    /// Run a tracking session to completion. Cancels and replaces any watch a
    /// previous call started, so at most one is ever active. Returns when the
    /// watch ends, a non-recoverable error occurs, or [Tracker::stop] is
    /// called. Platform errors are surfaced through the observer, never
    /// returned.
    pub async fn start(&self) {
        let cancel = {
            let mut current = self.watch_cancel.lock().await;
            current.cancel();
            *current = CancellationToken::new();
            current.clone()
        };

        let denied = {
            let mut session = self.session.write().await;
            session.restart();
            session.permission == PermissionState::Denied
        };

        if denied {
            // Refused in a prior session; prompting again would just storm
            // the user, go straight to the fallback coordinate
            warn!("Location permission was previously denied, skipping request");
            self.observer.fallback(self.fallback_location());
            self.session.write().await.deactivate();
            return;
        }

        let watch = self
            .geolocator
            .watch(self.config.watch_options(), cancel.child_token())
            .await;

        let mut updates = match watch {
            Ok(rx) => rx,
            Err(err) => {
                self.consume_error(err).await;
                self.session.write().await.deactivate();
                return;
            }
        };

        let oneshot = self
            .geolocator
            .current_position(self.config.oneshot_options());
        tokio::pin!(oneshot);
        let mut oneshot_pending = true;

        info!("Started location tracking");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                update = &mut oneshot, if oneshot_pending => {
                    oneshot_pending = false;
                    if self.consume_update(update).await {
                        break;
                    }
                }

                update = updates.recv() => {
                    match update {
                        Some(update) => {
                            if self.consume_update(update).await {
                                break;
                            }
                        }
                        // Platform ended the watch
                        None => break,
                    }
                }
            }
        }

        // A restart cancels the old token and installs a fresh one before its
        // own loop begins; in that case the session now belongs to the new
        // run and must stay active.
        let replaced = cancel.is_cancelled() && !self.watch_cancel.lock().await.is_cancelled();
        if !replaced {
            self.session.write().await.deactivate();
        }
        info!("Stopped location tracking");
    }

    /// Returns whether the loop should stop.
    async fn consume_update(&self, update: WatchUpdate) -> bool {
        match update {
            Ok(fix) => {
                self.consume_fix(fix).await;
                false
            }
            Err(err) => self.consume_error(err).await,
        }
    }

    async fn consume_fix(&self, fix: PositionFix) {
        let mut session = self.session.write().await;

        if session.permission != PermissionState::Granted {
            session.permission = PermissionState::Granted;
            PermissionState::Granted.persist(&self.store);
        }

        // Hard floor filter, applied before the throttle ever sees the fix
        if fix.accuracy > self.config.accuracy_floor_meters {
            debug!(
                "Low accuracy fix ({} m), waiting for a better signal",
                fix.accuracy
            );
            return;
        }

        let now = get_now();
        if !session.should_accept(&fix, now, &self.config.throttle) {
            debug!("Throttled insignificant movement");
            return;
        }

        let motion = session.accept_fix(fix, now);
        let first = session.mark_first_fix();
        drop(session);

        StoredCoordinates::from(&fix).persist(&self.store);
        self.observer.fix_accepted(&fix, &motion);
        if first {
            self.observer.first_fix(fix.location);
        }
    }

    /// Returns whether the loop should stop.
    async fn consume_error(&self, err: GeoError) -> bool {
        error!("Location tracking error: {err}");
        self.observer.tracking_error(err.kind, &err.message);

        match err.kind {
            GeoErrorKind::PermissionDenied => {
                self.session.write().await.permission = PermissionState::Denied;
                PermissionState::Denied.persist(&self.store);
                self.observer.fallback(self.fallback_location());
                true
            }
            GeoErrorKind::Unsupported => {
                self.observer.fallback(self.fallback_location());
                true
            }
            // Transient; keep the watch, leave permission and the last
            // accepted fix untouched
            GeoErrorKind::PositionUnavailable | GeoErrorKind::Timeout => false,
        }
    }

    /// Cancel the active watch; the running [Tracker::start] call returns.
    pub async fn stop(&self) {
        self.watch_cancel.lock().await.cancel();
    }

    pub async fn is_active(&self) -> bool {
        self.session.read().await.is_active
    }

    pub async fn set_auto_center(&self, enabled: bool) {
        self.session.write().await.auto_center = enabled;
    }

    pub async fn auto_center(&self) -> bool {
        self.session.read().await.auto_center
    }

    pub async fn last_accepted(&self) -> Option<PositionFix> {
        self.session.read().await.last_accepted().copied()
    }

    pub async fn permission(&self) -> PermissionState {
        self.session.read().await.permission
    }
}
