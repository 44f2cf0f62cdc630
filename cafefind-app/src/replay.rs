use std::{
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use chrono::Utc;
use log::info;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use cafefind_logic::{
    DerivedMotion, GeoError, GeoErrorKind, Geolocator, Location, PositionFix, PositionOptions,
    Tracker, TrackerConfig, TrackerObserver, WatchUpdate, prelude::*,
};

use crate::store::JsonStore;

#[derive(Debug, Clone, Deserialize)]
/// One fix in a recorded trace file
pub struct TraceFix {
    /// Milliseconds since the start of the trace
    pub offset_ms: u64,
    pub lat: f64,
    pub long: f64,
    pub accuracy: f64,
    #[serde(default)]
    pub speed: Option<f64>,
}

impl TraceFix {
    fn to_fix(&self) -> PositionFix {
        let mut fix = PositionFix::new(Location::new(self.lat, self.long), self.accuracy, Utc::now());
        fix.speed = self.speed;
        fix
    }
}

/// [Geolocator] that replays a recorded trace in real time.
pub struct TraceGeolocator {
    fixes: Vec<TraceFix>,
}

impl TraceGeolocator {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace file {}", path.display()))?;
        let fixes = serde_json::from_str::<Vec<TraceFix>>(&raw)
            .with_context(|| format!("Trace file {} is not a JSON fix list", path.display()))?;
        Ok(Self { fixes })
    }
}

impl Geolocator for TraceGeolocator {
    async fn current_position(&self, _options: PositionOptions) -> WatchUpdate {
        match self.fixes.first() {
            Some(trace_fix) => Ok(trace_fix.to_fix()),
            None => Err(GeoError::new(
                GeoErrorKind::PositionUnavailable,
                "trace is empty",
            )),
        }
    }

    async fn watch(
        &self,
        _options: PositionOptions,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<WatchUpdate>, GeoError> {
        let (tx, rx) = mpsc::channel(20);
        let fixes = self.fixes.clone();

        tokio::spawn(async move {
            let mut elapsed_ms = 0;
            for trace_fix in fixes {
                let wait = trace_fix.offset_ms.saturating_sub(elapsed_ms);
                elapsed_ms = trace_fix.offset_ms;

                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(Duration::from_millis(wait)) => {}
                }

                if tx.send(Ok(trace_fix.to_fix())).await.is_err() {
                    return;
                }
            }
            // Dropping the sender ends the watch, and with it the replay
        });

        Ok(rx)
    }
}

/// Prints tracking output as it happens and counts what went by.
#[derive(Default)]
pub struct ConsoleObserver {
    accepted: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
}

impl ConsoleObserver {
    pub fn counters(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (self.accepted.clone(), self.errors.clone())
    }
}

impl TrackerObserver for ConsoleObserver {
    fn fix_accepted(&self, fix: &PositionFix, motion: &DerivedMotion) {
        self.accepted.fetch_add(1, Ordering::SeqCst);
        let heading = motion
            .heading
            .map(|h| format!("{h:.0}°"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "accepted  {:>10.6}, {:>11.6}  ±{:>5.1} m  heading {heading:>4}  {:.2} m/s",
            fix.location.lat, fix.location.long, fix.accuracy, motion.average_speed
        );
    }

    fn first_fix(&self, location: Location) {
        println!("first fix {:>10.6}, {:>11.6}  (would trigger the initial search)",
            location.lat, location.long);
    }

    fn tracking_error(&self, kind: GeoErrorKind, message: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        println!("error     {kind}: {message}");
    }

    fn fallback(&self, location: Location) {
        println!("fallback  {:>10.6}, {:>11.6}", location.lat, location.long);
    }
}

pub async fn run_replay(store: &JsonStore, trace: &Path) -> Result {
    let geolocator = TraceGeolocator::load(trace)?;
    let observer = ConsoleObserver::default();
    let (accepted, errors) = observer.counters();

    let tracker = Tracker::new(TrackerConfig::default(), geolocator, store, observer);

    info!("Replaying {}", trace.display());
    tracker.start().await;

    println!(
        "replay done: {} accepted update(s), {} error(s)",
        accepted.load(Ordering::SeqCst),
        errors.load(Ordering::SeqCst)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use cafefind_logic::{COORDINATES_MAX_AGE_MS, KvStore, StoredCoordinates};

    use super::*;

    fn trace_fix(offset_ms: u64, lat: f64, long: f64, accuracy: f64) -> TraceFix {
        TraceFix {
            offset_ms,
            lat,
            long,
            accuracy,
            speed: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replayed_trace_is_throttled_like_a_live_watch() {
        let path = std::env::temp_dir().join(format!("cafefind-replay-{}.json", std::process::id()));
        let _ = fs::remove_file(&path);
        let store = JsonStore::open(&path).unwrap();

        let geolocator = TraceGeolocator {
            fixes: vec![
                trace_fix(0, 0.0, 0.0, 10.0),
                // ~15.7 m by haversine, over the 5 m gate
                trace_fix(1000, 0.0001, 0.0001, 10.0),
                // ~3 m further with 30 m accuracy: noise, rejected
                trace_fix(2000, 0.000127, 0.0001, 30.0),
                // A real move, accepted again
                trace_fix(3000, 0.001, 0.001, 10.0),
            ],
        };
        let observer = ConsoleObserver::default();
        let (accepted, errors) = observer.counters();

        let tracker = Tracker::new(TrackerConfig::default(), geolocator, &store, observer);
        tracker.start().await;

        // The one-shot delivers the trace head too, and a zero-meter move
        // with good accuracy passes the throttle, so both copies count
        assert_eq!(accepted.load(Ordering::SeqCst), 4);
        assert_eq!(errors.load(Ordering::SeqCst), 0);

        // The last accepted fix was persisted for the next session
        let coords = StoredCoordinates::load(&store, Utc::now(), COORDINATES_MAX_AGE_MS).unwrap();
        assert_eq!(coords.location(), Location::new(0.001, 0.001));
        assert_eq!(store.get("locationPermissionStatus").as_deref(), Some("granted"));

        let _ = fs::remove_file(&path);
    }

    #[tokio::test(start_paused = true)]
    async fn trace_watch_replays_in_order_and_ends() {
        let fixes = vec![
            TraceFix {
                offset_ms: 0,
                lat: 0.0,
                long: 0.0,
                accuracy: 10.0,
                speed: None,
            },
            TraceFix {
                offset_ms: 2000,
                lat: 0.0001,
                long: 0.0001,
                accuracy: 10.0,
                speed: Some(1.5),
            },
        ];
        let geolocator = TraceGeolocator { fixes };

        let mut rx = geolocator
            .watch(
                TrackerConfig::default().watch_options(),
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let first = rx.recv().await.unwrap().unwrap();
        assert_eq!(first.location, Location::new(0.0, 0.0));
        assert_eq!(first.speed, None);

        let second = rx.recv().await.unwrap().unwrap();
        assert_eq!(second.location, Location::new(0.0001, 0.0001));
        assert_eq!(second.speed, Some(1.5));

        // Trace exhausted, the channel closes
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_watch_stops_sending() {
        let fixes = vec![TraceFix {
            offset_ms: 60_000,
            lat: 0.0,
            long: 0.0,
            accuracy: 10.0,
            speed: None,
        }];
        let geolocator = TraceGeolocator { fixes };

        let cancel = CancellationToken::new();
        let mut rx = geolocator
            .watch(TrackerConfig::default().watch_options(), cancel.clone())
            .await
            .unwrap();

        cancel.cancel();
        assert!(rx.recv().await.is_none());
    }
}
