use serde::{Deserialize, Serialize};

/// A "part" of a location
pub type LocationComponent = f64;

/// Mean Earth radius used by the haversine formula
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Fallback coordinate (central Jakarta) used when no position can be acquired
pub const DEFAULT_LOCATION: Location = Location::new(-6.2088, 106.8456);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
/// Some location in the world as gotten from a Geolocation API
pub struct Location {
    /// Latitude in signed degrees
    pub lat: LocationComponent,
    /// Longitude in signed degrees
    pub long: LocationComponent,
}

impl Location {
    pub const fn new(lat: LocationComponent, long: LocationComponent) -> Self {
        Self { lat, long }
    }

    /// Great-circle distance to `other` in kilometers via the haversine formula.
    ///
    /// Symmetric, zero for identical points. Inputs are not validated, out of
    /// range degrees produce a mathematically valid result.
    pub fn distance_km(&self, other: Location) -> f64 {
        let d_lat = (other.lat - self.lat).to_radians();
        let d_long = (other.long - self.long).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos()
                * other.lat.to_radians().cos()
                * (d_long / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Initial compass bearing from `self` to `other`, degrees in `[0, 360)`.
    ///
    /// Not symmetric. Coincident points degrade to 0 by formula degeneracy.
    pub fn bearing_degrees(&self, other: Location) -> f64 {
        let phi1 = self.lat.to_radians();
        let phi2 = other.lat.to_radians();
        let d_lambda = (other.long - self.long).to_radians();

        let y = d_lambda.sin() * phi2.cos();
        let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lambda.cos();
        let theta = y.atan2(x);

        (theta.to_degrees() + 360.0) % 360.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAKARTA: Location = DEFAULT_LOCATION;
    const BANDUNG: Location = Location::new(-6.9175, 107.6191);

    #[test]
    fn distance_identical_points_is_zero() {
        assert_eq!(JAKARTA.distance_km(JAKARTA), 0.0);
        assert_eq!(Location::new(0.0, 0.0).distance_km(Location::new(0.0, 0.0)), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let there = JAKARTA.distance_km(BANDUNG);
        let back = BANDUNG.distance_km(JAKARTA);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn distance_matches_reference_value() {
        // Jakarta to Bandung is roughly 118 km as the crow flies
        let km = JAKARTA.distance_km(BANDUNG);
        assert!((km - 118.0).abs() < 2.0, "got {km} km");
    }

    #[test]
    fn bearing_stays_in_range() {
        let points = [
            Location::new(0.0, 0.0),
            Location::new(10.0, 10.0),
            Location::new(-10.0, 10.0),
            Location::new(10.0, -10.0),
            Location::new(-10.0, -10.0),
            Location::new(89.0, 179.0),
            Location::new(-89.0, -179.0),
        ];
        for a in points {
            for b in points {
                let bearing = a.bearing_degrees(b);
                assert!((0.0..360.0).contains(&bearing), "{a:?} -> {b:?} gave {bearing}");
            }
        }
    }

    #[test]
    fn bearing_of_coincident_points_is_zero() {
        assert_eq!(JAKARTA.bearing_degrees(JAKARTA), 0.0);
    }

    #[test]
    fn bearing_cardinal_directions() {
        let origin = Location::new(0.0, 0.0);
        assert!((origin.bearing_degrees(Location::new(1.0, 0.0)) - 0.0).abs() < 1e-6);
        assert!((origin.bearing_degrees(Location::new(0.0, 1.0)) - 90.0).abs() < 1e-6);
        assert!((origin.bearing_degrees(Location::new(-1.0, 0.0)) - 180.0).abs() < 1e-6);
        assert!((origin.bearing_degrees(Location::new(0.0, -1.0)) - 270.0).abs() < 1e-6);
    }
}
