use cafefind_logic::{Location, Place};
use serde::Deserialize;

/// Photo size requested from the provider
const PHOTO_SIZE: &str = "300x200";

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
/// One place as the provider returns it. `geocodes.main` may be missing, in
/// which case the result is unusable and gets skipped.
pub struct PlaceResult {
    pub fsq_id: String,
    pub name: String,
    pub geocodes: Option<Geocodes>,
    #[serde(default)]
    pub location: PlaceAddress,
    #[serde(default)]
    pub categories: Vec<CategoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct Geocodes {
    pub main: Option<GeoPoint>,
}

#[derive(Debug, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlaceAddress {
    pub address: Option<String>,
    pub locality: Option<String>,
    pub postcode: Option<String>,
}

impl PlaceAddress {
    /// "street, locality, postcode", skipping missing parts
    pub fn formatted(&self) -> String {
        [&self.address, &self.locality, &self.postcode]
            .into_iter()
            .flatten()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PhotoEntry {
    pub prefix: String,
    pub suffix: String,
}

impl PhotoEntry {
    pub fn url(&self) -> String {
        format!("{}{PHOTO_SIZE}{}", self.prefix, self.suffix)
    }
}

impl PlaceResult {
    /// Convert into a domain [Place], computing the distance from the search
    /// center. `None` when the provider gave no usable coordinates.
    pub fn into_place(self, from: Location) -> Option<Place> {
        let point = self.geocodes?.main?;
        let location = Location::new(point.latitude, point.longitude);

        Some(Place {
            id: self.fsq_id,
            name: self.name,
            location,
            address: self.location.formatted(),
            categories: self
                .categories
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            distance_km: from.distance_km(location),
            photo: None,
        })
    }
}

/// The geocoder returns coordinates as strings
#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    pub lat: String,
    pub lon: String,
}

impl GeocodeResult {
    pub fn location(&self) -> Option<Location> {
        let lat = self.lat.parse().ok()?;
        let long = self.lon.parse().ok()?;
        Some(Location::new(lat, long))
    }
}
