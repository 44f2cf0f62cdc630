use serde::{Deserialize, Serialize};

use crate::geo::Location;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// A place as returned by the places provider, ready for presentation.
pub struct Place {
    /// Provider-issued id, opaque to us
    pub id: String,
    pub name: String,
    pub location: Location,
    /// Pre-joined "street, locality, postcode" form
    pub address: String,
    /// Comma-joined category names
    pub categories: String,
    /// Distance from the search center in kilometers
    pub distance_km: f64,
    pub photo: Option<String>,
}
