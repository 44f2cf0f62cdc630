mod category;
mod client;
mod endpoints;
mod geocode;
mod models;

pub use category::Category;
pub use client::{DEFAULT_LIMIT, DEFAULT_RADIUS_M, PlacesClient};
pub use endpoints::API_KEY_VAR;
pub use geocode::geocode;
