//! Compile-time endpoint configuration. Override the providers with
//! `CAFEFIND_PLACES_URL` / `CAFEFIND_GEOCODER_URL` at build time to point at
//! a proxy or a fixture server.

const fn places_base_url() -> &'static str {
    if let Some(url) = option_env!("CAFEFIND_PLACES_URL") {
        url
    } else {
        "https://api.foursquare.com/v3"
    }
}

const fn geocoder_base_url() -> &'static str {
    if let Some(url) = option_env!("CAFEFIND_GEOCODER_URL") {
        url
    } else {
        "https://nominatim.openstreetmap.org"
    }
}

pub(crate) const PLACES_BASE_URL: &str = places_base_url();
pub(crate) const GEOCODER_BASE_URL: &str = geocoder_base_url();

pub(crate) const SEARCH_URL: &str = const_str::concat!(PLACES_BASE_URL, "/places/search");
pub(crate) const PLACES_URL: &str = const_str::concat!(PLACES_BASE_URL, "/places");
pub(crate) const GEOCODE_URL: &str = const_str::concat!(GEOCODER_BASE_URL, "/search");

/// Environment variable holding the places API key
pub const API_KEY_VAR: &str = "CAFEFIND_API_KEY";
