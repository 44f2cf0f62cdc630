use log::debug;

use cafefind_logic::{Location, prelude::*};

use crate::{endpoints::GEOCODE_URL, models::GeocodeResult};

const USER_AGENT: &str = concat!("cafefind/", env!("CARGO_PKG_VERSION"));

/// Resolve a free-text query to its best-match coordinate. `Ok(None)` when
/// the geocoder has no answer; the caller falls back to a query search.
pub async fn geocode(query: &str) -> Result<Option<Location>> {
    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    let results = http
        .get(GEOCODE_URL)
        .query(&[("format", "json"), ("q", query), ("limit", "1")])
        .send()
        .await
        .context("Could not reach the geocoder")?
        .error_for_status()
        .context("Geocoder returned an error")?
        .json::<Vec<GeocodeResult>>()
        .await
        .context("Malformed geocoder response")?;

    let location = results.first().and_then(GeocodeResult::location);
    debug!("Geocoded {query:?} to {location:?}");
    Ok(location)
}
