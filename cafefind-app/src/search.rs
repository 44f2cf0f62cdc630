use chrono::Utc;
use log::info;

use cafefind_logic::{
    COORDINATES_MAX_AGE_MS, DEFAULT_LOCATION, Location, Place, StoredCoordinates, prelude::*,
    record_visit,
};
use cafefind_places::{Category, PlacesClient, geocode};

use crate::store::JsonStore;

/// Where to center a search when the user gave no coordinate: the last known
/// position if a tracking run saved one recently, the default otherwise.
fn stored_center(store: &JsonStore) -> Location {
    StoredCoordinates::load(store, Utc::now(), COORDINATES_MAX_AGE_MS)
        .map(|coords| coords.location())
        .unwrap_or(DEFAULT_LOCATION)
}

fn print_place(place: &Place) {
    println!("{}  [{}]  {:.2} km", place.name, place.id, place.distance_km);
    if !place.address.is_empty() {
        println!("    {}", place.address);
    }
    if !place.categories.is_empty() {
        println!("    {}", place.categories);
    }
    if let Some(photo) = &place.photo {
        println!("    {photo}");
    }
}

/// Geocode the query and run a category search around the match; when
/// geocoding has no answer, fall back to a free-text search around the
/// stored center. An explicit `--near` center skips geocoding and keeps the
/// query as free text.
pub async fn run_search(
    store: &JsonStore,
    query: &str,
    near: Option<Location>,
    radius_m: u32,
    category: Category,
    limit: u32,
) -> Result {
    let client = PlacesClient::from_env()?;

    let places = if let Some(center) = near {
        info!("Free-text search for {query:?} around {center:?}");
        client.search_query(query, center, radius_m, limit).await?
    } else if let Some(center) = geocode(query).await? {
        info!("Searching around geocoded location {center:?}");
        client.search_nearby(center, radius_m, category, limit).await?
    } else {
        let center = stored_center(store);
        info!("Geocoding found nothing, free-text search around {center:?}");
        client.search_query(query, center, radius_m, limit).await?
    };

    if places.is_empty() {
        println!("No places found, try different search criteria");
        return Ok(());
    }

    println!("{} place(s) found", places.len());
    for place in &places {
        print_place(place);
    }
    Ok(())
}

/// Fetch one place with its photo and record the view in the history, the
/// way opening a detail card does.
pub async fn run_view(store: &JsonStore, id: &str) -> Result {
    let client = PlacesClient::from_env()?;
    let from =
        StoredCoordinates::load(store, Utc::now(), COORDINATES_MAX_AGE_MS).map(|coords| coords.location());

    let place = client.place_details(id, from).await?;
    record_visit(store, &place, Utc::now());

    print_place(&place);
    Ok(())
}
