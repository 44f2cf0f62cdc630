use std::collections::HashSet;

use log::{debug, warn};
use reqwest::header::{ACCEPT, AUTHORIZATION};

use cafefind_logic::{Location, Place, prelude::*};

use crate::{
    category::Category,
    endpoints::{API_KEY_VAR, PLACES_URL, SEARCH_URL},
    models::{PhotoEntry, PlaceResult, SearchResponse},
};

/// Default search radius in meters
pub const DEFAULT_RADIUS_M: u32 = 5000;
/// Default number of results per search
pub const DEFAULT_LIMIT: u32 = 20;

/// Client for the places provider (Foursquare v3 API shape).
pub struct PlacesClient {
    http: reqwest::Client,
    api_key: String,
}

impl PlacesClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            api_key: api_key.into(),
        })
    }

    /// Read the API key from the environment.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_VAR)
            .with_context(|| format!("{API_KEY_VAR} is not set"))?;
        Self::new(api_key)
    }

    async fn get_results(&self, params: &[(&str, String)]) -> Result<Vec<PlaceResult>> {
        let response = self
            .http
            .get(SEARCH_URL)
            .query(params)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, &self.api_key)
            .send()
            .await
            .context("Could not reach the places API")?
            .error_for_status()
            .context("Places API returned an error")?
            .json::<SearchResponse>()
            .await
            .context("Malformed places API response")?;

        Ok(response.results)
    }

    /// Deduplicate by provider id, skip results without coordinates, attach
    /// the distance from the search center.
    fn collect_places(results: Vec<PlaceResult>, center: Location) -> Vec<Place> {
        let mut seen = HashSet::new();
        results
            .into_iter()
            .filter(|result| seen.insert(result.fsq_id.clone()))
            .filter_map(|result| result.into_place(center))
            .collect()
    }

    /// Places of `category` around `center`, nearest first.
    pub async fn search_nearby(
        &self,
        center: Location,
        radius_m: u32,
        category: Category,
        limit: u32,
    ) -> Result<Vec<Place>> {
        debug!("Nearby search at {center:?}, radius {radius_m} m, category {category}");
        let params = [
            ("ll", format!("{},{}", center.lat, center.long)),
            ("radius", radius_m.to_string()),
            ("categories", category.id().to_string()),
            ("limit", limit.to_string()),
            ("sort", "DISTANCE".to_string()),
        ];
        let results = self.get_results(&params).await?;
        Ok(Self::collect_places(results, center))
    }

    /// Free-text search around `center`, most relevant first.
    pub async fn search_query(
        &self,
        query: &str,
        center: Location,
        radius_m: u32,
        limit: u32,
    ) -> Result<Vec<Place>> {
        debug!("Query search for {query:?} around {center:?}");
        let params = [
            ("query", query.to_string()),
            ("ll", format!("{},{}", center.lat, center.long)),
            ("radius", radius_m.to_string()),
            ("limit", limit.to_string()),
            ("sort", "RELEVANCE".to_string()),
        ];
        let results = self.get_results(&params).await?;
        Ok(Self::collect_places(results, center))
    }

    /// Look a single place up by its provider id, with its first photo
    /// attached. `from` is used for the distance field when known.
    pub async fn place_details(&self, id: &str, from: Option<Location>) -> Result<Place> {
        let url = format!("{PLACES_URL}/{id}");
        let result = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, &self.api_key)
            .send()
            .await
            .context("Could not reach the places API")?
            .error_for_status()
            .context("Places API returned an error")?
            .json::<PlaceResult>()
            .await
            .context("Malformed place details response")?;

        let center = from.unwrap_or(cafefind_logic::DEFAULT_LOCATION);
        let mut place = result
            .into_place(center)
            .context("Place has no coordinates")?;
        if from.is_none() {
            place.distance_km = 0.0;
        }

        place.photo = self.place_photo(id).await;
        Ok(place)
    }

    /// First photo of a place, sized for a result card. Photo lookups degrade
    /// to `None` rather than failing the place.
    pub async fn place_photo(&self, id: &str) -> Option<String> {
        let url = format!("{PLACES_URL}/{id}/photos");
        let photos = async {
            self.http
                .get(url)
                .header(ACCEPT, "application/json")
                .header(AUTHORIZATION, &self.api_key)
                .send()
                .await?
                .error_for_status()?
                .json::<Vec<PhotoEntry>>()
                .await
        }
        .await;

        match photos {
            Ok(photos) => photos.first().map(PhotoEntry::url),
            Err(why) => {
                warn!("Failed to fetch photos for {id}: {why:?}");
                None
            }
        }
    }
}
