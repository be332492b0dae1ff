//! # Geocoding
//!
//! Fallback for places without usable coordinates.
//!
//! ## Flow
//!
//! 1. Text search with the address (or `"{name}, {city}"`) to get the
//!    provider's place id. Only the id field is requested.
//! 2. Details fetch for that id: address, rating, opening hours, location and
//!    map link.
//! 3. The details are cached per restaurant name for the session. Each call is
//!    billed, so a cached name is never queried again.
//!
//! ## Failure
//!
//! Every step can fail on its own (network, non-2xx, zero results, bad JSON).
//! [`geocode`] reports the reason, [`Geocoder::lookup`] logs it and hands back
//! `None` so the caller keeps the place at the default center. No retries.
use std::collections::HashMap;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{error::GeocodeError, place::Coordinates};

pub const PLACES_BASE_URL: &str = "https://places.googleapis.com/v1/places";

const API_KEY_HEADER: &str = "X-Goog-Api-Key";
const FIELD_MASK_HEADER: &str = "X-Goog-FieldMask";
const SEARCH_FIELD_MASK: &str = "places.id";
const DETAILS_FIELD_MASK: &str =
    concat!(
        "id,displayName,formattedAddress,rating,userRatingCount,",
        "currentOpeningHours,location,googleMapsUri"
    );

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    #[serde(default)]
    pub id: String,
    pub display_name: Option<LocalizedText>,
    pub formatted_address: Option<String>,
    pub rating: Option<f64>,
    pub user_rating_count: Option<u32>,
    pub current_opening_hours: Option<OpeningHours>,
    pub location: Option<LatLng>,
    pub google_maps_uri: Option<String>,
}

impl PlaceDetails {
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.location
            .as_ref()
            .and_then(|location| Coordinates::new(location.latitude, location.longitude))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningHours {
    #[serde(default)]
    pub weekday_descriptions: Vec<String>,
    pub open_now: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    places: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    id: String,
}

/// Search and details endpoints of a places provider.
#[allow(async_fn_in_trait)]
pub trait PlaceProvider {
    /// Provider id of the best match for `query`.
    async fn search_text(&self, query: &str) -> Result<String, GeocodeError>;

    async fn place_details(&self, id: &str) -> Result<PlaceDetails, GeocodeError>;
}

pub fn text_query(name: &str, address: &str, city: &str) -> String {
    if address.trim().is_empty() {
        format!("{name}, {city}")
    } else {
        address.trim().to_string()
    }
}

/// Resolves one place. No caching and no side effects beyond the provider
/// calls.
pub async fn geocode<P: PlaceProvider>(
    provider: &P,
    name: &str,
    address: &str,
    city: &str,
) -> Result<PlaceDetails, GeocodeError> {
    let query = text_query(name, address, city);
    let id = provider.search_text(&query).await?;
    debug!("Found place id {id} for {name}");

    provider.place_details(&id).await
}

pub struct Geocoder<P> {
    provider: P,
    city: String,
    cache: HashMap<String, PlaceDetails>,
}

impl<P: PlaceProvider> Geocoder<P> {
    pub fn new(provider: P, city: &str) -> Self {
        Self {
            provider,
            city: city.to_string(),
            cache: HashMap::new(),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cached(&self, name: &str) -> Option<&PlaceDetails> {
        self.cache.get(name)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Cached details for `name`, querying the provider on a miss. Failures
    /// are logged and not cached.
    pub async fn lookup(&mut self, name: &str, address: &str) -> Option<PlaceDetails> {
        if let Some(details) = self.cache.get(name) {
            debug!("Cache hit for {name}");
            return Some(details.clone());
        }

        match geocode(&self.provider, name, address, &self.city).await {
            Ok(details) => {
                info!(
                    "Resolved {name}: {}",
                    details.formatted_address.as_deref().unwrap_or("no address")
                );
                self.cache.insert(name.to_string(), details.clone());
                Some(details)
            }
            Err(e) => {
                warn!("Geocoding failed for {name}: {e}");
                None
            }
        }
    }
}

/// Places API (v1) over HTTP.
#[derive(Clone)]
pub struct PlacesClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PlacesClient {
    pub fn new(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

impl PlaceProvider for PlacesClient {
    async fn search_text(&self, query: &str) -> Result<String, GeocodeError> {
        let res = self
            .client
            .post(format!("{}:searchText", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .header(FIELD_MASK_HEADER, SEARCH_FIELD_MASK)
            .json(&json!({
                "textQuery": query,
                "maxResultCount": 1,
            }))
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(GeocodeError::Status(res.status()));
        }

        let body = res.text().await?;
        let response: SearchResponse = serde_json::from_str(&body)?;

        response
            .places
            .into_iter()
            .next()
            .map(|hit| hit.id)
            .ok_or_else(|| GeocodeError::NoResults(query.to_string()))
    }

    async fn place_details(&self, id: &str) -> Result<PlaceDetails, GeocodeError> {
        let res = self
            .client
            .get(format!("{}/{id}", self.base_url))
            .header(API_KEY_HEADER, &self.api_key)
            .header(FIELD_MASK_HEADER, DETAILS_FIELD_MASK)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(GeocodeError::Status(res.status()));
        }

        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}
