//! geocode.maps.co search backend
//!
//! Nominatim-style API; works without a key, which is why it is the default.

use super::{
    coordinate, endpoint, fetch_json, non_empty_str, string_id, GeocodeError, PlaceSearch,
    PlaceSuggestion, ProviderKind, MAX_SUGGESTIONS,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://geocode.maps.co";

pub struct MapsCoProvider {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl MapsCoProvider {
    pub fn new(client: Client, base_url: Url, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn search_url(&self, query: &str) -> Result<Url, GeocodeError> {
        let mut url = endpoint(&self.base_url, &["search"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            if let Some(key) = &self.api_key {
                pairs.append_pair("api_key", key);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl PlaceSearch for MapsCoProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::MapsCo
    }

    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, GeocodeError> {
        let url = self.search_url(query)?;
        let body = fetch_json(&self.client, ProviderKind::MapsCo, url).await?;
        Ok(normalize(&body))
    }
}

/// Turn a maps.co response body into suggestions.
///
/// Anything other than a JSON array is treated as "no results".
pub fn normalize(body: &Value) -> Vec<PlaceSuggestion> {
    let Some(places) = body.as_array() else {
        return Vec::new();
    };

    places
        .iter()
        .take(MAX_SUGGESTIONS)
        .enumerate()
        .map(|(idx, place)| PlaceSuggestion {
            id: string_id(place.get("place_id")).unwrap_or_else(|| idx.to_string()),
            label: label_for(place),
            lat: coordinate(place.get("lat")),
            lon: coordinate(place.get("lon")),
            raw: place.clone(),
        })
        .collect()
}

fn label_for(place: &Value) -> String {
    if let Some(display_name) = non_empty_str(place.get("display_name")) {
        return display_name.to_string();
    }

    let head = non_empty_str(place.get("name"))
        .or_else(|| non_empty_str(place.get("address")))
        .unwrap_or("Unknown");
    let country = non_empty_str(place.get("country")).unwrap_or("");
    format!("{} {}", head, country).trim().to_string()
}
