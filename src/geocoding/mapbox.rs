//! Mapbox Search (geocoding v6 forward) backend

use super::{
    coordinate, endpoint, fetch_json, non_empty_str, string_id, GeocodeError, PlaceSearch,
    PlaceSuggestion, ProviderKind, MAX_SUGGESTIONS,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

/// Envelope of a forward geocoding response
#[derive(Debug, Default, Deserialize)]
struct ForwardResponse {
    #[serde(default)]
    features: Vec<Value>,
}

pub struct MapboxProvider {
    client: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl MapboxProvider {
    pub fn new(client: Client, base_url: Url, access_token: Option<String>) -> Self {
        Self {
            client,
            base_url,
            access_token,
        }
    }

    fn search_url(&self, query: &str, token: &str) -> Result<Url, GeocodeError> {
        let mut url = endpoint(&self.base_url, &["search", "geocode", "v6", "forward"])?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &MAX_SUGGESTIONS.to_string())
            .append_pair("autocomplete", "true")
            .append_pair("access_token", token);
        Ok(url)
    }
}

#[async_trait]
impl PlaceSearch for MapboxProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Mapbox
    }

    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, GeocodeError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(GeocodeError::Configuration {
                provider: ProviderKind::Mapbox,
                credential: "mapboxAccessToken",
            })?;

        let url = self.search_url(query, token)?;
        let body = fetch_json(&self.client, ProviderKind::Mapbox, url).await?;
        normalize(body)
    }
}

/// Turn a Mapbox forward response into suggestions.
pub fn normalize(body: Value) -> Result<Vec<PlaceSuggestion>, GeocodeError> {
    let response: ForwardResponse = if body.is_null() {
        ForwardResponse::default()
    } else {
        serde_json::from_value(body).map_err(|e| GeocodeError::Decode {
            provider: ProviderKind::Mapbox,
            message: e.to_string(),
        })?
    };

    Ok(response
        .features
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .enumerate()
        .map(|(idx, feature)| {
            let properties = feature.get("properties");
            let field = |name: &str| properties.and_then(|p| p.get(name));
            let structured = field("coordinates");
            let geometry = feature.get("geometry").and_then(|g| g.get("coordinates"));

            PlaceSuggestion {
                id: string_id(field("mapbox_id"))
                    .or_else(|| string_id(feature.get("id")))
                    .unwrap_or_else(|| idx.to_string()),
                label: non_empty_str(field("full_address"))
                    .or_else(|| non_empty_str(field("place_formatted")))
                    .or_else(|| non_empty_str(field("name")))
                    .unwrap_or("Unknown")
                    .to_string(),
                lat: coordinate(structured.and_then(|c| c.get("latitude")))
                    .or_else(|| coordinate(geometry.and_then(|g| g.get(1)))),
                lon: coordinate(structured.and_then(|c| c.get("longitude")))
                    .or_else(|| coordinate(geometry.and_then(|g| g.get(0)))),
                raw: feature.clone(),
            }
        })
        .collect())
}
