//! Google Places Autocomplete (legacy HTTP endpoint) backend
//!
//! Predictions carry no coordinates; resolving them needs a Place Details call,
//! which the autocomplete flow never makes.

use super::{
    endpoint, fetch_json, non_empty_str, string_id, GeocodeError, PlaceSearch, PlaceSuggestion,
    ProviderKind, MAX_SUGGESTIONS,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// Logo shown next to Google-sourced suggestions
pub const ATTRIBUTION_LOGO_URL: &str =
    "https://developers.google.com/maps/documentation/images/powered_by_google_on_white.png";

#[derive(Debug, Default, Deserialize)]
struct AutocompleteResponse {
    #[serde(default)]
    predictions: Vec<Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

pub struct GooglePlacesProvider {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl GooglePlacesProvider {
    pub fn new(client: Client, base_url: Url, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn search_url(&self, query: &str, key: &str) -> Result<Url, GeocodeError> {
        let mut url = endpoint(&self.base_url, &["maps", "api", "place", "autocomplete", "json"])?;
        url.query_pairs_mut()
            .append_pair("input", query)
            .append_pair("key", key);
        Ok(url)
    }
}

#[async_trait]
impl PlaceSearch for GooglePlacesProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, GeocodeError> {
        let key = self.api_key.as_deref().ok_or(GeocodeError::Configuration {
            provider: ProviderKind::Google,
            credential: "googlePlacesApiKey",
        })?;

        let url = self.search_url(query, key)?;
        let body = fetch_json(&self.client, ProviderKind::Google, url).await?;
        normalize(body)
    }
}

/// Turn an autocomplete response into suggestions.
///
/// Predictions without a description are dropped, since they have nothing to
/// show.
pub fn normalize(body: Value) -> Result<Vec<PlaceSuggestion>, GeocodeError> {
    let response: AutocompleteResponse = if body.is_null() {
        AutocompleteResponse::default()
    } else {
        serde_json::from_value(body).map_err(|e| GeocodeError::Decode {
            provider: ProviderKind::Google,
            message: e.to_string(),
        })?
    };

    // The legacy API reports quota and key problems in-band with a 200.
    if let Some(status) = response.status {
        if status != "OK" && status != "ZERO_RESULTS" {
            debug!("google autocomplete status {}", status);
            return Err(GeocodeError::Rejected {
                provider: ProviderKind::Google,
                message: response
                    .error_message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "no details given".to_string()),
                status,
            });
        }
    }

    Ok(response
        .predictions
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .enumerate()
        .filter_map(|(idx, prediction)| {
            let label = non_empty_str(prediction.get("description"))?.to_string();
            Some(PlaceSuggestion {
                id: string_id(prediction.get("place_id")).unwrap_or_else(|| idx.to_string()),
                label,
                lat: None,
                lon: None,
                raw: prediction,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_predictions() {
        let body = json!({
            "status": "OK",
            "predictions": [
                { "place_id": "ChIJ1", "description": "Woodward Avenue, Detroit, MI, USA" },
                { "place_id": "ChIJ2", "description": "Woodward Ave, Royal Oak, MI, USA" },
            ]
        });
        let places = normalize(body).unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].id, "ChIJ1");
        assert_eq!(places[0].label, "Woodward Avenue, Detroit, MI, USA");
        assert!(places.iter().all(|p| p.lat.is_none() && p.lon.is_none()));
        assert_eq!(places[1].raw["place_id"], "ChIJ2");
    }

    #[test]
    fn test_normalize_truncates_and_skips_blank_descriptions() {
        let mut predictions: Vec<Value> = (0..7)
            .map(|i| json!({ "place_id": format!("p{}", i), "description": format!("Place {}", i) }))
            .collect();
        predictions[1] = json!({ "place_id": "blank" });
        let places = normalize(json!({ "predictions": predictions })).unwrap();
        let ids: Vec<&str> = places.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p2", "p3", "p4"]);
    }

    #[test]
    fn test_normalize_in_band_rejection_is_an_error() {
        let body = json!({ "status": "REQUEST_DENIED", "error_message": "bad key", "predictions": [] });
        match normalize(body).unwrap_err() {
            GeocodeError::Rejected { status, message, .. } => {
                assert_eq!(status, "REQUEST_DENIED");
                assert_eq!(message, "bad key");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let body = json!({ "status": "OVER_QUERY_LIMIT" });
        assert!(matches!(
            normalize(body),
            Err(GeocodeError::Rejected { message, .. }) if message == "no details given"
        ));

        let body = json!({ "status": "ZERO_RESULTS", "predictions": [] });
        assert!(normalize(body).unwrap().is_empty());
    }

    #[test]
    fn test_search_url_parameters() {
        let provider = GooglePlacesProvider::new(
            Client::new(),
            Url::parse(DEFAULT_BASE_URL).unwrap(),
            None,
        );
        let url = provider.search_url("Woodward", "g-key").unwrap();
        assert_eq!(
            url.as_str(),
            "https://maps.googleapis.com/maps/api/place/autocomplete/json?input=Woodward&key=g-key"
        );
    }
}
