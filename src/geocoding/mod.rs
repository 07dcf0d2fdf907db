//! Geocoding providers and the normalized place model
//!
//! Every backend answers the same question (free text in, ranked places out)
//! through [`PlaceSearch`]; the [`ProviderRouter`] picks one from configuration.

pub mod error;
pub mod google;
pub mod mapbox;
pub mod maps_co;
pub mod router;


pub use error::GeocodeError;
pub use router::{ProviderRouter, SearchOutcome};

use async_trait::async_trait;
use reqwest::Client;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use url::Url;

/// Upper bound on suggestions returned by any provider.
pub const MAX_SUGGESTIONS: usize = 5;

/// Supported geocoding backends
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    #[default]
    MapsCo,
    Google,
    Mapbox,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::MapsCo, ProviderKind::Google, ProviderKind::Mapbox];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::MapsCo => "maps-co",
            ProviderKind::Google => "google",
            ProviderKind::Mapbox => "mapbox",
        }
    }

    /// Name of the credential without which the provider is skipped.
    /// maps.co works anonymously, so it has none.
    pub fn required_credential(&self) -> Option<&'static str> {
        match self {
            ProviderKind::MapsCo => None,
            ProviderKind::Google => Some("googlePlacesApiKey"),
            ProviderKind::Mapbox => Some("mapboxAccessToken"),
        }
    }

    /// Google's terms require a "powered by Google" mark next to results.
    pub fn requires_attribution(&self) -> bool {
        matches!(self, ProviderKind::Google)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "Unknown geocoding provider '{}' (expected maps-co, google or mapbox)",
                    s
                )
            })
    }
}

/// One normalized geocoding result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlaceSuggestion {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Provider payload, passed through untouched
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub raw: Value,
}

impl PlaceSuggestion {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            lat: None,
            lon: None,
            raw: Value::Null,
        }
    }

    pub fn with_coordinates(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }
}

/// A single geocoding backend
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Search for `query`, which the caller has already trimmed and checked
    /// to be non-empty. Returns at most [`MAX_SUGGESTIONS`] results in the
    /// provider's own order.
    async fn search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, GeocodeError>;
}

/// Append path segments to a provider base URL.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, GeocodeError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| GeocodeError::Client(format!("{} cannot be used as a base URL", base)))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// GET `url` and decode the body as JSON, mapping failures onto the taxonomy.
pub(crate) async fn fetch_json(
    client: &Client,
    provider: ProviderKind,
    url: Url,
) -> Result<Value, GeocodeError> {
    // Query strings carry credentials; log the path only.
    debug!("{} request: {}", provider, url.path());

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| GeocodeError::Network(format!("{} unreachable: {}", provider, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GeocodeError::Provider {
            provider,
            status: status.as_u16(),
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| GeocodeError::from_reqwest(provider, e))
}

/// String field that is present and not blank.
pub(crate) fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Identifier that may arrive as a string or a number.
pub(crate) fn string_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coordinate that may arrive as a number or a numeric string.
pub(crate) fn coordinate(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|c| c.is_finite())
}
