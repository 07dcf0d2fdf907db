//! Provider routing
//!
//! Holds the one backend selected by configuration and is the boundary where
//! geocoding failures stop: past [`ProviderRouter::search`] only "results" or
//! "no results" exist.

use super::google::GooglePlacesProvider;
use super::mapbox::MapboxProvider;
use super::maps_co::MapsCoProvider;
use super::{GeocodeError, PlaceSearch, PlaceSuggestion, ProviderKind, MAX_SUGGESTIONS};
use crate::config::ProviderConfig;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// What a live search produced, with failures already absorbed
#[derive(Debug)]
pub enum SearchOutcome {
    /// The provider answered (possibly with nothing)
    Live(Vec<PlaceSuggestion>),
    /// The provider was not queried: blank query or missing credential
    Skipped,
    /// The provider could not be reached or rejected the request
    Failed(GeocodeError),
}

/// Routes queries to the configured geocoding backend
#[derive(Clone)]
pub struct ProviderRouter {
    backend: Arc<dyn PlaceSearch>,
}

impl ProviderRouter {
    /// Build the router for `config.geocoding_provider`, sharing `client`.
    pub fn from_config(config: &ProviderConfig, client: Client) -> Result<Self, GeocodeError> {
        let kind = config.geocoding_provider;
        let credential = config.credential_for(kind).map(str::to_string);
        let endpoints = &config.endpoints;

        let backend: Arc<dyn PlaceSearch> = match kind {
            ProviderKind::MapsCo => Arc::new(MapsCoProvider::new(
                client,
                parse_base(kind, &endpoints.maps_co)?,
                credential,
            )),
            ProviderKind::Google => Arc::new(GooglePlacesProvider::new(
                client,
                parse_base(kind, &endpoints.google)?,
                credential,
            )),
            ProviderKind::Mapbox => Arc::new(MapboxProvider::new(
                client,
                parse_base(kind, &endpoints.mapbox)?,
                credential,
            )),
        };

        debug!("Geocoding via {}", kind);
        Ok(Self { backend })
    }

    /// Route through an arbitrary backend
    pub fn with_backend(backend: Arc<dyn PlaceSearch>) -> Self {
        Self { backend }
    }

    pub fn provider(&self) -> ProviderKind {
        self.backend.kind()
    }

    /// Whether results must carry the provider's attribution mark
    pub fn requires_attribution(&self) -> bool {
        self.provider().requires_attribution()
    }

    /// Search, surfacing provider and network failures.
    ///
    /// Blank queries and missing credentials yield an empty list without a
    /// request.
    pub async fn try_search(&self, query: &str) -> Result<Vec<PlaceSuggestion>, GeocodeError> {
        match self.search(query).await {
            SearchOutcome::Live(places) => Ok(places),
            SearchOutcome::Skipped => Ok(Vec::new()),
            SearchOutcome::Failed(err) => Err(err),
        }
    }

    /// Search without ever failing; errors are logged and reported as
    /// [`SearchOutcome::Failed`].
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let query = query.trim();
        if query.is_empty() {
            return SearchOutcome::Skipped;
        }

        match self.backend.search(query).await {
            Ok(mut places) => {
                places.truncate(MAX_SUGGESTIONS);
                debug!("{} returned {} suggestions for {:?}", self.provider(), places.len(), query);
                SearchOutcome::Live(places)
            }
            Err(GeocodeError::Configuration {
                provider,
                credential,
            }) => {
                debug!("Skipping {} search: {} not configured", provider, credential);
                SearchOutcome::Skipped
            }
            Err(err) => {
                warn!(
                    status = ?err.status(),
                    network = err.is_network(),
                    "Geocoding search for {:?} failed: {}",
                    query,
                    err
                );
                SearchOutcome::Failed(err)
            }
        }
    }
}

fn parse_base(provider: ProviderKind, raw: &str) -> Result<Url, GeocodeError> {
    Url::parse(raw)
        .map_err(|e| GeocodeError::Client(format!("Invalid {} endpoint {:?}: {}", provider, raw, e)))
}
