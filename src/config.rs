//! Provider configuration
//!
//! Resolved once at startup (defaults, then the JSON config file, then the
//! environment, then command-line overrides) and passed around by value.
//! Nothing reads it from global state afterwards.

use crate::geocoding::{google, mapbox, maps_co, ProviderKind};
use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const ENV_PROVIDER: &str = "WAYFARER_GEOCODING_PROVIDER";
pub const ENV_MAPS_CO_KEY: &str = "WAYFARER_GEOCODE_MAPS_API_KEY";
pub const ENV_GOOGLE_KEY: &str = "WAYFARER_GOOGLE_PLACES_API_KEY";
pub const ENV_MAPBOX_TOKEN: &str = "WAYFARER_MAPBOX_ACCESS_TOKEN";
pub const ENV_DEBOUNCE_MS: &str = "WAYFARER_DEBOUNCE_MS";

pub const DEFAULT_DEBOUNCE_MS: u64 = 350;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Shown when live search has nothing to offer
pub const DEFAULT_FALLBACK_ADDRESSES: [&str; 5] = [
    "123 Main St, Detroit, MI",
    "456 Woodward Ave, Detroit, MI",
    "789 Cass Ave, Detroit, MI",
    "101 Jefferson Ave, Detroit, MI",
    "500 Broadway St, Detroit, MI",
];

const REDACTED: &str = "***";

/// Base URLs for each provider's HTTP API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoints {
    pub maps_co: String,
    pub mapbox: String,
    pub google: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            maps_co: maps_co::DEFAULT_BASE_URL.to_string(),
            mapbox: mapbox::DEFAULT_BASE_URL.to_string(),
            google: google::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Process-wide geocoding configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    #[serde(deserialize_with = "lenient_provider")]
    pub geocoding_provider: ProviderKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocode_maps_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_places_api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapbox_access_token: Option<String>,
    pub endpoints: Endpoints,
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub fallback_addresses: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            geocoding_provider: ProviderKind::default(),
            geocode_maps_api_key: None,
            google_places_api_key: None,
            mapbox_access_token: None,
            endpoints: Endpoints::default(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            fallback_addresses: DEFAULT_FALLBACK_ADDRESSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Unknown provider names fall back to maps.co instead of failing startup.
fn lenient_provider<'de, D>(deserializer: D) -> Result<ProviderKind, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map(parse_provider_or_default).unwrap_or_default())
}

fn parse_provider_or_default(name: &str) -> ProviderKind {
    name.parse().unwrap_or_else(|e| {
        warn!("{}; using {}", e, ProviderKind::default());
        ProviderKind::default()
    })
}

impl ProviderConfig {
    /// Resolve configuration for this process.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => Self::load_default(config_path())?,
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.normalize();
        Ok(config)
    }

    /// Load the file at the default location, if there is one.
    ///
    /// A platform without a config directory behaves like a missing file.
    fn load_default(location: Result<PathBuf>) -> Result<Self> {
        let path = match location {
            Ok(path) => path,
            Err(e) => {
                debug!("{:#}, using defaults", e);
                return Ok(Self::default());
            }
        };
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config: ProviderConfig = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.normalize();
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Layer environment variables over the current values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup(ENV_PROVIDER) {
            self.geocoding_provider = parse_provider_or_default(&name);
        }
        if let Some(key) = lookup(ENV_MAPS_CO_KEY) {
            self.geocode_maps_api_key = Some(key);
        }
        if let Some(key) = lookup(ENV_GOOGLE_KEY) {
            self.google_places_api_key = Some(key);
        }
        if let Some(token) = lookup(ENV_MAPBOX_TOKEN) {
            self.mapbox_access_token = Some(token);
        }
        if let Some(ms) = lookup(ENV_DEBOUNCE_MS) {
            match ms.trim().parse::<u64>() {
                Ok(ms) => self.debounce_ms = ms,
                Err(_) => warn!("Ignoring {}={:?}: not a number of milliseconds", ENV_DEBOUNCE_MS, ms),
            }
        }
    }

    /// Command-line provider choice wins over everything else.
    pub fn with_provider(mut self, provider: Option<ProviderKind>) -> Self {
        if let Some(provider) = provider {
            self.geocoding_provider = provider;
        }
        self
    }

    /// Blank credentials count as absent.
    fn normalize(&mut self) {
        for slot in [
            &mut self.geocode_maps_api_key,
            &mut self.google_places_api_key,
            &mut self.mapbox_access_token,
        ] {
            if slot.as_deref().map(str::trim).is_some_and(str::is_empty) {
                *slot = None;
            }
        }
    }

    /// Credential configured for `provider`, if any
    pub fn credential_for(&self, provider: ProviderKind) -> Option<&str> {
        match provider {
            ProviderKind::MapsCo => self.geocode_maps_api_key.as_deref(),
            ProviderKind::Google => self.google_places_api_key.as_deref(),
            ProviderKind::Mapbox => self.mapbox_access_token.as_deref(),
        }
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Copy safe to print: credentials masked
    pub fn redacted(&self) -> Self {
        let mask = |v: &Option<String>| v.as_ref().map(|_| REDACTED.to_string());
        Self {
            geocode_maps_api_key: mask(&self.geocode_maps_api_key),
            google_places_api_key: mask(&self.google_places_api_key),
            mapbox_access_token: mask(&self.mapbox_access_token),
            ..self.clone()
        }
    }
}

/// Default location of the configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("wayfarer").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert_eq!(config.geocoding_provider, ProviderKind::MapsCo);
        assert_eq!(config.debounce_window(), Duration::from_millis(350));
        assert_eq!(config.fallback_addresses.len(), 5);
        assert_eq!(config.credential_for(ProviderKind::Google), None);
        assert_eq!(config.endpoints.maps_co, "https://geocode.maps.co");
    }

    #[test]
    fn test_default_location_is_optional() {
        let config = ProviderConfig::load_default(Err(anyhow::anyhow!("Cannot determine config directory"))).unwrap();
        assert_eq!(config.geocoding_provider, ProviderKind::MapsCo);
        assert_eq!(config.fallback_addresses.len(), 5);

        let dir = tempfile::tempdir().unwrap();
        let config = ProviderConfig::load_default(Ok(dir.path().join("config.json"))).unwrap();
        assert_eq!(config.debounce_window(), Duration::from_millis(350));

        let path = dir.path().join("present.json");
        std::fs::write(&path, r#"{ "debounceMs": 90 }"#).unwrap();
        let config = ProviderConfig::load_default(Ok(path)).unwrap();
        assert_eq!(config.debounce_ms, 90);
    }

    #[test]
    fn test_load_from_file_uses_camel_case_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "geocodingProvider": "google",
                "googlePlacesApiKey": "g-key",
                "mapboxAccessToken": "  ",
                "debounceMs": 300,
                "endpoints": {{ "google": "http://127.0.0.1:4000" }}
            }}"#
        )
        .unwrap();

        let config = ProviderConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.geocoding_provider, ProviderKind::Google);
        assert_eq!(config.credential_for(ProviderKind::Google), Some("g-key"));
        assert_eq!(config.mapbox_access_token, None);
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.endpoints.google, "http://127.0.0.1:4000");
        assert_eq!(config.endpoints.mapbox, "https://api.mapbox.com");
        assert_eq!(config.fallback_addresses.len(), 5);
    }

    #[test]
    fn test_unknown_provider_in_file_defaults_to_maps_co() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "geocodingProvider": "here" }}"#).unwrap();
        let config = ProviderConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.geocoding_provider, ProviderKind::MapsCo);
    }

    #[test]
    fn test_missing_file_is_an_error_when_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let result = ProviderConfig::resolve(Some(&dir.path().join("absent.json")));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = ProviderConfig {
            google_places_api_key: Some("from-file".to_string()),
            ..ProviderConfig::default()
        };
        config.apply_env(env_from(&[
            (ENV_PROVIDER, "mapbox"),
            (ENV_MAPBOX_TOKEN, "pk.env"),
            (ENV_GOOGLE_KEY, "from-env"),
            (ENV_DEBOUNCE_MS, "300"),
        ]));
        assert_eq!(config.geocoding_provider, ProviderKind::Mapbox);
        assert_eq!(config.credential_for(ProviderKind::Mapbox), Some("pk.env"));
        assert_eq!(config.credential_for(ProviderKind::Google), Some("from-env"));
        assert_eq!(config.debounce_ms, 300);
    }

    #[test]
    fn test_bad_debounce_env_is_ignored() {
        let mut config = ProviderConfig::default();
        config.apply_env(env_from(&[(ENV_DEBOUNCE_MS, "soon")]));
        assert_eq!(config.debounce_ms, DEFAULT_DEBOUNCE_MS);
    }

    #[test]
    fn test_cli_provider_wins() {
        let config = ProviderConfig::default().with_provider(Some(ProviderKind::Google));
        assert_eq!(config.geocoding_provider, ProviderKind::Google);
        let config = config.with_provider(None);
        assert_eq!(config.geocoding_provider, ProviderKind::Google);
    }

    #[test]
    fn test_redacted_masks_only_present_credentials() {
        let config = ProviderConfig {
            mapbox_access_token: Some("pk.secret".to_string()),
            ..ProviderConfig::default()
        };
        let shown = config.redacted();
        assert_eq!(shown.mapbox_access_token.as_deref(), Some("***"));
        assert_eq!(shown.google_places_api_key, None);
        let json = serde_json::to_string(&shown).unwrap();
        assert!(!json.contains("pk.secret"));
    }
}
