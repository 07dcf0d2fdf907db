//! Tool implementations shared by the CLI and the stdio server

pub mod format;
pub mod geocode;
pub mod session;
pub mod suggest;

use crate::config::ProviderConfig;
use crate::geocoding::{GeocodeError, ProviderRouter};
use crate::http::{build_client, ProxySettings};
use reqwest::Client;
use std::time::Duration;

/// Upper bound on a single tool invocation
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved configuration plus the HTTP client every router shares
#[derive(Clone)]
pub struct ToolContext {
    pub config: ProviderConfig,
    client: Client,
}

impl ToolContext {
    pub fn new(config: ProviderConfig) -> Result<Self, GeocodeError> {
        let client = build_client(config.request_timeout(), ProxySettings::from_env())?;
        Ok(Self::with_client(config, client))
    }

    pub fn with_client(config: ProviderConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Router for the configured provider
    pub fn router(&self) -> Result<ProviderRouter, GeocodeError> {
        ProviderRouter::from_config(&self.config, self.client.clone())
    }
}
