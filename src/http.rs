//! HTTP client shared by all geocoding providers
//!
//! One `reqwest::Client` per process: transport timeout from configuration,
//! proxies from the usual environment variables.

use crate::geocoding::GeocodeError;
use reqwest::{Client, Proxy};
use std::net::IpAddr;
use std::time::Duration;
use url::Url;

/// Proxy settings read from HTTPS_PROXY / HTTP_PROXY / ALL_PROXY / NO_PROXY
/// (upper- or lower-case).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProxySettings {
    pub https: Option<String>,
    pub http: Option<String>,
    pub bypass: Vec<BypassRule>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BypassRule {
    Everything,
    /// Host equals or is a subdomain of this domain
    Suffix(String),
    /// Literal host: localhost or an IP address
    Host(String),
}

impl ProxySettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(*k))
                .find(|v| !v.trim().is_empty())
        };
        let all = first(&["ALL_PROXY", "all_proxy"]);

        Self {
            https: first(&["HTTPS_PROXY", "https_proxy"]).or_else(|| all.clone()),
            http: first(&["HTTP_PROXY", "http_proxy"]).or(all),
            bypass: first(&["NO_PROXY", "no_proxy"])
                .map(|v| parse_bypass(&v))
                .unwrap_or_default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.https.is_none() && self.http.is_none()
    }

    /// Proxy to use for `url`, if any
    pub fn proxy_for(&self, url: &Url) -> Option<String> {
        let host = url.host_str().unwrap_or("");
        if self.bypasses(host) {
            return None;
        }
        match url.scheme() {
            "https" => self.https.clone().or_else(|| self.http.clone()),
            "http" => self.http.clone().or_else(|| self.https.clone()),
            _ => None,
        }
    }

    fn bypasses(&self, host: &str) -> bool {
        if host.is_empty() {
            return false;
        }
        let host = host.to_ascii_lowercase();
        self.bypass.iter().any(|rule| match rule {
            BypassRule::Everything => true,
            BypassRule::Host(h) => host == *h,
            BypassRule::Suffix(domain) => {
                host == *domain || host.ends_with(&format!(".{}", domain))
            }
        })
    }
}

fn parse_bypass(value: &str) -> Vec<BypassRule> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            if token == "*" {
                return BypassRule::Everything;
            }
            let token = token.to_ascii_lowercase();
            if let Some(domain) = token.strip_prefix('.') {
                BypassRule::Suffix(domain.to_string())
            } else if token == "localhost" || token.parse::<IpAddr>().is_ok() {
                BypassRule::Host(token)
            } else {
                BypassRule::Suffix(token)
            }
        })
        .collect()
}

/// Build the shared client with a transport timeout and proxy settings.
pub fn build_client(timeout: Duration, proxies: ProxySettings) -> Result<Client, GeocodeError> {
    // Environment proxies are resolved above; reqwest must not apply its own.
    let mut builder = Client::builder().timeout(timeout).no_proxy();

    if !proxies.is_empty() {
        builder = builder.proxy(Proxy::custom(move |url: &Url| proxies.proxy_for(url)));
    }

    builder
        .user_agent(concat!("wayfarer/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| GeocodeError::Client(e.to_string()))
}
