use super::ProviderKind;
use thiserror::Error;

/// Failures a geocoding backend can report.
///
/// `Configuration` never reaches callers of the router: a provider selected
/// without its credential is skipped instead of queried.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("{provider} error {status}")]
    Provider { provider: ProviderKind, status: u16 },
    #[error("Network error: {0}")]
    Network(String),
    #[error("{provider} requires {credential}, which is not configured")]
    Configuration {
        provider: ProviderKind,
        credential: &'static str,
    },
    /// The API answered 200 but refused the request in its body
    #[error("{provider} rejected the request ({status}): {message}")]
    Rejected {
        provider: ProviderKind,
        status: String,
        message: String,
    },
    #[error("{provider} returned an unreadable response: {message}")]
    Decode {
        provider: ProviderKind,
        message: String,
    },
    #[error("HTTP client initialization failed: {0}")]
    Client(String),
}

impl GeocodeError {
    /// Classify a reqwest failure raised while talking to `provider`.
    pub fn from_reqwest(provider: ProviderKind, err: reqwest::Error) -> Self {
        if err.is_decode() {
            GeocodeError::Decode {
                provider,
                message: err.to_string(),
            }
        } else if let Some(status) = err.status() {
            GeocodeError::Provider {
                provider,
                status: status.as_u16(),
            }
        } else {
            GeocodeError::Network(err.to_string())
        }
    }

    /// HTTP status carried by a provider rejection.
    pub fn status(&self) -> Option<u16> {
        match self {
            GeocodeError::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, GeocodeError::Network(_))
    }
}
