//! Error types and handling for the CLI and the stdio server

use crate::geocoding::GeocodeError;
use serde::Serialize;
use std::fmt;

/// Maximum accepted query length, in characters
pub const MAX_QUERY_CHARS: usize = 500;

/// Application error types surfaced to users of the CLI and tool calls
#[derive(Debug, Serialize)]
pub enum AppError {
    InvalidInput(String),
    ConfigError(String),
    ProviderFailed(String),
    NetworkError(String),
    Timeout(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ProviderFailed(msg) => write!(f, "Geocoding provider failed: {}", msg),
            AppError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            AppError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Get the error code for tool responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::ConfigError(_) => "config_error",
            AppError::ProviderFailed(_) => "provider_failed",
            AppError::NetworkError(_) => "network_error",
            AppError::Timeout(_) => "timeout",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Process exit code for CLI mode
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::InvalidInput(_) => 1,
            AppError::ProviderFailed(_) | AppError::NetworkError(_) => 2,
            AppError::Timeout(_) => 4,
            AppError::ConfigError(_) | AppError::Internal(_) => 5,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<GeocodeError> for AppError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::Provider { .. }
            | GeocodeError::Rejected { .. }
            | GeocodeError::Decode { .. } => {
                AppError::ProviderFailed(err.to_string())
            }
            GeocodeError::Network(msg) => AppError::NetworkError(msg),
            GeocodeError::Configuration { .. } | GeocodeError::Client(_) => {
                AppError::ConfigError(err.to_string())
            }
        }
    }
}

/// Convert anyhow::Error to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", err))
    }
}

/// Convert serde_json::Error to AppError
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert std::io::Error to AppError
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Validate a search query, returning it trimmed
pub fn validate_query(query: &str) -> Result<&str, AppError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Query cannot be empty".to_string()));
    }

    if trimmed.chars().count() > MAX_QUERY_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Query too long, maximum {} characters",
            MAX_QUERY_CHARS
        )));
    }

    Ok(trimmed)
}
