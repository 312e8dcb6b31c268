//! Error types and handling for the `AeroGuard` core

use thiserror::Error;

/// Main error type for the `AeroGuard` core
#[derive(Error, Debug)]
pub enum AeroGuardError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Upstream provider errors that are surfaced to the caller
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },
}

impl AeroGuardError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AeroGuardError::Config { .. } => {
                "Configuration error. Please check your config file and API token.".to_string()
            }
            AeroGuardError::Api { .. } => "Failed to fetch air quality data".to_string(),
            AeroGuardError::Validation { message } => format!("Invalid input: {message}"),
        }
    }
}

/// Outcome of a single failed provider query.
///
/// A failure never carries a default reading; callers either drop it
/// (station probing) or turn it into an [`AeroGuardError::Api`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderFailure {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    HttpStatus(u16),

    #[error("Provider reported status '{status}': {message}")]
    Status { status: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Station has no current reading")]
    NoReading,
}

impl From<ProviderFailure> for AeroGuardError {
    fn from(failure: ProviderFailure) -> Self {
        AeroGuardError::api(failure.to_string())
    }
}
