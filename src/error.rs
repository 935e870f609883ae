//! Error types and handling for the `LaWander` engine

use thiserror::Error;

/// Main error type for the `LaWander` engine
#[derive(Error, Debug)]
pub enum LaWanderError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Geocoder or completion endpoint communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Geocode cache errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// The trip destination could not be geocoded, so no anchor exists
    #[error("Destination not found: {destination}")]
    DestinationNotFound { destination: String },

    /// The AI completion collaborator failed or returned nothing usable
    #[error("Completion error: {message}")]
    Completion { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl LaWanderError {
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

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    pub fn destination_not_found<S: Into<String>>(destination: S) -> Self {
        Self::DestinationNotFound {
            destination: destination.into(),
        }
    }

    pub fn completion<S: Into<String>>(message: S) -> Self {
        Self::Completion {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            LaWanderError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            LaWanderError::Api { .. } | LaWanderError::Completion { .. } => {
                "Sorry, I'm having trouble connecting to the server. Please try again later."
                    .to_string()
            }
            LaWanderError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            LaWanderError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            LaWanderError::DestinationNotFound { destination } => {
                format!("Could not find '{destination}' on the map.")
            }
            LaWanderError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}
