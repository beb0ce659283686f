use thiserror::Error;

/// Application-wide error types for cafecrawl.
#[derive(Error, Debug)]
pub enum AppError {
    /// The search API answered with a non-success status.
    #[error("HTTP error ({status}): {message}")]
    HttpError { status: u16, message: String },

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A place returned by the search API could not be normalized.
    #[error("Invalid record {external_id}: {reason}")]
    InvalidRecord { external_id: String, reason: String },

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error.
    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Returns true if this error came from talking to the search API.
    ///
    /// Fetch errors end pagination for the zone being collected; everything
    /// else is a zone error.
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            AppError::HttpError { .. }
                | AppError::NetworkError(_)
                | AppError::Timeout(_)
                | AppError::SerializationError(_)
        )
    }

    /// Returns true if the API signalled request-rate exhaustion.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AppError::HttpError { status: 429, .. })
    }
}
