use thiserror::Error;

/// Result type alias for trust store operations
pub type Result<T> = std::result::Result<T, PinningError>;

/// Errors that can occur while updating or configuring the trust store
#[derive(Error, Debug)]
pub enum PinningError {
    /// Transport failure while fetching the fingerprint feed
    #[error("network request failed: {0}")]
    Network(String),

    /// The server answered with a non-2xx status code
    #[error("HTTP request failed with status code {code}")]
    HttpStatus {
        /// HTTP status code
        code: u16,
    },

    /// The feed could not be decoded
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A signature did not verify, or was missing where one is required
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The feed was valid but produced no usable certificates
    #[error("store is empty after update")]
    StoreIsEmpty,

    /// The secure data store failed to load, save or remove data
    #[error("storage error: {0}")]
    Storage(String),

    /// The configuration cannot be used
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PinningError {
    /// Returns true if the next `update()` call may succeed without any change
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::HttpStatus { .. } | Self::StoreIsEmpty | Self::Storage(_)
        )
    }

    /// Returns true if the error indicates tampering or replay
    #[must_use]
    pub const fn is_security_event(&self) -> bool {
        matches!(self, Self::InvalidSignature(_))
    }

    /// Returns the HTTP status code if the server rejected the request
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { code } => Some(*code),
            _ => None,
        }
    }
}
