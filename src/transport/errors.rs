use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("{resource} not found")]
    NotFound { resource: String },
    #[error("Rate limited by the chat service, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("Chat service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("Network error: {message}")]
    Network { message: String },
    #[error("Unexpected response from chat service: {message}")]
    Decode { message: String },
    #[error("{what} is not configured")]
    NotConfigured { what: String },
}

impl TransportError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        TransportError::NotFound {
            resource: resource.into(),
        }
    }

    /// The target no longer exists, e.g. a message someone already deleted
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::NotFound { .. })
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Decode {
                message: err.to_string(),
            }
        } else {
            TransportError::Network {
                message: err.to_string(),
            }
        }
    }
}
