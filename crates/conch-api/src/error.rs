//! Fetch error types

use conch_core::{EntityKind, Error};
use thiserror::Error;

/// Failure of a single API request.
///
/// `Clone` so one in-flight result can be handed to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection refused, reset, DNS failure, unreadable body
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Authentication required")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-2xx status
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Body did not have the documented shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Result type for API operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }

    /// Map into the store-level taxonomy: 404 is `NotFound`, everything else
    /// (timeouts included) is `LoadFailed`.
    pub fn into_error(self, kind: EntityKind, id: Option<&str>) -> Error {
        match (self, id) {
            (FetchError::NotFound(_), Some(id)) => Error::not_found(kind.resource(), id),
            (err, _) => Error::load_failed(kind.resource(), err.to_string()),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_decode() {
            FetchError::InvalidResponse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_with_id_maps_to_not_found() {
        let err = FetchError::NotFound("/rack/9".into()).into_error(EntityKind::Rack, Some("9"));
        assert!(matches!(err, Error::NotFound { ref id, .. } if id == "9"));
    }

    #[test]
    fn test_timeout_maps_to_load_failed() {
        let err = FetchError::Timeout.into_error(EntityKind::Device, Some("HX-1"));
        assert!(matches!(err, Error::LoadFailed { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_not_found_on_list_is_load_failure() {
        let err = FetchError::NotFound("/relay".into()).into_error(EntityKind::Relay, None);
        assert!(matches!(err, Error::LoadFailed { .. }));
    }
}
