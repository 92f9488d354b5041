//! Fetch error types.

use thiserror::Error;

/// Errors from the miss path of a coordinated fetch.
///
/// Clone-able so concurrent callers sharing one in-flight call all
/// receive the outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// HTTP-level failure from the network layer.
    #[error("HTTP error: {status} for {resource}")]
    Http { status: u16, resource: String },

    /// Transport failure before a response arrived.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The API answered with `success: false`.
    #[error("Request rejected by API: {0}")]
    Rejected(String),

    /// The response body did not match the expected shape.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// The call was aborted by the caller before completing.
    ///
    /// Distinguished from genuine failures so it can be suppressed
    /// from user-facing error channels.
    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    /// Check if this error is a caller-initiated cancellation.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_distinguished() {
        assert!(FetchError::Cancelled.is_cancellation());
        assert!(!FetchError::Connection("reset".into()).is_cancellation());
    }

    #[test]
    fn test_error_display() {
        let err = FetchError::Http {
            status: 502,
            resource: "listing?page=1".into(),
        };
        assert_eq!(err.to_string(), "HTTP error: 502 for listing?page=1");
    }
}
