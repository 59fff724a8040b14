use thiserror::Error;

use crate::transport::TransportMode;

/// Errors from [`crate::travel_time::TravelTimeProvider::travel_time_matrix`].
///
/// Every variant is recoverable: the [`TravelTimeCache`](crate::TravelTimeCache)
/// substitutes default costs instead of propagating these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TravelTimeError {
    /// No coordinates were provided.
    #[error("at least one coordinate is required")]
    EmptyInput,

    /// The provider cannot price the requested mode.
    #[error("transport mode {mode} is not supported by this provider")]
    UnsupportedMode {
        /// Requested mode.
        mode: TransportMode,
    },

    /// A network error occurred while contacting the routing service.
    #[error("network error contacting {url}: {message}")]
    NetworkError {
        /// Request URL.
        url: String,
        /// Error description.
        message: String,
    },

    /// The request timed out.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Timeout that elapsed.
        timeout_secs: u64,
    },

    /// The routing service answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}: {message}")]
    HttpError {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },

    /// The routing service reported an error, including quota exhaustion.
    #[error("routing service error ({code}): {message}")]
    ServiceError {
        /// Service status code.
        code: String,
        /// Service message.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to parse routing response: {message}")]
    ParseError {
        /// Error description.
        message: String,
    },

    /// The matrix shape does not match the number of coordinates.
    #[error("expected a {expected}x{expected} matrix, got {actual} rows")]
    DimensionMismatch {
        /// Expected side length.
        expected: usize,
        /// Received row count, or offending row length.
        actual: usize,
    },
}
