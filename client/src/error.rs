//! Errors raised while constructing a client

use imgur_rest_core::ConfigError;
use thiserror::Error;

/// Errors that can occur when building an [`ImgurClient`](crate::ImgurClient)
///
/// Failures of individual calls are never reported here; they resolve the
/// call's [`AsyncResult`](imgur_rest_runtime::AsyncResult) with a
/// [`RestError`](imgur_rest_core::RestError).
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration could not be loaded or is invalid
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The configured base url cannot be parsed
    #[error("Invalid base url `{url}`: {reason}")]
    InvalidBaseUrl {
        /// The rejected url
        url: String,
        /// Parser message
        reason: String,
    },

    /// The HTTP client could not be built
    #[error("HTTP client construction failed: {0}")]
    HttpClient(String),
}
