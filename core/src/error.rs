//! Error types shared by every layer of the client

use thiserror::Error;

/// A response document that does not satisfy a decoder's contract.
///
/// Raised by [`DataObject`](crate::data::DataObject) getters and by the entity
/// builders. Always names the offending field so callers can tell which part
/// of the document was wrong.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParsingError {
    /// A required field is absent (or explicitly `null`)
    #[error("Missing required field `{0}`")]
    MissingField(String),

    /// A field is present but holds a value of the wrong type
    #[error("Field `{field}` has the wrong type (expected {expected})")]
    TypeMismatch {
        /// Name of the field
        field: String,
        /// Human readable description of the expected type
        expected: &'static str,
    },

    /// The body is not a well-formed document
    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl ParsingError {
    /// Name of the field this error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingField(field) | Self::TypeMismatch { field, .. } => Some(field),
            Self::Malformed(_) => None,
        }
    }
}

/// Every way a request can terminate without a value.
///
/// The variants follow the lifecycle of a request: validation happens before
/// anything is queued, transport and server failures happen during an attempt,
/// parsing happens after a successful response, and cancellation or deadline
/// expiry can happen at any point before resolution.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RestError {
    /// Malformed input caught before any network activity
    #[error("Invalid argument `{name}`: {reason}")]
    Validation {
        /// Name of the offending argument or route slot
        name: String,
        /// What was wrong with it
        reason: String,
    },

    /// Network or connection level failure
    #[error("Transport failed: {0}")]
    Transport(String),

    /// Failure on this side of the wire, such as a body that cannot be
    /// encoded or a response too large to read. Not retried.
    #[error("Request could not be completed locally: {0}")]
    Local(String),

    /// Rate limited (429) or server side (5xx) response
    #[error("Transient server failure (status {status}): {message}")]
    TransientServer {
        /// HTTP status code
        status: u16,
        /// Error message extracted from the response
        message: String,
    },

    /// Any other non-success response
    #[error("API error (status {status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error message extracted from the response
        message: String,
    },

    /// Wall-clock budget exhausted before or during execution
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Response received but could not be decoded
    #[error("Response parsing failed: {0}")]
    Parsing(#[from] ParsingError),

    /// Cancelled by the caller
    #[error("Request cancelled")]
    Cancelled,

    /// The requester that owned the request is gone
    #[error("Requester is shut down")]
    Shutdown,
}

impl RestError {
    /// Build a [`RestError::Validation`].
    #[must_use]
    pub fn validation(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether the retry policy may re-attempt a request that failed this way.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::TransientServer { .. })
    }

    /// Short, stable label used for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Transport(_) => "transport",
            Self::Local(_) => "local",
            Self::TransientServer { .. } => "transient_server",
            Self::Http { .. } => "http",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Parsing(_) => "parsing",
            Self::Cancelled => "cancelled",
            Self::Shutdown => "shutdown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_and_server_failures_are_transient() {
        assert!(RestError::Transport("reset".into()).is_transient());
        assert!(RestError::TransientServer { status: 503, message: String::new() }.is_transient());

        assert!(!RestError::DeadlineExceeded.is_transient());
        assert!(!RestError::Local("bad mime".into()).is_transient());
        assert!(!RestError::Cancelled.is_transient());
        assert!(!RestError::Http { status: 404, message: String::new() }.is_transient());
        assert!(!RestError::from(ParsingError::MissingField("id".into())).is_transient());
        assert!(!RestError::validation("hash", "may not be blank").is_transient());
    }

    #[test]
    fn parsing_error_names_the_field() {
        let err = ParsingError::TypeMismatch {
            field: "datetime".into(),
            expected: "integer",
        };
        assert_eq!(err.field(), Some("datetime"));
        assert_eq!(
            err.to_string(),
            "Field `datetime` has the wrong type (expected integer)"
        );
        assert_eq!(ParsingError::Malformed("eof".into()).field(), None);
    }
}
