//! The outbound side of the requester.
//!
//! A [`Transport`] performs exactly one HTTP exchange per call. It knows
//! nothing about retries, deadlines or rate limits; the requester wraps every
//! call with those concerns. Aborting an in-flight call is done by dropping
//! the future returned by [`Transport::issue`].

use async_trait::async_trait;
use imgur_rest_core::{DataObject, Method, ParsingError, Payload, RestError};
use std::collections::HashMap;
use thiserror::Error;

/// Failure reported by a transport instead of a response
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    transient: bool,
}

impl TransportError {
    /// Network or connection failure; the call may succeed if repeated.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: true,
        }
    }

    /// Failure that repeating the call cannot fix, such as a body that does
    /// not encode.
    #[must_use]
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: false,
        }
    }

    /// What went wrong.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the call may be retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.transient
    }
}

impl From<TransportError> for RestError {
    fn from(err: TransportError) -> Self {
        if err.transient {
            Self::Transport(err.message)
        } else {
            Self::Local(err.message)
        }
    }
}

/// Everything a transport needs to perform one exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportCall {
    /// HTTP method
    pub method: Method,
    /// Path relative to the API base url
    pub path: String,
    /// Query parameters, not yet encoded
    pub query: Vec<(String, String)>,
    /// Request headers
    pub headers: Vec<(String, String)>,
    /// Optional body
    pub body: Option<Payload>,
}

/// Response as received from the wire
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawResponse {
    status: u16,
    headers: HashMap<String, String>,
    body: Vec<u8>,
}

impl RawResponse {
    /// Build a response. Header names are stored lower-cased.
    #[must_use]
    pub fn new<I, K, V>(status: u16, headers: I, body: impl Into<Vec<u8>>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
                .collect(),
            body: body.into(),
        }
    }

    /// JSON response without headers.
    #[must_use]
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(
            status,
            [("content-type", "application/json")],
            value.to_string(),
        )
    }

    /// Copy with an extra header.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Header value, looked up case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Raw body bytes.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as text, invalid UTF-8 replaced.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ParsingError::Malformed`] when the body is not a JSON object.
    pub fn object(&self) -> Result<DataObject, ParsingError> {
        DataObject::parse(&self.body)
    }

    /// Best effort error message for a non-success response.
    ///
    /// Understands the API error envelope (`{"data": {"error": ...}}`, where
    /// `error` is either a string or an object with a `message`), and falls
    /// back to the raw body text.
    #[must_use]
    pub fn error_message(&self) -> String {
        let from_envelope = self.object().ok().and_then(|root| {
            let data = root.opt_object("data")?;
            data.opt_string("error").or_else(|| {
                data.opt_object("error")
                    .and_then(|error| error.opt_string("message"))
            })
        });
        from_envelope.unwrap_or_else(|| {
            let text = self.text();
            if text.is_empty() {
                format!("HTTP {}", self.status)
            } else {
                text
            }
        })
    }
}

/// Performs one HTTP exchange
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Issue `call` and return the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response could be obtained.
    async fn issue(&self, call: TransportCall) -> Result<RawResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn only_transient_failures_map_to_retryable_errors() {
        let reset = RestError::from(TransportError::new("connection reset"));
        assert_eq!(reset, RestError::Transport("connection reset".into()));
        assert!(reset.is_transient());

        let encoding = RestError::from(TransportError::permanent("invalid mime"));
        assert_eq!(encoding, RestError::Local("invalid mime".into()));
        assert!(!encoding.is_transient());
    }

    #[test]
    fn headers_are_case_insensitive() {
        let response = RawResponse::new(200, [("X-RateLimit-UserRemaining", "10")], "")
            .with_header("Retry-After", "3");
        assert_eq!(response.header("x-ratelimit-userremaining"), Some("10"));
        assert_eq!(response.header("RETRY-AFTER"), Some("3"));
        assert_eq!(response.header("missing"), None);
    }

    #[test]
    fn error_message_reads_envelope() {
        let string_error = RawResponse::json(
            404,
            &json!({"data": {"error": "Unable to find an image with the id, abc"}, "success": false, "status": 404}),
        );
        assert_eq!(
            string_error.error_message(),
            "Unable to find an image with the id, abc"
        );

        let object_error = RawResponse::json(
            400,
            &json!({"data": {"error": {"message": "File type invalid", "code": 1003}}}),
        );
        assert_eq!(object_error.error_message(), "File type invalid");
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(
            RawResponse::new(502, Vec::<(&str, &str)>::new(), "Bad Gateway").error_message(),
            "Bad Gateway"
        );
        assert_eq!(RawResponse::default().error_message(), "HTTP 0");
    }

    #[test]
    fn success_range() {
        assert!(RawResponse::json(204, &json!({})).is_success());
        assert!(!RawResponse::json(301, &json!({})).is_success());
    }
}
