//! Request bodies.
//!
//! Payloads are plain descriptions; the transport decides how to put them on
//! the wire. They are cheap to clone because a retried request sends the same
//! body again.

use std::sync::Arc;

/// One part of a multipart body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Plain text field
    Text {
        /// Field name
        name: String,
        /// Field value
        value: String,
    },
    /// Binary file field
    File {
        /// Field name
        name: String,
        /// File name reported to the server
        file_name: String,
        /// File contents
        bytes: Arc<[u8]>,
        /// Optional MIME type
        mime: Option<String>,
    },
}

impl Part {
    /// Field name of this part.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text { name, .. } | Self::File { name, .. } => name,
        }
    }
}

/// Optional body of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// `multipart/form-data`
    Multipart(Vec<Part>),
}

impl Payload {
    /// Whether the payload carries no fields at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Form(fields) => fields.is_empty(),
            Self::Multipart(parts) => parts.is_empty(),
        }
    }
}

/// Accumulates multipart fields.
///
/// Repositories use it to turn a DTO into a [`Payload`]; `build` returns
/// `None` for an empty body so the request goes out without one.
#[derive(Debug, Clone, Default)]
pub struct MultipartBuilder {
    parts: Vec<Part>,
}

impl MultipartBuilder {
    /// Empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// Add a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Add every `(name, value)` pair as a text field.
    #[must_use]
    pub fn texts<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in fields {
            self = self.text(name, value);
        }
        self
    }

    /// Add a file field.
    #[must_use]
    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        mime: Option<String>,
    ) -> Self {
        self.parts.push(Part::File {
            name: name.into(),
            file_name: file_name.into(),
            bytes: bytes.into(),
            mime,
        });
        self
    }

    /// Finish the body, `None` when no field was added.
    #[must_use]
    pub fn build(self) -> Option<Payload> {
        if self.parts.is_empty() {
            None
        } else {
            Some(Payload::Multipart(self.parts))
        }
    }
}
