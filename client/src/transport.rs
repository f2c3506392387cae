//! [`Transport`] backed by a shared `reqwest` connection pool.

use async_trait::async_trait;
use imgur_rest_core::{Method, Part, Payload};
use imgur_rest_runtime::{RawResponse, Transport, TransportCall, TransportError};
use reqwest::{Client, Url};

/// Maximum response size (50MB)
const MAX_RESPONSE_SIZE: usize = 50 * 1024 * 1024;

/// HTTP transport issuing calls relative to a base url
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Transport with a default `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when `base_url` is not an absolute url.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Self::with_client(Client::new(), base_url)
    }

    /// Transport reusing an existing `reqwest` client.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when `base_url` is not an absolute url.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url).map_err(|e| TransportError::new(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    /// API root every call path is resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|e| TransportError::permanent(format!("Invalid path `{path}`: {e}")))
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn multipart_form(parts: Vec<Part>) -> Result<reqwest::multipart::Form, TransportError> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match part {
            Part::Text { name, value } => form.text(name, value),
            Part::File {
                name,
                file_name,
                bytes,
                mime,
            } => {
                let mut file = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(file_name);
                if let Some(mime) = mime {
                    file = file.mime_str(&mime).map_err(|e| {
                        TransportError::permanent(format!("Invalid MIME type `{mime}`: {e}"))
                    })?;
                }
                form.part(name, file)
            }
        };
    }
    Ok(form)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn issue(&self, call: TransportCall) -> Result<RawResponse, TransportError> {
        let url = self.url_for(&call.path)?;
        let mut request = self.client.request(http_method(call.method), url);

        if !call.query.is_empty() {
            request = request.query(&call.query);
        }
        for (name, value) in &call.headers {
            request = request.header(name, value);
        }
        request = match call.body {
            Some(Payload::Form(fields)) => request.form(&fields),
            Some(Payload::Multipart(parts)) => request.multipart(multipart_form(parts)?),
            None => request,
        };

        let mut response = request.send().await.map_err(|e| {
            if e.is_builder() {
                TransportError::permanent(format!("Invalid request: {e}"))
            } else {
                TransportError::new(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TransportError::new(format!("Failed to read response: {e}")))?
        {
            if body.len() + chunk.len() > MAX_RESPONSE_SIZE {
                return Err(TransportError::permanent(format!(
                    "Response too large (>{MAX_RESPONSE_SIZE} bytes)"
                )));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::trace!(status, bytes = body.len(), path = %call.path, "Response received");
        Ok(RawResponse::new(status, headers, body))
    }
}
