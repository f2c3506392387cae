//! The client handle and the path every repository call takes.

use crate::albums::AlbumRepository;
use crate::comments::CommentRepository;
use crate::error::ClientError;
use crate::gallery::GalleryRepository;
use crate::images::ImageRepository;
use crate::transport::ReqwestTransport;
use imgur_rest_core::{ClientConfig, CompiledRoute, ParsingError, Payload, RestError};
use imgur_rest_runtime::{AsyncResult, RawResponse, Requester, RequesterConfig, Transport};
use std::fmt;
use std::sync::{Arc, Weak};

struct ClientInner {
    config: ClientConfig,
    requester: Requester,
}

/// Imgur API client
///
/// Cheap to clone; clones share the requester and its connection pool.
/// Entities returned by the client keep a [`ClientRef`] to it for follow-up
/// calls, which fail with [`RestError::Shutdown`] once every clone of the
/// client has been dropped.
#[derive(Clone)]
pub struct ImgurClient {
    inner: Arc<ClientInner>,
}

impl ImgurClient {
    /// Create a client talking HTTP to `config.base_url()`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] when the base url cannot be
    /// parsed and [`ClientError::HttpClient`] when the HTTP client cannot be
    /// built.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::HttpClient(e.to_string()))?;
        let transport = ReqwestTransport::with_client(http, config.base_url()).map_err(|e| {
            ClientError::InvalidBaseUrl {
                url: config.base_url().to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client from `IMGUR_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] for invalid variables, otherwise the
    /// errors of [`new`](Self::new).
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Create a client over a custom transport.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let requester = Requester::new(transport, RequesterConfig::from_client_config(&config));
        tracing::debug!(base_url = config.base_url(), "Imgur client created");
        Self {
            inner: Arc::new(ClientInner { config, requester }),
        }
    }

    /// Configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The requester executing this client's calls.
    #[must_use]
    pub fn requester(&self) -> &Requester {
        &self.inner.requester
    }

    /// Image endpoints.
    #[must_use]
    pub const fn images(&self) -> ImageRepository<'_> {
        ImageRepository::new(self)
    }

    /// Album endpoints.
    #[must_use]
    pub const fn albums(&self) -> AlbumRepository<'_> {
        AlbumRepository::new(self)
    }

    /// Gallery endpoints.
    #[must_use]
    pub const fn gallery(&self) -> GalleryRepository<'_> {
        GalleryRepository::new(self)
    }

    /// Comment endpoints.
    #[must_use]
    pub const fn comments(&self) -> CommentRepository<'_> {
        CommentRepository::new(self)
    }

    /// Non-owning reference handed to decoded entities.
    #[must_use]
    pub fn downgrade(&self) -> ClientRef {
        ClientRef(Arc::downgrade(&self.inner))
    }

    /// Submit `route` and decode its response with `decode`.
    ///
    /// A route that failed validation resolves immediately and never reaches
    /// the requester.
    pub(crate) fn execute<T, F>(
        &self,
        route: Result<CompiledRoute, RestError>,
        payload: Option<Payload>,
        decode: F,
    ) -> AsyncResult<T>
    where
        T: Clone + Send + 'static,
        F: Fn(&ClientRef, &RawResponse) -> Result<T, ParsingError> + Send + Sync + 'static,
    {
        let route = match route {
            Ok(route) => route,
            Err(err) => {
                tracing::debug!(error = %err, "Call rejected before submission");
                return AsyncResult::failed(err);
            }
        };
        let client = self.downgrade();
        self.inner.requester.submit(
            route,
            payload,
            Arc::new(move |_, response| decode(&client, response)),
            None,
        )
    }
}

impl fmt::Debug for ImgurClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImgurClient")
            .field("config", &self.inner.config)
            .field("requester", &self.inner.requester)
            .finish()
    }
}

/// Weak back-reference from an entity to the client that decoded it
///
/// Does not keep the client alive. Two references always compare equal so
/// that entities compare by their data alone.
#[derive(Clone, Default)]
pub struct ClientRef(Weak<ClientInner>);

impl ClientRef {
    /// Reference to no client; follow-up calls fail with
    /// [`RestError::Shutdown`].
    #[must_use]
    pub const fn detached() -> Self {
        Self(Weak::new())
    }

    /// The client, if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<ImgurClient> {
        self.0.upgrade().map(|inner| ImgurClient { inner })
    }

    /// Whether the client is still alive.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Run `call` against the client, or fail with [`RestError::Shutdown`].
    pub(crate) fn follow_up<T, F>(&self, call: F) -> AsyncResult<T>
    where
        T: Clone + Send + 'static,
        F: FnOnce(&ImgurClient) -> AsyncResult<T>,
    {
        match self.upgrade() {
            Some(client) => call(&client),
            None => AsyncResult::failed(RestError::Shutdown),
        }
    }
}

impl PartialEq for ClientRef {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl fmt::Debug for ClientRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRef")
            .field("alive", &self.is_alive())
            .finish()
    }
}
