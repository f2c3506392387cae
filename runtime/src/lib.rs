//! # imgur-rest Runtime
//!
//! The asynchronous request pipeline behind the imgur-rest client.
//!
//! ## Core Components
//!
//! - **Transport**: performs one HTTP exchange; swapped for a mock in tests
//! - **Request**: route, payload, decoder and deadline of one call, with an
//!   atomic lifecycle state
//! - **`AsyncResult`**: the caller's single-assignment handle; awaitable,
//!   blocking, or callback driven, and cancellable
//! - **Requester**: queues requests into per-bucket lanes, bounds
//!   concurrency, honours rate limits, retries transient failures and
//!   resolves every request exactly once
//! - **`PagedRequest`**: page-by-page access to paginated listings
//!
//! ## Example
//!
//! ```ignore
//! use imgur_rest_runtime::{Requester, RequesterConfig};
//! use imgur_rest_core::route::endpoints::image;
//! use std::sync::Arc;
//!
//! let requester = Requester::new(transport, RequesterConfig::default());
//! let route = image::GET_IMAGE.compile(&["Xa1b2c3"])?;
//! let title = requester
//!     .submit(route, None, Arc::new(|_, response| {
//!         response.object()?.get_object("data")?.get_string("title")
//!     }), None)
//!     .await?;
//! ```

/// Request pipeline metrics
pub mod metrics;

/// Paginated requests
pub mod paged;

/// Per-bucket rate-limit bookkeeping
pub mod rate_limit;

/// Request lifecycle
pub mod request;

/// The request pipeline
pub mod requester;

/// Caller-facing result handle
pub mod result;

/// Retry policy with exponential backoff
pub mod retry;

/// The transport seam
pub mod transport;

pub use paged::{Page, PageRoute, PagedRequest};
pub use rate_limit::{BucketState, RateLimits};
pub use request::{Decoder, Request, RequestInfo, RequestState};
pub use requester::{Requester, RequesterConfig};
pub use result::AsyncResult;
pub use retry::RetryPolicy;
pub use transport::{RawResponse, Transport, TransportCall, TransportError};
