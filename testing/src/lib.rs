//! # imgur-rest Testing
//!
//! Testing utilities and helpers for the imgur-rest client.
//!
//! This crate provides:
//! - [`MockTransport`]: a scripted [`Transport`](imgur_rest_runtime::Transport)
//!   that records every call
//! - [`fixtures`]: response documents shaped like the real API's
//! - [`init_tracing`]: log output for tests, filtered by `RUST_LOG`
//!
//! ## Example
//!
//! ```ignore
//! use imgur_rest_testing::{fixtures, MockTransport};
//! use imgur_rest_runtime::{Requester, RequesterConfig};
//!
//! #[tokio::test]
//! async fn fetches_an_image() {
//!     let transport = MockTransport::new();
//!     transport.respond(fixtures::ok(fixtures::image("Xa1b2c3")));
//!
//!     let requester = Requester::new(transport.shared(), RequesterConfig::default());
//!     // ... submit requests ...
//!     assert_eq!(transport.call_count(), 1);
//! }
//! ```

pub mod fixtures;
mod transport_mocks;

pub use transport_mocks::{MockTransport, Scripted};

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-friendly `tracing` subscriber once per process.
///
/// Output goes through the test harness writer, so it only shows for failing
/// tests (or with `--nocapture`). The filter defaults to `warn` and follows
/// `RUST_LOG` when set.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}
