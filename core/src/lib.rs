//! # imgur-rest Core
//!
//! Building blocks shared by the request runtime and the API client.
//!
//! ## Contents
//!
//! - [`route`]: endpoint descriptors, their compiled form and the static
//!   endpoint registry
//! - [`payload`]: form and multipart request bodies
//! - [`data`]: typed access to JSON response documents
//! - [`config`]: client configuration and flags
//! - [`check`]: argument validation run before anything is queued
//! - [`error`]: the error taxonomy every request resolves with
//!
//! ## Example
//!
//! ```
//! use imgur_rest_core::route::endpoints::image;
//! use imgur_rest_core::error::RestError;
//!
//! let route = image::GET_IMAGE.compile(&["Xa1b2c3"]).unwrap();
//! assert_eq!(route.path(), "image/Xa1b2c3");
//!
//! let err = image::GET_IMAGE.compile(&[""]).unwrap_err();
//! assert!(matches!(err, RestError::Validation { .. }));
//! ```

pub mod check;
pub mod config;
pub mod data;
pub mod error;
pub mod payload;
pub mod route;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use config::{ClientConfig, ConfigError, ConfigFlag, ConfigFlags};
pub use data::{DataArray, DataObject};
pub use error::{ParsingError, RestError};
pub use payload::{MultipartBuilder, Part, Payload};
pub use route::{CompiledRoute, Method, Route};
