//! # Imgur REST Client
//!
//! Typed, asynchronous access to the Imgur API v3.
//!
//! Every call returns an [`AsyncResult`] right away. Arguments are validated
//! first; a call with bad arguments resolves immediately with
//! [`RestError::Validation`] and never reaches the network. Valid calls are
//! queued on the client's [`Requester`](imgur_rest_runtime::Requester), which
//! retries transient failures, honors rate limits and enforces the request
//! timeout.
//!
//! ## Example
//!
//! ```no_run
//! use imgur_rest_client::{ImgurClient, ImageUpload};
//! use imgur_rest_core::ClientConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder().client_id("0123456789abcde").build()?;
//!     let client = ImgurClient::new(config)?;
//!
//!     let image = client.images().get("Xa1b2c3").await?;
//!     println!("{:?} ({}x{})", image.title, image.width, image.height);
//!
//!     let upload = ImageUpload::url("https://example.com/cat.png").title("Cat");
//!     let uploaded = client.images().upload(&upload).await?;
//!     println!("delete hash: {:?}", uploaded.deletehash);
//!     Ok(())
//! }
//! ```
//!
//! ## Layout
//!
//! - [`ImgurClient`] and its repositories: [`images`], [`albums`],
//!   [`gallery`], [`comments`]
//! - [`dto`]: request bodies and listing options
//! - [`entities`] and the [`builder`] functions that decode them
//! - [`types`]: enumerations with wire keys
//! - [`ReqwestTransport`]: the HTTP transport

pub mod albums;
pub mod builder;
pub mod client;
pub mod comments;
pub mod dto;
pub mod entities;
pub mod error;
pub mod gallery;
pub mod images;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{ClientRef, ImgurClient};
pub use dto::{
    AlbumInformation, CommentInformation, GalleryQuery, GallerySearch, GalleryShare,
    ImageInformation, ImageUpload,
};
pub use entities::{
    Album, Comment, Cover, GalleryAlbum, GalleryElement, GalleryImage, GalleryStats, Image, Tag,
    Votes,
};
pub use error::ClientError;
pub use imgur_rest_core::RestError;
pub use imgur_rest_runtime::{AsyncResult, Page, PagedRequest};
pub use transport::ReqwestTransport;
pub use types::{
    AlbumLayout, AlbumPrivacy, CommentSort, FileType, GallerySection, GallerySort,
    GalleryTimeWindow, ReportReason, SearchImageSize, Vote,
};
