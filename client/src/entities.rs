//! Domain entities.
//!
//! Entities are immutable values produced by the [`builder`](crate::builder)
//! functions. Those with follow-up calls keep a [`ClientRef`] to the client
//! that decoded them; the reference is skipped when serializing and ignored
//! when comparing.

use crate::client::ClientRef;
use crate::dto::{AlbumInformation, ImageInformation};
use crate::types::{AlbumLayout, AlbumPrivacy, CommentSort, ReportReason, Vote};
use chrono::{DateTime, Utc};
use imgur_rest_runtime::AsyncResult;
use serde::Serialize;

/// An uploaded image or video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Image {
    /// Image hash
    pub id: String,
    /// Title
    pub title: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Upload time
    pub datetime: DateTime<Utc>,
    /// MIME type, e.g. `image/gif`
    pub mime_type: Option<String>,
    /// Whether the image is animated
    pub animated: bool,
    /// Width in pixels
    pub width: i64,
    /// Height in pixels
    pub height: i64,
    /// Size in bytes
    pub size: i64,
    /// Number of views
    pub views: i64,
    /// Bandwidth consumed, in bytes
    pub bandwidth: i64,
    /// The current user's vote
    pub vote: Option<Vote>,
    /// Favorited by the current user
    pub favorite: bool,
    /// Not safe for work
    pub nsfw: bool,
    /// Subreddit section it was pulled from
    pub section: Option<String>,
    /// Uploader's username
    pub account_url: Option<String>,
    /// Uploader's account id
    pub account_id: Option<i64>,
    /// Advertisement
    pub is_ad: bool,
    /// Currently in the most viral gallery
    pub in_most_viral: bool,
    /// Video with an audio track
    pub has_sound: bool,
    /// Tags
    pub tags: Vec<Tag>,
    /// Edit counter
    pub edited: i64,
    /// Shared to the gallery
    pub in_gallery: bool,
    /// Delete hash, only present for the uploader
    pub deletehash: Option<String>,
    /// Original file name, only present for the uploader
    pub name: Option<String>,
    /// Direct link
    pub link: Option<String>,
    /// MP4 link of an animated image
    pub mp4: Option<String>,
    /// GIFV link of an animated image
    pub gifv: Option<String>,
    #[serde(skip)]
    pub(crate) client: ClientRef,
}

impl Image {
    /// Client that decoded this image.
    #[must_use]
    pub const fn client(&self) -> &ClientRef {
        &self.client
    }

    /// Delete this image, by delete hash when known.
    #[must_use]
    pub fn delete(&self) -> AsyncResult<bool> {
        let hash = self.deletehash.as_deref().unwrap_or(&self.id);
        self.client.follow_up(|client| client.images().delete(hash))
    }

    /// Toggle the favorite flag of this image.
    #[must_use]
    pub fn favorite(&self) -> AsyncResult<bool> {
        self.client.follow_up(|client| client.images().favorite(&self.id))
    }

    /// Update title and description.
    #[must_use]
    pub fn update(&self, information: &ImageInformation) -> AsyncResult<bool> {
        let hash = self.deletehash.as_deref().unwrap_or(&self.id);
        self.client
            .follow_up(|client| client.images().update_information(hash, information))
    }
}

/// Cover image of an album
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cover {
    /// Image hash
    pub name: String,
    /// Direct link
    pub url: String,
}

/// A collection of images
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Album {
    /// Album hash
    pub id: String,
    /// Title
    pub title: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Creation time
    pub datetime: DateTime<Utc>,
    /// Cover image
    pub cover: Option<Cover>,
    /// Cover width in pixels
    pub cover_width: i64,
    /// Cover height in pixels
    pub cover_height: i64,
    /// Owner's username
    pub account_url: Option<String>,
    /// Owner's account id
    pub account_id: Option<i64>,
    /// Visibility
    pub privacy: Option<AlbumPrivacy>,
    /// Display layout
    pub layout: Option<AlbumLayout>,
    /// Number of views
    pub views: i64,
    /// Link to the album page
    pub link: Option<String>,
    /// Favorited by the current user
    pub favorite: bool,
    /// Not safe for work
    pub nsfw: bool,
    /// Subreddit section it was pulled from
    pub section: Option<String>,
    /// Number of images
    pub images_count: i64,
    /// Shared to the gallery
    pub in_gallery: bool,
    /// Advertisement
    pub is_ad: bool,
    /// Delete hash, only present for the owner
    pub deletehash: Option<String>,
    /// Images embedded in the document
    pub images: Vec<Image>,
    #[serde(skip)]
    pub(crate) client: ClientRef,
}

impl Album {
    /// Client that decoded this album.
    #[must_use]
    pub const fn client(&self) -> &ClientRef {
        &self.client
    }

    /// Fetch the album's images.
    #[must_use]
    pub fn fetch_images(&self) -> AsyncResult<Vec<Image>> {
        self.client.follow_up(|client| client.albums().images(&self.id))
    }

    /// Delete this album, by delete hash when known.
    #[must_use]
    pub fn delete(&self) -> AsyncResult<bool> {
        let hash = self.deletehash.as_deref().unwrap_or(&self.id);
        self.client.follow_up(|client| client.albums().delete(hash))
    }

    /// Toggle the favorite flag of this album.
    #[must_use]
    pub fn favorite(&self) -> AsyncResult<bool> {
        self.client.follow_up(|client| client.albums().favorite(&self.id))
    }

    /// Update the album's information.
    #[must_use]
    pub fn update(&self, information: &AlbumInformation) -> AsyncResult<bool> {
        let hash = self.deletehash.as_deref().unwrap_or(&self.id);
        self.client
            .follow_up(|client| client.albums().update(hash, information))
    }

    /// Replace the album's images.
    #[must_use]
    pub fn set_images<S: AsRef<str>>(&self, hashes: &[S]) -> AsyncResult<bool> {
        let hash = self.deletehash.as_deref().unwrap_or(&self.id);
        self.client
            .follow_up(|client| client.albums().set_images(hash, hashes))
    }

    /// Append images to the album.
    #[must_use]
    pub fn add_images<S: AsRef<str>>(&self, hashes: &[S]) -> AsyncResult<bool> {
        let hash = self.deletehash.as_deref().unwrap_or(&self.id);
        self.client
            .follow_up(|client| client.albums().add_images(hash, hashes))
    }

    /// Remove images from the album.
    #[must_use]
    pub fn remove_images<S: AsRef<str>>(&self, hashes: &[S]) -> AsyncResult<bool> {
        let hash = self.deletehash.as_deref().unwrap_or(&self.id);
        self.client
            .follow_up(|client| client.albums().remove_images(hash, hashes))
    }
}

/// A gallery tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    /// Tag name
    pub name: String,
    /// Name as displayed
    pub display_name: Option<String>,
    /// Number of followers
    pub followers: i64,
    /// Number of tagged items
    pub total_items: i64,
    /// Followed by the current user
    pub following: bool,
    /// Hash of the background image
    pub background_hash: Option<String>,
    /// Accent color
    pub accent: Option<String>,
    /// Description
    pub description: Option<String>,
}

/// Vote totals of a gallery post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Votes {
    /// Upvotes
    pub ups: i64,
    /// Downvotes
    pub downs: i64,
}

/// Community data attached to a post shared in the gallery
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GalleryStats {
    /// Upvotes
    pub ups: i64,
    /// Downvotes
    pub downs: i64,
    /// Upvotes minus downvotes
    pub points: i64,
    /// Popularity score
    pub score: i64,
    /// Number of comments
    pub comment_count: i64,
    /// Number of favorites
    pub favorite_count: i64,
    /// Topic name
    pub topic: Option<String>,
}

/// An image shared in the gallery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryImage {
    /// The image
    #[serde(flatten)]
    pub image: Image,
    /// Gallery data
    #[serde(flatten)]
    pub stats: GalleryStats,
}

/// An album shared in the gallery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryAlbum {
    /// The album
    #[serde(flatten)]
    pub album: Album,
    /// Gallery data
    #[serde(flatten)]
    pub stats: GalleryStats,
}

/// Any post in the gallery
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GalleryElement {
    /// A single image
    Image(GalleryImage),
    /// An album
    Album(GalleryAlbum),
}

impl GalleryElement {
    /// Post hash.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Image(image) => &image.image.id,
            Self::Album(album) => &album.album.id,
        }
    }

    /// Whether this post is an album.
    #[must_use]
    pub const fn is_album(&self) -> bool {
        matches!(self, Self::Album(_))
    }

    /// Gallery data of the post.
    #[must_use]
    pub const fn stats(&self) -> &GalleryStats {
        match self {
            Self::Image(image) => &image.stats,
            Self::Album(album) => &album.stats,
        }
    }

    const fn client(&self) -> &ClientRef {
        match self {
            Self::Image(image) => &image.image.client,
            Self::Album(album) => &album.album.client,
        }
    }

    /// Fetch the post's vote totals.
    #[must_use]
    pub fn votes(&self) -> AsyncResult<Votes> {
        self.client().follow_up(|client| client.gallery().votes(self.id()))
    }

    /// Vote on the post.
    #[must_use]
    pub fn vote(&self, vote: Vote) -> AsyncResult<bool> {
        self.client()
            .follow_up(|client| client.gallery().vote(self.id(), vote))
    }

    /// Fetch the post's comments.
    #[must_use]
    pub fn comments(&self, sort: CommentSort) -> AsyncResult<Vec<Comment>> {
        self.client()
            .follow_up(|client| client.gallery().comments(self.id(), sort))
    }

    /// Report the post.
    #[must_use]
    pub fn report(&self, reason: Option<ReportReason>) -> AsyncResult<bool> {
        self.client()
            .follow_up(|client| client.gallery().report(self.id(), reason))
    }
}

impl From<GalleryImage> for GalleryElement {
    fn from(image: GalleryImage) -> Self {
        Self::Image(image)
    }
}

impl From<GalleryAlbum> for GalleryElement {
    fn from(album: GalleryAlbum) -> Self {
        Self::Album(album)
    }
}

/// A comment on a gallery post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    /// Comment id
    pub id: i64,
    /// Hash of the post commented on
    pub image_id: String,
    /// Text
    pub comment: String,
    /// Author's username
    pub author: Option<String>,
    /// Author's account id
    pub author_id: Option<i64>,
    /// Posted on an album
    pub on_album: bool,
    /// Cover hash of the album commented on
    pub album_cover: Option<String>,
    /// Upvotes
    pub ups: i64,
    /// Downvotes
    pub downs: i64,
    /// Upvotes minus downvotes
    pub points: i64,
    /// Posting time
    pub datetime: DateTime<Utc>,
    /// Parent comment, `None` for top-level comments
    pub parent_id: Option<i64>,
    /// Deleted by its author
    pub deleted: bool,
    /// The current user's vote
    pub vote: Option<Vote>,
    /// Platform it was posted from
    pub platform: Option<String>,
    /// Replies
    pub children: Vec<Comment>,
    #[serde(skip)]
    pub(crate) client: ClientRef,
}

impl Comment {
    /// Client that decoded this comment.
    #[must_use]
    pub const fn client(&self) -> &ClientRef {
        &self.client
    }

    /// Whether this comment replies to another one.
    #[must_use]
    pub const fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Fetch this comment with its replies.
    #[must_use]
    pub fn replies(&self) -> AsyncResult<Comment> {
        self.client
            .follow_up(|client| client.comments().with_replies(self.id))
    }

    /// Reply to this comment; resolves to the new comment's id.
    #[must_use]
    pub fn reply(&self, text: &str) -> AsyncResult<i64> {
        self.client
            .follow_up(|client| client.comments().reply(&self.image_id, self.id, text))
    }

    /// Delete this comment.
    #[must_use]
    pub fn delete(&self) -> AsyncResult<bool> {
        self.client.follow_up(|client| client.comments().delete(self.id))
    }

    /// Vote on this comment.
    #[must_use]
    pub fn vote(&self, vote: Vote) -> AsyncResult<bool> {
        self.client
            .follow_up(|client| client.comments().vote(self.id, vote))
    }

    /// Report this comment.
    #[must_use]
    pub fn report(&self, reason: Option<ReportReason>) -> AsyncResult<bool> {
        self.client
            .follow_up(|client| client.comments().report(self.id, reason))
    }
}
