//! Request bodies and query options assembled from user supplied fields.
//!
//! Each DTO accumulates fields with consuming setters and renders them as a
//! [`Payload`] (or query pairs) for its repository. Unset fields are left out
//! of the body entirely.

use crate::types::{
    AlbumLayout, AlbumPrivacy, FileType, GallerySection, GallerySort, GalleryTimeWindow,
    SearchImageSize,
};
use imgur_rest_core::{MultipartBuilder, Payload, RestError};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
enum UploadSource {
    File {
        file_name: String,
        bytes: Arc<[u8]>,
        video: bool,
    },
    Base64(String),
    Url(String),
}

/// Content and metadata of an image or video upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    source: UploadSource,
    fields: BTreeMap<&'static str, String>,
}

impl ImageUpload {
    fn from_source(source: UploadSource) -> Self {
        Self {
            source,
            fields: BTreeMap::new(),
        }
    }

    /// Upload an image file.
    #[must_use]
    pub fn image_file(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::from_source(UploadSource::File {
            file_name: file_name.into(),
            bytes: bytes.into(),
            video: false,
        })
    }

    /// Upload a video file.
    #[must_use]
    pub fn video_file(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self::from_source(UploadSource::File {
            file_name: file_name.into(),
            bytes: bytes.into(),
            video: true,
        })
    }

    /// Upload base64 encoded image data.
    #[must_use]
    pub fn base64(data: impl Into<String>) -> Self {
        Self::from_source(UploadSource::Base64(data.into()))
    }

    /// Let the server fetch the image at `url`.
    #[must_use]
    pub fn url(url: impl Into<String>) -> Self {
        Self::from_source(UploadSource::Url(url.into()))
    }

    /// How the content is supplied.
    #[must_use]
    pub const fn file_type(&self) -> FileType {
        match self.source {
            UploadSource::File { .. } => FileType::File,
            UploadSource::Base64(_) => FileType::Base64,
            UploadSource::Url(_) => FileType::Url,
        }
    }

    /// Set the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.fields.insert("title", title.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.fields.insert("description", description.into());
        self
    }

    /// Set the file name reported to the server.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.fields.insert("name", name.into());
        self
    }

    /// Add the upload to an album, by album delete hash.
    #[must_use]
    pub fn album(mut self, deletehash: impl Into<String>) -> Self {
        self.fields.insert("album", deletehash.into());
        self
    }

    /// Strip the audio track of a video.
    #[must_use]
    pub fn disable_audio(mut self, disable: bool) -> Self {
        self.fields
            .insert("disable_audio", if disable { "1" } else { "0" }.to_string());
        self
    }

    /// Check the content is usable.
    ///
    /// # Errors
    ///
    /// [`RestError::Validation`] for empty files and blank data or urls.
    pub fn validate(&self) -> Result<(), RestError> {
        match &self.source {
            UploadSource::File { bytes, .. } if bytes.is_empty() => {
                Err(RestError::validation("file", "may not be empty"))
            }
            UploadSource::Base64(value) | UploadSource::Url(value) if value.trim().is_empty() => {
                Err(RestError::validation("image", "may not be blank"))
            }
            _ => Ok(()),
        }
    }

    /// Multipart body: the content, its `type`, then the metadata.
    pub(crate) fn to_payload(&self) -> Option<Payload> {
        let body = match &self.source {
            UploadSource::File {
                file_name,
                bytes,
                video,
            } => MultipartBuilder::new().file(
                if *video { "video" } else { "image" },
                file_name.clone(),
                Arc::clone(bytes),
                None,
            ),
            UploadSource::Base64(value) | UploadSource::Url(value) => {
                MultipartBuilder::new().text("image", value.clone())
            }
        };
        body.text("type", self.file_type().key())
            .texts(self.fields.iter().map(|(k, v)| (*k, v.clone())))
            .build()
    }
}

/// Title and description of an image
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageInformation {
    fields: BTreeMap<&'static str, String>,
}

impl ImageInformation {
    /// Empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.fields.insert("title", title.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.fields.insert("description", description.into());
        self
    }

    /// Whether no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn to_payload(&self) -> Option<Payload> {
        MultipartBuilder::new()
            .texts(self.fields.iter().map(|(k, v)| (*k, v.clone())))
            .build()
    }
}

/// Fields of an album creation or update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumInformation {
    images: Vec<String>,
    fields: BTreeMap<&'static str, String>,
}

impl AlbumInformation {
    /// Empty album information.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the album's images, by hash.
    #[must_use]
    pub fn images<I, S>(mut self, hashes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = hashes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.fields.insert("title", title.into());
        self
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.fields.insert("description", description.into());
        self
    }

    /// Set the visibility.
    #[must_use]
    pub fn privacy(mut self, privacy: AlbumPrivacy) -> Self {
        self.fields.insert("privacy", privacy.key().to_string());
        self
    }

    /// Set the layout.
    #[must_use]
    pub fn layout(mut self, layout: AlbumLayout) -> Self {
        self.fields.insert("layout", layout.key().to_string());
        self
    }

    /// Set the cover, by image hash.
    #[must_use]
    pub fn cover(mut self, hash: impl Into<String>) -> Self {
        self.fields.insert("cover", hash.into());
        self
    }

    /// Whether neither images nor fields are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.fields.is_empty()
    }

    /// Check the image hashes.
    ///
    /// # Errors
    ///
    /// [`RestError::Validation`] naming `ids` when a hash is blank.
    pub fn validate(&self) -> Result<(), RestError> {
        self.images
            .iter()
            .try_for_each(|hash| imgur_rest_core::check::not_blank(hash, "ids"))
    }

    pub(crate) fn to_payload(&self) -> Option<Payload> {
        let mut body = MultipartBuilder::new();
        if !self.images.is_empty() {
            body = body.text("ids", self.images.join(","));
        }
        body.texts(self.fields.iter().map(|(k, v)| (*k, v.clone())))
            .build()
    }
}

/// A new comment or reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentInformation {
    image_id: String,
    comment: String,
    parent_id: Option<i64>,
}

impl CommentInformation {
    /// Comment `comment` on the post `image_id`.
    #[must_use]
    pub fn new(image_id: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            comment: comment.into(),
            parent_id: None,
        }
    }

    /// Make this a reply to comment `parent_id`.
    #[must_use]
    pub const fn reply_to(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Parent comment, if this is a reply.
    #[must_use]
    pub const fn parent_id(&self) -> Option<i64> {
        self.parent_id
    }

    /// Check every field is usable.
    ///
    /// # Errors
    ///
    /// [`RestError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<(), RestError> {
        imgur_rest_core::check::not_blank(&self.image_id, "image_id")?;
        imgur_rest_core::check::not_blank(&self.comment, "comment")?;
        if let Some(parent_id) = self.parent_id {
            imgur_rest_core::check::positive(parent_id, "parent_id")?;
        }
        Ok(())
    }

    pub(crate) fn to_payload(&self) -> Option<Payload> {
        let mut body = MultipartBuilder::new()
            .text("image_id", self.image_id.clone())
            .text("comment", self.comment.clone());
        if let Some(parent_id) = self.parent_id {
            body = body.text("parent_id", parent_id.to_string());
        }
        body.build()
    }
}

/// Which gallery listing to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryQuery {
    /// Section
    pub section: GallerySection,
    /// Ordering
    pub sort: GallerySort,
    /// Time window, used by the `top` section
    pub window: GalleryTimeWindow,
    /// Include viral posts in the `user` section
    pub show_viral: bool,
    /// Include mature posts
    pub mature: bool,
    /// Include album previews
    pub album_previews: bool,
}

impl Default for GalleryQuery {
    fn default() -> Self {
        Self {
            section: GallerySection::default(),
            sort: GallerySort::default(),
            window: GalleryTimeWindow::default(),
            show_viral: true,
            mature: false,
            album_previews: false,
        }
    }
}

impl GalleryQuery {
    /// Default listing: hot, viral, day.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the section.
    #[must_use]
    pub const fn section(mut self, section: GallerySection) -> Self {
        self.section = section;
        self
    }

    /// Set the ordering.
    #[must_use]
    pub const fn sort(mut self, sort: GallerySort) -> Self {
        self.sort = sort;
        self
    }

    /// Set the time window.
    #[must_use]
    pub const fn window(mut self, window: GalleryTimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Include viral posts in the `user` section.
    #[must_use]
    pub const fn show_viral(mut self, show: bool) -> Self {
        self.show_viral = show;
        self
    }

    /// Include mature posts.
    #[must_use]
    pub const fn mature(mut self, mature: bool) -> Self {
        self.mature = mature;
        self
    }

    /// Include album previews.
    #[must_use]
    pub const fn album_previews(mut self, previews: bool) -> Self {
        self.album_previews = previews;
        self
    }

    /// Check no `Unknown` value is used.
    ///
    /// # Errors
    ///
    /// [`RestError::Validation`] naming the offending option.
    pub fn validate(&self) -> Result<(), RestError> {
        check_known(self.section.is_unknown(), "section")?;
        check_known(self.sort.is_unknown(), "sort")?;
        check_known(self.window.is_unknown(), "window")
    }

    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("showViral", self.show_viral.to_string()),
            ("mature", self.mature.to_string()),
            ("album_previews", self.album_previews.to_string()),
        ]
    }
}

fn check_known(unknown: bool, name: &str) -> Result<(), RestError> {
    imgur_rest_core::check::check(!unknown, name, "may not be unknown")
}

/// A gallery search, simple or advanced
///
/// Advanced terms take precedence over the simple query on the server side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GallerySearch {
    terms: BTreeMap<&'static str, String>,
    /// Ordering
    pub sort: GallerySort,
    /// Time window
    pub window: GalleryTimeWindow,
}

impl GallerySearch {
    /// Simple search for `query`.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self::advanced().term("q", query)
    }

    /// Advanced search; add terms with the setters.
    #[must_use]
    pub fn advanced() -> Self {
        Self::default()
    }

    fn term(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.terms.insert(key, value.into());
        self
    }

    /// Posts containing all of these words.
    #[must_use]
    pub fn all_of(self, words: impl Into<String>) -> Self {
        self.term("q_all", words)
    }

    /// Posts containing any of these words.
    #[must_use]
    pub fn any_of(self, words: impl Into<String>) -> Self {
        self.term("q_any", words)
    }

    /// Posts containing this exact phrase.
    #[must_use]
    pub fn exactly(self, phrase: impl Into<String>) -> Self {
        self.term("q_exactly", phrase)
    }

    /// Posts containing none of these words.
    #[must_use]
    pub fn none_of(self, words: impl Into<String>) -> Self {
        self.term("q_not", words)
    }

    /// Restrict to a file extension (`jpg`, `png`, `gif`, `anigif`, `album`).
    #[must_use]
    pub fn file_type(self, extension: impl Into<String>) -> Self {
        self.term("q_type", extension)
    }

    /// Restrict by image size.
    #[must_use]
    pub fn size(self, size: SearchImageSize) -> Self {
        self.term("q_size_px", size.key())
    }

    /// Set the ordering.
    #[must_use]
    pub const fn sort(mut self, sort: GallerySort) -> Self {
        self.sort = sort;
        self
    }

    /// Set the time window.
    #[must_use]
    pub const fn window(mut self, window: GalleryTimeWindow) -> Self {
        self.window = window;
        self
    }

    /// Check at least one non-blank term is given.
    ///
    /// # Errors
    ///
    /// [`RestError::Validation`] naming `query` or the unknown option.
    pub fn validate(&self) -> Result<(), RestError> {
        imgur_rest_core::check::check(
            self.terms.values().any(|term| !term.trim().is_empty()),
            "query",
            "may not be blank",
        )?;
        check_known(self.sort.is_unknown(), "sort")?;
        check_known(self.window.is_unknown(), "window")
    }

    pub(crate) fn query(&self) -> Vec<(&'static str, String)> {
        self.terms
            .iter()
            .filter(|(_, term)| !term.trim().is_empty())
            .map(|(key, term)| (*key, term.clone()))
            .collect()
    }
}

/// Fields of a gallery submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryShare {
    title: String,
    fields: BTreeMap<&'static str, String>,
}

impl GalleryShare {
    /// Share under `title`.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set the topic.
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.fields.insert("topic", topic.into());
        self
    }

    /// Accept the gallery terms.
    #[must_use]
    pub fn accept_terms(mut self, accept: bool) -> Self {
        self.fields
            .insert("terms", if accept { "1" } else { "0" }.to_string());
        self
    }

    /// Mark as mature.
    #[must_use]
    pub fn mature(mut self, mature: bool) -> Self {
        self.fields
            .insert("mature", if mature { "1" } else { "0" }.to_string());
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn tags<S: AsRef<str>>(mut self, tags: &[S]) -> Self {
        let tags: Vec<&str> = tags.iter().map(AsRef::as_ref).collect();
        self.fields.insert("tags", tags.join(","));
        self
    }

    /// Check the title.
    ///
    /// # Errors
    ///
    /// [`RestError::Validation`] naming `title` when it is blank.
    pub fn validate(&self) -> Result<(), RestError> {
        imgur_rest_core::check::not_blank(&self.title, "title")
    }

    pub(crate) fn to_payload(&self) -> Option<Payload> {
        MultipartBuilder::new()
            .text("title", self.title.clone())
            .texts(self.fields.iter().map(|(k, v)| (*k, v.clone())))
            .build()
    }
}
