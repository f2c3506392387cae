//! Endpoint descriptors and their compiled, dispatchable form.
//!
//! A [`Route`] is a method plus a path pattern with `{named}` slots. It is
//! `const` constructible so every known endpoint lives in the static
//! [`endpoints`] registry. [`Route::compile`] substitutes the slots and yields
//! a [`CompiledRoute`], the only form the requester accepts.
//!
//! # Example
//!
//! ```
//! use imgur_rest_core::route::endpoints::album;
//!
//! let route = album::GET_ALBUM_IMAGE.compile(&["a1b2c3", "x9y8z7"]).unwrap();
//! assert_eq!(route.path(), "album/a1b2c3/image/x9y8z7");
//! assert_eq!(route.bucket(), "GET album/{album_hash}/image/{image_hash}");
//! ```

use crate::error::RestError;
use std::fmt;

/// HTTP method of a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Upper-case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable endpoint descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    method: Method,
    pattern: &'static str,
}

impl Route {
    /// Create a route from a method and a path pattern.
    #[must_use]
    pub const fn new(method: Method, pattern: &'static str) -> Self {
        Self { method, pattern }
    }

    /// `GET` route.
    #[must_use]
    pub const fn get(pattern: &'static str) -> Self {
        Self::new(Method::Get, pattern)
    }

    /// `POST` route.
    #[must_use]
    pub const fn post(pattern: &'static str) -> Self {
        Self::new(Method::Post, pattern)
    }

    /// `PUT` route.
    #[must_use]
    pub const fn put(pattern: &'static str) -> Self {
        Self::new(Method::Put, pattern)
    }

    /// `DELETE` route.
    #[must_use]
    pub const fn delete(pattern: &'static str) -> Self {
        Self::new(Method::Delete, pattern)
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Un-substituted path pattern.
    #[must_use]
    pub const fn pattern(&self) -> &'static str {
        self.pattern
    }

    /// Names of the slots in the pattern, in order.
    pub fn slots(&self) -> impl Iterator<Item = &'static str> {
        Slots {
            rest: self.pattern,
        }
    }

    /// Number of parameters [`compile`](Self::compile) expects.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots().count()
    }

    /// Rate-limit bucket key shared by every compilation of this route.
    #[must_use]
    pub fn bucket_key(&self) -> String {
        format!("{} {}", self.method, self.pattern)
    }

    /// Substitute `params` into the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::Validation`] when the number of params does not
    /// match the number of slots (named `params`), or when a param is blank or
    /// contains `/` or whitespace (named after its slot).
    pub fn compile(&self, params: &[&str]) -> Result<CompiledRoute, RestError> {
        let expected = self.slot_count();
        if params.len() != expected {
            return Err(RestError::validation(
                "params",
                format!(
                    "`{}` expects {expected} parameter(s), got {}",
                    self.pattern,
                    params.len()
                ),
            ));
        }

        let mut path = String::with_capacity(self.pattern.len() + 16);
        let mut rest = self.pattern;
        let mut values = params.iter();
        while let Some((before, name, after)) = next_slot(rest) {
            let value = values.next().copied().unwrap_or_default();
            check_param(name, value)?;
            path.push_str(before);
            path.push_str(value);
            rest = after;
        }
        path.push_str(rest);

        Ok(CompiledRoute {
            method: self.method,
            path,
            query: Vec::new(),
            bucket: self.bucket_key(),
        })
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern)
    }
}

fn check_param(name: &str, value: &str) -> Result<(), RestError> {
    if value.trim().is_empty() {
        return Err(RestError::validation(name, "may not be blank"));
    }
    if value.contains('/') || value.chars().any(char::is_whitespace) {
        return Err(RestError::validation(
            name,
            "may not contain `/` or whitespace",
        ));
    }
    Ok(())
}

/// Split `pattern` around its first `{slot}`: (text before, slot name, text after).
fn next_slot(pattern: &str) -> Option<(&str, &str, &str)> {
    let open = pattern.find('{')?;
    let close = open + pattern[open..].find('}')?;
    Some((&pattern[..open], &pattern[open + 1..close], &pattern[close + 1..]))
}

struct Slots {
    rest: &'static str,
}

impl Iterator for Slots {
    type Item = &'static str;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, name, after) = next_slot(self.rest)?;
        self.rest = after;
        Some(name)
    }
}

/// A route with every slot substituted, ready to dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRoute {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    bucket: String,
}

impl CompiledRoute {
    /// Append a query parameter. Does not change the bucket key.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Concrete path, relative to the API base url.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order.
    #[must_use]
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Rate-limit bucket key.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl fmt::Display for CompiledRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Static registry of every endpoint the client knows about.
pub mod endpoints {
    /// Image endpoints
    pub mod image {
        use crate::route::Route;

        /// Fetch image information
        pub const GET_IMAGE: Route = Route::get("image/{hash}");
        /// Upload an image or video
        pub const UPLOAD_IMAGE: Route = Route::post("image");
        /// Delete an image
        pub const DELETE_IMAGE: Route = Route::delete("image/{hash}");
        /// Update title/description
        pub const UPDATE_IMAGE_INFORMATION: Route = Route::post("image/{hash}");
        /// Toggle favorite
        pub const FAVORITE_IMAGE: Route = Route::post("image/{hash}/favorite");
    }

    /// Album endpoints
    pub mod album {
        use crate::route::Route;

        /// Fetch album information
        pub const GET_ALBUM: Route = Route::get("album/{hash}");
        /// List the images of an album
        pub const GET_ALBUM_IMAGES: Route = Route::get("album/{hash}/images");
        /// Fetch a single image of an album
        pub const GET_ALBUM_IMAGE: Route = Route::get("album/{album_hash}/image/{image_hash}");
        /// Create an album
        pub const CREATE_ALBUM: Route = Route::post("album");
        /// Update album information
        pub const UPDATE_ALBUM: Route = Route::put("album/{hash}");
        /// Delete an album
        pub const DELETE_ALBUM: Route = Route::delete("album/{hash}");
        /// Toggle favorite
        pub const FAVORITE_ALBUM: Route = Route::post("album/{hash}/favorite");
        /// Replace the images of an album
        pub const SET_ALBUM_IMAGES: Route = Route::post("album/{hash}");
        /// Append images to an album
        pub const ADD_ALBUM_IMAGES: Route = Route::post("album/{hash}/add");
        /// Remove images from an album
        pub const REMOVE_ALBUM_IMAGES: Route = Route::post("album/{hash}/remove_images");
    }

    /// Gallery endpoints
    pub mod gallery {
        use crate::route::Route;

        /// Browse a gallery section (paged)
        pub const GET_GALLERY: Route = Route::get("gallery/{section}/{sort}/{window}/{page}");
        /// Search the gallery (paged)
        pub const SEARCH_GALLERY: Route = Route::get("gallery/search/{sort}/{window}/{page}");
        /// Fetch a gallery album
        pub const GET_GALLERY_ALBUM: Route = Route::get("gallery/album/{hash}");
        /// Fetch a gallery image
        pub const GET_GALLERY_IMAGE: Route = Route::get("gallery/image/{hash}");
        /// Share an image to the gallery
        pub const SHARE_IMAGE: Route = Route::post("gallery/image/{hash}");
        /// Share an album to the gallery
        pub const SHARE_ALBUM: Route = Route::post("gallery/album/{hash}");
        /// Remove a post from the gallery
        pub const REMOVE_FROM_GALLERY: Route = Route::delete("gallery/{hash}");
        /// Report a post
        pub const REPORT: Route = Route::post("gallery/{hash}/report");
        /// Fetch the vote totals of a post
        pub const GET_VOTES: Route = Route::get("gallery/{hash}/votes");
        /// Vote on a post
        pub const VOTE: Route = Route::post("gallery/{hash}/vote/{vote}");
        /// List the comments of a post
        pub const GET_COMMENTS: Route = Route::get("gallery/{hash}/comments/{sort}");
        /// Fetch a single comment of a post
        pub const GET_COMMENT: Route = Route::get("gallery/{hash}/comment/{id}");
    }

    /// Comment endpoints
    pub mod comment {
        use crate::route::Route;

        /// Fetch a comment
        pub const GET_COMMENT: Route = Route::get("comment/{id}");
        /// Post a comment
        pub const POST_COMMENT: Route = Route::post("comment");
        /// Delete a comment
        pub const DELETE_COMMENT: Route = Route::delete("comment/{id}");
        /// Fetch a comment with its reply tree
        pub const GET_REPLIES: Route = Route::get("comment/{id}/replies");
        /// Reply to a comment
        pub const REPLY: Route = Route::post("comment/{id}");
        /// Vote on a comment
        pub const VOTE: Route = Route::post("comment/{id}/vote/{vote}");
        /// Report a comment
        pub const REPORT: Route = Route::post("comment/{id}/report");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests can unwrap
mod tests {
    use super::endpoints::{album, gallery, image};
    use super::*;

    #[test]
    fn compiles_single_slot() {
        let route = image::GET_IMAGE.compile(&["abc123"]).unwrap();
        assert_eq!(route.method(), Method::Get);
        assert_eq!(route.path(), "image/abc123");
        assert_eq!(route.bucket(), "GET image/{hash}");
        assert_eq!(route.to_string(), "GET image/abc123");
    }

    #[test]
    fn compiles_route_without_slots() {
        let route = image::UPLOAD_IMAGE.compile(&[]).unwrap();
        assert_eq!(route.path(), "image");
        assert_eq!(route.bucket(), "POST image");
    }

    #[test]
    fn compiles_multiple_slots_in_order() {
        let route = gallery::GET_GALLERY
            .compile(&["hot", "viral", "day", "3"])
            .unwrap();
        assert_eq!(route.path(), "gallery/hot/viral/day/3");
        assert_eq!(route.bucket(), "GET gallery/{section}/{sort}/{window}/{page}");
    }

    #[test]
    fn same_shape_shares_bucket() {
        let a = album::GET_ALBUM.compile(&["one"]).unwrap();
        let b = album::GET_ALBUM.compile(&["two"]).unwrap();
        assert_eq!(a.bucket(), b.bucket());
        assert_ne!(a.path(), b.path());

        let c = album::DELETE_ALBUM.compile(&["one"]).unwrap();
        assert_ne!(a.bucket(), c.bucket());
    }

    #[test]
    fn slot_names_are_listed() {
        let names: Vec<_> = album::GET_ALBUM_IMAGE.slots().collect();
        assert_eq!(names, vec!["album_hash", "image_hash"]);
        assert_eq!(image::UPLOAD_IMAGE.slot_count(), 0);
    }

    #[test]
    fn wrong_count_fails() {
        let err = album::GET_ALBUM_IMAGE.compile(&["only-one"]).unwrap_err();
        assert!(matches!(err, RestError::Validation { ref name, .. } if name == "params"));

        let err = image::UPLOAD_IMAGE.compile(&["extra"]).unwrap_err();
        assert!(matches!(err, RestError::Validation { .. }));
    }

    #[test]
    fn blank_param_names_its_slot() {
        let err = album::GET_ALBUM_IMAGE.compile(&["abc", "  "]).unwrap_err();
        assert_eq!(err, RestError::validation("image_hash", "may not be blank"));
    }

    #[test]
    fn path_separators_are_rejected() {
        let err = image::GET_IMAGE.compile(&["../account"]).unwrap_err();
        assert!(matches!(err, RestError::Validation { ref name, .. } if name == "hash"));
    }

    #[test]
    fn query_does_not_change_bucket() {
        let route = gallery::SEARCH_GALLERY
            .compile(&["time", "all", "0"])
            .unwrap()
            .with_query("q", "cats")
            .with_query("q_type", "png");
        assert_eq!(route.query().len(), 2);
        assert_eq!(route.query()[0], ("q".to_string(), "cats".to_string()));
        assert_eq!(route.bucket(), "GET gallery/search/{sort}/{window}/{page}");
    }
}
