//! Gallery endpoints.

use crate::builder::{
    build_comment, build_gallery_album, build_gallery_element, build_gallery_image, build_votes,
    data_array, data_bool, data_object,
};
use crate::client::ImgurClient;
use crate::dto::{GalleryQuery, GallerySearch, GalleryShare};
use crate::entities::{Comment, GalleryAlbum, GalleryElement, GalleryImage, Votes};
use crate::types::{CommentSort, ReportReason, Vote};
use imgur_rest_core::route::endpoints::gallery;
use imgur_rest_core::route::Route;
use imgur_rest_core::{check, CompiledRoute, MultipartBuilder, RestError};
use imgur_rest_runtime::{AsyncResult, PagedRequest};

/// Gallery endpoints of an [`ImgurClient`]
#[derive(Debug, Clone, Copy)]
pub struct GalleryRepository<'a> {
    client: &'a ImgurClient,
}

impl<'a> GalleryRepository<'a> {
    pub(crate) const fn new(client: &'a ImgurClient) -> Self {
        Self { client }
    }

    fn listing<R>(&self, route: R) -> PagedRequest<GalleryElement>
    where
        R: Fn(u32) -> Result<CompiledRoute, RestError> + Send + Sync + 'static,
    {
        let client = self.client.downgrade();
        PagedRequest::new(self.client.requester().clone(), route, move |_, response| {
            data_array(response)?.map_objects(|element| build_gallery_element(&client, element))
        })
    }

    /// Paginated gallery listing.
    ///
    /// An invalid query fails every page without contacting the server.
    #[must_use]
    pub fn list(&self, query: &GalleryQuery) -> PagedRequest<GalleryElement> {
        let query = query.clone();
        self.listing(move |page| {
            query.validate()?;
            let page = page.to_string();
            let route = gallery::GET_GALLERY.compile(&[
                query.section.key(),
                query.sort.key(),
                query.window.key(),
                &page,
            ])?;
            Ok(query
                .query()
                .into_iter()
                .fold(route, |route, (key, value)| route.with_query(key, value)))
        })
    }

    /// Paginated gallery search.
    ///
    /// A search without terms fails every page without contacting the server.
    #[must_use]
    pub fn search(&self, search: &GallerySearch) -> PagedRequest<GalleryElement> {
        let search = search.clone();
        self.listing(move |page| {
            search.validate()?;
            let page = page.to_string();
            let route =
                gallery::SEARCH_GALLERY.compile(&[search.sort.key(), search.window.key(), &page])?;
            Ok(search
                .query()
                .into_iter()
                .fold(route, |route, (key, value)| route.with_query(key, value)))
        })
    }

    /// Fetch an album shared in the gallery.
    #[must_use]
    pub fn album(&self, hash: &str) -> AsyncResult<GalleryAlbum> {
        self.client.execute(
            check::not_blank(hash, "hash")
                .and_then(|()| gallery::GET_GALLERY_ALBUM.compile(&[hash])),
            None,
            |client, response| build_gallery_album(client, &data_object(response)?),
        )
    }

    /// Fetch an image shared in the gallery.
    #[must_use]
    pub fn image(&self, hash: &str) -> AsyncResult<GalleryImage> {
        self.client.execute(
            check::not_blank(hash, "hash")
                .and_then(|()| gallery::GET_GALLERY_IMAGE.compile(&[hash])),
            None,
            |client, response| build_gallery_image(client, &data_object(response)?),
        )
    }

    /// Share an image to the gallery.
    #[must_use]
    pub fn share_image(&self, hash: &str, share: &GalleryShare) -> AsyncResult<bool> {
        self.share(gallery::SHARE_IMAGE, hash, share)
    }

    /// Share an album to the gallery.
    #[must_use]
    pub fn share_album(&self, hash: &str, share: &GalleryShare) -> AsyncResult<bool> {
        self.share(gallery::SHARE_ALBUM, hash, share)
    }

    fn share(&self, route: Route, hash: &str, share: &GalleryShare) -> AsyncResult<bool> {
        let compiled = check::not_blank(hash, "hash")
            .and_then(|()| share.validate())
            .and_then(|()| route.compile(&[hash]));
        self.client
            .execute(compiled, share.to_payload(), |_, response| data_bool(response))
    }

    /// Remove a post from the gallery.
    #[must_use]
    pub fn remove(&self, hash: &str) -> AsyncResult<bool> {
        self.client.execute(
            check::not_blank(hash, "hash")
                .and_then(|()| gallery::REMOVE_FROM_GALLERY.compile(&[hash])),
            None,
            |_, response| data_bool(response),
        )
    }

    /// Report a post, optionally giving a reason.
    #[must_use]
    pub fn report(&self, hash: &str, reason: Option<ReportReason>) -> AsyncResult<bool> {
        let compiled = check::not_blank(hash, "hash")
            .and_then(|()| check_reason(reason))
            .and_then(|()| gallery::REPORT.compile(&[hash]));
        self.client
            .execute(compiled, reason_payload(reason), |_, response| data_bool(response))
    }

    /// Fetch the vote totals of a post.
    #[must_use]
    pub fn votes(&self, hash: &str) -> AsyncResult<Votes> {
        self.client.execute(
            check::not_blank(hash, "hash").and_then(|()| gallery::GET_VOTES.compile(&[hash])),
            None,
            |_, response| build_votes(&data_object(response)?),
        )
    }

    /// Vote on a post.
    #[must_use]
    pub fn vote(&self, hash: &str, vote: Vote) -> AsyncResult<bool> {
        let compiled = check::not_blank(hash, "hash")
            .and_then(|()| check::check(!vote.is_unknown(), "vote", "may not be unknown"))
            .and_then(|()| gallery::VOTE.compile(&[hash, vote.key()]));
        self.client
            .execute(compiled, None, |_, response| data_bool(response))
    }

    /// Fetch the comments of a post, with their replies.
    #[must_use]
    pub fn comments(&self, hash: &str, sort: CommentSort) -> AsyncResult<Vec<Comment>> {
        let compiled = check::not_blank(hash, "hash")
            .and_then(|()| check::check(!sort.is_unknown(), "sort", "may not be unknown"))
            .and_then(|()| gallery::GET_COMMENTS.compile(&[hash, sort.key()]));
        self.client.execute(compiled, None, |client, response| {
            data_array(response)?.map_objects(|comment| build_comment(client, comment))
        })
    }

    /// Fetch one comment of a post.
    #[must_use]
    pub fn comment(&self, hash: &str, id: i64) -> AsyncResult<Comment> {
        let id_param = id.to_string();
        let compiled = check::not_blank(hash, "hash")
            .and_then(|()| check::positive(id, "id"))
            .and_then(|()| gallery::GET_COMMENT.compile(&[hash, &id_param]));
        self.client.execute(compiled, None, |client, response| {
            build_comment(client, &data_object(response)?)
        })
    }
}

pub(crate) fn check_reason(reason: Option<ReportReason>) -> Result<(), RestError> {
    check::check(
        !reason.is_some_and(ReportReason::is_unknown),
        "reason",
        "may not be unknown",
    )
}

pub(crate) fn reason_payload(reason: Option<ReportReason>) -> Option<imgur_rest_core::Payload> {
    reason.and_then(|reason| MultipartBuilder::new().text("reason", reason.key()).build())
}
