//! Album endpoints.

use crate::builder::{build_album, build_image, data_array, data_bool, data_favorited, data_object};
use crate::client::ImgurClient;
use crate::dto::AlbumInformation;
use crate::entities::{Album, Image};
use imgur_rest_core::route::endpoints::album;
use imgur_rest_core::route::Route;
use imgur_rest_core::{check, MultipartBuilder};
use imgur_rest_runtime::AsyncResult;

/// Album endpoints of an [`ImgurClient`]
#[derive(Debug, Clone, Copy)]
pub struct AlbumRepository<'a> {
    client: &'a ImgurClient,
}

impl<'a> AlbumRepository<'a> {
    pub(crate) const fn new(client: &'a ImgurClient) -> Self {
        Self { client }
    }

    /// Fetch an album with its images.
    #[must_use]
    pub fn get(&self, hash: &str) -> AsyncResult<Album> {
        self.client.execute(
            check::not_blank(hash, "hash").and_then(|()| album::GET_ALBUM.compile(&[hash])),
            None,
            |client, response| build_album(client, &data_object(response)?),
        )
    }

    /// Fetch the images of an album.
    #[must_use]
    pub fn images(&self, hash: &str) -> AsyncResult<Vec<Image>> {
        self.client.execute(
            check::not_blank(hash, "hash").and_then(|()| album::GET_ALBUM_IMAGES.compile(&[hash])),
            None,
            |client, response| {
                data_array(response)?.map_objects(|image| build_image(client, image))
            },
        )
    }

    /// Fetch one image of an album.
    #[must_use]
    pub fn image(&self, album_hash: &str, image_hash: &str) -> AsyncResult<Image> {
        let route = check::not_blank(album_hash, "album_hash")
            .and_then(|()| check::not_blank(image_hash, "image_hash"))
            .and_then(|()| album::GET_ALBUM_IMAGE.compile(&[album_hash, image_hash]));
        self.client.execute(route, None, |client, response| {
            build_image(client, &data_object(response)?)
        })
    }

    /// Create an album; resolves to the new album's hash.
    #[must_use]
    pub fn create(&self, information: &AlbumInformation) -> AsyncResult<String> {
        self.client.execute(
            information
                .validate()
                .and_then(|()| album::CREATE_ALBUM.compile(&[])),
            information.to_payload(),
            |_, response| data_object(response)?.get_string("id"),
        )
    }

    /// Update an album, by hash or delete hash.
    #[must_use]
    pub fn update(&self, hash: &str, information: &AlbumInformation) -> AsyncResult<bool> {
        let route = check::not_blank(hash, "hash")
            .and_then(|()| information.validate())
            .and_then(|()| album::UPDATE_ALBUM.compile(&[hash]));
        self.client
            .execute(route, information.to_payload(), |_, response| data_bool(response))
    }

    /// Delete an album, by hash or delete hash. Its images are kept.
    #[must_use]
    pub fn delete(&self, hash: &str) -> AsyncResult<bool> {
        self.client.execute(
            check::not_blank(hash, "hash").and_then(|()| album::DELETE_ALBUM.compile(&[hash])),
            None,
            |_, response| data_bool(response),
        )
    }

    /// Toggle the favorite flag; resolves to whether the album is now a
    /// favorite.
    #[must_use]
    pub fn favorite(&self, hash: &str) -> AsyncResult<bool> {
        self.client.execute(
            check::not_blank(hash, "hash").and_then(|()| album::FAVORITE_ALBUM.compile(&[hash])),
            None,
            |_, response| data_favorited(response),
        )
    }

    /// Replace the images of an album.
    #[must_use]
    pub fn set_images<S: AsRef<str>>(&self, hash: &str, images: &[S]) -> AsyncResult<bool> {
        self.modify_images(album::SET_ALBUM_IMAGES, hash, images)
    }

    /// Append images to an album.
    #[must_use]
    pub fn add_images<S: AsRef<str>>(&self, hash: &str, images: &[S]) -> AsyncResult<bool> {
        self.modify_images(album::ADD_ALBUM_IMAGES, hash, images)
    }

    /// Remove images from an album.
    #[must_use]
    pub fn remove_images<S: AsRef<str>>(&self, hash: &str, images: &[S]) -> AsyncResult<bool> {
        self.modify_images(album::REMOVE_ALBUM_IMAGES, hash, images)
    }

    fn modify_images<S: AsRef<str>>(
        &self,
        route: Route,
        hash: &str,
        images: &[S],
    ) -> AsyncResult<bool> {
        let compiled = check::not_blank(hash, "hash")
            .and_then(|()| check::none_blank(images, "ids"))
            .and_then(|()| route.compile(&[hash]));
        let ids: Vec<&str> = images.iter().map(AsRef::as_ref).collect();
        let payload = MultipartBuilder::new().text("ids", ids.join(",")).build();
        self.client
            .execute(compiled, payload, |_, response| data_bool(response))
    }
}

