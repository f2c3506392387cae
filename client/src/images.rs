//! Image endpoints.

use crate::builder::{build_image, data_bool, data_favorited, data_object};
use crate::client::ImgurClient;
use crate::dto::{ImageInformation, ImageUpload};
use crate::entities::Image;
use imgur_rest_core::check;
use imgur_rest_core::route::endpoints::image;
use imgur_rest_runtime::AsyncResult;

/// Image endpoints of an [`ImgurClient`]
#[derive(Debug, Clone, Copy)]
pub struct ImageRepository<'a> {
    client: &'a ImgurClient,
}

impl<'a> ImageRepository<'a> {
    pub(crate) const fn new(client: &'a ImgurClient) -> Self {
        Self { client }
    }

    /// Fetch an image.
    #[must_use]
    pub fn get(&self, hash: &str) -> AsyncResult<Image> {
        self.client.execute(
            check::not_blank(hash, "hash").and_then(|()| image::GET_IMAGE.compile(&[hash])),
            None,
            |client, response| build_image(client, &data_object(response)?),
        )
    }

    /// Upload an image or video.
    #[must_use]
    pub fn upload(&self, upload: &ImageUpload) -> AsyncResult<Image> {
        self.client.execute(
            upload
                .validate()
                .and_then(|()| image::UPLOAD_IMAGE.compile(&[])),
            upload.to_payload(),
            |client, response| build_image(client, &data_object(response)?),
        )
    }

    /// Delete an image, by hash or delete hash.
    #[must_use]
    pub fn delete(&self, hash: &str) -> AsyncResult<bool> {
        self.client.execute(
            check::not_blank(hash, "hash").and_then(|()| image::DELETE_IMAGE.compile(&[hash])),
            None,
            |_, response| data_bool(response),
        )
    }

    /// Update an image's title and description, by hash or delete hash.
    #[must_use]
    pub fn update_information(
        &self,
        hash: &str,
        information: &ImageInformation,
    ) -> AsyncResult<bool> {
        self.client.execute(
            check::not_blank(hash, "hash")
                .and_then(|()| image::UPDATE_IMAGE_INFORMATION.compile(&[hash])),
            information.to_payload(),
            |_, response| data_bool(response),
        )
    }

    /// Toggle the favorite flag; resolves to whether the image is now a
    /// favorite.
    #[must_use]
    pub fn favorite(&self, hash: &str) -> AsyncResult<bool> {
        self.client.execute(
            check::not_blank(hash, "hash").and_then(|()| image::FAVORITE_IMAGE.compile(&[hash])),
            None,
            |_, response| data_favorited(response),
        )
    }
}
