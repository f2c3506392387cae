//! Entity builder.
//!
//! Free functions turning a decoded document into an entity. Required fields
//! fail with a [`ParsingError`] naming the field; every other field falls
//! back to a neutral value. Building is pure, so decoding the same document
//! twice yields equal entities.

use crate::client::ClientRef;
use crate::entities::{
    Album, Comment, Cover, GalleryAlbum, GalleryElement, GalleryImage, GalleryStats, Image, Tag,
    Votes,
};
use crate::types::{AlbumLayout, AlbumPrivacy, Vote};
use imgur_rest_core::{DataArray, DataObject, ParsingError};
use imgur_rest_runtime::RawResponse;

/// Integer that may also be sent as a numeric string; `0` otherwise.
fn lenient_i64(obj: &DataObject, key: &str) -> i64 {
    obj.opt_i64(key)
        .or_else(|| obj.opt_string(key).and_then(|raw| raw.trim().parse().ok()))
        .unwrap_or(0)
}

/// Identifier that may be sent as a string or a number.
fn any_id(obj: &DataObject, key: &str) -> Result<String, ParsingError> {
    match obj.opt_i64(key) {
        Some(id) => Ok(id.to_string()),
        None => obj.get_string(key),
    }
}

/// Positive id, `None` for absent or zero.
fn opt_id(obj: &DataObject, key: &str) -> Option<i64> {
    obj.opt_i64(key).filter(|id| *id > 0)
}

fn opt_vote(obj: &DataObject) -> Option<Vote> {
    obj.opt_string("vote").map(|key| Vote::from_key(&key))
}

fn objects<T, F>(array: Option<DataArray>, build: F) -> Result<Vec<T>, ParsingError>
where
    F: FnMut(&DataObject) -> Result<T, ParsingError>,
{
    array.map_or_else(|| Ok(Vec::new()), |array| array.map_objects(build))
}

/// Build an [`Image`]. Requires `id` and `datetime`.
///
/// # Errors
///
/// [`ParsingError`] naming the first missing or mistyped required field.
pub fn build_image(client: &ClientRef, obj: &DataObject) -> Result<Image, ParsingError> {
    Ok(Image {
        id: obj.get_string("id")?,
        title: obj.opt_string("title"),
        description: obj.opt_string("description"),
        datetime: obj.get_timestamp("datetime")?,
        mime_type: obj.opt_string("type"),
        animated: obj.bool_or_false("animated"),
        width: obj.i64_or_zero("width"),
        height: obj.i64_or_zero("height"),
        size: obj.i64_or_zero("size"),
        views: obj.i64_or_zero("views"),
        bandwidth: obj.i64_or_zero("bandwidth"),
        vote: opt_vote(obj),
        favorite: obj.bool_or_false("favorite"),
        nsfw: obj.bool_or_false("nsfw"),
        section: obj.opt_string("section"),
        account_url: obj.opt_string("account_url"),
        account_id: opt_id(obj, "account_id"),
        is_ad: obj.bool_or_false("is_ad"),
        in_most_viral: obj.bool_or_false("in_most_viral"),
        has_sound: obj.bool_or_false("has_sound"),
        tags: objects(obj.opt_array("tags"), build_tag)?,
        edited: lenient_i64(obj, "edited"),
        in_gallery: obj.bool_or_false("in_gallery"),
        deletehash: obj.opt_string("deletehash"),
        name: obj.opt_string("name"),
        link: obj.opt_string("link"),
        mp4: obj.opt_string("mp4"),
        gifv: obj.opt_string("gifv"),
        client: client.clone(),
    })
}

/// Build a [`Cover`] from an image hash.
#[must_use]
pub fn build_cover(hash: &str) -> Cover {
    Cover {
        name: hash.to_string(),
        url: format!("https://i.imgur.com/{hash}.jpg"),
    }
}

/// Build an [`Album`]. Requires `id` and `datetime`.
///
/// # Errors
///
/// [`ParsingError`] naming the first missing or mistyped required field,
/// including those of embedded images.
pub fn build_album(client: &ClientRef, obj: &DataObject) -> Result<Album, ParsingError> {
    let images = objects(obj.opt_array("images"), |image| build_image(client, image))?;
    Ok(Album {
        id: obj.get_string("id")?,
        title: obj.opt_string("title"),
        description: obj.opt_string("description"),
        datetime: obj.get_timestamp("datetime")?,
        cover: obj.opt_string("cover").as_deref().map(build_cover),
        cover_width: obj.i64_or_zero("cover_width"),
        cover_height: obj.i64_or_zero("cover_height"),
        account_url: obj.opt_string("account_url"),
        account_id: opt_id(obj, "account_id"),
        privacy: obj
            .opt_string("privacy")
            .map(|key| AlbumPrivacy::from_key(&key)),
        layout: obj
            .opt_string("layout")
            .map(|key| AlbumLayout::from_key(&key)),
        views: obj.i64_or_zero("views"),
        link: obj.opt_string("link"),
        favorite: obj.bool_or_false("favorite"),
        nsfw: obj.bool_or_false("nsfw"),
        section: obj.opt_string("section"),
        images_count: obj
            .opt_i64("images_count")
            .unwrap_or_else(|| i64::try_from(images.len()).unwrap_or(i64::MAX)),
        in_gallery: obj.bool_or_false("in_gallery"),
        is_ad: obj.bool_or_false("is_ad"),
        deletehash: obj.opt_string("deletehash"),
        images,
        client: client.clone(),
    })
}

fn build_stats(obj: &DataObject) -> GalleryStats {
    GalleryStats {
        ups: obj.i64_or_zero("ups"),
        downs: obj.i64_or_zero("downs"),
        points: obj.i64_or_zero("points"),
        score: obj.i64_or_zero("score"),
        comment_count: obj.i64_or_zero("comment_count"),
        favorite_count: obj.i64_or_zero("favorite_count"),
        topic: obj.opt_string("topic"),
    }
}

/// Build a [`GalleryImage`].
///
/// # Errors
///
/// Same as [`build_image`].
pub fn build_gallery_image(
    client: &ClientRef,
    obj: &DataObject,
) -> Result<GalleryImage, ParsingError> {
    Ok(GalleryImage {
        image: build_image(client, obj)?,
        stats: build_stats(obj),
    })
}

/// Build a [`GalleryAlbum`].
///
/// # Errors
///
/// Same as [`build_album`].
pub fn build_gallery_album(
    client: &ClientRef,
    obj: &DataObject,
) -> Result<GalleryAlbum, ParsingError> {
    Ok(GalleryAlbum {
        album: build_album(client, obj)?,
        stats: build_stats(obj),
    })
}

/// Build a [`GalleryElement`], an album when `is_album` is true.
///
/// # Errors
///
/// Same as [`build_gallery_album`] or [`build_gallery_image`].
pub fn build_gallery_element(
    client: &ClientRef,
    obj: &DataObject,
) -> Result<GalleryElement, ParsingError> {
    if obj.bool_or_false("is_album") {
        build_gallery_album(client, obj).map(GalleryElement::Album)
    } else {
        build_gallery_image(client, obj).map(GalleryElement::Image)
    }
}

/// Build a [`Tag`]. Requires `name`.
///
/// # Errors
///
/// [`ParsingError`] when `name` is missing or not a string.
pub fn build_tag(obj: &DataObject) -> Result<Tag, ParsingError> {
    Ok(Tag {
        name: obj.get_string("name")?,
        display_name: obj.opt_string("display_name"),
        followers: obj.i64_or_zero("followers"),
        total_items: obj.i64_or_zero("total_items"),
        following: obj.bool_or_false("following"),
        background_hash: obj.opt_string("background_hash"),
        accent: obj.opt_string("accent"),
        description: obj.opt_string("description"),
    })
}

/// Build [`Votes`]. Requires `ups` and `downs`.
///
/// # Errors
///
/// [`ParsingError`] naming the missing or mistyped count.
pub fn build_votes(obj: &DataObject) -> Result<Votes, ParsingError> {
    Ok(Votes {
        ups: obj.get_i64("ups")?,
        downs: obj.get_i64("downs")?,
    })
}

/// Build a [`Comment`] with its replies. Requires `id`, `image_id` and
/// `datetime`.
///
/// # Errors
///
/// [`ParsingError`] naming the first missing or mistyped required field,
/// including those of replies.
pub fn build_comment(client: &ClientRef, obj: &DataObject) -> Result<Comment, ParsingError> {
    Ok(Comment {
        id: obj.get_i64("id")?,
        image_id: any_id(obj, "image_id")?,
        comment: obj.opt_string("comment").unwrap_or_default(),
        author: obj.opt_string("author"),
        author_id: opt_id(obj, "author_id"),
        on_album: obj.bool_or_false("on_album"),
        album_cover: obj.opt_string("album_cover"),
        ups: obj.i64_or_zero("ups"),
        downs: obj.i64_or_zero("downs"),
        points: obj.i64_or_zero("points"),
        datetime: obj.get_timestamp("datetime")?,
        parent_id: opt_id(obj, "parent_id"),
        deleted: obj.bool_or_false("deleted"),
        vote: opt_vote(obj),
        platform: obj.opt_string("platform"),
        children: objects(obj.opt_array("children"), |child| build_comment(client, child))?,
        client: client.clone(),
    })
}

/// The `data` member of a response envelope, as an object.
pub(crate) fn data_object(response: &RawResponse) -> Result<DataObject, ParsingError> {
    response.object()?.get_object("data")
}

/// The `data` member of a response envelope, as an array.
pub(crate) fn data_array(response: &RawResponse) -> Result<DataArray, ParsingError> {
    response.object()?.get_array("data")
}

/// The `data` member of a response envelope, as a boolean.
pub(crate) fn data_bool(response: &RawResponse) -> Result<bool, ParsingError> {
    response.object()?.get_bool("data")
}

/// Whether a favorite toggle left the target favorited.
pub(crate) fn data_favorited(response: &RawResponse) -> Result<bool, ParsingError> {
    Ok(response.object()?.get_string("data")? == "favorited")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests can unwrap
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> DataObject {
        DataObject::from_value(value).unwrap()
    }

    #[test]
    fn edited_accepts_numeric_strings() {
        let obj = doc(json!({ "a": "3", "b": 4, "c": "x" }));
        assert_eq!(lenient_i64(&obj, "a"), 3);
        assert_eq!(lenient_i64(&obj, "b"), 4);
        assert_eq!(lenient_i64(&obj, "c"), 0);
        assert_eq!(lenient_i64(&obj, "missing"), 0);
    }

    #[test]
    fn zero_ids_read_as_absent() {
        let obj = doc(json!({ "parent_id": 0, "author_id": 12 }));
        assert_eq!(opt_id(&obj, "parent_id"), None);
        assert_eq!(opt_id(&obj, "author_id"), Some(12));
    }

    #[test]
    fn cover_links_the_image() {
        let cover = build_cover("Xa1b2c3");
        assert_eq!(cover.name, "Xa1b2c3");
        assert_eq!(cover.url, "https://i.imgur.com/Xa1b2c3.jpg");
    }

    #[test]
    fn votes_require_both_counts() {
        let err = build_votes(&doc(json!({ "ups": 3 }))).unwrap_err();
        assert_eq!(err, ParsingError::MissingField("downs".into()));
    }

    #[test]
    fn favorite_toggle_is_read_from_data() {
        let favorited = RawResponse::json(200, &json!({ "data": "favorited" }));
        let unfavorited = RawResponse::json(200, &json!({ "data": "unfavorited" }));
        assert!(data_favorited(&favorited).unwrap());
        assert!(!data_favorited(&unfavorited).unwrap());
    }
}
