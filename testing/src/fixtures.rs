//! Response documents shaped like the API's.
//!
//! Each entity fixture returns the `data` part only; wrap it with
//! [`envelope`] (JSON) or [`ok`] (ready-made [`RawResponse`]).

use imgur_rest_runtime::RawResponse;
use serde_json::{json, Value};

/// Creation time used by every fixture (2020-05-01T12:00:00Z).
pub const DATETIME: i64 = 1_588_334_400;

/// `{"data": data, "success": true, "status": 200}`
#[must_use]
pub fn envelope(data: Value) -> Value {
    json!({ "data": data, "success": true, "status": 200 })
}

/// Error envelope as the API sends it.
#[must_use]
pub fn error_envelope(status: u16, message: &str) -> Value {
    json!({
        "data": { "error": message, "request": "/3/", "method": "GET" },
        "success": false,
        "status": status,
    })
}

/// Successful response wrapping `data`.
#[must_use]
pub fn ok(data: Value) -> RawResponse {
    RawResponse::json(200, &envelope(data))
}

/// Failed response with the API's error envelope.
#[must_use]
pub fn error(status: u16, message: &str) -> RawResponse {
    RawResponse::json(status, &error_envelope(status, message))
}

/// Image document.
#[must_use]
pub fn image(hash: &str) -> Value {
    json!({
        "id": hash,
        "title": "Sunset over the bay",
        "description": null,
        "datetime": DATETIME,
        "type": "image/jpeg",
        "animated": false,
        "width": 1920,
        "height": 1080,
        "size": 482_133,
        "views": 1204,
        "bandwidth": 580_488_132,
        "vote": null,
        "favorite": false,
        "nsfw": false,
        "section": null,
        "account_url": null,
        "account_id": 0,
        "is_ad": false,
        "in_most_viral": false,
        "has_sound": false,
        "tags": [],
        "edited": "0",
        "in_gallery": false,
        "deletehash": "dEl3t3H4sh",
        "name": "sunset.jpg",
        "link": format!("https://i.imgur.com/{hash}.jpg"),
    })
}

/// Album document with `images` embedded.
#[must_use]
pub fn album(hash: &str, images: &[&str]) -> Value {
    let images: Vec<Value> = images.iter().map(|id| image(id)).collect();
    json!({
        "id": hash,
        "title": "Road trip",
        "description": "Three days, two flat tyres",
        "datetime": DATETIME,
        "cover": images.first().and_then(|img| img.get("id")).cloned(),
        "cover_width": 1920,
        "cover_height": 1080,
        "account_url": "traveller",
        "account_id": 4_242,
        "privacy": "hidden",
        "layout": "blog",
        "views": 87,
        "link": format!("https://imgur.com/a/{hash}"),
        "favorite": false,
        "nsfw": null,
        "section": null,
        "images_count": images.len(),
        "in_gallery": false,
        "is_ad": false,
        "deletehash": "aLbUmDeL",
        "images": images,
    })
}

fn with_gallery_fields(mut doc: Value, is_album: bool) -> Value {
    if let Some(fields) = doc.as_object_mut() {
        fields.insert("is_album".into(), json!(is_album));
        fields.insert("in_gallery".into(), json!(true));
        fields.insert("ups".into(), json!(1_520));
        fields.insert("downs".into(), json!(31));
        fields.insert("points".into(), json!(1_489));
        fields.insert("score".into(), json!(1_602));
        fields.insert("comment_count".into(), json!(58));
        fields.insert("favorite_count".into(), json!(210));
        fields.insert("topic".into(), json!("No Topic"));
        fields.insert("tags".into(), json!([tag("nature")]));
    }
    doc
}

/// Gallery image document.
#[must_use]
pub fn gallery_image(hash: &str) -> Value {
    with_gallery_fields(image(hash), false)
}

/// Gallery album document.
#[must_use]
pub fn gallery_album(hash: &str, images: &[&str]) -> Value {
    with_gallery_fields(album(hash, images), true)
}

/// Tag document.
#[must_use]
pub fn tag(name: &str) -> Value {
    json!({
        "name": name,
        "display_name": name,
        "followers": 120_330,
        "total_items": 59_010,
        "following": false,
        "background_hash": "bGh4sh0",
        "accent": "5C8A3A",
        "description": "the great outdoors",
    })
}

/// Comment document with `children` replies embedded.
#[must_use]
pub fn comment(id: i64, children: &[Value]) -> Value {
    json!({
        "id": id,
        "image_id": "Xa1b2c3",
        "comment": "Beautiful shot!",
        "author": "photofan",
        "author_id": 77,
        "on_album": false,
        "album_cover": null,
        "ups": 12,
        "downs": 0,
        "points": 12,
        "datetime": DATETIME,
        "parent_id": 0,
        "deleted": false,
        "vote": "up",
        "platform": "desktop",
        "children": children,
    })
}

/// Vote totals document.
#[must_use]
pub fn votes(ups: i64, downs: i64) -> Value {
    json!({ "ups": ups, "downs": downs })
}
