//! Repositories over the reqwest transport against a mock HTTP server.

#![allow(clippy::unwrap_used)] // Tests can unwrap

use futures::StreamExt;
use imgur_rest_client::{
    AlbumInformation, CommentSort, GalleryElement, GalleryQuery, ImageUpload, ImgurClient,
    ReportReason, RestError, Vote,
};
use imgur_rest_core::{ClientConfig, ConfigFlag};
use imgur_rest_testing::{fixtures, init_tracing};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLIENT_ID: &str = "0123456789abcde";

fn config(server: &MockServer) -> imgur_rest_core::config::ClientConfigBuilder {
    ClientConfig::builder()
        .base_url(format!("{}/3/", server.uri()))
        .client_id(CLIENT_ID)
}

async fn client(server: &MockServer) -> ImgurClient {
    init_tracing();
    ImgurClient::new(config(server).build().unwrap()).unwrap()
}

fn ok(data: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(fixtures::envelope(data))
}

fn failure(status: u16, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).set_body_json(fixtures::error_envelope(status, message))
}

#[tokio::test]
async fn image_is_fetched_with_standard_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/image/Xa1b2c3"))
        .and(header("Authorization", format!("Client-ID {CLIENT_ID}").as_str()))
        .and(header("Accept", "application/json"))
        .respond_with(ok(fixtures::image("Xa1b2c3")))
        .expect(1)
        .mount(&server)
        .await;

    let image = client(&server).await.images().get("Xa1b2c3").await.unwrap();

    assert_eq!(image.id, "Xa1b2c3");
    assert_eq!(image.title.as_deref(), Some("Sunset over the bay"));
    assert_eq!(image.width, 1920);
    assert_eq!(image.datetime.timestamp(), fixtures::DATETIME);
}

#[tokio::test]
async fn upload_is_sent_as_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/3/image"))
        .and(body_string_contains("name=\"image\"; filename=\"sunset.jpg\""))
        .and(body_string_contains("name=\"type\""))
        .and(body_string_contains("Sunset"))
        .respond_with(ok(fixtures::image("n3wImg")))
        .expect(1)
        .mount(&server)
        .await;

    let upload = ImageUpload::image_file("sunset.jpg", b"\xff\xd8\xff\xe0".to_vec()).title("Sunset");
    let image = client(&server).await.images().upload(&upload).await.unwrap();

    assert_eq!(image.id, "n3wImg");
    assert_eq!(image.deletehash.as_deref(), Some("dEl3t3H4sh"));
}

#[tokio::test]
async fn invalid_arguments_never_reach_the_server() {
    let server = MockServer::start().await;
    let client = client(&server).await;

    let blank = client.images().get("  ").await;
    let spaced = client.albums().get("a b").await;
    let no_ids = client.albums().add_images("alb", &[] as &[&str]).await;
    let unknown_vote = client.gallery().vote("Xa1b2c3", Vote::Unknown).await;

    assert!(matches!(blank, Err(RestError::Validation { ref name, .. }) if name == "hash"));
    assert!(matches!(spaced, Err(RestError::Validation { .. })));
    assert!(matches!(no_ids, Err(RestError::Validation { ref name, .. }) if name == "ids"));
    assert!(matches!(unknown_vote, Err(RestError::Validation { ref name, .. }) if name == "vote"));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn transient_failure_is_retried_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/image/Xa1b2c3"))
        .respond_with(failure(503, "Over capacity"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/3/image/Xa1b2c3"))
        .respond_with(ok(fixtures::image("Xa1b2c3")))
        .mount(&server)
        .await;

    let image = client(&server).await.images().get("Xa1b2c3").await;

    assert!(image.is_ok());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn disabled_retries_surface_the_first_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(failure(503, "Over capacity"))
        .mount(&server)
        .await;

    init_tracing();
    let config = config(&server)
        .disable(ConfigFlag::RetryOnTimeout)
        .build()
        .unwrap();
    let outcome = ImgurClient::new(config).unwrap().images().get("Xa1b2c3").await;

    assert_eq!(
        outcome.unwrap_err(),
        RestError::TransientServer {
            status: 503,
            message: "Over capacity".into()
        }
    );
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn client_errors_carry_the_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(failure(404, "Unable to find an image with the id, missing"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server).await.images().get("missing").await;

    assert_eq!(
        outcome.unwrap_err(),
        RestError::Http {
            status: 404,
            message: "Unable to find an image with the id, missing".into()
        }
    );
}

#[tokio::test]
async fn malformed_entity_fails_with_the_missing_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ok(json!({ "id": "Xa1b2c3" })))
        .mount(&server)
        .await;

    let outcome = client(&server).await.images().get("Xa1b2c3").await;

    assert!(matches!(
        outcome,
        Err(RestError::Parsing(ref err)) if err.field() == Some("datetime")
    ));
}

#[tokio::test]
async fn entities_make_follow_up_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/album/r0adTr1p"))
        .respond_with(ok(fixtures::album("r0adTr1p", &["one", "two"])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/3/album/aLbUmDeL/add"))
        .and(body_string_contains("three,four"))
        .respond_with(ok(json!(true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/3/image/one/favorite"))
        .respond_with(ok(json!("favorited")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).await;
    let album = client.albums().get("r0adTr1p").await.unwrap();

    assert_eq!(album.images.len(), 2);
    assert_eq!(album.cover.as_ref().unwrap().name, "one");
    assert!(album.add_images(&["three", "four"]).await.unwrap());
    assert!(album.images[0].favorite().await.unwrap());
}

#[tokio::test]
async fn follow_ups_fail_once_the_client_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/comment/101"))
        .respond_with(ok(fixtures::comment(101, &[])))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let comment = client.comments().get(101).await.unwrap();
    drop(client);

    assert!(!comment.client().is_alive());
    assert_eq!(comment.delete().await, Err(RestError::Shutdown));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn gallery_pages_are_streamed_until_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/3/gallery/top/time/week/0"))
        .and(query_param("showViral", "true"))
        .respond_with(ok(json!([
            fixtures::gallery_image("img1"),
            fixtures::gallery_album("alb1", &["img2"]),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/3/gallery/top/time/week/1"))
        .respond_with(ok(json!([])))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let query = GalleryQuery::new()
        .section(imgur_rest_client::GallerySection::Top)
        .sort(imgur_rest_client::GallerySort::Time)
        .window(imgur_rest_client::GalleryTimeWindow::Week);
    let pages: Vec<_> = client.gallery().list(&query).stream(0).collect().await;

    assert_eq!(pages.len(), 1);
    let items = &pages[0].as_ref().unwrap().items;
    assert!(matches!(&items[0], GalleryElement::Image(image) if image.stats.ups == 1_520));
    assert!(matches!(&items[1], GalleryElement::Album(album) if album.album.images.len() == 1));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn comment_threads_are_decoded() {
    let server = MockServer::start().await;
    let reply = fixtures::comment(202, &[]);
    Mock::given(method("GET"))
        .and(path("/3/gallery/Xa1b2c3/comments/new"))
        .respond_with(ok(json!([fixtures::comment(101, &[reply])])))
        .mount(&server)
        .await;

    let comments = client(&server)
        .await
        .gallery()
        .comments("Xa1b2c3", CommentSort::New)
        .await
        .unwrap();

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].children[0].id, 202);
    assert_eq!(comments[0].vote, Some(Vote::Up));
    assert!(!comments[0].is_reply());
}

#[tokio::test]
async fn album_creation_resolves_to_its_hash() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/3/album"))
        .and(body_string_contains("a1,b2"))
        .respond_with(ok(json!({ "id": "n3wAlb", "deletehash": "d3l" })))
        .expect(1)
        .mount(&server)
        .await;

    let info = AlbumInformation::new().images(["a1", "b2"]).title("Trip");
    let hash = client(&server).await.albums().create(&info).await.unwrap();

    assert_eq!(hash, "n3wAlb");
}

#[tokio::test]
async fn reports_send_the_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/3/comment/101/report"))
        .and(body_string_contains("name=\"reason\""))
        .respond_with(ok(json!(true)))
        .expect(1)
        .mount(&server)
        .await;

    let reported = client(&server)
        .await
        .comments()
        .report(101, Some(ReportReason::Spam))
        .await;

    assert_eq!(reported, Ok(true));
}
