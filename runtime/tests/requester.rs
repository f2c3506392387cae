//! End-to-end behaviour of the request pipeline against a scripted transport.

#![allow(clippy::unwrap_used)] // Tests can unwrap

use imgur_rest_core::route::endpoints::{album, gallery, image};
use imgur_rest_core::{ClientConfig, CompiledRoute, ParsingError, RestError};
use imgur_rest_runtime::{
    Decoder, RawResponse, Request, RequestState, Requester, RequesterConfig, RetryPolicy,
    TransportError,
};
use imgur_rest_testing::{fixtures, init_tracing, MockTransport, Scripted};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn fast_retries() -> RequesterConfig {
    RequesterConfig::default().with_retry_policy(
        RetryPolicy::builder()
            .max_retries(1)
            .initial_delay(Duration::from_millis(10))
            .build(),
    )
}

fn requester(transport: &MockTransport, config: RequesterConfig) -> Requester {
    init_tracing();
    Requester::new(transport.shared(), config)
}

fn image_route(hash: &str) -> CompiledRoute {
    image::GET_IMAGE.compile(&[hash]).unwrap()
}

fn title_decoder() -> Decoder<String> {
    Arc::new(|_, response: &RawResponse| {
        response.object()?.get_object("data")?.get_string("title")
    })
}

#[tokio::test]
async fn success_is_decoded() {
    let transport = MockTransport::new();
    transport.respond(fixtures::ok(fixtures::image("Xa1b2c3")));
    let requester = requester(&transport, RequesterConfig::default());

    let title = requester
        .submit(image_route("Xa1b2c3"), None, title_decoder(), None)
        .await;

    assert_eq!(title, Ok("Sunset over the bay".to_string()));
    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].path, "image/Xa1b2c3");
}

#[tokio::test]
async fn standard_headers_are_sent() {
    let transport = MockTransport::new();
    transport.respond(fixtures::ok(fixtures::image("abc")));
    let config = ClientConfig::builder().client_id("c1ient").build().unwrap();
    let requester = requester(&transport, RequesterConfig::from_client_config(&config));

    requester
        .submit(image_route("abc"), None, title_decoder(), None)
        .await
        .unwrap();

    let headers = &transport.calls()[0].headers;
    assert!(headers.contains(&("Accept".to_string(), "application/json".to_string())));
    assert!(headers.contains(&("Authorization".to_string(), "Client-ID c1ient".to_string())));
    assert!(headers.iter().any(|(name, _)| name == "User-Agent"));
}

#[tokio::test]
async fn past_deadline_never_reaches_transport() {
    let transport = MockTransport::new();
    transport.always(Scripted::Respond(fixtures::ok(fixtures::image("abc"))));
    let requester = requester(&transport, RequesterConfig::default());

    let outcome = requester
        .submit(image_route("abc"), None, title_decoder(), Some(Instant::now()))
        .await;

    assert_eq!(outcome, Err(RestError::DeadlineExceeded));
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn attempt_running_past_deadline_is_abandoned() {
    let transport = MockTransport::new();
    transport.hang();
    let requester = requester(&transport, fast_retries());

    let deadline = Instant::now() + Duration::from_millis(50);
    let handle = requester.submit(image_route("abc"), None, title_decoder(), Some(deadline));

    assert_eq!(handle.clone().await, Err(RestError::DeadlineExceeded));
    assert_eq!(handle.state(), Some(RequestState::Failed));
    assert_eq!(transport.call_count(), 1);
    assert_eq!(transport.aborted(), 1);
}

#[tokio::test]
async fn cancelling_queued_request_skips_transport() {
    let transport = MockTransport::new();
    transport.hang();
    let config = RequesterConfig {
        max_concurrency: 1,
        ..RequesterConfig::default()
    };
    let requester = requester(&transport, config);

    let blocker = requester.submit(image_route("first"), None, title_decoder(), None);
    transport.wait_for_calls(1).await;

    let queued = requester.submit(image_route("second"), None, title_decoder(), None);
    assert!(queued.cancel());
    assert_eq!(queued.try_result(), Some(Err(RestError::Cancelled)));
    assert_eq!(queued.state(), Some(RequestState::Cancelled));

    assert!(blocker.cancel());
    assert_eq!(blocker.clone().await, Err(RestError::Cancelled));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.call_count(), 1);
    assert!(!queued.cancel());
}

#[tokio::test]
async fn cancelling_in_flight_request_aborts_the_call() {
    let transport = MockTransport::new();
    transport.hang();
    let requester = requester(&transport, RequesterConfig::default());

    let handle = requester.submit(image_route("abc"), None, title_decoder(), None);
    transport.wait_for_calls(1).await;
    assert_eq!(handle.state(), Some(RequestState::InFlight));

    assert!(handle.cancel());
    assert_eq!(handle.clone().await, Err(RestError::Cancelled));
    assert_eq!(handle.state(), Some(RequestState::Cancelled));
    assert_eq!(transport.aborted(), 1);
    assert!(!handle.cancel());
}

#[tokio::test]
async fn cancelling_before_submission_is_not_queued() {
    let transport = MockTransport::new();
    let requester = requester(&transport, RequesterConfig::default());

    let request = Request::with_decoder(image_route("abc"), title_decoder());
    let early = request.handle();
    assert!(early.cancel());

    let handle = requester.submit_request(request);
    assert_eq!(handle.await, Err(RestError::Cancelled));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn resolution_is_exactly_once() {
    let transport = MockTransport::new();
    transport.respond(fixtures::ok(fixtures::image("abc")));
    let requester = requester(&transport, RequesterConfig::default());

    let calls = Arc::new(AtomicUsize::new(0));
    let handle = requester.submit(image_route("abc"), None, title_decoder(), None);
    let counter = Arc::clone(&calls);
    handle.on_complete(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(handle.clone().await.is_ok());
    assert!(!handle.cancel());
    assert!(handle.clone().await.is_ok());

    let counter = Arc::clone(&calls);
    handle.on_complete(move |_| {
        counter.fetch_add(10, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 11);
}

#[tokio::test]
async fn transient_failure_is_retried_once() {
    let transport = MockTransport::new();
    transport
        .respond(fixtures::error(503, "Over capacity"))
        .respond(fixtures::ok(fixtures::image("abc")));
    let requester = requester(&transport, fast_retries());

    let outcome = requester
        .submit(image_route("abc"), None, title_decoder(), None)
        .await;

    assert_eq!(outcome, Ok("Sunset over the bay".to_string()));
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn transport_failure_is_retried() {
    let transport = MockTransport::new();
    transport
        .fail("connection reset by peer")
        .respond(fixtures::ok(fixtures::image("abc")));
    let requester = requester(&transport, fast_retries());

    let outcome = requester
        .submit(image_route("abc"), None, title_decoder(), None)
        .await;

    assert!(outcome.is_ok());
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn retries_are_exhausted() {
    let transport = MockTransport::new();
    transport.always(Scripted::Respond(fixtures::error(429, "slow down")));
    let requester = requester(&transport, fast_retries());

    let outcome = requester
        .submit(image_route("abc"), None, title_decoder(), None)
        .await;

    assert_eq!(
        outcome,
        Err(RestError::TransientServer {
            status: 429,
            message: "slow down".into()
        })
    );
    assert_eq!(transport.call_count(), 2);
}

#[tokio::test]
async fn disabled_retries_surface_first_failure() {
    let transport = MockTransport::new();
    transport
        .respond(fixtures::error(500, "Internal error"))
        .respond(fixtures::ok(fixtures::image("abc")));
    let requester = requester(
        &transport,
        RequesterConfig::default().with_retry_policy(RetryPolicy::never()),
    );

    let outcome = requester
        .submit(image_route("abc"), None, title_decoder(), None)
        .await;

    assert!(matches!(outcome, Err(RestError::TransientServer { status: 500, .. })));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let transport = MockTransport::new();
    transport.always(Scripted::Respond(fixtures::error(404, "Unable to find an image")));
    let requester = requester(&transport, fast_retries());

    let outcome = requester
        .submit(image_route("abc"), None, title_decoder(), None)
        .await;

    assert_eq!(
        outcome,
        Err(RestError::Http {
            status: 404,
            message: "Unable to find an image".into()
        })
    );
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn decoding_failures_are_not_retried() {
    let transport = MockTransport::new();
    transport.always(Scripted::Respond(fixtures::ok(serde_json::json!({"id": "abc"}))));
    let requester = requester(&transport, fast_retries());

    let outcome = requester
        .submit(image_route("abc"), None, title_decoder(), None)
        .await;

    assert_eq!(
        outcome,
        Err(RestError::Parsing(ParsingError::MissingField("title".into())))
    );
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn concurrency_is_bounded() {
    let transport = MockTransport::new();
    transport.always(Scripted::Delay(
        Duration::from_millis(30),
        fixtures::ok(fixtures::image("abc")),
    ));
    let config = RequesterConfig {
        max_concurrency: 2,
        ..RequesterConfig::default()
    };
    let requester = requester(&transport, config);

    let routes = [
        image_route("a"),
        image_route("b"),
        album::GET_ALBUM.compile(&["c"]).unwrap(),
        album::GET_ALBUM_IMAGES.compile(&["d"]).unwrap(),
        gallery::GET_GALLERY_IMAGE.compile(&["e"]).unwrap(),
    ];
    let handles: Vec<_> = routes
        .into_iter()
        .map(|route| requester.submit(route, None, title_decoder(), None))
        .collect();

    for handle in handles {
        assert!(handle.await.is_ok());
    }
    assert_eq!(transport.call_count(), 5);
    assert!(transport.peak_in_flight() <= 2);
}

#[tokio::test]
async fn bucket_is_dispatched_in_order() {
    let transport = MockTransport::new();
    transport.always(Scripted::Respond(fixtures::ok(fixtures::image("abc"))));
    let config = RequesterConfig {
        max_concurrency: 1,
        ..RequesterConfig::default()
    };
    let requester = requester(&transport, config);

    let handles: Vec<_> = ["one", "two", "three", "four"]
        .iter()
        .map(|hash| requester.submit(image_route(hash), None, title_decoder(), None))
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let paths: Vec<String> = transport.calls().into_iter().map(|call| call.path).collect();
    assert_eq!(paths, ["image/one", "image/two", "image/three", "image/four"]);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_bucket_waits_without_blocking_others() {
    let transport = MockTransport::new();
    transport
        .respond(fixtures::ok(fixtures::image("first")).with_header("Retry-After", "5"))
        .always(Scripted::Respond(fixtures::ok(fixtures::image("abc"))));
    let requester = requester(&transport, RequesterConfig::default());

    requester
        .submit(image_route("first"), None, title_decoder(), None)
        .await
        .unwrap();
    let state = requester.rate_limit("GET image/{hash}").await.unwrap();
    assert!(state.resume_at.is_some());

    let started = Instant::now();
    let limited = requester.submit(image_route("second"), None, title_decoder(), None);
    let other = requester.submit(
        album::GET_ALBUM.compile(&["alb"]).unwrap(),
        None,
        title_decoder(),
        None,
    );

    other.await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(1));

    limited.await.unwrap();
    assert!(started.elapsed() >= Duration::from_secs(4));
    assert_eq!(transport.call_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn bucket_delay_past_deadline_fails_fast() {
    let transport = MockTransport::new();
    transport
        .respond(fixtures::ok(fixtures::image("first")).with_header("retry-after", "60"))
        .always(Scripted::Respond(fixtures::ok(fixtures::image("abc"))));
    let requester = requester(&transport, RequesterConfig::default());

    requester
        .submit(image_route("first"), None, title_decoder(), None)
        .await
        .unwrap();

    let started = Instant::now();
    let deadline = started + Duration::from_secs(10);
    let outcome = requester
        .submit(image_route("second"), None, title_decoder(), Some(deadline))
        .await;

    assert_eq!(outcome, Err(RestError::DeadlineExceeded));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn retry_after_shutdown_resolves() {
    let transport = MockTransport::new();
    transport.delay(Duration::from_millis(30), fixtures::error(502, "Bad Gateway"));
    let requester = requester(&transport, fast_retries());

    let handle = requester.submit(image_route("abc"), None, title_decoder(), None);
    drop(requester);

    assert_eq!(handle.await, Err(RestError::Shutdown));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn derived_results_share_cancellation() {
    let transport = MockTransport::new();
    transport.hang();
    let requester = requester(&transport, RequesterConfig::default());

    let handle = requester.submit(image_route("abc"), None, title_decoder(), None);
    let length = handle.map(|title| title.len());
    transport.wait_for_calls(1).await;

    assert!(length.cancel());
    assert_eq!(length.await, Err(RestError::Cancelled));
    assert_eq!(handle.await, Err(RestError::Cancelled));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_wait_from_plain_thread() {
    let transport = MockTransport::new();
    transport.delay(Duration::from_millis(20), fixtures::ok(fixtures::image("abc")));
    let requester = requester(&transport, RequesterConfig::default());

    let handle = requester.submit(image_route("abc"), None, title_decoder(), None);
    let waited = tokio::task::spawn_blocking(move || handle.wait())
        .await
        .unwrap();

    assert_eq!(waited, Ok("Sunset over the bay".to_string()));
}

#[test]
fn runtime_teardown_resolves_in_flight_requests() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let transport = MockTransport::new();
    transport.hang();

    let handle = runtime.block_on(async {
        let requester = requester(&transport, RequesterConfig::default());
        let handle = requester.submit(image_route("abc"), None, title_decoder(), None);
        transport.wait_for_calls(1).await;
        handle
    });
    drop(runtime);

    assert_eq!(
        handle.wait_timeout(Duration::from_secs(1)),
        Some(Err(RestError::Shutdown))
    );
    assert_eq!(handle.state(), Some(RequestState::Failed));
}

#[tokio::test]
async fn oversized_timeout_still_dispatches() {
    let transport = MockTransport::new();
    transport.respond(fixtures::ok(fixtures::image("abc")));
    let config = ClientConfig::builder()
        .request_timeout(Duration::from_secs(u64::MAX / 2))
        .build()
        .unwrap();
    let requester = requester(&transport, RequesterConfig::from_client_config(&config));

    let title = requester
        .submit(image_route("abc"), None, title_decoder(), None)
        .await;

    assert_eq!(title, Ok("Sunset over the bay".to_string()));
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test]
async fn local_transport_failures_are_not_retried() {
    let transport = MockTransport::new();
    transport.push(Scripted::Fail(TransportError::permanent("Invalid MIME type `x`")));
    transport.respond(fixtures::ok(fixtures::image("abc")));
    let requester = requester(&transport, fast_retries());

    let outcome = requester
        .submit(image_route("abc"), None, title_decoder(), None)
        .await;

    assert_eq!(outcome, Err(RestError::Local("Invalid MIME type `x`".into())));
    assert_eq!(transport.call_count(), 1);
}
