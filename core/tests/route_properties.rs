//! Property tests for route compilation

#![allow(clippy::unwrap_used)] // Tests can unwrap

use imgur_rest_core::route::endpoints::{album, comment, gallery, image};
use imgur_rest_core::{RestError, Route};
use proptest::prelude::*;

const ROUTES: &[Route] = &[
    image::GET_IMAGE,
    image::UPLOAD_IMAGE,
    album::GET_ALBUM_IMAGE,
    album::ADD_ALBUM_IMAGES,
    gallery::GET_GALLERY,
    gallery::SEARCH_GALLERY,
    gallery::VOTE,
    comment::VOTE,
    comment::POST_COMMENT,
];

fn identifier() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,16}"
}

proptest! {
    #[test]
    fn matching_params_always_compile(
        index in 0..ROUTES.len(),
        pool in prop::collection::vec(identifier(), 4),
    ) {
        let route = ROUTES[index];
        let params: Vec<&str> = pool.iter().take(route.slot_count()).map(String::as_str).collect();

        let compiled = route.compile(&params).unwrap();
        let has_open_brace = compiled.path().contains('{');
        prop_assert!(!has_open_brace);
        let has_close_brace = compiled.path().contains('}');
        prop_assert!(!has_close_brace);
        prop_assert_eq!(compiled.bucket(), route.bucket_key());
        prop_assert_eq!(compiled.method(), route.method());
        for param in &params {
            prop_assert!(compiled.path().contains(param));
        }
    }

    #[test]
    fn mismatched_count_always_fails(
        index in 0..ROUTES.len(),
        extra in 1_usize..3,
        pool in prop::collection::vec(identifier(), 8),
    ) {
        let route = ROUTES[index];
        let params: Vec<&str> = pool.iter().take(route.slot_count() + extra).map(String::as_str).collect();
        let is_validation = matches!(route.compile(&params), Err(RestError::Validation { .. }));
        prop_assert!(is_validation);

        if route.slot_count() > 0 {
            let short: Vec<&str> = pool.iter().take(route.slot_count() - 1).map(String::as_str).collect();
            let is_validation = matches!(route.compile(&short), Err(RestError::Validation { .. }));
            prop_assert!(is_validation);
        }
    }

    #[test]
    fn blank_param_always_fails(
        index in 0..ROUTES.len(),
        blank in "[ \t]{0,4}",
        pool in prop::collection::vec(identifier(), 4),
        position in 0_usize..4,
    ) {
        let route = ROUTES[index];
        prop_assume!(route.slot_count() > 0);

        let mut params: Vec<&str> = pool.iter().take(route.slot_count()).map(String::as_str).collect();
        let position = position % params.len();
        params[position] = blank.as_str();

        let slot = route.slots().nth(position).unwrap();
        match route.compile(&params) {
            Err(RestError::Validation { name, .. }) => prop_assert_eq!(name, slot),
            other => prop_assert!(false, "expected validation failure, got {:?}", other),
        }
    }
}
