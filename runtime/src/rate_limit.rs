//! Per-bucket rate-limit bookkeeping.
//!
//! Every response is inspected for the API's rate-limit headers and recorded
//! against the bucket key of the route that produced it. A bucket whose
//! credits are exhausted, or which was told to back off with `retry-after`,
//! reports a delay until its reset instant; the dispatch lane of that bucket
//! waits it out before issuing its next call.
//!
//! | header | meaning |
//! |---|---|
//! | `x-ratelimit-userremaining` | credits left for the user |
//! | `x-ratelimit-userreset` | unix time at which user credits reset |
//! | `x-ratelimit-clientremaining` | credits left for the application |
//! | `x-ratelimit-clientreset` | unix time (or seconds) until client credits reset |
//! | `x-post-rate-limit-reset` | seconds until uploads are allowed again |
//! | `retry-after` | seconds to wait before the next call |

use crate::request::instant_after;
use crate::transport::RawResponse;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

const USER_REMAINING: &str = "x-ratelimit-userremaining";
const USER_RESET: &str = "x-ratelimit-userreset";
const CLIENT_REMAINING: &str = "x-ratelimit-clientremaining";
const CLIENT_RESET: &str = "x-ratelimit-clientreset";
const POST_RESET: &str = "x-post-rate-limit-reset";
const RETRY_AFTER: &str = "retry-after";

// Reset values below this are relative seconds rather than unix timestamps.
const EPOCH_THRESHOLD: i64 = 1_000_000_000;

/// What is known about one bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketState {
    /// Last reported user credits
    pub user_remaining: Option<u64>,
    /// Last reported client credits
    pub client_remaining: Option<u64>,
    /// Dispatch is held back until this instant
    pub resume_at: Option<Instant>,
}

impl BucketState {
    fn is_exhausted(&self) -> bool {
        self.user_remaining == Some(0) || self.client_remaining == Some(0)
    }
}

/// Rate-limit state of all buckets, guarded by one mutex
#[derive(Debug, Default)]
pub struct RateLimits {
    buckets: Mutex<HashMap<String, BucketState>>,
}

impl RateLimits {
    /// Empty map; every bucket starts unrestricted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the rate-limit headers of `response` against `bucket`.
    ///
    /// Returns the delay now imposed on the bucket, if any.
    pub async fn record(&self, bucket: &str, response: &RawResponse) -> Option<Duration> {
        let now = Instant::now();
        let backoff = backoff_from_headers(response, Utc::now().timestamp());
        let user_remaining = header_u64(response, USER_REMAINING);
        let client_remaining = header_u64(response, CLIENT_REMAINING);

        let mut buckets = self.buckets.lock().await;
        let state = buckets.entry(bucket.to_string()).or_default();
        if user_remaining.is_some() {
            state.user_remaining = user_remaining;
        }
        if client_remaining.is_some() {
            state.client_remaining = client_remaining;
        }

        match backoff {
            Some(delay) => state.resume_at = Some(instant_after(now, delay)),
            None if !state.is_exhausted()
                && (user_remaining.is_some() || client_remaining.is_some()) =>
            {
                state.resume_at = None;
            }
            None => {}
        }

        state
            .resume_at
            .map(|at| at.saturating_duration_since(now))
            .filter(|delay| !delay.is_zero())
    }

    /// How long `bucket` must wait before its next dispatch, as of `now`.
    pub async fn delay(&self, bucket: &str, now: Instant) -> Option<Duration> {
        let buckets = self.buckets.lock().await;
        buckets
            .get(bucket)
            .and_then(|state| state.resume_at)
            .map(|at| at.saturating_duration_since(now))
            .filter(|delay| !delay.is_zero())
    }

    /// Copy of the state recorded for `bucket`.
    pub async fn snapshot(&self, bucket: &str) -> Option<BucketState> {
        self.buckets.lock().await.get(bucket).cloned()
    }
}

fn header_u64(response: &RawResponse, name: &str) -> Option<u64> {
    response.header(name)?.trim().parse().ok()
}

fn header_i64(response: &RawResponse, name: &str) -> Option<i64> {
    response.header(name)?.trim().parse().ok()
}

/// Seconds until `reset`, which is either a unix timestamp or already a
/// relative number of seconds.
fn until_reset(reset: i64, now_epoch: i64) -> Duration {
    let secs = if reset >= EPOCH_THRESHOLD {
        reset.saturating_sub(now_epoch)
    } else {
        reset
    };
    Duration::from_secs(u64::try_from(secs).unwrap_or(0))
}

/// Longest delay any header asks for.
fn backoff_from_headers(response: &RawResponse, now_epoch: i64) -> Option<Duration> {
    let mut candidates = Vec::new();

    if let Some(secs) = header_u64(response, RETRY_AFTER) {
        candidates.push(Duration::from_secs(secs));
    }
    if let Some(secs) = header_u64(response, POST_RESET) {
        candidates.push(Duration::from_secs(secs));
    }
    if header_u64(response, USER_REMAINING) == Some(0) {
        if let Some(reset) = header_i64(response, USER_RESET) {
            candidates.push(until_reset(reset, now_epoch));
        }
    }
    if header_u64(response, CLIENT_REMAINING) == Some(0) {
        if let Some(reset) = header_i64(response, CLIENT_RESET) {
            candidates.push(until_reset(reset, now_epoch));
        }
    }

    candidates.into_iter().max().filter(|delay| !delay.is_zero())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests can unwrap
mod tests {
    use super::*;
    use imgur_rest_core::route::endpoints::{gallery, image};

    const NOW: i64 = 1_700_000_000;

    fn response(headers: &[(&str, &str)]) -> RawResponse {
        RawResponse::new(200, headers.iter().copied(), "{}")
    }

    #[test]
    fn no_headers_no_backoff() {
        assert_eq!(backoff_from_headers(&response(&[]), NOW), None);
    }

    #[test]
    fn retry_after_is_seconds() {
        let response = response(&[("Retry-After", "7")]);
        assert_eq!(backoff_from_headers(&response, NOW), Some(Duration::from_secs(7)));
    }

    #[test]
    fn exhausted_user_credits_wait_for_reset() {
        let reset = (NOW + 120).to_string();
        let response = response(&[
            ("X-RateLimit-UserRemaining", "0"),
            ("X-RateLimit-UserReset", reset.as_str()),
        ]);
        assert_eq!(
            backoff_from_headers(&response, NOW),
            Some(Duration::from_secs(120))
        );
    }

    #[test]
    fn remaining_credits_ignore_reset() {
        let reset = (NOW + 120).to_string();
        let response = response(&[
            ("X-RateLimit-UserRemaining", "3"),
            ("X-RateLimit-UserReset", reset.as_str()),
        ]);
        assert_eq!(backoff_from_headers(&response, NOW), None);
    }

    #[test]
    fn longest_delay_wins() {
        let response = response(&[
            ("retry-after", "2"),
            ("x-post-rate-limit-reset", "30"),
            ("x-ratelimit-clientremaining", "0"),
            ("x-ratelimit-clientreset", "10"),
        ]);
        assert_eq!(
            backoff_from_headers(&response, NOW),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn past_reset_is_no_delay() {
        let reset = (NOW - 5).to_string();
        let response = response(&[
            ("x-ratelimit-userremaining", "0"),
            ("x-ratelimit-userreset", reset.as_str()),
        ]);
        assert_eq!(backoff_from_headers(&response, NOW), None);
    }

    #[tokio::test]
    async fn buckets_are_independent() {
        let votes = gallery::GET_VOTES.compile(&["abc"]).unwrap();
        let image = image::GET_IMAGE.compile(&["abc"]).unwrap();
        assert_eq!(votes.bucket(), "GET gallery/{hash}/votes");
        assert_eq!(image.bucket(), "GET image/{hash}");

        let limits = RateLimits::new();
        let delay = limits
            .record(votes.bucket(), &response(&[("retry-after", "60")]))
            .await;
        assert!(delay.is_some());

        let now = Instant::now();
        assert!(limits.delay(votes.bucket(), now).await.is_some());
        assert_eq!(limits.delay(image.bucket(), now).await, None);
    }

    #[tokio::test]
    async fn huge_retry_after_is_clamped() {
        let limits = RateLimits::new();
        let retry_after = u64::MAX.to_string();
        let delay = limits
            .record("POST image", &response(&[("retry-after", retry_after.as_str())]))
            .await;

        let delay = delay.unwrap();
        assert!(delay > Duration::from_secs(86_400 * 365));
        assert!(delay < Duration::from_secs(u64::MAX / 2));
    }

    #[tokio::test]
    async fn replenished_credits_clear_the_delay() {
        let limits = RateLimits::new();
        limits
            .record(
                "POST image",
                &response(&[("x-ratelimit-userremaining", "0"), ("retry-after", "60")]),
            )
            .await;
        assert!(limits.delay("POST image", Instant::now()).await.is_some());

        limits
            .record("POST image", &response(&[("x-ratelimit-userremaining", "500")]))
            .await;
        assert_eq!(limits.delay("POST image", Instant::now()).await, None);

        let state = limits.snapshot("POST image").await.unwrap();
        assert_eq!(state.user_remaining, Some(500));
        assert_eq!(state.resume_at, None);
    }
}
