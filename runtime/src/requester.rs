//! The request pipeline.
//!
//! ```text
//!             submit()                 dispatcher                lanes (one per bucket)
//! callers ───────────────▶ intake ───────────────▶ ┌─▶ "GET image/{hash}"       ─┐
//!                            ▲                     ├─▶ "POST image"              ├─▶ attempts (≤ max_concurrency)
//!                            │                     └─▶ …                         ┘        │
//!                            └──────────────── retry after backoff ◀─────────────────────┘
//! ```
//!
//! - One unbounded intake channel keeps arrival order.
//! - The dispatcher routes each job to the lane of its bucket key. A lane is
//!   a task that handles its jobs strictly in order, waiting out the bucket's
//!   rate-limit delay before each dispatch. Lanes never block each other.
//! - A global semaphore bounds concurrent transport calls.
//! - Every wait (bucket delay, permit, transport call, backoff) races the
//!   request's cancel signal and its deadline.
//! - Transient failures are re-queued through the intake channel, so a retry
//!   lines up behind requests submitted in the meantime.

use crate::metrics::RequestMetrics;
use crate::rate_limit::{BucketState, RateLimits};
use crate::request::{instant_after, Control, Decoder, Job, Request, RequestState};
use crate::result::AsyncResult;
use crate::retry::RetryPolicy;
use crate::transport::{RawResponse, Transport, TransportCall};
use imgur_rest_core::config::{DEFAULT_MAX_CONCURRENCY, DEFAULT_REQUEST_TIMEOUT, DEFAULT_USER_AGENT};
use imgur_rest_core::{ClientConfig, CompiledRoute, Payload, RestError};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

type JobBox = Box<dyn Job>;

/// Requester configuration.
#[derive(Debug, Clone)]
pub struct RequesterConfig {
    /// Retry policy for transient failures
    pub retry_policy: RetryPolicy,
    /// Deadline applied to requests submitted without one
    pub request_timeout: Duration,
    /// Maximum number of concurrent transport calls
    pub max_concurrency: usize,
    /// Headers sent with every call
    pub default_headers: Vec<(String, String)>,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            default_headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string()),
            ],
        }
    }
}

impl RequesterConfig {
    /// Derive the requester settings from a client configuration.
    #[must_use]
    pub fn from_client_config(config: &ClientConfig) -> Self {
        let mut default_headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("User-Agent".to_string(), config.user_agent().to_string()),
        ];
        if let Some(client_id) = config.client_id() {
            default_headers.push(("Authorization".to_string(), format!("Client-ID {client_id}")));
        }

        Self {
            retry_policy: RetryPolicy::from_flags(config.flags()),
            request_timeout: config.request_timeout(),
            max_concurrency: config.max_concurrency(),
            default_headers,
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }
}

struct Shared {
    transport: Arc<dyn Transport>,
    config: RequesterConfig,
    rate_limits: RateLimits,
    permits: Arc<Semaphore>,
}

impl Shared {
    fn call_for(&self, job: &dyn Job) -> TransportCall {
        let route = &job.info().route;
        TransportCall {
            method: route.method(),
            path: route.path().to_string(),
            query: route.query().to_vec(),
            headers: self.config.default_headers.clone(),
            body: job.payload().cloned(),
        }
    }
}

/// Queues, executes, retries and resolves requests.
///
/// Cheap to clone; all clones feed the same pipeline. The pipeline shuts down
/// once every clone has been dropped and the queued work has drained.
/// Retries scheduled after that point resolve with [`RestError::Shutdown`].
#[derive(Clone)]
pub struct Requester {
    shared: Arc<Shared>,
    intake: UnboundedSender<JobBox>,
}

impl Requester {
    /// Start a requester on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, since the dispatcher task
    /// is spawned immediately.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: RequesterConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        let shared = Arc::new(Shared {
            transport,
            config,
            rate_limits: RateLimits::new(),
            permits,
        });

        let (intake, receiver) = mpsc::unbounded_channel();
        tokio::spawn(dispatch(Arc::clone(&shared), receiver, intake.downgrade()));

        Self { shared, intake }
    }

    /// Requester configuration.
    #[must_use]
    pub fn config(&self) -> &RequesterConfig {
        &self.shared.config
    }

    /// Build and submit a request.
    ///
    /// Without an explicit `deadline` the request gets `now + request_timeout`.
    pub fn submit<T>(
        &self,
        route: CompiledRoute,
        payload: Option<Payload>,
        decoder: Decoder<T>,
        deadline: Option<Instant>,
    ) -> AsyncResult<T>
    where
        T: Clone + Send + 'static,
    {
        let mut request = Request::with_decoder(route, decoder).with_payload(payload);
        if let Some(deadline) = deadline {
            request = request.with_deadline(deadline);
        }
        self.submit_request(request)
    }

    /// Submit a prepared request and return its handle.
    ///
    /// A request cancelled before submission is not queued; its handle
    /// already holds [`RestError::Cancelled`].
    pub fn submit_request<T>(&self, mut request: Request<T>) -> AsyncResult<T>
    where
        T: Clone + Send + 'static,
    {
        let deadline = instant_after(Instant::now(), self.shared.config.request_timeout);
        request.ensure_deadline(deadline);
        let handle = request.handle();
        if !request.mark_queued() {
            tracing::debug!(
                request_id = request.info().id,
                state = ?request.state(),
                "Request not queued"
            );
            return handle;
        }

        tracing::trace!(
            request_id = request.info().id,
            route = %request.info().route,
            "Request queued"
        );
        if let Err(mpsc::error::SendError(job)) = self.intake.send(Box::new(request)) {
            job.fail(RestError::Shutdown);
        }
        handle
    }

    /// Rate-limit state recorded for `bucket`.
    pub async fn rate_limit(&self, bucket: &str) -> Option<BucketState> {
        self.shared.rate_limits.snapshot(bucket).await
    }
}

impl fmt::Debug for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requester")
            .field("config", &self.shared.config)
            .field("available_permits", &self.shared.permits.available_permits())
            .finish_non_exhaustive()
    }
}

/// Run `future` unless the request is cancelled or its deadline passes first.
async fn guarded<F>(control: &Control, deadline: Instant, future: F) -> Result<F::Output, RestError>
where
    F: Future,
{
    tokio::select! {
        biased;
        () = control.cancel_requested() => Err(RestError::Cancelled),
        () = tokio::time::sleep_until(deadline) => Err(RestError::DeadlineExceeded),
        output = future => Ok(output),
    }
}

async fn dispatch(
    shared: Arc<Shared>,
    mut intake: UnboundedReceiver<JobBox>,
    requeue: WeakUnboundedSender<JobBox>,
) {
    let mut lanes: HashMap<String, UnboundedSender<JobBox>> = HashMap::new();

    while let Some(job) = intake.recv().await {
        let bucket = job.info().route.bucket().to_string();
        let lane = lanes.entry(bucket.clone()).or_insert_with(|| {
            tracing::debug!(bucket = %bucket, "Opening dispatch lane");
            let (sender, receiver) = mpsc::unbounded_channel();
            tokio::spawn(run_lane(
                Arc::clone(&shared),
                bucket.clone(),
                receiver,
                requeue.clone(),
            ));
            sender
        });

        if let Err(mpsc::error::SendError(job)) = lane.send(job) {
            job.fail(RestError::Shutdown);
        }
    }

    tracing::debug!("Requester intake closed, dispatcher stopping");
}

async fn run_lane(
    shared: Arc<Shared>,
    bucket: String,
    mut jobs: UnboundedReceiver<JobBox>,
    requeue: WeakUnboundedSender<JobBox>,
) {
    while let Some(mut job) = jobs.recv().await {
        if job.control().state() != RequestState::Queued {
            tracing::debug!(
                request_id = job.info().id,
                state = ?job.control().state(),
                "Skipping request that left the queue"
            );
            continue;
        }

        let deadline = job.deadline();
        let now = Instant::now();
        if now >= deadline {
            fail(&bucket, job, RestError::DeadlineExceeded);
            continue;
        }

        if let Some(delay) = shared.rate_limits.delay(&bucket, now).await {
            RequestMetrics::record_rate_limited(&bucket);
            if delay >= deadline.saturating_duration_since(now) {
                tracing::info!(
                    request_id = job.info().id,
                    bucket = %bucket,
                    delay_ms = delay.as_millis(),
                    "Bucket delay outlasts deadline"
                );
                fail(&bucket, job, RestError::DeadlineExceeded);
                continue;
            }

            tracing::info!(
                request_id = job.info().id,
                bucket = %bucket,
                delay_ms = delay.as_millis(),
                "Bucket rate limited, delaying dispatch"
            );
            let waited = guarded(job.control(), deadline, tokio::time::sleep(delay)).await;
            if let Err(err) = waited {
                fail(&bucket, job, err);
                continue;
            }
        }

        let acquired = guarded(
            job.control(),
            deadline,
            Arc::clone(&shared.permits).acquire_owned(),
        )
        .await;
        let permit = match acquired {
            Ok(Ok(permit)) => permit,
            Ok(Err(_closed)) => {
                fail(&bucket, job, RestError::Shutdown);
                continue;
            }
            Err(err) => {
                fail(&bucket, job, err);
                continue;
            }
        };

        if !job
            .control()
            .transition(RequestState::Queued, RequestState::InFlight)
        {
            // Cancelled while waiting for the permit.
            continue;
        }

        let attempt = job.begin_attempt();
        tracing::debug!(
            request_id = job.info().id,
            bucket = %bucket,
            attempt,
            "Dispatching request"
        );
        RequestMetrics::record_dispatch(&bucket);

        tokio::spawn(run_attempt(
            Arc::clone(&shared),
            bucket.clone(),
            job,
            permit,
            requeue.clone(),
        ));
    }
}

async fn run_attempt(
    shared: Arc<Shared>,
    bucket: String,
    job: JobBox,
    permit: OwnedSemaphorePermit,
    requeue: WeakUnboundedSender<JobBox>,
) {
    let call = shared.call_for(job.as_ref());
    let started = Instant::now();
    let outcome = guarded(job.control(), job.deadline(), shared.transport.issue(call)).await;
    drop(permit);
    RequestMetrics::record_duration(&bucket, started.elapsed());

    let classified = match outcome {
        Err(RestError::Cancelled) => {
            tracing::debug!(request_id = job.info().id, "In-flight request aborted");
            job.fail(RestError::Cancelled);
            return;
        }
        Err(err) => {
            fail(&bucket, job, err);
            return;
        }
        Ok(Err(err)) => Err(RestError::from(err)),
        Ok(Ok(response)) => {
            shared.rate_limits.record(&bucket, &response).await;
            classify(response)
        }
    };

    match classified {
        Ok(response) => {
            tracing::trace!(
                request_id = job.info().id,
                status = response.status(),
                "Request succeeded"
            );
            job.succeed(&response);
        }
        Err(err) => handle_failure(&shared, &bucket, job, err, &requeue).await,
    }
}

fn classify(response: RawResponse) -> Result<RawResponse, RestError> {
    let status = response.status();
    if response.is_success() {
        Ok(response)
    } else if status == 429 || status >= 500 {
        Err(RestError::TransientServer {
            status,
            message: response.error_message(),
        })
    } else {
        Err(RestError::Http {
            status,
            message: response.error_message(),
        })
    }
}

async fn handle_failure(
    shared: &Shared,
    bucket: &str,
    job: JobBox,
    error: RestError,
    requeue: &WeakUnboundedSender<JobBox>,
) {
    let deadline = job.deadline();
    let attempt = job.info().attempt;
    let Some(delay) =
        shared
            .config
            .retry_policy
            .retry_delay(&error, attempt, Instant::now(), deadline)
    else {
        fail(bucket, job, error);
        return;
    };

    if job.control().is_cancel_requested() {
        job.fail(RestError::Cancelled);
        return;
    }
    if !job
        .control()
        .transition(RequestState::InFlight, RequestState::Queued)
    {
        return;
    }

    tracing::warn!(
        request_id = job.info().id,
        bucket = %bucket,
        attempt,
        delay_ms = delay.as_millis(),
        error = %error,
        "Transient failure, retrying"
    );
    RequestMetrics::record_retry(bucket);

    let waited = guarded(job.control(), deadline, tokio::time::sleep(delay)).await;
    if let Err(err) = waited {
        fail(bucket, job, err);
        return;
    }

    match requeue.upgrade() {
        Some(intake) => {
            if let Err(mpsc::error::SendError(job)) = intake.send(job) {
                fail(bucket, job, RestError::Shutdown);
            }
        }
        None => fail(bucket, job, RestError::Shutdown),
    }
}

/// Resolve `job` with `error`, logging and counting the failure.
fn fail(bucket: &str, job: JobBox, error: RestError) {
    if matches!(error, RestError::Cancelled) {
        job.fail(error);
        return;
    }

    match &error {
        RestError::Parsing(_) | RestError::Local(_) | RestError::Shutdown => tracing::error!(
            request_id = job.info().id,
            bucket = %bucket,
            attempt = job.info().attempt,
            error = %error,
            "Request failed"
        ),
        _ => tracing::warn!(
            request_id = job.info().id,
            bucket = %bucket,
            attempt = job.info().attempt,
            error = %error,
            "Request failed"
        ),
    }
    RequestMetrics::record_failure(bucket, error.kind());
    job.fail(error);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests can unwrap
mod tests {
    use super::*;
    use imgur_rest_core::ConfigFlag;

    #[test]
    fn headers_follow_client_config() {
        let config = ClientConfig::builder()
            .client_id("abc123")
            .user_agent("gallery-sync/2.0")
            .build()
            .unwrap();
        let requester = RequesterConfig::from_client_config(&config);

        assert!(requester
            .default_headers
            .contains(&("Authorization".to_string(), "Client-ID abc123".to_string())));
        assert!(requester
            .default_headers
            .contains(&("User-Agent".to_string(), "gallery-sync/2.0".to_string())));
        assert_eq!(requester.retry_policy.max_retries, 1);
    }

    #[test]
    fn anonymous_config_has_no_authorization() {
        let config = ClientConfig::builder()
            .disable(ConfigFlag::RetryOnTimeout)
            .build()
            .unwrap();
        let requester = RequesterConfig::from_client_config(&config);

        assert!(requester
            .default_headers
            .iter()
            .all(|(name, _)| name != "Authorization"));
        assert_eq!(requester.retry_policy.max_retries, 0);
    }

    #[test]
    fn classification() {
        let ok = RawResponse::json(200, &serde_json::json!({"data": {}}));
        assert!(classify(ok).is_ok());

        let throttled = RawResponse::json(429, &serde_json::json!({"data": {"error": "slow down"}}));
        assert_eq!(
            classify(throttled),
            Err(RestError::TransientServer {
                status: 429,
                message: "slow down".into()
            })
        );

        let unavailable = RawResponse::new(503, Vec::<(&str, &str)>::new(), "Over capacity");
        assert!(classify(unavailable).is_err_and(|err| err.is_transient()));

        let missing = RawResponse::json(404, &serde_json::json!({"data": {"error": "not found"}}));
        assert_eq!(
            classify(missing),
            Err(RestError::Http {
                status: 404,
                message: "not found".into()
            })
        );
    }
}
