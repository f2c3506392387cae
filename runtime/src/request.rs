//! The unit of work handed to the requester.
//!
//! A [`Request`] owns a compiled route, an optional payload, a decoder and a
//! deadline. Its lifecycle is tracked by an atomic [`RequestState`] with
//! compare-and-swap transitions, so the dispatcher and a cancelling caller can
//! never both win a transition:
//!
//! ```text
//! Created ──▶ Queued ──▶ InFlight ──▶ Succeeded | Failed | Cancelled
//!               ▲           │
//!               └── retry ──┘
//! ```
//!
//! Cancelling a `Created`/`Queued` request moves it straight to `Cancelled`.
//! Cancelling an `InFlight` request raises its cancel signal; the dispatcher
//! aborts the transport call and performs the final transition itself.
//!
//! A request dropped before it terminated (never submitted, or torn down with
//! the runtime) fails its handle with [`RestError::Shutdown`].

use crate::result::{AsyncResult, Canceller, Completion};
use crate::transport::RawResponse;
use imgur_rest_core::{CompiledRoute, ParsingError, Payload, RestError};
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// About thirty years; longer waits are clamped to it.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + after` without overflowing on absurd durations.
pub(crate) fn instant_after(now: Instant, after: Duration) -> Instant {
    now + after.min(FAR_FUTURE)
}

/// Decodes a successful response into a typed value
pub type Decoder<T> =
    Arc<dyn Fn(&RequestInfo, &RawResponse) -> Result<T, ParsingError> + Send + Sync>;

/// Lifecycle state of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RequestState {
    /// Built but not yet handed to the requester
    Created = 0,
    /// Waiting in a dispatch lane
    Queued = 1,
    /// A transport call is running
    InFlight = 2,
    /// Decoded and delivered
    Succeeded = 3,
    /// Terminated with an error
    Failed = 4,
    /// Cancelled by the caller
    Cancelled = 5,
}

impl RequestState {
    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Queued,
            2 => Self::InFlight,
            3 => Self::Succeeded,
            4 => Self::Failed,
            _ => Self::Cancelled,
        }
    }
}

/// Identity of a request as seen by its decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestInfo {
    /// Process-unique request id
    pub id: u64,
    /// The route being executed
    pub route: CompiledRoute,
    /// Number of transport attempts started so far
    pub attempt: u32,
}

/// What a cancel request achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CancelOutcome {
    /// The request was not dispatched yet and is now `Cancelled`
    Immediate,
    /// The request is in flight; the dispatcher will abort it
    Signalled,
    /// The request had already terminated
    AlreadyTerminal,
}

/// Shared lifecycle state of one request
pub(crate) struct Control {
    state: AtomicU8,
    cancel: watch::Sender<bool>,
}

impl Control {
    fn new() -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            state: AtomicU8::new(RequestState::Created as u8),
            cancel,
        }
    }

    pub(crate) fn state(&self) -> RequestState {
        RequestState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Compare-and-swap `from → to`.
    pub(crate) fn transition(&self, from: RequestState, to: RequestState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Move from any non-terminal state to `to`. False if already terminal.
    pub(crate) fn terminate(&self, to: RequestState) -> bool {
        let mut current = self.state();
        loop {
            if current.is_terminal() {
                return false;
            }
            match self.state.compare_exchange(
                current as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(actual) => current = RequestState::from_u8(actual),
            }
        }
    }

    pub(crate) fn request_cancel(&self) -> CancelOutcome {
        let mut current = self.state();
        loop {
            match current {
                RequestState::Created | RequestState::Queued => {
                    if self.transition(current, RequestState::Cancelled) {
                        self.cancel.send_replace(true);
                        return CancelOutcome::Immediate;
                    }
                }
                RequestState::InFlight => {
                    self.cancel.send_replace(true);
                    return CancelOutcome::Signalled;
                }
                _ => return CancelOutcome::AlreadyTerminal,
            }
            current = self.state();
        }
    }

    pub(crate) fn is_cancel_requested(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves once cancellation has been requested.
    pub(crate) async fn cancel_requested(&self) {
        let mut rx = self.cancel.subscribe();
        // The sender lives as long as `self`, so `wait_for` only returns once
        // the flag is set.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("state", &self.state())
            .field("cancel_requested", &self.is_cancel_requested())
            .finish()
    }
}

/// One HTTP call plus everything needed to resolve its caller
pub struct Request<T> {
    info: RequestInfo,
    payload: Option<Payload>,
    decoder: Decoder<T>,
    deadline: Option<Instant>,
    control: Arc<Control>,
    completion: Arc<Completion<T>>,
}

impl<T> Request<T>
where
    T: Clone + Send + 'static,
{
    /// New request for `route`, decoded by `decoder`.
    pub fn new<F>(route: CompiledRoute, decoder: F) -> Self
    where
        F: Fn(&RequestInfo, &RawResponse) -> Result<T, ParsingError> + Send + Sync + 'static,
    {
        Self::with_decoder(route, Arc::new(decoder))
    }

    /// New request sharing an existing decoder.
    #[must_use]
    pub fn with_decoder(route: CompiledRoute, decoder: Decoder<T>) -> Self {
        Self {
            info: RequestInfo {
                id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
                route,
                attempt: 0,
            },
            payload: None,
            decoder,
            deadline: None,
            control: Arc::new(Control::new()),
            completion: Arc::new(Completion::pending()),
        }
    }

    /// Attach a body.
    #[must_use]
    pub fn with_payload(mut self, payload: Option<Payload>) -> Self {
        self.payload = payload;
        self
    }

    /// Attach an absolute deadline. Without one, the requester applies its
    /// global timeout at submission.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Request identity.
    #[must_use]
    pub const fn info(&self) -> &RequestInfo {
        &self.info
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> RequestState {
        self.control.state()
    }

    /// Caller-facing handle bound to this request.
    #[must_use]
    pub fn handle(&self) -> AsyncResult<T> {
        let canceller: Arc<dyn Canceller> = Arc::new(RequestCanceller {
            control: Arc::clone(&self.control),
            completion: Arc::clone(&self.completion),
        });
        AsyncResult::bound(Arc::clone(&self.completion), canceller, Arc::clone(&self.control))
    }

    pub(crate) fn ensure_deadline(&mut self, default: Instant) {
        self.deadline.get_or_insert(default);
    }

    pub(crate) fn mark_queued(&self) -> bool {
        self.control.transition(RequestState::Created, RequestState::Queued)
    }

    fn finish(&self, outcome: Result<T, RestError>) -> bool {
        let terminal = match &outcome {
            Ok(_) => RequestState::Succeeded,
            Err(RestError::Cancelled) => RequestState::Cancelled,
            Err(_) => RequestState::Failed,
        };
        if !self.control.terminate(terminal) {
            tracing::debug!(
                request_id = self.info.id,
                state = ?self.control.state(),
                "Discarding outcome for already terminated request"
            );
            return false;
        }
        self.completion.resolve(outcome)
    }
}

impl<T> Drop for Request<T> {
    fn drop(&mut self) {
        if self.control.terminate(RequestState::Failed) {
            tracing::debug!(
                request_id = self.info.id,
                "Request dropped before it terminated"
            );
            self.completion.abandon(&RestError::Shutdown);
        }
    }
}

impl<T> fmt::Debug for Request<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("info", &self.info)
            .field("payload", &self.payload.is_some())
            .field("deadline", &self.deadline)
            .field("control", &self.control)
            .finish_non_exhaustive()
    }
}

/// Type-erased request, as stored in the dispatch queues
pub(crate) trait Job: Send + Sync {
    fn info(&self) -> &RequestInfo;
    fn begin_attempt(&mut self) -> u32;
    fn payload(&self) -> Option<&Payload>;
    fn deadline(&self) -> Instant;
    fn control(&self) -> &Control;
    /// Decode and resolve. Decoder failures resolve as [`RestError::Parsing`].
    fn succeed(self: Box<Self>, response: &RawResponse);
    fn fail(self: Box<Self>, error: RestError);
}

impl<T> Job for Request<T>
where
    T: Clone + Send + 'static,
{
    fn info(&self) -> &RequestInfo {
        &self.info
    }

    fn begin_attempt(&mut self) -> u32 {
        self.info.attempt += 1;
        self.info.attempt
    }

    fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }

    fn deadline(&self) -> Instant {
        // Submission always fills the deadline in.
        self.deadline.unwrap_or_else(Instant::now)
    }

    fn control(&self) -> &Control {
        &self.control
    }

    fn succeed(self: Box<Self>, response: &RawResponse) {
        match (self.decoder)(&self.info, response) {
            Ok(value) => {
                self.finish(Ok(value));
            }
            Err(err) => {
                tracing::warn!(
                    request_id = self.info.id,
                    route = %self.info.route,
                    error = %err,
                    "Response could not be decoded"
                );
                self.finish(Err(RestError::Parsing(err)));
            }
        }
    }

    fn fail(self: Box<Self>, error: RestError) {
        self.finish(Err(error));
    }
}

/// Cancels the request behind an [`AsyncResult`].
struct RequestCanceller<T> {
    control: Arc<Control>,
    completion: Arc<Completion<T>>,
}

impl<T> Canceller for RequestCanceller<T>
where
    T: Clone + Send + 'static,
{
    fn cancel(&self) -> bool {
        match self.control.request_cancel() {
            CancelOutcome::Immediate => {
                self.completion.resolve(Err(RestError::Cancelled));
                true
            }
            CancelOutcome::Signalled => true,
            CancelOutcome::AlreadyTerminal => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Tests can unwrap
mod tests {
    use super::*;
    use imgur_rest_core::route::endpoints::image;

    fn request() -> Request<String> {
        let route = image::GET_IMAGE.compile(&["abc"]).unwrap();
        Request::new(route, |_, response| Ok(response.text()))
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(request().info().id, request().info().id);
    }

    #[test]
    fn transitions_are_compare_and_swap() {
        let control = Control::new();
        assert!(control.transition(RequestState::Created, RequestState::Queued));
        assert!(!control.transition(RequestState::Created, RequestState::Queued));
        assert!(control.transition(RequestState::Queued, RequestState::InFlight));
        assert!(control.terminate(RequestState::Succeeded));
        assert!(!control.terminate(RequestState::Failed));
        assert_eq!(control.state(), RequestState::Succeeded);
    }

    #[test]
    fn cancel_before_dispatch_is_immediate() {
        let control = Control::new();
        assert!(control.transition(RequestState::Created, RequestState::Queued));
        assert_eq!(control.request_cancel(), CancelOutcome::Immediate);
        assert_eq!(control.state(), RequestState::Cancelled);
        assert!(control.is_cancel_requested());
        assert_eq!(control.request_cancel(), CancelOutcome::AlreadyTerminal);
    }

    #[test]
    fn cancel_in_flight_only_signals() {
        let control = Control::new();
        assert!(control.transition(RequestState::Created, RequestState::Queued));
        assert!(control.transition(RequestState::Queued, RequestState::InFlight));
        assert_eq!(control.request_cancel(), CancelOutcome::Signalled);
        assert_eq!(control.state(), RequestState::InFlight);
        assert!(control.is_cancel_requested());
    }

    #[test]
    fn handle_cancel_resolves_unqueued_request() {
        let request = request();
        let handle = request.handle();
        assert!(handle.cancel());
        assert_eq!(request.state(), RequestState::Cancelled);
        assert_eq!(handle.try_result(), Some(Err(RestError::Cancelled)));
        assert!(!handle.cancel());
    }

    #[test]
    fn late_outcomes_are_discarded() {
        let request = request();
        let handle = request.handle();
        assert!(request.finish(Ok("first".to_string())));
        assert!(!request.finish(Err(RestError::DeadlineExceeded)));
        assert_eq!(handle.try_result(), Some(Ok("first".to_string())));
    }

    #[test]
    fn dropped_request_fails_its_handle() {
        let request = request();
        let handle = request.handle();
        drop(request);
        assert_eq!(handle.state(), Some(RequestState::Failed));
        assert_eq!(handle.try_result(), Some(Err(RestError::Shutdown)));
    }

    #[test]
    fn finished_request_drops_quietly() {
        let request = request();
        let handle = request.handle();
        Box::new(request).fail(RestError::DeadlineExceeded);
        assert_eq!(handle.try_result(), Some(Err(RestError::DeadlineExceeded)));
    }

    #[test]
    fn decoder_failure_becomes_parsing_error() {
        let route = image::GET_IMAGE.compile(&["abc"]).unwrap();
        let request: Request<String> = Request::new(route, |_, response| {
            response.object()?.get_string("id")
        });
        let handle = request.handle();
        Box::new(request).succeed(&RawResponse::json(200, &serde_json::json!({})));
        assert_eq!(
            handle.try_result(),
            Some(Err(RestError::Parsing(ParsingError::MissingField("id".into()))))
        );
    }
}
