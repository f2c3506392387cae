//! Scripted transport for exercising the requester without a network.

#![allow(clippy::missing_panics_doc)] // Test utilities document panics where critical

use async_trait::async_trait;
use imgur_rest_runtime::{RawResponse, Transport, TransportCall, TransportError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

/// One scripted reaction of [`MockTransport`]
#[derive(Debug, Clone)]
pub enum Scripted {
    /// Return this response immediately
    Respond(RawResponse),
    /// Fail with a transport error
    Fail(TransportError),
    /// Never complete; only cancellation or the deadline end the call
    Hang,
    /// Return this response after a delay
    Delay(Duration, RawResponse),
}

#[derive(Debug)]
struct Inner {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Option<Scripted>>,
    calls: Mutex<Vec<TransportCall>>,
    call_count: watch::Sender<usize>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    aborted: AtomicUsize,
}

/// In-memory [`Transport`] that replays a script.
///
/// Each call consumes the next scripted entry. Once the script is exhausted
/// the fallback (if any) answers, otherwise the call fails with a transport
/// error. Every call is recorded before it is answered.
#[derive(Debug, Clone)]
pub struct MockTransport {
    inner: Arc<Inner>,
}

impl MockTransport {
    /// Transport with an empty script.
    #[must_use]
    pub fn new() -> Self {
        let (call_count, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                script: Mutex::new(VecDeque::new()),
                fallback: Mutex::new(None),
                calls: Mutex::new(Vec::new()),
                call_count,
                in_flight: AtomicUsize::new(0),
                peak_in_flight: AtomicUsize::new(0),
                aborted: AtomicUsize::new(0),
            }),
        }
    }

    /// This transport as the trait object the requester takes.
    #[must_use]
    pub fn shared(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }

    /// Append an entry to the script.
    pub fn push(&self, entry: Scripted) -> &Self {
        self.inner
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(entry);
        self
    }

    /// Script a response.
    pub fn respond(&self, response: RawResponse) -> &Self {
        self.push(Scripted::Respond(response))
    }

    /// Script a transport failure.
    pub fn fail(&self, message: &str) -> &Self {
        self.push(Scripted::Fail(TransportError::new(message)))
    }

    /// Script a call that never completes.
    pub fn hang(&self) -> &Self {
        self.push(Scripted::Hang)
    }

    /// Script a response that arrives after `delay`.
    pub fn delay(&self, delay: Duration, response: RawResponse) -> &Self {
        self.push(Scripted::Delay(delay, response))
    }

    /// Answer every call beyond the script with `entry`.
    pub fn always(&self, entry: Scripted) -> &Self {
        *self
            .inner
            .fallback
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(entry);
        self
    }

    /// Calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<TransportCall> {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.inner.call_count.borrow()
    }

    /// Highest number of calls that were running at the same time.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.inner.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Number of calls dropped before they completed.
    #[must_use]
    pub fn aborted(&self) -> usize {
        self.inner.aborted.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` calls have been received.
    pub async fn wait_for_calls(&self, count: usize) {
        let mut receiver = self.inner.call_count.subscribe();
        let _ = receiver.wait_for(|received| *received >= count).await;
    }

    fn next_entry(&self) -> Option<Scripted> {
        let scripted = self
            .inner
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        scripted.or_else(|| {
            self.inner
                .fallback
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        })
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks one running call; counts it as aborted if dropped unfinished.
struct InFlight<'a> {
    inner: &'a Inner,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn enter(inner: &'a Inner) -> Self {
        let running = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        inner.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        Self {
            inner,
            finished: false,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !self.finished {
            self.inner.aborted.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn issue(&self, call: TransportCall) -> Result<RawResponse, TransportError> {
        self.inner
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        self.inner.call_count.send_modify(|count| *count += 1);

        let mut guard = InFlight::enter(&self.inner);
        let outcome = match self.next_entry() {
            Some(Scripted::Respond(response)) => {
                tokio::task::yield_now().await;
                Ok(response)
            }
            Some(Scripted::Fail(error)) => Err(error),
            Some(Scripted::Hang) => std::future::pending().await,
            Some(Scripted::Delay(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            None => Err(TransportError::new("no scripted response")),
        };
        guard.finished = true;
        outcome
    }
}
