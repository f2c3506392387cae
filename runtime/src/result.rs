//! Caller-facing handle of a request.
//!
//! An [`AsyncResult`] is a single-assignment cell. It is either bound to a
//! live request (and forwards cancellation to it), or created already
//! resolved with a value or an error. Once resolved it never changes.
//!
//! Outcomes can be consumed in three ways:
//!
//! - `.await` it (it implements [`Future`])
//! - block the current thread with [`AsyncResult::wait`]
//! - register a callback with [`AsyncResult::on_complete`]
//!
//! Dropping a handle does not cancel the request behind it.

use crate::request::{Control, RequestState};
use imgur_rest_core::RestError;
use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

type Listener<T> = Box<dyn FnOnce(Result<T, RestError>) + Send>;

enum Slot<T> {
    Pending {
        listeners: Vec<Listener<T>>,
        wakers: Vec<Waker>,
    },
    Resolved(Result<T, RestError>),
}

/// The shared single-assignment cell
pub(crate) struct Completion<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Completion<T> {
    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // Listeners run outside the lock, so a poisoned lock still holds a
        // consistent slot.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store the outcome produced by `outcome` unless something already did.
    /// `outcome` runs once for the slot and once per listener.
    fn settle<F>(&self, outcome: F) -> bool
    where
        F: Fn() -> Result<T, RestError>,
    {
        let (listeners, wakers) = {
            let mut slot = self.lock();
            let Slot::Pending { listeners, wakers } = &mut *slot else {
                return false;
            };
            let taken = (mem::take(listeners), mem::take(wakers));
            *slot = Slot::Resolved(outcome());
            taken
        };

        self.ready.notify_all();
        for waker in wakers {
            waker.wake();
        }
        for listener in listeners {
            listener(outcome());
        }
        true
    }

    /// Fail with `error`. Needs no bound on `T`, so it can run from `Drop`.
    pub(crate) fn abandon(&self, error: &RestError) -> bool {
        self.settle(|| Err(error.clone()))
    }
}

impl<T> Completion<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) const fn pending() -> Self {
        Self {
            slot: Mutex::new(Slot::Pending {
                listeners: Vec::new(),
                wakers: Vec::new(),
            }),
            ready: Condvar::new(),
        }
    }

    fn resolved(outcome: Result<T, RestError>) -> Self {
        Self {
            slot: Mutex::new(Slot::Resolved(outcome)),
            ready: Condvar::new(),
        }
    }

    /// Store `outcome` unless something already did. Returns whether this
    /// call won.
    pub(crate) fn resolve(&self, outcome: Result<T, RestError>) -> bool {
        self.settle(|| outcome.clone())
    }

    fn subscribe(&self, listener: Listener<T>) {
        let resolved = {
            let mut slot = self.lock();
            match &mut *slot {
                Slot::Pending { listeners, .. } => {
                    listeners.push(listener);
                    return;
                }
                Slot::Resolved(outcome) => outcome.clone(),
            }
        };
        listener(resolved);
    }

    fn peek(&self) -> Option<Result<T, RestError>> {
        match &*self.lock() {
            Slot::Resolved(outcome) => Some(outcome.clone()),
            Slot::Pending { .. } => None,
        }
    }

    fn poll(&self, cx: &Context<'_>) -> Poll<Result<T, RestError>> {
        let mut slot = self.lock();
        match &mut *slot {
            Slot::Resolved(outcome) => Poll::Ready(outcome.clone()),
            Slot::Pending { wakers, .. } => {
                if !wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }

    fn wait(&self, timeout: Option<Duration>) -> Option<Result<T, RestError>> {
        let is_pending = |slot: &mut Slot<T>| matches!(slot, Slot::Pending { .. });
        let slot = self.lock();
        let slot = match timeout {
            None => self
                .ready
                .wait_while(slot, is_pending)
                .unwrap_or_else(PoisonError::into_inner),
            Some(timeout) => {
                self.ready
                    .wait_timeout_while(slot, timeout, is_pending)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
        };
        match &*slot {
            Slot::Resolved(outcome) => Some(outcome.clone()),
            Slot::Pending { .. } => None,
        }
    }
}

/// Forwards cancellation from a handle to whatever produces its outcome
pub(crate) trait Canceller: Send + Sync {
    fn cancel(&self) -> bool;
}

#[derive(Clone)]
struct Binding {
    canceller: Arc<dyn Canceller>,
    control: Arc<Control>,
}

/// Single-assignment future representing an in-flight or finished request
pub struct AsyncResult<T> {
    completion: Arc<Completion<T>>,
    binding: Option<Binding>,
}

impl<T> AsyncResult<T>
where
    T: Clone + Send + 'static,
{
    pub(crate) fn bound(
        completion: Arc<Completion<T>>,
        canceller: Arc<dyn Canceller>,
        control: Arc<Control>,
    ) -> Self {
        Self {
            completion,
            binding: Some(Binding { canceller, control }),
        }
    }

    /// Already resolved with `value`; no request is involved.
    #[must_use]
    pub fn completed(value: T) -> Self {
        Self {
            completion: Arc::new(Completion::resolved(Ok(value))),
            binding: None,
        }
    }

    /// Already resolved with `error`; no request is involved.
    #[must_use]
    pub fn failed(error: RestError) -> Self {
        Self {
            completion: Arc::new(Completion::resolved(Err(error))),
            binding: None,
        }
    }

    /// Already resolved with `outcome`.
    #[must_use]
    pub fn from_result(outcome: Result<T, RestError>) -> Self {
        match outcome {
            Ok(value) => Self::completed(value),
            Err(error) => Self::failed(error),
        }
    }

    /// Cancel the bound request.
    ///
    /// Returns `true` when the cancellation was accepted: a queued request is
    /// resolved with [`RestError::Cancelled`] immediately, an in-flight one
    /// once its transport call has been aborted. Returns `false` for handles
    /// that are not bound to a request or whose request already terminated.
    pub fn cancel(&self) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|binding| binding.canceller.cancel())
    }

    /// Whether an outcome is available.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.completion.peek().is_some()
    }

    /// The outcome, if available, without waiting.
    #[must_use]
    pub fn try_result(&self) -> Option<Result<T, RestError>> {
        self.completion.peek()
    }

    /// Lifecycle state of the bound request, `None` for pre-resolved handles.
    #[must_use]
    pub fn state(&self) -> Option<RequestState> {
        self.binding.as_ref().map(|binding| binding.control.state())
    }

    /// Block the current thread until the outcome is available.
    ///
    /// Bound requests terminate by their deadline, or with
    /// [`RestError::Shutdown`] when the pipeline is torn down first. Must not
    /// be called from inside an async task: it parks the thread the runtime
    /// needs to make progress.
    ///
    /// # Errors
    ///
    /// The failure the request terminated with.
    pub fn wait(&self) -> Result<T, RestError> {
        self.completion
            .wait(None)
            .unwrap_or(Err(RestError::DeadlineExceeded))
    }

    /// Like [`wait`](Self::wait), giving up after `timeout`.
    ///
    /// Returns `None` when the timeout elapsed first; the request keeps going.
    #[must_use]
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Result<T, RestError>> {
        self.completion.wait(Some(timeout))
    }

    /// Run `callback` with the outcome. Runs immediately when the outcome is
    /// already available, otherwise on the thread that resolves the result.
    pub fn on_complete<F>(&self, callback: F)
    where
        F: FnOnce(Result<T, RestError>) + Send + 'static,
    {
        self.completion.subscribe(Box::new(callback));
    }

    /// Derived result holding `transform(value)`. Errors pass through, and
    /// cancelling the derived result cancels this one's request.
    #[must_use]
    pub fn map<U, F>(&self, transform: F) -> AsyncResult<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.and_then(move |value| Ok(transform(value)))
    }

    /// Derived result holding `transform(value)`, which may itself fail.
    #[must_use]
    pub fn and_then<U, F>(&self, transform: F) -> AsyncResult<U>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Result<U, RestError> + Send + 'static,
    {
        let child = Arc::new(Completion::pending());
        let target = Arc::clone(&child);
        self.on_complete(move |outcome| {
            target.resolve(outcome.and_then(transform));
        });
        AsyncResult {
            completion: child,
            binding: self.binding.clone(),
        }
    }
}

impl<T> Clone for AsyncResult<T> {
    fn clone(&self) -> Self {
        Self {
            completion: Arc::clone(&self.completion),
            binding: self.binding.clone(),
        }
    }
}

impl<T> Future for AsyncResult<T>
where
    T: Clone + Send + 'static,
{
    type Output = Result<T, RestError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.completion.poll(cx)
    }
}

impl<T> fmt::Debug for AsyncResult<T>
where
    T: Clone + Send + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncResult")
            .field("outcome", &self.completion.peek())
            .field("state", &self.state())
            .finish()
    }
}
