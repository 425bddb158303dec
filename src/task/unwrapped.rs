//! Tasks that surface their value directly.
//!
//! An [`UnwrappedAsyncTask<T, P>`] is what the `unwrap` family of
//! [`AsyncTask`](crate::AsyncTask) and [`FallibleAsyncTask`](crate::FallibleAsyncTask)
//! returns. Awaiting it yields `Ok(value)`, or `Err(CancellationSignal)` when the
//! upstream task cannot produce the requested value.
//!
//! Unlike the containers it is derived from, cancellation here is not a quiet
//! terminal state that resolves to `Absent`: it surfaces as an error. Unwraps
//! with a fallback (`unwrap_or`, `unwrap_or_else`) never produce that error;
//! they resolve to the fallback instead.
//!
//! # Example
//!
//! ```rust
//! use undertow::{AsyncTask, CancellationSignal};
//!
//! # tokio_test::block_on(async {
//! let task = AsyncTask::<i32>::make(|_resolver| ());
//! let unwrapped = task.unwrap();
//! let with_fallback = task.unwrap_or(0);
//! task.cancel();
//!
//! assert_eq!(unwrapped.await, Err(CancellationSignal::Cancelled));
//! assert_eq!(with_fallback.await, Ok(0));
//! # });
//! ```

use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::future::IntoFuture;
use std::rc::Rc;

use crate::error::CancellationSignal;
use crate::task::core::{Cleanup, TaskStatus};
use crate::task::future::{SettledFuture, UnwrappedFuture};

type Settled<T, P> = Result<T, CancellationSignal<P>>;
type SettledCallback<T, P> = Box<dyn FnOnce(Settled<T, P>)>;

enum UnwrappedState<T, P> {
    Pending {
        cleanup: Option<Cleanup>,
        subscribers: Vec<SettledCallback<T, P>>,
    },
    Resolved(T),
    Cancelled(CancellationSignal<P>),
}

/// A task whose value is surfaced directly, with cancellation reported as an error.
///
/// `P` is the payload a rejection can carry: `Infallible` for unwraps of plain
/// tasks, the failure type for [`FallibleAsyncTask::unwrap`](crate::FallibleAsyncTask::unwrap),
/// the success type for [`FallibleAsyncTask::unwrap_error`](crate::FallibleAsyncTask::unwrap_error).
pub struct UnwrappedAsyncTask<T, P = Infallible> {
    inner: Rc<RefCell<UnwrappedState<T, P>>>,
}

impl<T, P> Clone for UnwrappedAsyncTask<T, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T, P> fmt::Debug for UnwrappedAsyncTask<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnwrappedAsyncTask")
            .field("status", &self.status())
            .finish()
    }
}

/// Settles an [`UnwrappedAsyncTask`] from inside its start routine.
pub(crate) struct UnwrapSettler<T, P> {
    task: UnwrappedAsyncTask<T, P>,
}

impl<T, P> Clone for UnwrapSettler<T, P> {
    fn clone(&self) -> Self {
        Self {
            task: self.task.clone(),
        }
    }
}

impl<T: Clone + 'static, P: Clone + 'static> UnwrapSettler<T, P> {
    pub(crate) fn resolve(&self, value: T) {
        self.task.settle(Ok(value));
    }

    pub(crate) fn reject(&self, signal: CancellationSignal<P>) {
        self.task.settle(Err(signal));
    }
}

impl<T, P> UnwrappedAsyncTask<T, P> {
    /// The current state.
    pub fn status(&self) -> TaskStatus {
        match &*self.inner.borrow() {
            UnwrappedState::Pending { .. } => TaskStatus::Pending,
            UnwrappedState::Resolved(_) => TaskStatus::Resolved,
            UnwrappedState::Cancelled(_) => TaskStatus::Cancelled,
        }
    }

    /// Returns `true` while the task has not settled.
    pub fn is_pending(&self) -> bool {
        self.status() == TaskStatus::Pending
    }
}

impl<T: Clone + 'static, P: Clone + 'static> UnwrappedAsyncTask<T, P> {
    /// Build and start immediately. `routine` wires the task to its upstream
    /// and returns the routine that forwards a cancellation request there.
    pub(crate) fn start<F>(routine: F) -> Self
    where
        F: FnOnce(UnwrapSettler<T, P>) -> Option<Cleanup>,
    {
        let task = Self {
            inner: Rc::new(RefCell::new(UnwrappedState::Pending {
                cleanup: None,
                subscribers: Vec::new(),
            })),
        };
        let cleanup = routine(UnwrapSettler { task: task.clone() });
        // a task that settled during wiring has nothing left to forward
        if let UnwrappedState::Pending { cleanup: slot, .. } = &mut *task.inner.borrow_mut() {
            *slot = cleanup;
        }
        task
    }

    fn settle(&self, settled: Settled<T, P>) {
        let previous = {
            let mut state = self.inner.borrow_mut();
            if !matches!(&*state, UnwrappedState::Pending { .. }) {
                return;
            }
            let next = match &settled {
                Ok(value) => UnwrappedState::Resolved(value.clone()),
                Err(signal) => UnwrappedState::Cancelled(signal.clone()),
            };
            std::mem::replace(&mut *state, next)
        };
        let UnwrappedState::Pending { subscribers, .. } = previous else {
            return;
        };
        for callback in subscribers {
            callback(settled.clone());
        }
    }

    /// Request cancellation.
    ///
    /// The request is forwarded upstream; depending on how the task was
    /// derived that settles it with a [`CancellationSignal`] or with a
    /// fallback value. A task with nothing to forward to is marked cancelled.
    pub fn cancel(&self) {
        let cleanup = match &mut *self.inner.borrow_mut() {
            UnwrappedState::Pending { cleanup, .. } => cleanup.take(),
            _ => return,
        };
        if let Some(cleanup) = cleanup {
            cleanup.run();
        }
        self.settle(Err(CancellationSignal::Cancelled));
    }

    /// Call `callback` with the settled result; immediately if already settled.
    pub fn on_settled<F>(&self, callback: F)
    where
        F: FnOnce(Result<T, CancellationSignal<P>>) + 'static,
    {
        let settled = match &mut *self.inner.borrow_mut() {
            UnwrappedState::Pending { subscribers, .. } => {
                subscribers.push(Box::new(callback));
                return;
            }
            UnwrappedState::Resolved(value) => Ok(value.clone()),
            UnwrappedState::Cancelled(signal) => Err(signal.clone()),
        };
        callback(settled);
    }

    /// Call `callback` with the value if the task resolves.
    pub fn on_resolved<F>(&self, callback: F)
    where
        F: FnOnce(T) + 'static,
    {
        self.on_settled(move |settled| {
            if let Ok(value) = settled {
                callback(value);
            }
        });
    }

    /// Call `callback` with the signal if the task ends without a value.
    pub fn on_rejected<F>(&self, callback: F)
    where
        F: FnOnce(CancellationSignal<P>) + 'static,
    {
        self.on_settled(move |settled| {
            if let Err(signal) = settled {
                callback(signal);
            }
        });
    }

    /// The settled result, if any.
    pub fn peek(&self) -> Option<Result<T, CancellationSignal<P>>> {
        match &*self.inner.borrow() {
            UnwrappedState::Pending { .. } => None,
            UnwrappedState::Resolved(value) => Some(Ok(value.clone())),
            UnwrappedState::Cancelled(signal) => Some(Err(signal.clone())),
        }
    }
}

impl<T: Clone + 'static, P: Clone + 'static> IntoFuture for UnwrappedAsyncTask<T, P> {
    type Output = Result<T, CancellationSignal<P>>;
    type IntoFuture = UnwrappedFuture<T, P>;

    fn into_future(self) -> Self::IntoFuture {
        let (future, filler) = SettledFuture::channel();
        self.on_settled(move |settled| filler.fill(settled));
        future
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_cancel_without_upstream_marks_cancelled() {
        let task = UnwrappedAsyncTask::<i32, Infallible>::start(|_| None);
        task.cancel();
        assert_eq!(task.peek(), Some(Err(CancellationSignal::Cancelled)));
    }

    #[test]
    fn test_cancel_forwards_to_cleanup_which_may_resolve() {
        let task = UnwrappedAsyncTask::<i32, Infallible>::start(|settler| {
            Some(Cleanup::new(move || settler.resolve(-1)))
        });
        task.cancel();
        assert_eq!(task.peek(), Some(Ok(-1)));
    }

    #[test]
    fn test_settles_once() {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let task = UnwrappedAsyncTask::<i32, &str>::start(|settler| {
            settler.reject(CancellationSignal::Rejected("E"));
            settler.resolve(1);
            None
        });
        task.on_settled(move |_| seen.set(seen.get() + 1));
        task.cancel();
        assert_eq!(calls.get(), 1);
        assert_eq!(task.peek(), Some(Err(CancellationSignal::Rejected("E"))));
    }

    #[test]
    fn test_on_resolved_and_on_rejected_filter() {
        let resolved = Rc::new(Cell::new(0));
        let rejected = Rc::new(Cell::new(false));
        let task = UnwrappedAsyncTask::<i32, Infallible>::start(|settler| {
            Some(Cleanup::new(move || settler.resolve(5)))
        });
        let r = resolved.clone();
        task.on_resolved(move |v| r.set(v));
        let j = rejected.clone();
        task.on_rejected(move |_| j.set(true));
        task.cancel();
        assert_eq!(resolved.get(), 5);
        assert!(!rejected.get());
    }
}
