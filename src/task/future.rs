//! Awaiting tasks.
//!
//! Awaiting subscribes to the task once. An [`AsyncTask`](crate::AsyncTask) or
//! [`FallibleAsyncTask`](crate::FallibleAsyncTask) completes with
//! `Present(value)` when it resolves and `Absent` when it is cancelled; an
//! [`UnwrappedAsyncTask`](crate::UnwrappedAsyncTask) completes with `Ok(value)`
//! or `Err(CancellationSignal)`.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use crate::error::CancellationSignal;
use crate::task::core::TaskCell;
use crate::OptionalValue;

struct Slot<O> {
    settled: Option<O>,
    waker: Option<Waker>,
}

/// Write side of a [`SettledFuture`].
pub(crate) struct Filler<O> {
    slot: Rc<RefCell<Slot<O>>>,
}

impl<O> Filler<O> {
    pub(crate) fn fill(self, settled: O) {
        let waker = {
            let mut slot = self.slot.borrow_mut();
            slot.settled = Some(settled);
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// Future that completes once a task settles.
///
/// Dropping it does not cancel the task.
pub struct SettledFuture<O> {
    slot: Rc<RefCell<Slot<O>>>,
}

/// Output of awaiting a plain or fallible task.
pub type TaskFuture<V> = SettledFuture<OptionalValue<V>>;

/// Output of awaiting an unwrapped task.
pub type UnwrappedFuture<T, P> = SettledFuture<Result<T, CancellationSignal<P>>>;

impl<O> SettledFuture<O> {
    pub(crate) fn channel() -> (Self, Filler<O>) {
        let slot = Rc::new(RefCell::new(Slot {
            settled: None,
            waker: None,
        }));
        let filler = Filler {
            slot: Rc::clone(&slot),
        };
        (Self { slot }, filler)
    }
}

impl<V: Clone + 'static> SettledFuture<OptionalValue<V>> {
    pub(crate) fn subscribe(cell: &TaskCell<V>) -> Self {
        let (future, filler) = Self::channel();
        cell.on_settled(move |settled| filler.fill(settled));
        future
    }
}

impl<O> Future for SettledFuture<O> {
    type Output = O;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut slot = self.slot.borrow_mut();
        match slot.settled.take() {
            Some(settled) => Poll::Ready(settled),
            None => {
                slot.waker = Some(cx.waker().clone());
                Poll::Pending
            }
        }
    }
}

impl<O> fmt::Debug for SettledFuture<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettledFuture")
            .field("settled", &self.slot.borrow().settled.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;

    #[test]
    fn test_pending_until_filled() {
        let (mut future, filler) = SettledFuture::<i32>::channel();
        assert_eq!((&mut future).now_or_never(), None);
        filler.fill(4);
        assert_eq!(future.now_or_never(), Some(4));
    }
}
