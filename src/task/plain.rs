//! `AsyncTask<T>`: a cancellable computation that resolves once with a plain value.

use std::convert::Infallible;
use std::fmt;
use std::future::IntoFuture;
use std::time::Duration;

use crate::error::CancellationSignal;
use crate::scheduler::Scheduler;
use crate::task::core::{Cleanup, IntoCleanup, TaskCell, TaskOptions, TaskStatus};
use crate::task::fallible::FallibleAsyncTask;
use crate::task::future::TaskFuture;
use crate::task::unwrapped::UnwrappedAsyncTask;
use crate::{OptionalValue, Outcome};

/// A single-resolution, cancellable asynchronous computation.
///
/// The task is a cheap handle: clones share the same state. It is driven by a
/// start routine that receives a [`Resolver`] and may return a [`Cleanup`] to
/// run on cancellation. Awaiting the task yields `Present(value)` or, if it was
/// cancelled, `Absent`.
///
/// # Example
///
/// ```rust
/// use undertow::{AsyncTask, OptionalValue};
///
/// # tokio_test::block_on(async {
/// let doubled = AsyncTask::of(5).map(|x| x * 2);
/// assert_eq!(doubled.await, OptionalValue::Present(10));
/// # });
/// ```
pub struct AsyncTask<T> {
    pub(crate) cell: TaskCell<T>,
}

impl<T> Clone for AsyncTask<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> fmt::Debug for AsyncTask<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncTask")
            .field("status", &self.cell.status())
            .finish()
    }
}

/// Handed to an [`AsyncTask`] start routine to resolve the task.
///
/// Clones resolve the same task. Only the first resolution counts; later ones,
/// and any after cancellation, are ignored.
pub struct Resolver<T> {
    cell: TaskCell<T>,
}

impl<T> Clone for Resolver<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> fmt::Debug for Resolver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("status", &self.cell.status())
            .finish()
    }
}

impl<T: Clone + 'static> Resolver<T> {
    /// Resolve the task with `value`.
    pub fn resolve(&self, value: T) {
        self.cell.resolve(value);
    }

    /// Returns `true` once the task is resolved or cancelled.
    pub fn is_settled(&self) -> bool {
        self.cell.status().is_terminal()
    }
}

impl<T: Clone + 'static> AsyncTask<T> {
    pub(crate) fn from_cell(cell: TaskCell<T>) -> Self {
        Self { cell }
    }

    // ========== Constructors ==========

    /// Create a task driven by `start`, which runs immediately.
    ///
    /// If `start` resolves synchronously the task is already resolved when
    /// `make` returns.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::AsyncTask;
    ///
    /// let task = AsyncTask::make(|resolver| resolver.resolve("ready"));
    /// assert!(task.is_resolved());
    /// ```
    pub fn make<F, C>(start: F) -> Self
    where
        F: FnOnce(Resolver<T>) -> C + 'static,
        C: IntoCleanup,
    {
        Self::make_with(start, TaskOptions::new())
    }

    /// Create a task with explicit [`TaskOptions`].
    pub fn make_with<F, C>(start: F, options: TaskOptions) -> Self
    where
        F: FnOnce(Resolver<T>) -> C + 'static,
        C: IntoCleanup,
    {
        let cell = TaskCell::new(
            Box::new(move |cell: TaskCell<T>| start(Resolver { cell }).into_cleanup()),
            options,
        );
        Self { cell }
    }

    /// An already-resolved task.
    pub fn of(value: T) -> Self {
        Self {
            cell: TaskCell::resolved(value),
        }
    }

    /// An already-cancelled task.
    pub fn cancelled() -> Self {
        Self {
            cell: TaskCell::cancelled(),
        }
    }

    // ========== State ==========

    /// Run the start routine of a lazy task. No effect otherwise.
    pub fn start(&self) {
        self.cell.start();
    }

    /// The current state.
    pub fn status(&self) -> TaskStatus {
        self.cell.status()
    }

    /// Returns `true` while the task has not settled.
    pub fn is_pending(&self) -> bool {
        self.status() == TaskStatus::Pending
    }

    /// Returns `true` once the task has resolved.
    pub fn is_resolved(&self) -> bool {
        self.status() == TaskStatus::Resolved
    }

    /// Returns `true` once the task has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status() == TaskStatus::Cancelled
    }

    /// The resolved value, without waiting.
    pub fn peek(&self) -> OptionalValue<T> {
        OptionalValue::from_nullable(self.cell.peek())
    }

    // ========== Subscriptions ==========

    /// Call `callback` with the value once the task resolves.
    ///
    /// Subscribers run in registration order. If the task has already resolved
    /// the callback runs before this method returns; if it was cancelled the
    /// callback never runs.
    pub fn on_resolved<F>(&self, callback: F)
    where
        F: FnOnce(T) + 'static,
    {
        self.cell.on_resolved(callback);
    }

    /// Call `callback` once the task is cancelled; immediately if it already is.
    pub fn on_cancelled<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        self.cell.on_cancelled(callback);
    }

    /// Cancel the task.
    ///
    /// A pending task becomes cancelled, runs its cleanup once, then notifies
    /// its cancel subscribers in order. Cancelling a settled task does nothing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    /// use undertow::AsyncTask;
    ///
    /// let notified = Rc::new(Cell::new(0));
    /// let task = AsyncTask::<()>::make(|_resolver| ());
    /// let counter = notified.clone();
    /// task.on_cancelled(move || counter.set(counter.get() + 1));
    ///
    /// task.cancel();
    /// task.cancel();
    /// assert_eq!(notified.get(), 1);
    /// ```
    pub fn cancel(&self) {
        self.cell.cancel();
    }

    // ========== Combinators ==========

    /// A task resolving to `f(value)`.
    ///
    /// Cancelling either task cancels the other.
    pub fn map<U, F>(&self, f: F) -> AsyncTask<U>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> U + 'static,
    {
        AsyncTask::from_cell(self.cell.derive(f))
    }

    /// Run `f` on the value once resolved; returns this task.
    pub fn tap<F>(&self, f: F) -> Self
    where
        F: FnOnce(&T) + 'static,
    {
        self.on_resolved(move |value| f(&value));
        self.clone()
    }

    /// View this task as a fallible task that never fails.
    pub fn to_fallible<E>(&self) -> FallibleAsyncTask<T, E>
    where
        E: Clone + 'static,
    {
        FallibleAsyncTask::from_cell(self.cell.derive(Outcome::Success))
    }

    /// The value, or `Err(CancellationSignal::Cancelled)` if this task is cancelled.
    ///
    /// Cancelling the returned task cancels this one.
    pub fn unwrap(&self) -> UnwrappedAsyncTask<T, Infallible> {
        let source = self.clone();
        UnwrappedAsyncTask::start(move |settler| {
            source.cell.on_settled(move |settled| match settled {
                OptionalValue::Present(value) => settler.resolve(value),
                OptionalValue::Absent => settler.reject(CancellationSignal::Cancelled),
            });
            Some(Cleanup::new(move || source.cancel()))
        })
    }

    /// The value, or `fallback` if this task is cancelled.
    pub fn unwrap_or(&self, fallback: T) -> UnwrappedAsyncTask<T, Infallible> {
        self.unwrap_or_else(move || fallback)
    }

    /// The value, or `f()` if this task is cancelled.
    ///
    /// Cancelling the returned task cancels this one, which resolves the
    /// returned task to the fallback.
    pub fn unwrap_or_else<F>(&self, f: F) -> UnwrappedAsyncTask<T, Infallible>
    where
        F: FnOnce() -> T + 'static,
    {
        let source = self.clone();
        UnwrappedAsyncTask::start(move |settler| {
            source.cell.on_settled(move |settled| settler.resolve(settled.unwrap_or_else(f)));
            Some(Cleanup::new(move || source.cancel()))
        })
    }

    // ========== Timers ==========

    /// Resolve with `value` after `delay` on `scheduler`.
    ///
    /// Cancelling the task cancels the timer.
    pub fn after<S>(scheduler: &S, delay: Duration, value: T) -> Self
    where
        S: Scheduler,
    {
        let scheduler = scheduler.clone();
        Self::make(move |resolver| {
            let handle = scheduler.schedule(delay, Box::new(move || resolver.resolve(value)));
            Cleanup::new(move || scheduler.cancel(handle))
        })
    }
}

impl AsyncTask<()> {
    /// Resolve after `delay` on `scheduler`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use undertow::testing::ManualScheduler;
    /// use undertow::AsyncTask;
    ///
    /// let clock = ManualScheduler::new();
    /// let task = AsyncTask::wait(&clock, Duration::from_millis(50));
    ///
    /// clock.advance(Duration::from_millis(49));
    /// assert!(task.is_pending());
    /// clock.advance(Duration::from_millis(1));
    /// assert!(task.is_resolved());
    /// ```
    pub fn wait<S>(scheduler: &S, delay: Duration) -> Self
    where
        S: Scheduler,
    {
        Self::after(scheduler, delay, ())
    }
}

impl<T: Clone + 'static> IntoFuture for AsyncTask<T> {
    type Output = OptionalValue<T>;
    type IntoFuture = TaskFuture<T>;

    fn into_future(self) -> Self::IntoFuture {
        TaskFuture::subscribe(&self.cell)
    }
}
