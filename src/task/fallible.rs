//! `FallibleAsyncTask<T, E>`: a cancellable computation that settles once with an
//! [`Outcome`].
//!
//! It runs on the same state machine as [`AsyncTask`], with `Outcome<T, E>` as
//! the resolved value. Its start routine gets a [`Settler`] with separate
//! `succeed` and `fail` entry points, and its combinators work on one side of
//! the outcome while passing the other through untouched.
//!
//! # Example
//!
//! ```rust
//! use undertow::{FallibleAsyncTask, OptionalValue, Outcome};
//!
//! fn fetch_quota(user: &str) -> FallibleAsyncTask<u32, String> {
//!     match user {
//!         "ada" => FallibleAsyncTask::of_success(10),
//!         _ => FallibleAsyncTask::of_failure(format!("unknown user {}", user)),
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let remaining = fetch_quota("ada").and_then(|quota| {
//!     if quota > 0 {
//!         Outcome::success(quota - 1)
//!     } else {
//!         Outcome::failure("quota exhausted".to_string())
//!     }
//! });
//! assert_eq!(remaining.await, OptionalValue::Present(Outcome::Success(9)));
//! # });
//! ```

use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt;
use std::future::IntoFuture;
use std::rc::Rc;

use crate::error::CancellationSignal;
use crate::task::core::{Cleanup, IntoCleanup, TaskCell, TaskOptions, TaskStatus};
use crate::task::future::TaskFuture;
use crate::task::plain::AsyncTask;
use crate::task::unwrapped::UnwrappedAsyncTask;
use crate::{OptionalValue, Outcome};

/// A single-resolution, cancellable asynchronous computation that may fail.
///
/// Awaiting yields `Present(outcome)` or, if cancelled, `Absent`.
pub struct FallibleAsyncTask<T, E> {
    pub(crate) cell: TaskCell<Outcome<T, E>>,
}

impl<T, E> Clone for FallibleAsyncTask<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T, E> fmt::Debug for FallibleAsyncTask<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallibleAsyncTask")
            .field("status", &self.cell.status())
            .finish()
    }
}

/// Handed to a [`FallibleAsyncTask`] start routine to settle the task.
///
/// The first call to `succeed`, `fail` or `settle` wins; the rest are ignored.
pub struct Settler<T, E> {
    cell: TaskCell<Outcome<T, E>>,
}

impl<T, E> Clone for Settler<T, E> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Settler<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settler")
            .field("status", &self.cell.status())
            .finish()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> Settler<T, E> {
    /// Settle with `Success(value)`.
    pub fn succeed(&self, value: T) {
        self.cell.resolve(Outcome::Success(value));
    }

    /// Settle with `Failure(error)`.
    pub fn fail(&self, error: E) {
        self.cell.resolve(Outcome::Failure(error));
    }

    /// Settle with an existing outcome.
    pub fn settle(&self, outcome: Outcome<T, E>) {
        self.cell.resolve(outcome);
    }

    /// Returns `true` once the task has settled or been cancelled.
    pub fn is_settled(&self) -> bool {
        self.cell.status().is_terminal()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> FallibleAsyncTask<T, E> {
    pub(crate) fn from_cell(cell: TaskCell<Outcome<T, E>>) -> Self {
        Self { cell }
    }

    // ========== Constructors ==========

    /// Create a task driven by `start`, which runs immediately.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::{FallibleAsyncTask, Outcome};
    ///
    /// let task = FallibleAsyncTask::<i32, String>::make(|settler| {
    ///     match "12".parse::<i32>() {
    ///         Ok(n) => settler.succeed(n),
    ///         Err(e) => settler.fail(e.to_string()),
    ///     }
    /// });
    /// assert_eq!(task.peek().unwrap(), Outcome::Success(12));
    /// ```
    pub fn make<F, C>(start: F) -> Self
    where
        F: FnOnce(Settler<T, E>) -> C + 'static,
        C: IntoCleanup,
    {
        Self::make_with(start, TaskOptions::new())
    }

    /// Create a task with explicit [`TaskOptions`].
    pub fn make_with<F, C>(start: F, options: TaskOptions) -> Self
    where
        F: FnOnce(Settler<T, E>) -> C + 'static,
        C: IntoCleanup,
    {
        let cell = TaskCell::new(
            Box::new(move |cell: TaskCell<Outcome<T, E>>| start(Settler { cell }).into_cleanup()),
            options,
        );
        Self { cell }
    }

    /// An already-settled task.
    pub fn of_outcome(outcome: Outcome<T, E>) -> Self {
        Self {
            cell: TaskCell::resolved(outcome),
        }
    }

    /// An already-succeeded task.
    pub fn of_success(value: T) -> Self {
        Self::of_outcome(Outcome::Success(value))
    }

    /// An already-failed task.
    pub fn of_failure(error: E) -> Self {
        Self::of_outcome(Outcome::Failure(error))
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

    /// Returns `true` once the task has settled with an outcome.
    pub fn is_resolved(&self) -> bool {
        self.status() == TaskStatus::Resolved
    }

    /// Returns `true` once the task has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status() == TaskStatus::Cancelled
    }

    /// The settled outcome, without waiting.
    pub fn peek(&self) -> OptionalValue<Outcome<T, E>> {
        OptionalValue::from_nullable(self.cell.peek())
    }

    // ========== Subscriptions ==========

    /// Call `callback` with the outcome once the task settles.
    pub fn on_resolved<F>(&self, callback: F)
    where
        F: FnOnce(Outcome<T, E>) + 'static,
    {
        self.cell.on_resolved(callback);
    }

    /// Call `callback` with the value if the task succeeds.
    pub fn on_succeeded<F>(&self, callback: F)
    where
        F: FnOnce(T) + 'static,
    {
        self.cell.on_resolved(move |outcome| {
            if let Outcome::Success(value) = outcome {
                callback(value);
            }
        });
    }

    /// Call `callback` with the error if the task fails.
    pub fn on_failed<F>(&self, callback: F)
    where
        F: FnOnce(E) + 'static,
    {
        self.cell.on_resolved(move |outcome| {
            if let Outcome::Failure(error) = outcome {
                callback(error);
            }
        });
    }

    /// Call `callback` once the task is cancelled; immediately if it already is.
    pub fn on_cancelled<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        self.cell.on_cancelled(callback);
    }

    /// Cancel the task. Same contract as [`AsyncTask::cancel`].
    pub fn cancel(&self) {
        self.cell.cancel();
    }

    // ========== Combinators ==========

    /// Transform the success value; failures pass through.
    pub fn map<U, F>(&self, f: F) -> FallibleAsyncTask<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> U + 'static,
    {
        FallibleAsyncTask::from_cell(self.cell.derive(move |outcome| outcome.map(f)))
    }

    /// Transform the error; successes pass through.
    pub fn map_error<E2, F>(&self, f: F) -> FallibleAsyncTask<T, E2>
    where
        E2: Clone + 'static,
        F: FnOnce(E) -> E2 + 'static,
    {
        FallibleAsyncTask::from_cell(self.cell.derive(move |outcome| outcome.map_error(f)))
    }

    /// Continue with another fallible step on success.
    ///
    /// `f` may return an [`Outcome`] (treated as already settled) or another
    /// task. A failure skips `f` and is forwarded as is. Cancelling the
    /// returned task cancels this task and the continuation, if one is running;
    /// cancelling either of them cancels the returned task.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::{FallibleAsyncTask, OptionalValue, Outcome};
    ///
    /// # tokio_test::block_on(async {
    /// let chained = FallibleAsyncTask::<i32, &str>::of_failure("E")
    ///     .and_then(|x| FallibleAsyncTask::of_success(x + 1));
    /// assert_eq!(chained.await, OptionalValue::Present(Outcome::Failure("E")));
    /// # });
    /// ```
    pub fn and_then<U, R, F>(&self, f: F) -> FallibleAsyncTask<U, E>
    where
        U: Clone + 'static,
        R: Into<FallibleAsyncTask<U, E>>,
        F: FnOnce(T) -> R + 'static,
    {
        self.chain(move |outcome| match outcome {
            Outcome::Success(value) => f(value).into(),
            Outcome::Failure(error) => FallibleAsyncTask::of_failure(error),
        })
    }

    /// Recover from a failure with another fallible step.
    ///
    /// The mirror of [`and_then`](Self::and_then): successes pass through.
    pub fn or_else<E2, R, F>(&self, f: F) -> FallibleAsyncTask<T, E2>
    where
        E2: Clone + 'static,
        R: Into<FallibleAsyncTask<T, E2>>,
        F: FnOnce(E) -> R + 'static,
    {
        self.chain(move |outcome| match outcome {
            Outcome::Success(value) => FallibleAsyncTask::of_success(value),
            Outcome::Failure(error) => f(error).into(),
        })
    }

    /// Wire a continuation chosen from this task's outcome.
    fn chain<U, E2, F>(&self, next: F) -> FallibleAsyncTask<U, E2>
    where
        U: Clone + 'static,
        E2: Clone + 'static,
        F: FnOnce(Outcome<T, E>) -> FallibleAsyncTask<U, E2> + 'static,
    {
        let source = self.clone();
        FallibleAsyncTask::make(move |settler: Settler<U, E2>| {
            let in_flight: Rc<RefCell<Option<FallibleAsyncTask<U, E2>>>> =
                Rc::new(RefCell::new(None));
            let slot = Rc::clone(&in_flight);
            let forward = settler.clone();
            source.cell.on_settled(move |settled| match settled {
                OptionalValue::Present(outcome) => {
                    let continuation = next(outcome);
                    *slot.borrow_mut() = Some(continuation.clone());
                    continuation.cell.on_settled(move |settled| match settled {
                        OptionalValue::Present(outcome) => forward.settle(outcome),
                        OptionalValue::Absent => forward.cell.cancel(),
                    });
                }
                OptionalValue::Absent => forward.cell.cancel(),
            });
            Cleanup::new(move || {
                source.cancel();
                let continuation = in_flight.borrow_mut().take();
                if let Some(continuation) = continuation {
                    continuation.cancel();
                }
            })
        })
    }

    /// Run `f` on the success value; returns this task.
    pub fn tap<F>(&self, f: F) -> Self
    where
        F: FnOnce(&T) + 'static,
    {
        self.on_succeeded(move |value| f(&value));
        self.clone()
    }

    /// Run `f` on the error; returns this task.
    pub fn tap_error<F>(&self, f: F) -> Self
    where
        F: FnOnce(&E) + 'static,
    {
        self.on_failed(move |error| f(&error));
        self.clone()
    }

    /// A plain task resolving to `Present(value)` on success and `Absent` on failure.
    pub fn to_optional_value(&self) -> AsyncTask<OptionalValue<T>> {
        AsyncTask::from_cell(self.cell.derive(Outcome::to_optional_value))
    }

    // ========== Unwrapping ==========

    /// The success value. Awaiting yields `Err(Rejected(error))` on failure and
    /// `Err(Cancelled)` on cancellation.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::{CancellationSignal, FallibleAsyncTask};
    ///
    /// # tokio_test::block_on(async {
    /// let failed = FallibleAsyncTask::<i32, &str>::of_failure("E");
    /// assert_eq!(failed.unwrap().await, Err(CancellationSignal::Rejected("E")));
    /// # });
    /// ```
    pub fn unwrap(&self) -> UnwrappedAsyncTask<T, E> {
        self.unwrap_with(|outcome| match outcome {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(CancellationSignal::Rejected(error)),
        })
    }

    /// The error. Awaiting yields `Err(Rejected(value))` on success and
    /// `Err(Cancelled)` on cancellation.
    pub fn unwrap_error(&self) -> UnwrappedAsyncTask<E, T> {
        self.unwrap_with(|outcome| match outcome {
            Outcome::Failure(error) => Ok(error),
            Outcome::Success(value) => Err(CancellationSignal::Rejected(value)),
        })
    }

    /// The success value, or `fallback` on failure or cancellation.
    pub fn unwrap_or(&self, fallback: T) -> UnwrappedAsyncTask<T, Infallible> {
        self.unwrap_or_else(move || fallback)
    }

    /// The success value, or `f()` on failure or cancellation.
    pub fn unwrap_or_else<F>(&self, f: F) -> UnwrappedAsyncTask<T, Infallible>
    where
        F: FnOnce() -> T + 'static,
    {
        let source = self.clone();
        UnwrappedAsyncTask::start(move |settler| {
            source.cell.on_settled(move |settled| {
                let value = match settled {
                    OptionalValue::Present(Outcome::Success(value)) => value,
                    OptionalValue::Present(Outcome::Failure(_)) | OptionalValue::Absent => f(),
                };
                settler.resolve(value);
            });
            Some(Cleanup::new(move || source.cancel()))
        })
    }

    /// Run one branch on the outcome. Awaiting yields `Err(Cancelled)` on
    /// cancellation; there is no fallback.
    pub fn fold<R, S, F>(&self, on_success: S, on_failure: F) -> UnwrappedAsyncTask<R, Infallible>
    where
        R: Clone + 'static,
        S: FnOnce(T) -> R + 'static,
        F: FnOnce(E) -> R + 'static,
    {
        self.unwrap_with(move |outcome| Ok(outcome.fold(on_success, on_failure)))
    }

    fn unwrap_with<R, P, F>(&self, pick: F) -> UnwrappedAsyncTask<R, P>
    where
        R: Clone + 'static,
        P: Clone + 'static,
        F: FnOnce(Outcome<T, E>) -> Result<R, CancellationSignal<P>> + 'static,
    {
        let source = self.clone();
        UnwrappedAsyncTask::start(move |settler| {
            source.cell.on_settled(move |settled| match settled {
                OptionalValue::Present(outcome) => match pick(outcome) {
                    Ok(value) => settler.resolve(value),
                    Err(signal) => settler.reject(signal),
                },
                OptionalValue::Absent => settler.reject(CancellationSignal::Cancelled),
            });
            Some(Cleanup::new(move || source.cancel()))
        })
    }
}

impl<T: Clone + 'static, E: Clone + 'static> From<Outcome<T, E>> for FallibleAsyncTask<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        FallibleAsyncTask::of_outcome(outcome)
    }
}

impl<T: Clone + 'static, E: Clone + 'static> From<AsyncTask<T>> for FallibleAsyncTask<T, E> {
    fn from(task: AsyncTask<T>) -> Self {
        task.to_fallible()
    }
}

impl<T: Clone + 'static, E: Clone + 'static> IntoFuture for FallibleAsyncTask<T, E> {
    type Output = OptionalValue<Outcome<T, E>>;
    type IntoFuture = TaskFuture<Outcome<T, E>>;

    fn into_future(self) -> Self::IntoFuture {
        TaskFuture::subscribe(&self.cell)
    }
}
