//! Timers for [`AsyncTask::wait`](crate::AsyncTask::wait) and
//! [`AsyncTask::after`](crate::AsyncTask::after).
//!
//! A [`Scheduler`] runs a callback once after a delay and can cancel it before
//! it fires. Two are provided:
//!
//! - [`TokioScheduler`] (feature `async`) sleeps on the tokio runtime. It spawns
//!   local tasks, so it must be used inside a `tokio::task::LocalSet`.
//! - [`ManualScheduler`](crate::testing::ManualScheduler) keeps a virtual clock
//!   that tests advance by hand.

use std::time::Duration;

/// A one-shot timer source.
pub trait Scheduler: Clone + 'static {
    /// Identifies a scheduled callback.
    type Handle: 'static;

    /// Run `callback` once, after `delay`.
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Self::Handle;

    /// Prevent a callback from running. No effect if it already ran.
    fn cancel(&self, handle: Self::Handle);
}

/// Timers backed by `tokio::time::sleep`.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use undertow::{AsyncTask, OptionalValue, TokioScheduler};
///
/// # tokio_test::block_on(async {
/// let local = tokio::task::LocalSet::new();
/// let settled = local
///     .run_until(async {
///         AsyncTask::after(&TokioScheduler, Duration::from_millis(5), "tick").await
///     })
///     .await;
/// assert_eq!(settled, OptionalValue::Present("tick"));
/// # });
/// ```
#[cfg(feature = "async")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[cfg(feature = "async")]
impl Scheduler for TokioScheduler {
    type Handle = tokio::task::JoinHandle<()>;

    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Self::Handle {
        tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            callback();
        })
    }

    fn cancel(&self, handle: Self::Handle) {
        handle.abort();
    }
}
