//! Single-resolution, cancellable asynchronous tasks.
//!
//! A task is a cell that starts `Pending` and settles exactly once: it either
//! resolves with a value or is cancelled. Late resolutions and repeated
//! cancellations are ignored.
//!
//! | Type | Settles with | Awaiting yields |
//! |------|--------------|-----------------|
//! | [`AsyncTask<T>`] | `T` | `OptionalValue<T>` |
//! | [`FallibleAsyncTask<T, E>`] | `Outcome<T, E>` | `OptionalValue<Outcome<T, E>>` |
//! | [`UnwrappedAsyncTask<T, P>`] | `T` | `Result<T, CancellationSignal<P>>` |
//!
//! # Cancellation
//!
//! Cancellation is cooperative. Cancelling a pending task runs its cleanup
//! once, then notifies its cancel subscribers in registration order. Derived
//! tasks (`map`, `and_then`, `all`, ...) are wired both ways: cancelling the
//! derived task cancels its sources, and cancelling a source cancels every task
//! derived from it.
//!
//! ```rust
//! use undertow::AsyncTask;
//!
//! let source = AsyncTask::<i32>::make(|_resolver| ());
//! let doubled = source.map(|x| x * 2);
//!
//! doubled.cancel();
//! assert!(source.is_cancelled());
//! ```
//!
//! # Threading
//!
//! Tasks are `!Send`. Everything runs on the thread that owns them: start
//! routines, cleanups and subscribers run synchronously from whichever call
//! triggered them. Host futures are adapted with `spawn_on` or, with the
//! `async` feature, `spawn_local` on a tokio `LocalSet`.
//!
//! # Lifetime
//!
//! A pending task holds its subscribers, and derived tasks hold their sources.
//! These references are released when the task settles. A task that never
//! settles keeps everything wired to it alive; cancel it to let go.

pub(crate) mod core;
mod aggregate;
mod fallible;
mod future;
mod plain;
mod spawn;
mod unwrapped;

pub use self::core::{Cleanup, IntoCleanup, TaskOptions, TaskStatus};
pub use aggregate::{AggregateTask, MixedTask};
pub use fallible::{FallibleAsyncTask, Settler};
pub use future::{SettledFuture, TaskFuture, UnwrappedFuture};
pub use plain::{AsyncTask, Resolver};
pub use unwrapped::UnwrappedAsyncTask;
