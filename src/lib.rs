//! # Undertow
//!
//! Cancellable, single-resolution asynchronous tasks and the value containers
//! they settle with.
//!
//! - [`OptionalValue<T>`]: `Present(value)` or `Absent`.
//! - [`Outcome<T, E>`]: `Success(value)` or `Failure(error)`.
//! - [`AsyncTask<T>`]: resolves once with a `T`, or is cancelled.
//! - [`FallibleAsyncTask<T, E>`]: resolves once with an `Outcome<T, E>`, or is cancelled.
//! - [`UnwrappedAsyncTask<T, P>`]: surfaces a task's value directly and reports
//!   cancellation as a [`CancellationSignal`].
//!
//! Tasks run on a single thread. Cancellation is cooperative and travels both
//! ways through derived tasks: cancel the end of a pipeline and every stage
//! still pending is cancelled with it.
//!
//! ## Quick Example
//!
//! ```rust
//! use undertow::{FallibleAsyncTask, OptionalValue, Outcome};
//!
//! fn parse_port(raw: &str) -> Outcome<u16, String> {
//!     Outcome::from_result(raw.parse::<u16>().map_err(|e| e.to_string()))
//! }
//!
//! # tokio_test::block_on(async {
//! let port = FallibleAsyncTask::<String, String>::of_success("8080".to_string())
//!     .and_then(|raw| parse_port(&raw))
//!     .map(|port| port + 1);
//!
//! assert_eq!(port.await, OptionalValue::Present(Outcome::Success(8081)));
//! # });
//! ```
//!
//! ## Features
//!
//! - `async` (default): [`TokioScheduler`] and `spawn_local` on a tokio `LocalSet`.
//! - `serde` (default): the tagged serialized form of [`OptionalValue`] and [`Outcome`].
//! - `tracing`: trace and debug events for cancellation and ignored resolutions.
//! - `proptest`: `Arbitrary` implementations for the value containers.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod optional;
pub mod outcome;
pub mod scheduler;
pub mod task;
pub mod testing;

#[cfg(feature = "serde")]
mod serde_impl;

// Re-exports
pub use error::{
    CancellationSignal, EmptyValueError, InvalidSerializedFormError, OutcomeVariant,
    UnmetExpectationError,
};
pub use optional::OptionalValue;
pub use outcome::Outcome;
pub use scheduler::Scheduler;
#[cfg(feature = "async")]
pub use scheduler::TokioScheduler;
pub use task::{
    AggregateTask, AsyncTask, Cleanup, FallibleAsyncTask, IntoCleanup, MixedTask, Resolver,
    SettledFuture, Settler, TaskFuture, TaskOptions, TaskStatus, UnwrappedAsyncTask,
    UnwrappedFuture,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::CancellationSignal;
    pub use crate::optional::OptionalValue;
    pub use crate::outcome::Outcome;
    pub use crate::scheduler::Scheduler;
    pub use crate::task::{
        AsyncTask, Cleanup, FallibleAsyncTask, MixedTask, TaskOptions, UnwrappedAsyncTask,
    };
}
