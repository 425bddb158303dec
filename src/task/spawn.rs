//! Running host futures as tasks.
//!
//! A future handed to `spawn_on` or `spawn_local` is driven by an executor;
//! its output settles the task. Cancelling the task stops the future: the
//! remote handle is dropped, or the tokio join handle is aborted.

use std::future::Future;

use futures::channel::oneshot;
use futures::task::{LocalSpawn, LocalSpawnExt, SpawnError};

use crate::task::core::Cleanup;
use crate::task::fallible::{FallibleAsyncTask, Settler};
use crate::task::plain::{AsyncTask, Resolver};
use crate::Outcome;

impl<T: Clone + 'static> AsyncTask<T> {
    /// Drive `future` on `spawner` and resolve with its output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use futures::executor::LocalPool;
    /// use undertow::{AsyncTask, OptionalValue};
    ///
    /// let mut pool = LocalPool::new();
    /// let task = AsyncTask::spawn_on(&pool.spawner(), async { 40 + 2 }).unwrap();
    /// pool.run_until_stalled();
    /// assert_eq!(task.peek(), OptionalValue::Present(42));
    /// ```
    pub fn spawn_on<S, Fut>(spawner: &S, future: Fut) -> Result<Self, SpawnError>
    where
        S: LocalSpawn + ?Sized,
        Fut: Future<Output = T> + 'static,
    {
        let (deliver, resolver) = oneshot::channel::<Resolver<T>>();
        let handle = spawner.spawn_local_with_handle(async move {
            let value = future.await;
            if let Ok(resolver) = resolver.await {
                resolver.resolve(value);
            }
        })?;
        Ok(Self::make(move |resolver| {
            // the receiver is held by the spawned future
            let _ = deliver.send(resolver);
            Cleanup::new(move || drop(handle))
        }))
    }

    /// Drive `future` on the current tokio `LocalSet`.
    ///
    /// Panics, like `tokio::task::spawn_local`, when called outside a `LocalSet`.
    #[cfg(feature = "async")]
    pub fn spawn_local<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = T> + 'static,
    {
        Self::make(move |resolver| {
            let handle = tokio::task::spawn_local(async move { resolver.resolve(future.await) });
            Cleanup::new(move || handle.abort())
        })
    }
}

impl<T: Clone + 'static, E: Clone + 'static> FallibleAsyncTask<T, E> {
    /// Drive `future` on `spawner`; `Ok` succeeds the task, `Err` fails it.
    pub fn spawn_on<S, Fut>(spawner: &S, future: Fut) -> Result<Self, SpawnError>
    where
        S: LocalSpawn + ?Sized,
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        let (deliver, settler) = oneshot::channel::<Settler<T, E>>();
        let handle = spawner.spawn_local_with_handle(async move {
            let result = future.await;
            if let Ok(settler) = settler.await {
                settler.settle(Outcome::from_result(result));
            }
        })?;
        Ok(Self::make(move |settler| {
            // the receiver is held by the spawned future
            let _ = deliver.send(settler);
            Cleanup::new(move || drop(handle))
        }))
    }

    /// Drive `future` on the current tokio `LocalSet`.
    ///
    /// Panics, like `tokio::task::spawn_local`, when called outside a `LocalSet`.
    #[cfg(feature = "async")]
    pub fn spawn_local<Fut>(future: Fut) -> Self
    where
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        Self::make(move |settler| {
            let handle = tokio::task::spawn_local(async move {
                settler.settle(Outcome::from_result(future.await));
            });
            Cleanup::new(move || handle.abort())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OptionalValue;
    use futures::executor::LocalPool;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_spawned_future_settles_task() {
        let mut pool = LocalPool::new();
        let task =
            FallibleAsyncTask::<i32, String>::spawn_on(&pool.spawner(), async { Err("io".to_string()) })
                .unwrap();
        assert!(task.is_pending());
        pool.run_until_stalled();
        assert_eq!(task.peek(), OptionalValue::Present(Outcome::Failure("io".to_string())));
    }

    #[test]
    fn test_cancel_stops_spawned_future() {
        let mut pool = LocalPool::new();
        let polled = Rc::new(Cell::new(false));
        let flag = polled.clone();
        let task = AsyncTask::spawn_on(&pool.spawner(), async move {
            flag.set(true);
            1
        })
        .unwrap();

        task.cancel();
        pool.run_until_stalled();
        assert!(task.is_cancelled());
        assert!(!polled.get());
    }
}
