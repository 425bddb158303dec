//! Waiting on many tasks at once.
//!
//! Every aggregate resolves only after each input has resolved, and is
//! cancelled as soon as any input is cancelled. Cancelling the aggregate
//! cancels every input still pending.
//!
//! Fallible aggregates wait for every input even after one has failed; the
//! reported failure is the first in input order, not the first to arrive.
//!
//! # Example
//!
//! ```rust
//! use undertow::{AsyncTask, FallibleAsyncTask, MixedTask, OptionalValue, Outcome};
//!
//! # tokio_test::block_on(async {
//! let aggregate = AsyncTask::all_mixed(vec![
//!     MixedTask::from(AsyncTask::of(4)),
//!     MixedTask::from(FallibleAsyncTask::of_failure("BOO")),
//! ]);
//! assert_eq!(aggregate.await, OptionalValue::Present(Outcome::Failure("BOO")));
//! # });
//! ```

use std::future::IntoFuture;

use crate::task::core::TaskCell;
use crate::task::fallible::FallibleAsyncTask;
use crate::task::future::TaskFuture;
use crate::task::plain::AsyncTask;
use crate::{OptionalValue, Outcome};

impl<T: Clone + 'static> AsyncTask<T> {
    /// Resolve to every value, in input order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::AsyncTask;
    ///
    /// let all = AsyncTask::all(vec![AsyncTask::of(1), AsyncTask::of(2)]);
    /// assert_eq!(all.peek().unwrap(), vec![1, 2]);
    /// ```
    pub fn all<I>(tasks: I) -> AsyncTask<Vec<T>>
    where
        I: IntoIterator<Item = AsyncTask<T>>,
    {
        let cells = tasks.into_iter().map(|task| task.cell).collect();
        AsyncTask::from_cell(TaskCell::gather(cells))
    }

    /// Resolve to every value paired with its key, collected into `M`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::HashMap;
    /// use undertow::AsyncTask;
    ///
    /// let keyed: undertow::AsyncTask<HashMap<&str, i32>> =
    ///     AsyncTask::all_keyed(vec![("a", AsyncTask::of(1)), ("b", AsyncTask::of(2))]);
    /// assert_eq!(keyed.peek().unwrap()["b"], 2);
    /// ```
    pub fn all_keyed<K, M, I>(tasks: I) -> AsyncTask<M>
    where
        K: 'static,
        M: FromIterator<(K, T)> + Clone + 'static,
        I: IntoIterator<Item = (K, AsyncTask<T>)>,
    {
        let (keys, cells): (Vec<K>, Vec<TaskCell<T>>) =
            tasks.into_iter().map(|(key, task)| (key, task.cell)).unzip();
        AsyncTask::from_cell(
            TaskCell::gather(cells).derive(move |values| keys.into_iter().zip(values).collect()),
        )
    }
}

impl<T: Clone + 'static, E: Clone + 'static> FallibleAsyncTask<T, E> {
    /// Resolve to [`Outcome::all`] of the inputs' outcomes.
    pub fn all<I>(tasks: I) -> FallibleAsyncTask<Vec<T>, E>
    where
        I: IntoIterator<Item = FallibleAsyncTask<T, E>>,
    {
        let cells = tasks.into_iter().map(|task| task.cell).collect();
        FallibleAsyncTask::from_cell(TaskCell::gather(cells).derive(Outcome::all))
    }

    /// Resolve to [`Outcome::all_keyed`] of the inputs' outcomes.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use undertow::{FallibleAsyncTask, Outcome};
    ///
    /// let keyed: FallibleAsyncTask<BTreeMap<&str, i32>, &str> = FallibleAsyncTask::all_keyed(vec![
    ///     ("a", FallibleAsyncTask::of_success(1)),
    ///     ("b", FallibleAsyncTask::of_failure("E")),
    /// ]);
    /// assert_eq!(keyed.peek().unwrap(), Outcome::Failure("E"));
    /// ```
    pub fn all_keyed<K, M, I>(tasks: I) -> FallibleAsyncTask<M, E>
    where
        K: 'static,
        M: FromIterator<(K, T)> + Clone + 'static,
        I: IntoIterator<Item = (K, FallibleAsyncTask<T, E>)>,
    {
        let (keys, cells): (Vec<K>, Vec<TaskCell<Outcome<T, E>>>) =
            tasks.into_iter().map(|(key, task)| (key, task.cell)).unzip();
        FallibleAsyncTask::from_cell(
            TaskCell::gather(cells)
                .derive(move |outcomes| Outcome::all_keyed(keys.into_iter().zip(outcomes))),
        )
    }
}

/// An input to [`AsyncTask::all_mixed`]: either kind of task.
#[derive(Debug)]
pub enum MixedTask<T, E> {
    /// A task that cannot fail.
    Plain(AsyncTask<T>),
    /// A task that settles with an outcome.
    Fallible(FallibleAsyncTask<T, E>),
}

impl<T, E> Clone for MixedTask<T, E> {
    fn clone(&self) -> Self {
        match self {
            MixedTask::Plain(task) => MixedTask::Plain(task.clone()),
            MixedTask::Fallible(task) => MixedTask::Fallible(task.clone()),
        }
    }
}

impl<T, E> From<AsyncTask<T>> for MixedTask<T, E> {
    fn from(task: AsyncTask<T>) -> Self {
        MixedTask::Plain(task)
    }
}

impl<T, E> From<FallibleAsyncTask<T, E>> for MixedTask<T, E> {
    fn from(task: FallibleAsyncTask<T, E>) -> Self {
        MixedTask::Fallible(task)
    }
}

/// The result of a mixed aggregate.
///
/// `Plain` when no input could fail, `Fallible` as soon as one could.
#[derive(Debug)]
pub enum AggregateTask<T, E> {
    /// Every input was plain.
    Plain(AsyncTask<T>),
    /// At least one input was fallible.
    Fallible(FallibleAsyncTask<T, E>),
}

impl<T, E> Clone for AggregateTask<T, E> {
    fn clone(&self) -> Self {
        match self {
            AggregateTask::Plain(task) => AggregateTask::Plain(task.clone()),
            AggregateTask::Fallible(task) => AggregateTask::Fallible(task.clone()),
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> AggregateTask<T, E> {
    /// Returns `true` if at least one input was fallible.
    pub fn is_fallible(&self) -> bool {
        matches!(self, AggregateTask::Fallible(_))
    }

    /// Cancel the aggregate and, through it, every input.
    pub fn cancel(&self) {
        match self {
            AggregateTask::Plain(task) => task.cancel(),
            AggregateTask::Fallible(task) => task.cancel(),
        }
    }

    /// View either kind as a fallible task.
    pub fn into_fallible(self) -> FallibleAsyncTask<T, E> {
        match self {
            AggregateTask::Plain(task) => task.to_fallible(),
            AggregateTask::Fallible(task) => task,
        }
    }
}

impl<T: Clone + 'static, E: Clone + 'static> IntoFuture for AggregateTask<T, E> {
    type Output = OptionalValue<Outcome<T, E>>;
    type IntoFuture = TaskFuture<Outcome<T, E>>;

    fn into_future(self) -> Self::IntoFuture {
        self.into_fallible().into_future()
    }
}

impl<T: Clone + 'static> AsyncTask<T> {
    /// Aggregate plain and fallible tasks together.
    ///
    /// With only plain inputs the result is an `AsyncTask<Vec<T>>`. Otherwise
    /// every plain input is promoted with [`to_fallible`](AsyncTask::to_fallible)
    /// and the result is [`FallibleAsyncTask::all`].
    pub fn all_mixed<E, I>(tasks: I) -> AggregateTask<Vec<T>, E>
    where
        E: Clone + 'static,
        I: IntoIterator<Item = MixedTask<T, E>>,
    {
        let tasks: Vec<MixedTask<T, E>> = tasks.into_iter().collect();
        match into_plain(tasks) {
            Ok(plain) => AggregateTask::Plain(AsyncTask::all(plain)),
            Err(mixed) => AggregateTask::Fallible(FallibleAsyncTask::all(
                mixed.into_iter().map(promote),
            )),
        }
    }

    /// Keyed counterpart of [`all_mixed`](AsyncTask::all_mixed).
    pub fn all_keyed_mixed<K, M, E, I>(tasks: I) -> AggregateTask<M, E>
    where
        K: 'static,
        M: FromIterator<(K, T)> + Clone + 'static,
        E: Clone + 'static,
        I: IntoIterator<Item = (K, MixedTask<T, E>)>,
    {
        let (keys, tasks): (Vec<K>, Vec<MixedTask<T, E>>) = tasks.into_iter().unzip();
        match into_plain(tasks) {
            Ok(plain) => AggregateTask::Plain(AsyncTask::all_keyed(keys.into_iter().zip(plain))),
            Err(mixed) => AggregateTask::Fallible(FallibleAsyncTask::all_keyed(
                keys.into_iter().zip(mixed.into_iter().map(promote)),
            )),
        }
    }
}

/// All plain tasks, or the inputs untouched if any of them is fallible.
fn into_plain<T, E>(tasks: Vec<MixedTask<T, E>>) -> Result<Vec<AsyncTask<T>>, Vec<MixedTask<T, E>>> {
    if tasks.iter().any(|task| matches!(task, MixedTask::Fallible(_))) {
        return Err(tasks);
    }
    Ok(tasks
        .into_iter()
        .filter_map(|task| match task {
            MixedTask::Plain(task) => Some(task),
            MixedTask::Fallible(_) => None,
        })
        .collect())
}

fn promote<T: Clone + 'static, E: Clone + 'static>(task: MixedTask<T, E>) -> FallibleAsyncTask<T, E> {
    match task {
        MixedTask::Plain(task) => task.to_fallible(),
        MixedTask::Fallible(task) => task,
    }
}
