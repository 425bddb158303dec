//! The state machine shared by every single-resolution task.
//!
//! A [`TaskCell<V>`] is `Pending` until it is either resolved with a `V` or
//! cancelled, and never leaves a terminal state. Plain tasks use `V = T`,
//! fallible tasks use `V = Outcome<T, E>`.
//!
//! Everything runs on the caller's thread. No `RefCell` borrow is held while a
//! start routine, cleanup or subscriber runs, so any of them may call back into
//! the same cell (resolve it, cancel it, subscribe to it).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::OptionalValue;

type StartRoutine<V> = Box<dyn FnOnce(TaskCell<V>) -> Option<Cleanup>>;
type ResolvedCallback<V> = Box<dyn FnOnce(V)>;
type CancelledCallback = Box<dyn FnOnce()>;

/// A routine run once when a pending task is cancelled.
///
/// Start routines return one to release whatever they set up: a timer, a
/// spawned future, a subscription on another task.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use undertow::{AsyncTask, Cleanup};
///
/// let released = Rc::new(Cell::new(false));
/// let flag = released.clone();
/// let task = AsyncTask::<i32>::make(move |_resolver| Cleanup::new(move || flag.set(true)));
///
/// task.cancel();
/// assert!(released.get());
/// ```
pub struct Cleanup(Box<dyn FnOnce()>);

impl Cleanup {
    /// Wrap a routine.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Cleanup(Box::new(f))
    }

    /// Run the routine.
    pub fn run(self) {
        (self.0)()
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cleanup").finish_non_exhaustive()
    }
}

/// What a start routine may return: nothing, or a [`Cleanup`].
pub trait IntoCleanup {
    /// Convert into an optional cleanup routine.
    fn into_cleanup(self) -> Option<Cleanup>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Cleanup> {
        None
    }
}

impl IntoCleanup for Cleanup {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(self)
    }
}

impl IntoCleanup for Option<Cleanup> {
    fn into_cleanup(self) -> Option<Cleanup> {
        self
    }
}

/// Construction options for tasks.
///
/// # Example
///
/// ```rust
/// use undertow::{AsyncTask, TaskOptions};
///
/// let task = AsyncTask::make_with(|resolver| resolver.resolve(1), TaskOptions::new().lazy(true));
/// assert!(task.is_pending());
///
/// task.start();
/// assert!(task.is_resolved());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskOptions {
    lazy: bool,
}

impl TaskOptions {
    /// Default options: the start routine runs during construction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defer the start routine until the task is first used.
    ///
    /// Subscribing, awaiting, or calling `start` counts as use. Cancelling an
    /// unstarted lazy task discards the start routine without running it.
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Whether the start routine is deferred.
    pub fn is_lazy(&self) -> bool {
        self.lazy
    }
}

/// The observable state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Not settled yet.
    Pending,
    /// Settled with a value.
    Resolved,
    /// Cancelled before it settled.
    Cancelled,
}

impl TaskStatus {
    /// Returns `true` for `Resolved` and `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::Pending)
    }
}

struct Pending<V> {
    start: Option<StartRoutine<V>>,
    cleanup: Option<Cleanup>,
    on_resolved: Vec<ResolvedCallback<V>>,
    on_cancelled: Vec<CancelledCallback>,
}

enum TaskState<V> {
    Pending(Pending<V>),
    Resolved(V),
    Cancelled,
}

/// Shared handle to one task's state.
pub(crate) struct TaskCell<V> {
    inner: Rc<RefCell<TaskState<V>>>,
}

impl<V> Clone for TaskCell<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<V> fmt::Debug for TaskCell<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskCell")
            .field("status", &self.status())
            .finish()
    }
}

impl<V> TaskCell<V> {
    pub(crate) fn status(&self) -> TaskStatus {
        match &*self.inner.borrow() {
            TaskState::Pending(_) => TaskStatus::Pending,
            TaskState::Resolved(_) => TaskStatus::Resolved,
            TaskState::Cancelled => TaskStatus::Cancelled,
        }
    }
}

impl<V: Clone + 'static> TaskCell<V> {
    /// Create a pending cell; the routine runs now unless `options` is lazy.
    pub(crate) fn new(start: StartRoutine<V>, options: TaskOptions) -> Self {
        let cell = Self {
            inner: Rc::new(RefCell::new(TaskState::Pending(Pending {
                start: Some(start),
                cleanup: None,
                on_resolved: Vec::new(),
                on_cancelled: Vec::new(),
            }))),
        };
        if !options.is_lazy() {
            cell.start();
        }
        cell
    }

    pub(crate) fn resolved(value: V) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TaskState::Resolved(value))),
        }
    }

    pub(crate) fn cancelled() -> Self {
        Self {
            inner: Rc::new(RefCell::new(TaskState::Cancelled)),
        }
    }

    /// Run the start routine if it has not run yet.
    pub(crate) fn start(&self) {
        let routine = match &mut *self.inner.borrow_mut() {
            TaskState::Pending(pending) => pending.start.take(),
            _ => None,
        };
        if let Some(routine) = routine {
            let cleanup = routine(self.clone());
            self.install_cleanup(cleanup);
        }
    }

    fn install_cleanup(&self, cleanup: Option<Cleanup>) {
        let Some(cleanup) = cleanup else {
            return;
        };
        let cancelled = match &mut *self.inner.borrow_mut() {
            TaskState::Pending(pending) => {
                pending.cleanup = Some(cleanup);
                return;
            }
            TaskState::Cancelled => true,
            TaskState::Resolved(_) => false,
        };
        if cancelled {
            #[cfg(feature = "tracing")]
            tracing::trace!("task cancelled during its start routine, running cleanup");
            cleanup.run();
        }
    }

    /// Settle with `value`. Ignored unless the cell is pending.
    pub(crate) fn resolve(&self, value: V) {
        let pending = {
            let mut state = self.inner.borrow_mut();
            if !matches!(&*state, TaskState::Pending(_)) {
                #[cfg(feature = "tracing")]
                tracing::trace!("late resolution ignored, task already settled");
                return;
            }
            match std::mem::replace(&mut *state, TaskState::Resolved(value.clone())) {
                TaskState::Pending(pending) => pending,
                _ => return,
            }
        };
        let Pending { on_resolved, .. } = pending;
        for callback in on_resolved {
            callback(value.clone());
        }
    }

    /// Cancel a pending cell: cleanup first, then cancel subscribers in order.
    pub(crate) fn cancel(&self) {
        let pending = {
            let mut state = self.inner.borrow_mut();
            if !matches!(&*state, TaskState::Pending(_)) {
                return;
            }
            match std::mem::replace(&mut *state, TaskState::Cancelled) {
                TaskState::Pending(pending) => pending,
                _ => return,
            }
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(
            subscribers = pending.on_cancelled.len(),
            has_cleanup = pending.cleanup.is_some(),
            "task cancelled"
        );
        let Pending {
            cleanup,
            on_cancelled,
            ..
        } = pending;
        if let Some(cleanup) = cleanup {
            cleanup.run();
        }
        for callback in on_cancelled {
            callback();
        }
    }

    /// Call `callback` with the value once resolved; immediately if it already is.
    pub(crate) fn on_resolved<F>(&self, callback: F)
    where
        F: FnOnce(V) + 'static,
    {
        self.start();
        let value = match &mut *self.inner.borrow_mut() {
            TaskState::Pending(pending) => {
                pending.on_resolved.push(Box::new(callback));
                return;
            }
            TaskState::Resolved(value) => value.clone(),
            TaskState::Cancelled => return,
        };
        callback(value);
    }

    /// Call `callback` once cancelled; immediately if it already is.
    pub(crate) fn on_cancelled<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        self.start();
        match &mut *self.inner.borrow_mut() {
            TaskState::Pending(pending) => {
                pending.on_cancelled.push(Box::new(callback));
                return;
            }
            TaskState::Resolved(_) => return,
            TaskState::Cancelled => {}
        }
        callback();
    }

    /// Like [`on_cancelled`](Self::on_cancelled), without running a lazy start routine.
    fn watch_cancelled<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        match &mut *self.inner.borrow_mut() {
            TaskState::Pending(pending) => {
                pending.on_cancelled.push(Box::new(callback));
                return;
            }
            TaskState::Resolved(_) => return,
            TaskState::Cancelled => {}
        }
        callback();
    }

    /// Whether a lazy start routine is still waiting for first use.
    fn is_unstarted(&self) -> bool {
        matches!(&*self.inner.borrow(), TaskState::Pending(Pending { start: Some(_), .. }))
    }

    /// Call `callback` exactly once with `Present(value)` or `Absent` on cancellation.
    pub(crate) fn on_settled<F>(&self, callback: F)
    where
        F: FnOnce(OptionalValue<V>) + 'static,
    {
        let shared = Rc::new(RefCell::new(Some(callback)));
        let on_cancel = Rc::clone(&shared);
        self.on_resolved(move |value| {
            let callback = shared.borrow_mut().take();
            if let Some(callback) = callback {
                callback(OptionalValue::Present(value));
            }
        });
        self.on_cancelled(move || {
            let callback = on_cancel.borrow_mut().take();
            if let Some(callback) = callback {
                callback(OptionalValue::Absent);
            }
        });
    }

    /// The resolved value, if the cell is resolved.
    pub(crate) fn peek(&self) -> Option<V> {
        match &*self.inner.borrow() {
            TaskState::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// A new cell that resolves to `f(value)`; cancellation flows both ways.
    ///
    /// Deriving from an unstarted lazy cell gives a lazy cell: neither starts
    /// until the derived one is first used.
    pub(crate) fn derive<W, F>(&self, f: F) -> TaskCell<W>
    where
        W: Clone + 'static,
        F: FnOnce(V) -> W + 'static,
    {
        let lazy = self.is_unstarted();
        let source = self.clone();
        let derived = TaskCell::new(
            Box::new(move |derived: TaskCell<W>| {
                let target = derived.clone();
                source.on_settled(move |settled| match settled {
                    OptionalValue::Present(value) => target.resolve(f(value)),
                    OptionalValue::Absent => target.cancel(),
                });
                Some(Cleanup::new(move || source.cancel()))
            }),
            TaskOptions::new().lazy(lazy),
        );
        if lazy {
            // wired before either side starts
            let target = derived.clone();
            self.watch_cancelled(move || target.cancel());
            let source = self.clone();
            derived.watch_cancelled(move || source.cancel());
        }
        derived
    }

    /// Wait for every cell; cancelling any of them, or the result, cancels all.
    pub(crate) fn gather(cells: Vec<TaskCell<V>>) -> TaskCell<Vec<V>> {
        if cells.is_empty() {
            return TaskCell::resolved(Vec::new());
        }
        TaskCell::new(
            Box::new(move |aggregate: TaskCell<Vec<V>>| {
                let slots = Rc::new(RefCell::new(Gather::new(cells.len())));
                for (index, cell) in cells.iter().enumerate() {
                    if aggregate.status().is_terminal() {
                        break;
                    }
                    let target = aggregate.clone();
                    let slots = Rc::clone(&slots);
                    cell.on_settled(move |settled| match settled {
                        OptionalValue::Present(value) => {
                            let complete = slots.borrow_mut().fill(index, value);
                            if let Some(values) = complete {
                                target.resolve(values);
                            }
                        }
                        OptionalValue::Absent => target.cancel(),
                    });
                }
                Some(Cleanup::new(move || {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(members = cells.len(), "aggregate cancelled, cancelling members");
                    for cell in &cells {
                        cell.cancel();
                    }
                }))
            }),
            TaskOptions::new(),
        )
    }
}

/// Slots for the values of an aggregate, in input order.
struct Gather<V> {
    values: Vec<Option<V>>,
    remaining: usize,
}

impl<V> Gather<V> {
    fn new(len: usize) -> Self {
        Self {
            values: (0..len).map(|_| None).collect(),
            remaining: len,
        }
    }

    /// Store one value; returns every value once the last slot is filled.
    fn fill(&mut self, index: usize, value: V) -> Option<Vec<V>> {
        if self.values[index].replace(value).is_none() {
            self.remaining -= 1;
        }
        if self.remaining > 0 {
            return None;
        }
        Some(self.values.drain(..).flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let c = Rc::new(Cell::new(0));
        (c.clone(), c)
    }

    #[test]
    fn test_gather_fills_in_input_order() {
        let mut gather = Gather::new(3);
        assert_eq!(gather.fill(2, "c"), None);
        assert_eq!(gather.fill(0, "a"), None);
        assert_eq!(gather.fill(1, "b"), Some(vec!["a", "b", "c"]));
    }

    #[test]
    fn test_resolve_is_monotonic() {
        let cell = TaskCell::<i32>::new(Box::new(|_: TaskCell<i32>| None), TaskOptions::new());
        cell.resolve(1);
        cell.resolve(2);
        cell.cancel();
        assert_eq!(cell.status(), TaskStatus::Resolved);
        assert_eq!(cell.peek(), Some(1));
    }

    #[test]
    fn test_cancel_runs_cleanup_once() {
        let (count, seen) = counter();
        let cell = TaskCell::<i32>::new(
            Box::new(move |_: TaskCell<i32>| Some(Cleanup::new(move || count.set(count.get() + 1)))),
            TaskOptions::new(),
        );
        cell.cancel();
        cell.cancel();
        assert_eq!(seen.get(), 1);
        assert_eq!(cell.status(), TaskStatus::Cancelled);
    }

    #[test]
    fn test_cleanup_runs_when_cancelled_inside_start() {
        let (count, seen) = counter();
        let cell = TaskCell::<i32>::new(
            Box::new(move |cell: TaskCell<i32>| {
                cell.cancel();
                Some(Cleanup::new(move || count.set(count.get() + 1)))
            }),
            TaskOptions::new(),
        );
        assert_eq!(cell.status(), TaskStatus::Cancelled);
        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn test_cleanup_dropped_after_resolution() {
        let (count, seen) = counter();
        let cell = TaskCell::<i32>::new(
            Box::new(move |cell: TaskCell<i32>| {
                cell.resolve(3);
                Some(Cleanup::new(move || count.set(count.get() + 1)))
            }),
            TaskOptions::new(),
        );
        cell.cancel();
        assert_eq!(cell.peek(), Some(3));
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn test_lazy_cell_starts_on_subscription() {
        let (runs, seen) = counter();
        let cell = TaskCell::<i32>::new(
            Box::new(move |cell: TaskCell<i32>| {
                runs.set(runs.get() + 1);
                cell.resolve(9);
                None
            }),
            TaskOptions::new().lazy(true),
        );
        assert_eq!(seen.get(), 0);
        let got = Rc::new(Cell::new(0));
        let sink = got.clone();
        cell.on_resolved(move |v| sink.set(v));
        cell.on_resolved(|_| {});
        assert_eq!(seen.get(), 1);
        assert_eq!(got.get(), 9);
    }

    #[test]
    fn test_on_settled_fires_once() {
        let cell = TaskCell::<i32>::new(Box::new(|_: TaskCell<i32>| None), TaskOptions::new());
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        cell.on_settled(move |settled| sink.borrow_mut().push(settled));
        cell.cancel();
        cell.resolve(1);
        assert_eq!(*log.borrow(), vec![OptionalValue::Absent]);
    }

    #[test]
    fn test_derive_cancels_both_ways() {
        let source = TaskCell::<i32>::new(Box::new(|_: TaskCell<i32>| None), TaskOptions::new());
        let derived = source.derive(|v| v + 1);
        derived.cancel();
        assert_eq!(source.status(), TaskStatus::Cancelled);

        let source = TaskCell::<i32>::new(Box::new(|_: TaskCell<i32>| None), TaskOptions::new());
        let derived = source.derive(|v| v + 1);
        source.cancel();
        assert_eq!(derived.status(), TaskStatus::Cancelled);
    }

    fn lazy_counting(runs: Rc<Cell<u32>>, value: i32) -> TaskCell<i32> {
        TaskCell::new(
            Box::new(move |cell: TaskCell<i32>| {
                runs.set(runs.get() + 1);
                cell.resolve(value);
                None
            }),
            TaskOptions::new().lazy(true),
        )
    }

    #[test]
    fn test_derive_from_lazy_cell_waits_for_use() {
        let (runs, seen) = counter();
        let source = lazy_counting(runs, 4);
        let derived = source.derive(|v| v * 2);
        let twice = derived.derive(|v| v + 1);
        assert_eq!(seen.get(), 0);
        assert_eq!(twice.status(), TaskStatus::Pending);

        twice.on_resolved(|_| {});
        assert_eq!(seen.get(), 1);
        assert_eq!(derived.peek(), Some(8));
        assert_eq!(twice.peek(), Some(9));
    }

    #[test]
    fn test_derive_from_lazy_cell_cancels_both_ways_unstarted() {
        let (runs, seen) = counter();
        let source = lazy_counting(runs.clone(), 1);
        let derived = source.derive(|v| v + 1);
        derived.cancel();
        assert_eq!(source.status(), TaskStatus::Cancelled);

        let source = lazy_counting(runs, 1);
        let derived = source.derive(|v| v + 1);
        source.cancel();
        assert_eq!(derived.status(), TaskStatus::Cancelled);
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn test_gather_stops_wiring_once_cancelled() {
        let (runs, seen) = counter();
        let lazy = lazy_counting(runs, 2);
        let gathered = TaskCell::gather(vec![TaskCell::cancelled(), lazy.clone()]);
        assert_eq!(gathered.status(), TaskStatus::Cancelled);
        assert_eq!(lazy.status(), TaskStatus::Cancelled);
        assert_eq!(seen.get(), 0);
    }

    #[test]
    fn test_gather_empty_resolves_immediately() {
        let gathered = TaskCell::<i32>::gather(Vec::new());
        assert_eq!(gathered.peek(), Some(vec![]));
    }
}
