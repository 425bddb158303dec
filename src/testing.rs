//! Testing utilities for undertow
//!
//! This module provides a virtual-clock [`Scheduler`] for driving timer-based
//! tasks deterministically, assertion macros for the value containers, and
//! property-based testing support.
//!
//! # Examples
//!
//! ## ManualScheduler
//!
//! ```rust
//! use std::time::Duration;
//! use undertow::testing::ManualScheduler;
//! use undertow::AsyncTask;
//!
//! let clock = ManualScheduler::new();
//! let greeting = AsyncTask::after(&clock, Duration::from_secs(1), "hello");
//! assert!(greeting.is_pending());
//!
//! clock.advance(Duration::from_secs(1));
//! assert!(greeting.is_resolved());
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use undertow::{assert_absent, assert_failure, assert_present, assert_success};
//! use undertow::{OptionalValue, Outcome};
//!
//! assert_present!(OptionalValue::present(1));
//! assert_absent!(OptionalValue::<i32>::absent());
//! assert_success!(Outcome::<_, String>::success(42));
//! assert_failure!(Outcome::<i32, _>::failure("boom"));
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::scheduler::Scheduler;

/// Identifies a timer registered with a [`ManualScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    due: Duration,
    seq: u64,
}

impl TimerId {
    /// The virtual time at which the timer fires.
    pub fn due(&self) -> Duration {
        self.due
    }
}

struct Clock {
    now: Duration,
    next_seq: u64,
    timers: BTreeMap<TimerId, Box<dyn FnOnce()>>,
}

/// A scheduler whose clock only moves when [`advance`](ManualScheduler::advance) is called.
///
/// Timers due at the same instant fire in the order they were scheduled.
/// Clones share the same clock.
#[derive(Clone)]
pub struct ManualScheduler {
    clock: Rc<RefCell<Clock>>,
}

impl ManualScheduler {
    /// A scheduler at virtual time zero with no timers.
    pub fn new() -> Self {
        Self {
            clock: Rc::new(RefCell::new(Clock {
                now: Duration::ZERO,
                next_seq: 0,
                timers: BTreeMap::new(),
            })),
        }
    }

    /// The current virtual time.
    pub fn now(&self) -> Duration {
        self.clock.borrow().now
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending_timers(&self) -> usize {
        self.clock.borrow().timers.len()
    }

    /// Move the clock forward by `by`, firing every timer that falls due.
    ///
    /// Timers scheduled by a firing callback also fire if they fall due within
    /// the same window.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        loop {
            let next = {
                let mut clock = self.clock.borrow_mut();
                let due = clock.timers.keys().next().copied().filter(|id| id.due <= target);
                match due {
                    Some(id) => {
                        clock.now = id.due;
                        clock.timers.remove(&id)
                    }
                    None => None,
                }
            };
            match next {
                Some(callback) => callback(),
                None => break,
            }
        }
        self.clock.borrow_mut().now = target;
    }
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clock = self.clock.borrow();
        f.debug_struct("ManualScheduler")
            .field("now", &clock.now)
            .field("pending_timers", &clock.timers.len())
            .finish()
    }
}

impl Scheduler for ManualScheduler {
    type Handle = TimerId;

    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let mut clock = self.clock.borrow_mut();
        let id = TimerId {
            due: clock.now + delay,
            seq: clock.next_seq,
        };
        clock.next_seq += 1;
        clock.timers.insert(id, callback);
        id
    }

    fn cancel(&self, handle: TimerId) {
        // dropped outside the borrow
        let removed = self.clock.borrow_mut().timers.remove(&handle);
        drop(removed);
    }
}

/// Assert that an optional value is present.
///
/// This macro will panic if the value is `Absent`.
///
/// # Example
///
/// ```rust
/// use undertow::{OptionalValue, assert_present};
///
/// assert_present!(OptionalValue::present(42));
/// ```
#[macro_export]
macro_rules! assert_present {
    ($optional:expr) => {
        match $optional {
            $crate::OptionalValue::Present(_) => {}
            $crate::OptionalValue::Absent => {
                panic!("Expected Present, got Absent");
            }
        }
    };
}

/// Assert that an optional value is absent.
///
/// This macro will panic if the value is `Present`.
#[macro_export]
macro_rules! assert_absent {
    ($optional:expr) => {
        match $optional {
            $crate::OptionalValue::Absent => {}
            $crate::OptionalValue::Present(v) => {
                panic!("Expected Absent, got Present: {:?}", v);
            }
        }
    };
}

/// Assert that an outcome succeeded.
///
/// This macro will panic if the outcome is a `Failure`.
///
/// # Example
///
/// ```rust
/// use undertow::{Outcome, assert_success};
///
/// let outcome = Outcome::<_, String>::success(42);
/// assert_success!(outcome);
/// ```
#[macro_export]
macro_rules! assert_success {
    ($outcome:expr) => {
        match $outcome {
            $crate::Outcome::Success(_) => {}
            $crate::Outcome::Failure(e) => {
                panic!("Expected Success, got Failure: {:?}", e);
            }
        }
    };
}

/// Assert that an outcome failed.
///
/// This macro will panic if the outcome is a `Success`.
#[macro_export]
macro_rules! assert_failure {
    ($outcome:expr) => {
        match $outcome {
            $crate::Outcome::Failure(_) => {}
            $crate::Outcome::Success(v) => {
                panic!("Expected Failure, got Success: {:?}", v);
            }
        }
    };
}

/// Assert that an outcome failed with a specific error.
///
/// # Example
///
/// ```rust
/// use undertow::{Outcome, assert_failure_eq};
///
/// let outcome = Outcome::<i32, _>::failure("timeout");
/// assert_failure_eq!(outcome, "timeout");
/// ```
#[macro_export]
macro_rules! assert_failure_eq {
    ($outcome:expr, $expected:expr) => {
        match $outcome {
            $crate::Outcome::Failure(error) => {
                assert_eq!(error, $expected);
            }
            $crate::Outcome::Success(v) => {
                panic!("Expected Failure {:?}, got Success: {:?}", $expected, v);
            }
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl<T> Arbitrary for crate::OptionalValue<T>
where
    T: Arbitrary + 'static,
{
    type Parameters = T::Parameters;
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            1 => Just(()).prop_map(|()| crate::OptionalValue::Absent),
            3 => any_with::<T>(args).prop_map(crate::OptionalValue::present),
        ]
        .boxed()
    }
}

#[cfg(feature = "proptest")]
impl<T, E> Arbitrary for crate::Outcome<T, E>
where
    T: Arbitrary + 'static,
    E: Arbitrary + 'static,
{
    type Parameters = (T::Parameters, E::Parameters);
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(args: Self::Parameters) -> Self::Strategy {
        let (t_params, e_params) = args;
        prop_oneof![
            any_with::<T>(t_params).prop_map(crate::Outcome::success),
            any_with::<E>(e_params).prop_map(crate::Outcome::failure),
        ]
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OptionalValue, Outcome};
    use std::cell::Cell;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, Rc<RefCell<Vec<&'static str>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        (log.clone(), log)
    }

    #[test]
    fn test_manual_scheduler_fires_due_timers_in_order() {
        let clock = ManualScheduler::new();
        let (log, seen) = recorder();
        let l = log.clone();
        clock.schedule(Duration::from_millis(20), Box::new(move || l.borrow_mut().push("b")));
        let l = log.clone();
        clock.schedule(Duration::from_millis(10), Box::new(move || l.borrow_mut().push("a")));
        clock.schedule(Duration::from_millis(20), Box::new(move || log.borrow_mut().push("c")));

        clock.advance(Duration::from_millis(15));
        assert_eq!(*seen.borrow(), vec!["a"]);
        clock.advance(Duration::from_millis(5));
        assert_eq!(*seen.borrow(), vec!["a", "b", "c"]);
        assert_eq!(clock.now(), Duration::from_millis(20));
    }

    #[test]
    fn test_manual_scheduler_cancel_prevents_firing() {
        let clock = ManualScheduler::new();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let id = clock.schedule(Duration::from_secs(1), Box::new(move || flag.set(true)));
        assert_eq!(clock.pending_timers(), 1);

        clock.cancel(id);
        clock.advance(Duration::from_secs(2));
        assert!(!fired.get());
        assert_eq!(clock.pending_timers(), 0);
    }

    #[test]
    fn test_manual_scheduler_runs_timers_scheduled_while_advancing() {
        let clock = ManualScheduler::new();
        let fired = Rc::new(Cell::new(0));
        let inner_clock = clock.clone();
        let counter = fired.clone();
        clock.schedule(
            Duration::from_millis(5),
            Box::new(move || {
                let counter = counter.clone();
                inner_clock.schedule(
                    Duration::from_millis(5),
                    Box::new(move || counter.set(counter.get() + 1)),
                );
            }),
        );

        clock.advance(Duration::from_millis(10));
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_assert_present_macro() {
        assert_present!(OptionalValue::present(1));
    }

    #[test]
    fn test_assert_absent_macro() {
        assert_absent!(OptionalValue::<i32>::absent());
    }

    #[test]
    fn test_assert_success_macro() {
        let outcome = Outcome::<_, String>::success(42);
        assert_success!(outcome);
    }

    #[test]
    fn test_assert_failure_macro() {
        assert_failure!(Outcome::<i32, _>::failure("error"));
    }

    #[test]
    fn test_assert_failure_eq_macro() {
        assert_failure_eq!(Outcome::<i32, _>::failure("error"), "error");
    }

    #[test]
    #[should_panic(expected = "Expected Present, got Absent")]
    fn test_assert_present_panics_on_absent() {
        assert_present!(OptionalValue::<i32>::Absent);
    }

    #[test]
    #[should_panic(expected = "Expected Success, got Failure")]
    fn test_assert_success_panics_on_failure() {
        assert_success!(Outcome::<i32, _>::failure("error"));
    }

    #[test]
    #[should_panic(expected = "Expected Failure, got Success")]
    fn test_assert_failure_panics_on_success() {
        assert_failure!(Outcome::<_, String>::success(42));
    }

    #[cfg(feature = "proptest")]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_outcome_arbitrary_generates_valid_instances(
                outcome in any::<Outcome<i32, String>>()
            ) {
                match outcome {
                    Outcome::Success(_) => prop_assert!(outcome.is_success()),
                    Outcome::Failure(_) => prop_assert!(outcome.is_failure()),
                }
            }

            #[test]
            fn test_optional_arbitrary_round_trips_through_option(
                optional in any::<OptionalValue<u8>>()
            ) {
                prop_assert_eq!(OptionalValue::from_nullable(optional.into_option()), optional);
            }
        }
    }
}
