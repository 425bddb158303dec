//! A two-variant container for the result of a computation that may fail.
//!
//! `Outcome<T, E>` is either `Success(T)` or `Failure(E)`. It is the settled
//! value of a [`FallibleAsyncTask`](crate::FallibleAsyncTask), and the
//! synchronous building block for its combinators.
//!
//! # Outcome vs Result
//!
//! The two convert freely (`From` both ways, [`Outcome::from_result`],
//! [`Outcome::into_result`]). `Outcome` adds the container vocabulary shared with
//! [`OptionalValue`]: `fold`, `tap`, `tap_error`, `to_optional_value`, and the
//! first-failure aggregation of [`Outcome::all`] / [`Outcome::all_keyed`].
//!
//! # Examples
//!
//! ```rust
//! use undertow::Outcome;
//!
//! fn parse(s: &str) -> Outcome<i32, String> {
//!     Outcome::from_execution_with(|| s.parse::<i32>(), |e| e.to_string())
//! }
//!
//! assert_eq!(parse("21").map(|n| n * 2), Outcome::Success(42));
//! assert!(parse("x").is_failure());
//! ```

use std::future::Future;

use crate::error::{OutcomeVariant, UnmetExpectationError};
use crate::OptionalValue;

/// Either `Success(T)` or `Failure(E)`.
///
/// # Example
///
/// ```rust
/// use undertow::Outcome;
///
/// let ok: Outcome<i32, &str> = Outcome::success(1);
/// let bad: Outcome<i32, &str> = Outcome::failure("nope");
///
/// assert_eq!(ok.and_then(|x| Outcome::success(x + 1)), Outcome::Success(2));
/// assert_eq!(bad.and_then(|x| Outcome::success(x + 1)), Outcome::Failure("nope"));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Outcome<T, E> {
    /// The computation succeeded.
    Success(T),
    /// The computation failed.
    Failure(E),
}

impl<T, E> Outcome<T, E> {
    // ========== Constructors ==========

    /// Create a successful outcome.
    #[inline]
    pub fn success(value: T) -> Self {
        Outcome::Success(value)
    }

    /// Create a failed outcome.
    #[inline]
    pub fn failure(error: E) -> Self {
        Outcome::Failure(error)
    }

    /// Convert a `Result`.
    #[inline]
    pub fn from_result(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Outcome::Success(v),
            Err(e) => Outcome::Failure(e),
        }
    }

    /// Convert into a `Result`.
    #[inline]
    pub fn into_result(self) -> Result<T, E> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::Failure(e) => Err(e),
        }
    }

    /// Run a fallible computation, capturing its error as a `Failure`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::Outcome;
    ///
    /// let outcome = Outcome::from_execution(|| "7".parse::<u8>());
    /// assert_eq!(outcome, Outcome::Success(7));
    /// ```
    pub fn from_execution<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<T, E>,
    {
        Outcome::from_result(f())
    }

    /// Run a fallible computation, mapping its error into `E`.
    pub fn from_execution_with<X, F, M>(f: F, error_mapper: M) -> Self
    where
        F: FnOnce() -> Result<T, X>,
        M: FnOnce(X) -> E,
    {
        match f() {
            Ok(v) => Outcome::Success(v),
            Err(x) => Outcome::Failure(error_mapper(x)),
        }
    }

    /// Await a fallible future, capturing its error as a `Failure`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::Outcome;
    ///
    /// # tokio_test::block_on(async {
    /// let outcome = Outcome::from_awaitable(async { Err::<i32, _>("offline") }).await;
    /// assert_eq!(outcome, Outcome::Failure("offline"));
    /// # });
    /// ```
    pub async fn from_awaitable<Fut>(awaitable: Fut) -> Self
    where
        Fut: Future<Output = Result<T, E>>,
    {
        Outcome::from_result(awaitable.await)
    }

    /// Await a fallible future, mapping its error into `E`.
    pub async fn from_awaitable_with<X, Fut, M>(awaitable: Fut, error_mapper: M) -> Self
    where
        Fut: Future<Output = Result<T, X>>,
        M: FnOnce(X) -> E,
    {
        match awaitable.await {
            Ok(v) => Outcome::Success(v),
            Err(x) => Outcome::Failure(error_mapper(x)),
        }
    }

    // ========== Predicates ==========

    /// Returns `true` on `Success`.
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// Returns `true` on `Failure`.
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    /// Borrow both payloads.
    #[inline]
    pub fn as_ref(&self) -> Outcome<&T, &E> {
        match self {
            Outcome::Success(v) => Outcome::Success(v),
            Outcome::Failure(e) => Outcome::Failure(e),
        }
    }

    // ========== Collapsing ==========

    /// Run exactly one branch and return its result.
    pub fn fold<R, S, F>(self, on_success: S, on_failure: F) -> R
    where
        S: FnOnce(T) -> R,
        F: FnOnce(E) -> R,
    {
        match self {
            Outcome::Success(v) => on_success(v),
            Outcome::Failure(e) => on_failure(e),
        }
    }

    // ========== Transformations ==========

    /// Transform the success payload.
    #[inline]
    pub fn map<U, F>(self, f: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(v) => Outcome::Success(f(v)),
            Outcome::Failure(e) => Outcome::Failure(e),
        }
    }

    /// Transform the success payload, or return `default` on failure.
    #[inline]
    pub fn map_or<U, F>(self, default: U, f: F) -> U
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(v) => f(v),
            Outcome::Failure(_) => default,
        }
    }

    /// Transform the success payload, or derive a value from the error.
    #[inline]
    pub fn map_or_else<U, D, F>(self, default: D, f: F) -> U
    where
        D: FnOnce(E) -> U,
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Success(v) => f(v),
            Outcome::Failure(e) => default(e),
        }
    }

    /// Transform the failure payload.
    #[inline]
    pub fn map_error<E2, F>(self, f: F) -> Outcome<T, E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Outcome::Success(v) => Outcome::Success(v),
            Outcome::Failure(e) => Outcome::Failure(f(e)),
        }
    }

    /// Returns `other` on success, the failure otherwise.
    #[inline]
    pub fn and<U>(self, other: Outcome<U, E>) -> Outcome<U, E> {
        match self {
            Outcome::Success(_) => other,
            Outcome::Failure(e) => Outcome::Failure(e),
        }
    }

    /// Chain a fallible computation on the success payload.
    #[inline]
    pub fn and_then<U, F>(self, f: F) -> Outcome<U, E>
    where
        F: FnOnce(T) -> Outcome<U, E>,
    {
        match self {
            Outcome::Success(v) => f(v),
            Outcome::Failure(e) => Outcome::Failure(e),
        }
    }

    /// Returns `self` on success, `other` otherwise.
    #[inline]
    pub fn or<E2>(self, other: Outcome<T, E2>) -> Outcome<T, E2> {
        match self {
            Outcome::Success(v) => Outcome::Success(v),
            Outcome::Failure(_) => other,
        }
    }

    /// Recover from a failure.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::Outcome;
    ///
    /// let cached: Outcome<&str, &str> = Outcome::failure("cache miss")
    ///     .or_else(|_| Outcome::<_, &str>::success("from origin"));
    /// assert_eq!(cached, Outcome::Success("from origin"));
    /// ```
    #[inline]
    pub fn or_else<E2, F>(self, f: F) -> Outcome<T, E2>
    where
        F: FnOnce(E) -> Outcome<T, E2>,
    {
        match self {
            Outcome::Success(v) => Outcome::Success(v),
            Outcome::Failure(e) => f(e),
        }
    }

    /// Observe the success payload through a shared borrow.
    pub fn tap<F>(self, f: F) -> Self
    where
        F: FnOnce(&T),
    {
        if let Outcome::Success(v) = &self {
            f(v);
        }
        self
    }

    /// Observe the failure payload through a shared borrow.
    pub fn tap_error<F>(self, f: F) -> Self
    where
        F: FnOnce(&E),
    {
        if let Outcome::Failure(e) = &self {
            f(e);
        }
        self
    }

    // ========== Conversions ==========

    /// `Success(v)` becomes `Present(v)`; the error of a `Failure` is discarded.
    #[inline]
    pub fn to_optional_value(self) -> OptionalValue<T> {
        match self {
            Outcome::Success(v) => OptionalValue::Present(v),
            Outcome::Failure(_) => OptionalValue::Absent,
        }
    }

    /// `Failure(e)` becomes `Present(e)`; the success payload is discarded.
    #[inline]
    pub fn error_value(self) -> OptionalValue<E> {
        match self {
            Outcome::Success(_) => OptionalValue::Absent,
            Outcome::Failure(e) => OptionalValue::Present(e),
        }
    }

    // ========== Extraction ==========

    /// Return the success payload.
    ///
    /// # Panics
    ///
    /// Panics with [`UnmetExpectationError`] on `Failure`.
    #[track_caller]
    pub fn unwrap(self) -> T {
        match self.try_unwrap() {
            Ok(v) => v,
            Err(err) => panic!("{}", err),
        }
    }

    /// Return the failure payload.
    ///
    /// # Panics
    ///
    /// Panics with [`UnmetExpectationError`] on `Success`.
    #[track_caller]
    pub fn unwrap_error(self) -> E {
        match self.try_unwrap_error() {
            Ok(e) => e,
            Err(err) => panic!("{}", err),
        }
    }

    /// Return the success payload, or an error naming the expectation.
    pub fn try_unwrap(self) -> Result<T, UnmetExpectationError> {
        match self {
            Outcome::Success(v) => Ok(v),
            Outcome::Failure(_) => Err(UnmetExpectationError::new(OutcomeVariant::Success)),
        }
    }

    /// Return the failure payload, or an error naming the expectation.
    pub fn try_unwrap_error(self) -> Result<E, UnmetExpectationError> {
        match self {
            Outcome::Failure(e) => Ok(e),
            Outcome::Success(_) => Err(UnmetExpectationError::new(OutcomeVariant::Failure)),
        }
    }

    /// Return the success payload or `default`.
    #[inline]
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            Outcome::Success(v) => v,
            Outcome::Failure(_) => default,
        }
    }

    /// Return the success payload or derive one from the error.
    #[inline]
    pub fn unwrap_or_else<F>(self, f: F) -> T
    where
        F: FnOnce(E) -> T,
    {
        match self {
            Outcome::Success(v) => v,
            Outcome::Failure(e) => f(e),
        }
    }

    // ========== Aggregation ==========

    /// Collect a sequence of outcomes.
    ///
    /// Scans left to right and returns the first `Failure`; otherwise returns
    /// `Success` of all payloads in order.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::Outcome;
    ///
    /// let all = Outcome::all(vec![
    ///     Outcome::success(1),
    ///     Outcome::failure("E1"),
    ///     Outcome::failure("E2"),
    /// ]);
    /// assert_eq!(all, Outcome::Failure("E1"));
    /// ```
    pub fn all<I>(outcomes: I) -> Outcome<Vec<T>, E>
    where
        I: IntoIterator<Item = Outcome<T, E>>,
    {
        let iter = outcomes.into_iter();
        let mut values = Vec::with_capacity(iter.size_hint().0);
        for outcome in iter {
            match outcome {
                Outcome::Success(v) => values.push(v),
                Outcome::Failure(e) => return Outcome::Failure(e),
            }
        }
        Outcome::Success(values)
    }

    /// Collect keyed outcomes into any keyed collection.
    ///
    /// The first `Failure` in iteration order wins. On success the payloads are
    /// collected, with their keys, into `M`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use undertow::Outcome;
    ///
    /// let settled: Outcome<BTreeMap<&str, i32>, &str> = Outcome::all_keyed(vec![
    ///     ("a", Outcome::success(1)),
    ///     ("b", Outcome::success(2)),
    /// ]);
    /// assert_eq!(settled.unwrap()["b"], 2);
    /// ```
    pub fn all_keyed<K, M, I>(outcomes: I) -> Outcome<M, E>
    where
        I: IntoIterator<Item = (K, Outcome<T, E>)>,
        M: FromIterator<(K, T)>,
    {
        let mut failure = None;
        let collected = outcomes
            .into_iter()
            .map_while(|(key, outcome)| match outcome {
                Outcome::Success(v) => Some((key, v)),
                Outcome::Failure(e) => {
                    failure = Some(e);
                    None
                }
            })
            .collect::<M>();
        match failure {
            Some(e) => Outcome::Failure(e),
            None => Outcome::Success(collected),
        }
    }
}

impl<T, E> Outcome<Outcome<T, E>, E> {
    /// Remove one level of nesting.
    pub fn flatten(self) -> Outcome<T, E> {
        match self {
            Outcome::Success(inner) => inner,
            Outcome::Failure(e) => Outcome::Failure(e),
        }
    }
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        Outcome::from_result(result)
    }
}

impl<T, E> From<Outcome<T, E>> for Result<T, E> {
    fn from(outcome: Outcome<T, E>) -> Self {
        outcome.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn test_predicates() {
        assert!(Outcome::<_, ()>::success(1).is_success());
        assert!(Outcome::<(), _>::failure("e").is_failure());
    }

    #[test]
    fn test_fold() {
        let ok = Outcome::<i32, &str>::success(2).fold(|v| v * 2, |_| 0);
        let bad = Outcome::<i32, &str>::failure("e").fold(|v| v * 2, |e| e.len() as i32);
        assert_eq!(ok, 4);
        assert_eq!(bad, 1);
    }

    #[test]
    fn test_map_composition() {
        let f = |x: i32| x + 1;
        let g = |x: i32| x * 10;
        let outcome = Outcome::<i32, ()>::success(4);
        assert_eq!(outcome.map(f).map(g), outcome.map(|x| g(f(x))));
    }

    #[test]
    fn test_map_passes_failure_through() {
        let mut called = false;
        let result = Outcome::<i32, &str>::failure("e").map(|x| {
            called = true;
            x
        });
        assert_eq!(result, Outcome::Failure("e"));
        assert!(!called);
    }

    #[test]
    fn test_map_error() {
        let result = Outcome::<i32, &str>::failure("boom").map_error(|e| e.len());
        assert_eq!(result, Outcome::Failure(4));
        let result = Outcome::<i32, &str>::success(1).map_error(|e| e.len());
        assert_eq!(result, Outcome::Success(1));
    }

    #[test]
    fn test_map_or_else_gets_error() {
        let v = Outcome::<i32, &str>::failure("four").map_or_else(|e| e.len() as i32, |v| v);
        assert_eq!(v, 4);
    }

    #[test]
    fn test_and_or() {
        let ok = Outcome::<i32, &str>::success(1);
        let bad = Outcome::<i32, &str>::failure("e");
        assert_eq!(ok.and(Outcome::<_, &str>::success("x")), Outcome::Success("x"));
        assert_eq!(bad.and(Outcome::<_, &str>::success("x")), Outcome::Failure("e"));
        assert_eq!(ok.or(Outcome::<_, ()>::success(9)), Outcome::Success(1));
        assert_eq!(bad.or(Outcome::<_, ()>::success(9)), Outcome::Success(9));
    }

    #[test]
    fn test_or_else_passes_success_through() {
        let result = Outcome::<i32, &str>::success(1).or_else(|_| Outcome::<i32, ()>::success(0));
        assert_eq!(result, Outcome::Success(1));
    }

    #[test]
    fn test_tap_and_tap_error() {
        let mut log = Vec::new();
        let _ = Outcome::<i32, i32>::success(1)
            .tap(|v| log.push(*v))
            .tap_error(|e| log.push(*e * 100));
        let _ = Outcome::<i32, i32>::failure(2)
            .tap(|v| log.push(*v))
            .tap_error(|e| log.push(*e * 100));
        assert_eq!(log, vec![1, 200]);
    }

    #[test]
    fn test_to_optional_value() {
        assert_eq!(
            Outcome::<i32, &str>::success(1).to_optional_value(),
            OptionalValue::Present(1)
        );
        assert_eq!(
            Outcome::<i32, &str>::failure("e").to_optional_value(),
            OptionalValue::Absent
        );
        assert_eq!(
            Outcome::<i32, &str>::failure("e").error_value(),
            OptionalValue::Present("e")
        );
    }

    #[test]
    fn test_try_unwrap_wrong_variant() {
        let err = Outcome::<i32, &str>::failure("e").try_unwrap().unwrap_err();
        assert_eq!(err.expected, OutcomeVariant::Success);
        let err = Outcome::<i32, &str>::success(1)
            .try_unwrap_error()
            .unwrap_err();
        assert_eq!(err.expected, OutcomeVariant::Failure);
    }

    #[test]
    #[should_panic(expected = "expected outcome to be Success, found Failure")]
    fn test_unwrap_panics_on_failure() {
        Outcome::<i32, &str>::failure("e").unwrap();
    }

    #[test]
    #[should_panic(expected = "expected outcome to be Failure, found Success")]
    fn test_unwrap_error_panics_on_success() {
        Outcome::<i32, &str>::success(1).unwrap_error();
    }

    #[test]
    fn test_unwrap_fallbacks() {
        assert_eq!(Outcome::<i32, &str>::failure("e").unwrap_or(3), 3);
        assert_eq!(
            Outcome::<usize, &str>::failure("four").unwrap_or_else(|e| e.len()),
            4
        );
    }

    #[test]
    fn test_from_execution_with_mapper() {
        let outcome: Outcome<i32, String> =
            Outcome::from_execution_with(|| "nope".parse::<i32>(), |e| format!("parse: {}", e));
        assert!(outcome.unwrap_error().starts_with("parse:"));
    }

    #[test]
    fn test_from_awaitable() {
        let outcome = futures::executor::block_on(Outcome::from_awaitable(async {
            Ok::<_, ()>(5)
        }));
        assert_eq!(outcome, Outcome::Success(5));

        let outcome = futures::executor::block_on(Outcome::<i32, usize>::from_awaitable_with(
            async { Err::<i32, _>("abc") },
            |e| e.len(),
        ));
        assert_eq!(outcome, Outcome::Failure(3));
    }

    #[test]
    fn test_all_first_failure_wins() {
        let all = Outcome::all(vec![
            Outcome::success(1),
            Outcome::failure("E1"),
            Outcome::failure("E2"),
        ]);
        assert_eq!(all, Outcome::Failure("E1"));
    }

    #[test]
    fn test_all_collects_in_order() {
        let all = Outcome::<i32, ()>::all(vec![Outcome::success(3), Outcome::success(1)]);
        assert_eq!(all, Outcome::Success(vec![3, 1]));
        let empty = Outcome::<i32, ()>::all(Vec::new());
        assert_eq!(empty, Outcome::Success(vec![]));
    }

    #[test]
    fn test_all_keyed_preserves_keys() {
        let all: Outcome<HashMap<&str, i32>, &str> = Outcome::all_keyed(vec![
            ("x", Outcome::success(1)),
            ("y", Outcome::success(2)),
        ]);
        let map = all.unwrap();
        assert_eq!(map["x"], 1);
        assert_eq!(map["y"], 2);
    }

    #[test]
    fn test_all_keyed_first_failure_in_key_order() {
        let all: Outcome<BTreeMap<&str, i32>, &str> = Outcome::all_keyed(vec![
            ("a", Outcome::success(1)),
            ("b", Outcome::failure("EB")),
            ("c", Outcome::failure("EC")),
        ]);
        assert_eq!(all, Outcome::Failure("EB"));
    }

    #[test]
    fn test_flatten() {
        let nested: Outcome<Outcome<i32, &str>, &str> = Outcome::success(Outcome::failure("in"));
        assert_eq!(nested.flatten(), Outcome::Failure("in"));
    }

    #[test]
    fn test_result_conversions() {
        let outcome: Outcome<i32, &str> = Ok(1).into();
        assert_eq!(outcome, Outcome::Success(1));
        let result: Result<i32, &str> = Outcome::failure("e").into();
        assert_eq!(result, Err("e"));
    }
}
