//! A two-variant container for a value that may be missing.
//!
//! `OptionalValue<T>` is either `Present(T)` or `Absent`. It behaves much like
//! `std::option::Option`, but speaks the same vocabulary as [`Outcome`] and the
//! asynchronous containers: the "was it cancelled" signal of an awaited
//! [`AsyncTask`](crate::AsyncTask) is an `OptionalValue`.
//!
//! `Absent` carries no payload, so every `Absent` is the same zero-sized value
//! and combinators that short-circuit on it allocate nothing.
//!
//! # Examples
//!
//! ```rust
//! use undertow::OptionalValue;
//!
//! let name = OptionalValue::present("ada");
//! let greeting = name
//!     .map(|n| n.to_uppercase())
//!     .map_or("nobody".to_string(), |n| format!("hello {}", n));
//! assert_eq!(greeting, "hello ADA");
//! ```

use std::any::Any;

use crate::error::EmptyValueError;
use crate::Outcome;

/// A value that is either `Present(T)` or `Absent`.
///
/// Combinators consume `self` and return a new value; nothing is mutated in
/// place. Branches that do not apply (e.g. `map` on `Absent`) hand back the
/// input unchanged.
///
/// # Example
///
/// ```rust
/// use undertow::OptionalValue;
///
/// let present = OptionalValue::present(2);
/// let absent: OptionalValue<i32> = OptionalValue::absent();
///
/// assert_eq!(present.map(|x| x * 10), OptionalValue::Present(20));
/// assert_eq!(absent.map(|x| x * 10), OptionalValue::Absent);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionalValue<T> {
    /// A value is present.
    Present(T),
    /// No value.
    Absent,
}

impl<T> OptionalValue<T> {
    // ========== Constructors ==========

    /// Wrap a value.
    #[inline]
    pub fn present(value: T) -> Self {
        OptionalValue::Present(value)
    }

    /// The empty value.
    #[inline]
    pub fn absent() -> Self {
        OptionalValue::Absent
    }

    /// Convert a nullable value.
    ///
    /// Only `None` becomes `Absent`. Values that would be "falsy" elsewhere
    /// (`0`, `""`, `false`) are present.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::OptionalValue;
    ///
    /// assert_eq!(OptionalValue::from_nullable(Some(0)), OptionalValue::Present(0));
    /// assert_eq!(OptionalValue::from_nullable(Some("")), OptionalValue::Present(""));
    /// assert_eq!(OptionalValue::<i32>::from_nullable(None), OptionalValue::Absent);
    /// ```
    #[inline]
    pub fn from_nullable(value: Option<T>) -> Self {
        match value {
            Some(v) => OptionalValue::Present(v),
            None => OptionalValue::Absent,
        }
    }

    // ========== Predicates ==========

    /// Returns `true` if a value is present.
    #[inline]
    pub fn is_present(&self) -> bool {
        matches!(self, OptionalValue::Present(_))
    }

    /// Returns `true` if no value is present.
    #[inline]
    pub fn is_absent(&self) -> bool {
        matches!(self, OptionalValue::Absent)
    }

    /// Runtime check that an arbitrary value is an `OptionalValue<T>`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::OptionalValue;
    ///
    /// let value = OptionalValue::present(1u8);
    /// assert!(OptionalValue::<u8>::is_optional_value(&value));
    /// assert!(!OptionalValue::<u8>::is_optional_value(&1u8));
    /// ```
    pub fn is_optional_value(value: &dyn Any) -> bool
    where
        T: 'static,
    {
        value.is::<OptionalValue<T>>()
    }

    // ========== Views ==========

    /// Borrow the payload.
    #[inline]
    pub fn as_ref(&self) -> OptionalValue<&T> {
        match self {
            OptionalValue::Present(v) => OptionalValue::Present(v),
            OptionalValue::Absent => OptionalValue::Absent,
        }
    }

    /// Convert into a standard `Option`.
    #[inline]
    pub fn into_option(self) -> Option<T> {
        match self {
            OptionalValue::Present(v) => Some(v),
            OptionalValue::Absent => None,
        }
    }

    /// Iterate over the payload, if any.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.as_ref().into_option().into_iter()
    }

    // ========== Collapsing ==========

    /// Run exactly one branch and return its result.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::OptionalValue;
    ///
    /// let label = OptionalValue::present(3).fold(|n| format!("{} items", n), || "empty".into());
    /// assert_eq!(label, "3 items");
    /// ```
    pub fn fold<R, P, A>(self, on_present: P, on_absent: A) -> R
    where
        P: FnOnce(T) -> R,
        A: FnOnce() -> R,
    {
        match self {
            OptionalValue::Present(v) => on_present(v),
            OptionalValue::Absent => on_absent(),
        }
    }

    // ========== Transformations ==========

    /// Transform the payload.
    #[inline]
    pub fn map<U, F>(self, f: F) -> OptionalValue<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            OptionalValue::Present(v) => OptionalValue::Present(f(v)),
            OptionalValue::Absent => OptionalValue::Absent,
        }
    }

    /// Transform the payload, or return `default` when absent.
    #[inline]
    pub fn map_or<U, F>(self, default: U, f: F) -> U
    where
        F: FnOnce(T) -> U,
    {
        match self {
            OptionalValue::Present(v) => f(v),
            OptionalValue::Absent => default,
        }
    }

    /// Transform the payload, or compute a default when absent.
    #[inline]
    pub fn map_or_else<U, D, F>(self, default: D, f: F) -> U
    where
        D: FnOnce() -> U,
        F: FnOnce(T) -> U,
    {
        match self {
            OptionalValue::Present(v) => f(v),
            OptionalValue::Absent => default(),
        }
    }

    /// Returns `other` if a value is present, `Absent` otherwise.
    #[inline]
    pub fn and<U>(self, other: OptionalValue<U>) -> OptionalValue<U> {
        match self {
            OptionalValue::Present(_) => other,
            OptionalValue::Absent => OptionalValue::Absent,
        }
    }

    /// Chain a computation that may itself produce nothing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::OptionalValue;
    ///
    /// fn half(n: i32) -> OptionalValue<i32> {
    ///     if n % 2 == 0 { OptionalValue::present(n / 2) } else { OptionalValue::absent() }
    /// }
    ///
    /// assert_eq!(OptionalValue::present(8).and_then(half).and_then(half), OptionalValue::Present(2));
    /// assert_eq!(OptionalValue::present(6).and_then(half).and_then(half), OptionalValue::Absent);
    /// ```
    #[inline]
    pub fn and_then<U, F>(self, f: F) -> OptionalValue<U>
    where
        F: FnOnce(T) -> OptionalValue<U>,
    {
        match self {
            OptionalValue::Present(v) => f(v),
            OptionalValue::Absent => OptionalValue::Absent,
        }
    }

    /// Returns `self` if present, `other` otherwise.
    #[inline]
    pub fn or(self, other: OptionalValue<T>) -> OptionalValue<T> {
        match self {
            OptionalValue::Present(_) => self,
            OptionalValue::Absent => other,
        }
    }

    /// Returns `self` if present, the result of `f` otherwise.
    #[inline]
    pub fn or_else<F>(self, f: F) -> OptionalValue<T>
    where
        F: FnOnce() -> OptionalValue<T>,
    {
        match self {
            OptionalValue::Present(_) => self,
            OptionalValue::Absent => f(),
        }
    }

    /// Returns whichever side is present when exactly one of them is.
    pub fn xor(self, other: OptionalValue<T>) -> OptionalValue<T> {
        match (self, other) {
            (OptionalValue::Present(v), OptionalValue::Absent)
            | (OptionalValue::Absent, OptionalValue::Present(v)) => OptionalValue::Present(v),
            _ => OptionalValue::Absent,
        }
    }

    /// Observe the payload without changing it.
    ///
    /// The callback only gets a shared borrow: it can neither mutate the value
    /// nor keep it past the call.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::OptionalValue;
    ///
    /// let mut seen = Vec::new();
    /// let value = OptionalValue::present(vec![1, 2]).tap(|v| seen.push(v.len()));
    /// assert_eq!(value, OptionalValue::Present(vec![1, 2]));
    /// assert_eq!(seen, vec![2]);
    /// ```
    pub fn tap<F>(self, f: F) -> Self
    where
        F: FnOnce(&T),
    {
        if let OptionalValue::Present(v) = &self {
            f(v);
        }
        self
    }

    // ========== Extraction ==========

    /// Return the payload.
    ///
    /// # Panics
    ///
    /// Panics with [`EmptyValueError`] if the value is absent.
    #[track_caller]
    pub fn unwrap(self) -> T {
        match self {
            OptionalValue::Present(v) => v,
            OptionalValue::Absent => panic!("{}", EmptyValueError),
        }
    }

    /// Return the payload, or [`EmptyValueError`] if absent.
    pub fn try_unwrap(self) -> Result<T, EmptyValueError> {
        match self {
            OptionalValue::Present(v) => Ok(v),
            OptionalValue::Absent => Err(EmptyValueError),
        }
    }

    /// Return the payload, panicking with `msg` if absent.
    #[track_caller]
    pub fn expect(self, msg: &str) -> T {
        match self {
            OptionalValue::Present(v) => v,
            OptionalValue::Absent => panic!("{}", msg),
        }
    }

    /// Return the payload or `default`.
    #[inline]
    pub fn unwrap_or(self, default: T) -> T {
        match self {
            OptionalValue::Present(v) => v,
            OptionalValue::Absent => default,
        }
    }

    /// Return the payload or compute one.
    #[inline]
    pub fn unwrap_or_else<F>(self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        match self {
            OptionalValue::Present(v) => v,
            OptionalValue::Absent => f(),
        }
    }

    /// Return the payload or `T::default()`.
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.unwrap_or_else(T::default)
    }

    // ========== Conversions ==========

    /// `Present(v)` becomes `Success(v)`, `Absent` becomes `Failure(error)`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use undertow::{OptionalValue, Outcome};
    ///
    /// let missing: OptionalValue<i32> = OptionalValue::absent();
    /// assert_eq!(missing.to_outcome_or("missing"), Outcome::Failure("missing"));
    /// ```
    pub fn to_outcome_or<E>(self, error: E) -> Outcome<T, E> {
        match self {
            OptionalValue::Present(v) => Outcome::Success(v),
            OptionalValue::Absent => Outcome::Failure(error),
        }
    }

    /// Like [`to_outcome_or`](Self::to_outcome_or), computing the error lazily.
    pub fn to_outcome_or_else<E, F>(self, f: F) -> Outcome<T, E>
    where
        F: FnOnce() -> E,
    {
        match self {
            OptionalValue::Present(v) => Outcome::Success(v),
            OptionalValue::Absent => Outcome::Failure(f()),
        }
    }
}

impl<T> OptionalValue<OptionalValue<T>> {
    /// Remove one level of nesting.
    pub fn flatten(self) -> OptionalValue<T> {
        match self {
            OptionalValue::Present(inner) => inner,
            OptionalValue::Absent => OptionalValue::Absent,
        }
    }
}

impl<T> Default for OptionalValue<T> {
    fn default() -> Self {
        OptionalValue::Absent
    }
}

impl<T> From<Option<T>> for OptionalValue<T> {
    fn from(value: Option<T>) -> Self {
        OptionalValue::from_nullable(value)
    }
}

impl<T> From<OptionalValue<T>> for Option<T> {
    fn from(value: OptionalValue<T>) -> Self {
        value.into_option()
    }
}

impl<T> IntoIterator for OptionalValue<T> {
    type Item = T;
    type IntoIter = std::option::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_option().into_iter()
    }
}
