//! Error types raised by the containers.
//!
//! None of these wrap a caller's error: a panic or `Err` produced inside a
//! user-supplied closure reaches the caller untouched. These types only describe
//! misuse of the containers themselves (unwrapping the wrong variant, decoding a
//! malformed serialized form, awaiting a task that can no longer produce a value).

use std::fmt;

/// Error returned when the payload of an `Absent` optional value is requested.
///
/// # Examples
///
/// ```rust
/// use undertow::{EmptyValueError, OptionalValue};
///
/// let value: OptionalValue<i32> = OptionalValue::absent();
/// assert_eq!(value.try_unwrap(), Err(EmptyValueError));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EmptyValueError;

impl fmt::Display for EmptyValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "called unwrap on an absent optional value")
    }
}

impl std::error::Error for EmptyValueError {}

/// The two variants of an [`Outcome`](crate::Outcome), used in error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeVariant {
    /// `Outcome::Success`
    Success,
    /// `Outcome::Failure`
    Failure,
}

impl fmt::Display for OutcomeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::Failure => write!(f, "Failure"),
        }
    }
}

/// Error returned when an outcome is unwrapped as the variant it does not hold.
///
/// # Examples
///
/// ```rust
/// use undertow::{Outcome, OutcomeVariant, UnmetExpectationError};
///
/// let outcome: Outcome<i32, &str> = Outcome::failure("boom");
/// let err = outcome.try_unwrap().unwrap_err();
/// assert_eq!(err, UnmetExpectationError::new(OutcomeVariant::Success));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnmetExpectationError {
    /// The variant the caller asked for.
    pub expected: OutcomeVariant,
}

impl UnmetExpectationError {
    /// Create an error for a failed expectation of `expected`.
    pub fn new(expected: OutcomeVariant) -> Self {
        Self { expected }
    }

    /// The variant that was actually found.
    pub fn found(&self) -> OutcomeVariant {
        match self.expected {
            OutcomeVariant::Success => OutcomeVariant::Failure,
            OutcomeVariant::Failure => OutcomeVariant::Success,
        }
    }
}

impl fmt::Display for UnmetExpectationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected outcome to be {}, found {}",
            self.expected,
            self.found()
        )
    }
}

impl std::error::Error for UnmetExpectationError {}

/// Error returned when decoding a serialized container fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidSerializedFormError {
    /// The input is not an object.
    NotAnObject,
    /// The `kind` discriminant is missing or not a string.
    MissingKind,
    /// The `kind` discriminant names another container.
    KindMismatch {
        /// The kind this decoder accepts.
        expected: &'static str,
        /// The kind found in the input.
        found: String,
    },
    /// The `tag` field is missing or not a string.
    MissingTag,
    /// The `tag` field does not name a variant of the container.
    UnknownTag(String),
    /// The field required by the tag is missing.
    MissingField {
        /// The tag being decoded.
        tag: &'static str,
        /// The missing field.
        field: &'static str,
    },
    /// The payload did not decode into the expected type.
    InvalidPayload(String),
}

impl fmt::Display for InvalidSerializedFormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "serialized form must be an object"),
            Self::MissingKind => write!(f, "serialized form has no `kind` discriminant"),
            Self::KindMismatch { expected, found } => {
                write!(f, "expected kind `{}`, found `{}`", expected, found)
            }
            Self::MissingTag => write!(f, "serialized form has no `tag`"),
            Self::UnknownTag(tag) => write!(f, "unknown tag `{}`", tag),
            Self::MissingField { tag, field } => {
                write!(f, "tag `{}` requires field `{}`", tag, field)
            }
            Self::InvalidPayload(reason) => write!(f, "invalid payload: {}", reason),
        }
    }
}

impl std::error::Error for InvalidSerializedFormError {}

/// The error produced by awaiting an [`UnwrappedAsyncTask`](crate::UnwrappedAsyncTask)
/// that could not produce a value.
///
/// `Cancelled` means the upstream task was cancelled. `Rejected` carries the
/// payload of the variant the unwrap did not ask for, e.g. the failure of a
/// fallible task that was unwrapped for its success value. Unwraps of plain
/// tasks use `P = Infallible`, so they can only ever report `Cancelled`.
///
/// # Examples
///
/// ```rust
/// use undertow::{AsyncTask, CancellationSignal};
///
/// # tokio_test::block_on(async {
/// let task = AsyncTask::<i32>::cancelled();
/// assert_eq!(task.unwrap().await, Err(CancellationSignal::Cancelled));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancellationSignal<P> {
    /// The upstream task was cancelled.
    Cancelled,
    /// The upstream task settled with the payload the unwrap rejects.
    Rejected(P),
}

impl<P> CancellationSignal<P> {
    /// Returns `true` if the upstream task was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if the upstream task settled with a rejected payload.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }

    /// The rejected payload, if any.
    pub fn into_payload(self) -> Option<P> {
        match self {
            Self::Rejected(payload) => Some(payload),
            Self::Cancelled => None,
        }
    }
}

impl<P: fmt::Display> fmt::Display for CancellationSignal<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => write!(f, "task was cancelled"),
            Self::Rejected(payload) => write!(f, "task settled with rejected value: {}", payload),
        }
    }
}

impl<P: fmt::Debug + fmt::Display> std::error::Error for CancellationSignal<P> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[test]
    fn test_empty_value_display() {
        assert_eq!(
            EmptyValueError.to_string(),
            "called unwrap on an absent optional value"
        );
    }

    #[test]
    fn test_unmet_expectation_reports_both_variants() {
        let err = UnmetExpectationError::new(OutcomeVariant::Failure);
        assert_eq!(err.found(), OutcomeVariant::Success);
        assert_eq!(
            err.to_string(),
            "expected outcome to be Failure, found Success"
        );
    }

    #[test]
    fn test_invalid_form_display() {
        let err = InvalidSerializedFormError::KindMismatch {
            expected: "Option",
            found: "Result".to_string(),
        };
        assert_eq!(err.to_string(), "expected kind `Option`, found `Result`");

        let err = InvalidSerializedFormError::MissingField {
            tag: "Failure",
            field: "error",
        };
        assert!(err.to_string().contains("`error`"));
    }

    #[test]
    fn test_cancellation_signal_payload() {
        let signal: CancellationSignal<&str> = CancellationSignal::Rejected("boom");
        assert!(signal.is_rejected());
        assert_eq!(signal.into_payload(), Some("boom"));

        let signal: CancellationSignal<Infallible> = CancellationSignal::Cancelled;
        assert!(signal.is_cancelled());
        assert_eq!(signal.into_payload(), None);
    }

    #[test]
    fn test_cancellation_signal_display() {
        let signal: CancellationSignal<String> = CancellationSignal::Rejected("E".to_string());
        assert_eq!(signal.to_string(), "task settled with rejected value: E");
    }
}
