//! Serde support for the synchronous containers (feature-gated)
//!
//! Both containers serialize to a tagged object:
//!
//! ```text
//! OptionalValue  Present -> { "kind": "Option", "tag": "Present", "value": <T> }
//!                Absent  -> { "kind": "Option", "tag": "Absent" }
//! Outcome        Success -> { "kind": "Result", "tag": "Success", "value": <T> }
//!                Failure -> { "kind": "Result", "tag": "Failure", "error": <E> }
//! ```
//!
//! Asynchronous tasks are live computations and have no serialized form.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use undertow::{OptionalValue, Outcome};
//!
//! let json = OptionalValue::present(1).to_json().unwrap();
//! assert_eq!(json, json!({ "kind": "Option", "tag": "Present", "value": 1 }));
//!
//! let outcome: Outcome<i32, String> =
//!     Outcome::from_json(&json!({ "kind": "Result", "tag": "Failure", "error": "E" })).unwrap();
//! assert_eq!(outcome, Outcome::Failure("E".to_string()));
//! ```

use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::InvalidSerializedFormError;
use crate::{OptionalValue, Outcome};

const OPTION_KIND: &str = "Option";
const RESULT_KIND: &str = "Result";

const PRESENT_TAG: &str = "Present";
const ABSENT_TAG: &str = "Absent";
const SUCCESS_TAG: &str = "Success";
const FAILURE_TAG: &str = "Failure";

/// Check the `kind` discriminant and return the object and its `tag`.
fn read_header<'a>(
    json: &'a Value,
    kind: &'static str,
) -> Result<(&'a Map<String, Value>, &'a str), InvalidSerializedFormError> {
    let object = json
        .as_object()
        .ok_or(InvalidSerializedFormError::NotAnObject)?;
    let found = object
        .get("kind")
        .and_then(Value::as_str)
        .ok_or(InvalidSerializedFormError::MissingKind)?;
    if found != kind {
        return Err(InvalidSerializedFormError::KindMismatch {
            expected: kind,
            found: found.to_string(),
        });
    }
    let tag = object
        .get("tag")
        .and_then(Value::as_str)
        .ok_or(InvalidSerializedFormError::MissingTag)?;
    Ok((object, tag))
}

fn read_field<X: DeserializeOwned>(
    object: &Map<String, Value>,
    tag: &'static str,
    field: &'static str,
) -> Result<X, InvalidSerializedFormError> {
    let raw = object
        .get(field)
        .ok_or(InvalidSerializedFormError::MissingField { tag, field })?;
    X::deserialize(raw).map_err(|e| InvalidSerializedFormError::InvalidPayload(e.to_string()))
}

impl<T> OptionalValue<T> {
    /// Encode into the tagged JSON form.
    pub fn to_json(&self) -> Result<Value, serde_json::Error>
    where
        T: Serialize,
    {
        serde_json::to_value(self)
    }

    /// Decode from the tagged JSON form.
    ///
    /// # Example
    ///
    /// ```rust
    /// use serde_json::json;
    /// use undertow::{InvalidSerializedFormError, OptionalValue};
    ///
    /// let err = OptionalValue::<i32>::from_json(&json!({ "tag": "Absent" })).unwrap_err();
    /// assert_eq!(err, InvalidSerializedFormError::MissingKind);
    /// ```
    pub fn from_json(json: &Value) -> Result<Self, InvalidSerializedFormError>
    where
        T: DeserializeOwned,
    {
        let (object, tag) = read_header(json, OPTION_KIND)?;
        match tag {
            PRESENT_TAG => read_field(object, PRESENT_TAG, "value").map(OptionalValue::Present),
            ABSENT_TAG => Ok(OptionalValue::Absent),
            other => Err(InvalidSerializedFormError::UnknownTag(other.to_string())),
        }
    }
}

impl<T, E> Outcome<T, E> {
    /// Encode into the tagged JSON form.
    pub fn to_json(&self) -> Result<Value, serde_json::Error>
    where
        T: Serialize,
        E: Serialize,
    {
        serde_json::to_value(self)
    }

    /// Decode from the tagged JSON form.
    pub fn from_json(json: &Value) -> Result<Self, InvalidSerializedFormError>
    where
        T: DeserializeOwned,
        E: DeserializeOwned,
    {
        let (object, tag) = read_header(json, RESULT_KIND)?;
        match tag {
            SUCCESS_TAG => read_field(object, SUCCESS_TAG, "value").map(Outcome::Success),
            FAILURE_TAG => read_field(object, FAILURE_TAG, "error").map(Outcome::Failure),
            other => Err(InvalidSerializedFormError::UnknownTag(other.to_string())),
        }
    }
}

impl<T: Serialize> Serialize for OptionalValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OptionalValue::Present(value) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("kind", OPTION_KIND)?;
                map.serialize_entry("tag", PRESENT_TAG)?;
                map.serialize_entry("value", value)?;
                map.end()
            }
            OptionalValue::Absent => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("kind", OPTION_KIND)?;
                map.serialize_entry("tag", ABSENT_TAG)?;
                map.end()
            }
        }
    }
}

impl<T: Serialize, E: Serialize> Serialize for Outcome<T, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("kind", RESULT_KIND)?;
        match self {
            Outcome::Success(value) => {
                map.serialize_entry("tag", SUCCESS_TAG)?;
                map.serialize_entry("value", value)?;
            }
            Outcome::Failure(error) => {
                map.serialize_entry("tag", FAILURE_TAG)?;
                map.serialize_entry("error", error)?;
            }
        }
        map.end()
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for OptionalValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Value::deserialize(deserializer)?;
        OptionalValue::from_json(&json).map_err(serde::de::Error::custom)
    }
}

impl<'de, T: DeserializeOwned, E: DeserializeOwned> Deserialize<'de> for Outcome<T, E> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Value::deserialize(deserializer)?;
        Outcome::from_json(&json).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Profile {
        nickname: OptionalValue<String>,
        last_sync: Outcome<u64, String>,
    }

    #[test]
    fn test_present_shape() {
        let json = OptionalValue::present("x").to_json().unwrap();
        assert_eq!(json, json!({ "kind": "Option", "tag": "Present", "value": "x" }));
    }

    #[test]
    fn test_absent_shape() {
        let json = OptionalValue::<i32>::absent().to_json().unwrap();
        assert_eq!(json, json!({ "kind": "Option", "tag": "Absent" }));
    }

    #[test]
    fn test_outcome_shapes() {
        let ok = Outcome::<i32, String>::success(1).to_json().unwrap();
        assert_eq!(ok, json!({ "kind": "Result", "tag": "Success", "value": 1 }));
        let bad = Outcome::<i32, &str>::failure("E").to_json().unwrap();
        assert_eq!(bad, json!({ "kind": "Result", "tag": "Failure", "error": "E" }));
    }

    #[test]
    fn test_round_trips() {
        let present = OptionalValue::present(1);
        assert_eq!(OptionalValue::from_json(&present.to_json().unwrap()), Ok(present));

        let absent = OptionalValue::<i32>::absent();
        assert_eq!(OptionalValue::from_json(&absent.to_json().unwrap()), Ok(absent));

        let success = Outcome::<i32, String>::success(1);
        assert_eq!(Outcome::from_json(&success.to_json().unwrap()), Ok(success));

        let failure = Outcome::<i32, String>::failure("E".to_string());
        let decoded = Outcome::from_json(&failure.to_json().unwrap());
        assert_eq!(decoded, Ok(failure));
    }

    #[test]
    fn test_present_null_payload_is_kept() {
        let json = json!({ "kind": "Option", "tag": "Present", "value": null });
        let decoded = OptionalValue::<Option<i32>>::from_json(&json).unwrap();
        assert_eq!(decoded, OptionalValue::Present(None));
    }

    #[test]
    fn test_kind_mismatch() {
        let json = json!({ "kind": "Result", "tag": "Absent" });
        let err = OptionalValue::<i32>::from_json(&json).unwrap_err();
        assert_eq!(
            err,
            InvalidSerializedFormError::KindMismatch {
                expected: "Option",
                found: "Result".to_string()
            }
        );
    }

    #[test]
    fn test_missing_tag_specific_field() {
        let json = json!({ "kind": "Result", "tag": "Failure", "value": 1 });
        let err = Outcome::<i32, String>::from_json(&json).unwrap_err();
        assert_eq!(
            err,
            InvalidSerializedFormError::MissingField {
                tag: "Failure",
                field: "error"
            }
        );

        let json = json!({ "kind": "Option", "tag": "Present" });
        assert!(matches!(
            OptionalValue::<i32>::from_json(&json),
            Err(InvalidSerializedFormError::MissingField { field: "value", .. })
        ));
    }

    #[test]
    fn test_unknown_tag_and_bad_payload() {
        let json = json!({ "kind": "Option", "tag": "Maybe" });
        assert_eq!(
            OptionalValue::<i32>::from_json(&json),
            Err(InvalidSerializedFormError::UnknownTag("Maybe".to_string()))
        );

        let json = json!({ "kind": "Option", "tag": "Present", "value": "not a number" });
        assert!(matches!(
            OptionalValue::<i32>::from_json(&json),
            Err(InvalidSerializedFormError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_not_an_object() {
        assert_eq!(
            Outcome::<i32, i32>::from_json(&json!([1, 2])),
            Err(InvalidSerializedFormError::NotAnObject)
        );
    }

    #[test]
    fn test_nested_in_struct() {
        let profile = Profile {
            nickname: OptionalValue::absent(),
            last_sync: Outcome::failure("offline".to_string()),
        };
        let text = serde_json::to_string(&profile).unwrap();
        let decoded: Profile = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, profile);
    }

    #[test]
    fn test_deserialize_reports_form_errors() {
        let result: Result<OptionalValue<i32>, _> = serde_json::from_str(r#"{"tag":"Absent"}"#);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("kind"));
    }
}
