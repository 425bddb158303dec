//! Integration tests for the tagged serialized form.

#![cfg(feature = "serde")]

use serde::{Deserialize, Serialize};
use serde_json::json;
use undertow::{FallibleAsyncTask, InvalidSerializedFormError, OptionalValue, Outcome};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct JobRecord {
    id: u32,
    owner: OptionalValue<String>,
    result: Outcome<Vec<u8>, String>,
}

#[test]
fn settled_task_outcome_can_be_persisted() {
    let task = FallibleAsyncTask::<Vec<u8>, String>::of_failure("disk full".to_string());
    let record = JobRecord {
        id: 7,
        owner: OptionalValue::Absent,
        result: task.peek().unwrap(),
    };

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(
        json,
        json!({
            "id": 7,
            "owner": { "kind": "Option", "tag": "Absent" },
            "result": { "kind": "Result", "tag": "Failure", "error": "disk full" },
        })
    );
    let restored: JobRecord = serde_json::from_value(json).unwrap();
    assert_eq!(restored, record);
}

#[test]
fn record_from_text() {
    let text = r#"{
        "id": 1,
        "owner": { "kind": "Option", "tag": "Present", "value": "ada" },
        "result": { "kind": "Result", "tag": "Success", "value": [1, 2, 3] }
    }"#;
    let record: JobRecord = serde_json::from_str(text).unwrap();
    assert_eq!(record.owner, OptionalValue::Present("ada".to_string()));
    assert_eq!(record.result, Outcome::Success(vec![1, 2, 3]));
}

#[test]
fn wrong_container_kind_is_rejected() {
    let err = OptionalValue::<i32>::from_json(&json!({ "kind": "Result", "tag": "Success", "value": 1 }))
        .unwrap_err();
    assert!(matches!(err, InvalidSerializedFormError::KindMismatch { .. }));

    let text = r#"{ "id": 1, "owner": { "kind": "Option", "tag": "Maybe" }, "result": { "kind": "Result", "tag": "Success", "value": [] } }"#;
    let parsed = serde_json::from_str::<JobRecord>(text);
    assert!(parsed.is_err());
}

#[test]
fn to_json_matches_serialize() {
    let outcome = Outcome::<i32, String>::success(3);
    assert_eq!(outcome.to_json().unwrap(), serde_json::to_value(outcome).unwrap());
}
