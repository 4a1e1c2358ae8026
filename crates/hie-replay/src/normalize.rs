//! Payload normalization for logged QuestionnaireResponse bodies.
//!
//! Upstream form tooling emits answer keys in lowercase (`valuecoding`). The
//! SHR only accepts the FHIR casing, so known keys are renamed on the parsed
//! tree. String values are left alone.

use serde_json::{Map, Value};

use crate::error::PayloadError;

pub const QUESTIONNAIRE_RESPONSE: &str = "QuestionnaireResponse";

/// Miscased key -> FHIR key.
pub const KEY_RENAMES: [(&str, &str); 3] = [
    ("valuecoding", "valueCoding"),
    ("valuedate", "valueDate"),
    ("valuestring", "valueString"),
];

/// A resource ready to be PUT to the SHR.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedResource {
    pub id: String,
    pub resource: Value,
}

/// Renames every known miscased key at any depth.
///
/// When an object already holds the canonical key, its value is kept and the
/// miscased duplicate is dropped.
pub fn normalize_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            rename_keys(map);
            for child in map.values_mut() {
                normalize_keys(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                normalize_keys(item);
            }
        }
        _ => {}
    }
}

fn rename_keys(map: &mut Map<String, Value>) {
    for (from, to) in KEY_RENAMES {
        if let Some(v) = map.remove(from)
            && !map.contains_key(to)
        {
            map.insert(to.to_string(), v);
        }
    }
}

/// `subject.reference` with every `/` replaced by `-`.
pub fn derive_resource_id(payload: &Value) -> Result<String, PayloadError> {
    payload
        .get("subject")
        .and_then(|s| s.get("reference"))
        .and_then(Value::as_str)
        .filter(|r| !r.is_empty())
        .map(|r| r.replace('/', "-"))
        .ok_or(PayloadError::MissingSubject)
}

/// Parses a logged request body and turns it into a replayable resource.
pub fn prepare_payload(body: &str) -> Result<PreparedResource, PayloadError> {
    let mut resource: Value =
        serde_json::from_str(body).map_err(|e| PayloadError::Parse(e.to_string()))?;
    normalize_resource(&mut resource)?;
    let id = derive_resource_id(&resource)?;
    if let Value::Object(map) = &mut resource {
        map.insert("id".to_string(), Value::String(id.clone()));
    }
    Ok(PreparedResource { id, resource })
}

fn normalize_resource(resource: &mut Value) -> Result<(), PayloadError> {
    let Value::Object(map) = resource else {
        return Err(PayloadError::NotAnObject);
    };
    match map.get("resourceType") {
        None => {
            map.insert(
                "resourceType".to_string(),
                Value::String(QUESTIONNAIRE_RESPONSE.to_string()),
            );
        }
        Some(Value::String(rt)) if rt == QUESTIONNAIRE_RESPONSE => {}
        Some(other) => {
            let found = other
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string());
            return Err(PayloadError::UnexpectedResourceType(found));
        }
    }
    normalize_keys(resource);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    #[test]
    fn derives_id_from_subject_reference() {
        let payload = json!({ "subject": { "reference": "Patient/123" } });
        assert_eq!(derive_resource_id(&payload).unwrap(), "Patient-123");

        let nested = json!({ "subject": { "reference": "Patient/123/_history/2" } });
        assert_eq!(derive_resource_id(&nested).unwrap(), "Patient-123-_history-2");
    }

    #[test]
    fn missing_subject_is_an_error() {
        assert_eq!(
            derive_resource_id(&json!({})),
            Err(PayloadError::MissingSubject)
        );
        assert_eq!(
            derive_resource_id(&json!({ "subject": { "reference": 42 } })),
            Err(PayloadError::MissingSubject)
        );
        assert_eq!(
            derive_resource_id(&json!({ "subject": { "reference": "" } })),
            Err(PayloadError::MissingSubject)
        );
    }

    #[test]
    fn renames_keys_at_any_depth() {
        let mut value = json!({
            "item": [{
                "linkId": "q1",
                "answer": [
                    { "valuecoding": { "code": "X" } },
                    { "valuedate": "2024-01-01" }
                ],
                "item": [{ "answer": [{ "valuestring": "nested" }] }]
            }]
        });
        normalize_keys(&mut value);
        assert_json_eq!(
            value,
            json!({
                "item": [{
                    "linkId": "q1",
                    "answer": [
                        { "valueCoding": { "code": "X" } },
                        { "valueDate": "2024-01-01" }
                    ],
                    "item": [{ "answer": [{ "valueString": "nested" }] }]
                }]
            })
        );
    }

    #[test]
    fn string_values_are_untouched() {
        let mut value = json!({
            "text": "valuecoding valuedate valuestring",
            "item": [{ "answer": [{ "valueString": "see valuecoding" }] }]
        });
        let before = value.clone();
        normalize_keys(&mut value);
        assert_eq!(value, before);
    }

    #[test]
    fn canonical_key_wins_over_miscased_duplicate() {
        let mut value = json!({ "valueCoding": { "code": "A" }, "valuecoding": { "code": "B" } });
        normalize_keys(&mut value);
        assert_json_eq!(value, json!({ "valueCoding": { "code": "A" } }));
    }

    #[test]
    fn normalization_is_idempotent() {
        let mut once = json!({
            "item": [{ "answer": [{ "valuecoding": { "code": "X" } }, { "valuestring": "s" }] }]
        });
        normalize_keys(&mut once);
        let mut twice = once.clone();
        normalize_keys(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn prepares_questionnaire_response() {
        let body = r#"{"subject":{"reference":"Patient/42"},"item":[{"answer":[{"valuecoding":{"code":"X"}}]}]}"#;
        let prepared = prepare_payload(body).unwrap();
        assert_eq!(prepared.id, "Patient-42");
        assert_json_eq!(
            prepared.resource,
            json!({
                "resourceType": "QuestionnaireResponse",
                "id": "Patient-42",
                "subject": { "reference": "Patient/42" },
                "item": [{ "answer": [{ "valueCoding": { "code": "X" } }] }]
            })
        );
    }

    #[test]
    fn existing_id_is_overwritten() {
        let body = r#"{"resourceType":"QuestionnaireResponse","id":"random","subject":{"reference":"Patient/7"}}"#;
        let prepared = prepare_payload(body).unwrap();
        assert_eq!(prepared.resource["id"], "Patient-7");
    }

    #[test]
    fn rejects_unparseable_and_foreign_payloads() {
        assert!(matches!(prepare_payload("{not json"), Err(PayloadError::Parse(_))));
        assert_eq!(prepare_payload("[1,2]"), Err(PayloadError::NotAnObject));
        assert_eq!(
            prepare_payload(r#"{"resourceType":"Patient","subject":{"reference":"Patient/1"}}"#),
            Err(PayloadError::UnexpectedResourceType("Patient".into()))
        );
        assert_eq!(
            prepare_payload(r#"{"resourceType":"QuestionnaireResponse"}"#),
            Err(PayloadError::MissingSubject)
        );
    }
}
