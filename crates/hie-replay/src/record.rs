//! Transaction log documents as captured by the interoperability layer.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A logged request/response pair. Read-only once fetched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "extended_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub request: Option<LoggedRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<LoggedResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggedRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(
        default,
        deserialize_with = "extended_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggedResponse {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Accepts plain strings as well as the `{"$oid": ..}` / `{"$date": ..}`
/// wrappers that database exports emit.
fn extended_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Object(map) => map
            .get("$oid")
            .or_else(|| map.get("$date"))
            .map(|inner| match inner {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        other => Some(other.to_string()),
    }))
}

impl TransactionRecord {
    /// Request path, treating a missing request or an empty path as absent.
    pub fn path(&self) -> Option<&str> {
        self.request
            .as_ref()
            .and_then(|r| r.path.as_deref())
            .filter(|p| !p.is_empty())
    }

    pub fn body(&self) -> Option<&str> {
        self.request.as_ref().and_then(|r| r.body.as_deref())
    }

    /// Identifier used in logs; falls back to `-` for exports without `_id`.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or("-")
    }

    /// Whether the interoperability layer recorded this transaction as failed.
    pub fn is_failed(&self) -> bool {
        if self.status.as_deref() == Some("Failed") {
            return true;
        }
        self.response
            .as_ref()
            .and_then(|r| r.status)
            .is_some_and(|s| s >= 400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_openhim_document() {
        let doc = json!({
            "_id": "65f0c1",
            "status": "Failed",
            "clientID": "abc",
            "request": {
                "path": "/fhir/QuestionnaireResponse",
                "method": "POST",
                "body": "{\"resourceType\":\"QuestionnaireResponse\"}",
                "timestamp": "2024-03-12T10:00:00.000Z"
            },
            "response": { "status": 500, "body": "oops" }
        });
        let record: TransactionRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(record.display_id(), "65f0c1");
        assert_eq!(record.path(), Some("/fhir/QuestionnaireResponse"));
        assert!(record.body().is_some());
        assert!(record.is_failed());
    }

    #[test]
    fn deserializes_export_wrappers() {
        let doc = json!({
            "_id": { "$oid": "65f0c1aa" },
            "request": {
                "path": "/custom/QuestionnaireResponse",
                "timestamp": { "$date": "2024-03-12T10:00:00.000Z" }
            }
        });
        let record: TransactionRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(record.id.as_deref(), Some("65f0c1aa"));
        assert_eq!(
            record.request.unwrap().timestamp.as_deref(),
            Some("2024-03-12T10:00:00.000Z")
        );
    }

    #[test]
    fn null_request_has_no_path() {
        let record: TransactionRecord =
            serde_json::from_value(json!({ "request": null })).unwrap();
        assert_eq!(record.path(), None);
        assert_eq!(record.body(), None);
        assert_eq!(record.display_id(), "-");
    }

    #[test]
    fn failure_detection() {
        let ok = TransactionRecord {
            status: Some("Successful".into()),
            response: Some(LoggedResponse {
                status: Some(201),
                body: None,
            }),
            ..Default::default()
        };
        assert!(!ok.is_failed());

        let rejected = TransactionRecord {
            status: Some("Completed".into()),
            response: Some(LoggedResponse {
                status: Some(400),
                body: None,
            }),
            ..Default::default()
        };
        assert!(rejected.is_failed());
    }
}
