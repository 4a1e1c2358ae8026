use std::time::Duration;

use serde_json::Value;

use crate::config::EnvironmentConfig;
use crate::error::TransportError;

/// Successful SHR answer.
#[derive(Debug, Clone, PartialEq)]
pub struct ShrResponse {
    pub status: u16,
    pub body: Value,
}

/// FHIR client bound to a single SHR environment.
pub struct ShrClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl ShrClient {
    pub fn new(environment: &EnvironmentConfig) -> Self {
        Self::with_http(environment, reqwest::Client::new())
    }

    /// Like [`ShrClient::new`] with a per-request timeout.
    pub fn with_timeout(
        environment: &EnvironmentConfig,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connect {
                url: environment.base_url.clone(),
                message: e.to_string(),
            })?;
        Ok(Self::with_http(environment, http))
    }

    fn with_http(environment: &EnvironmentConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: environment.base_url.trim_end_matches('/').to_string(),
            username: environment.username.clone(),
            password: environment.password.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fhir_url(&self, path: &str) -> String {
        format!("{}/fhir/{}", self.base_url, path)
    }

    /// `PUT {base}/fhir/{resource_type}/{id}` with the environment's basic auth.
    pub async fn put_resource(
        &self,
        resource_type: &str,
        id: &str,
        body: &Value,
    ) -> Result<ShrResponse, TransportError> {
        let url = self.fhir_url(&format!("{resource_type}/{id}"));
        let resp = self
            .http
            .put(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Accept", "application/fhir+json")
            .header("Content-Type", "application/fhir+json")
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::Connect {
                url: url.clone(),
                message: e.to_string(),
            })?;
        handle_response(&url, resp).await
    }
}

async fn handle_response(
    url: &str,
    resp: reqwest::Response,
) -> Result<ShrResponse, TransportError> {
    let status = resp.status();
    let body = resp.text().await.map_err(|e| TransportError::Connect {
        url: url.to_string(),
        message: format!("failed to read response body: {e}"),
    })?;
    let json = serde_json::from_str::<Value>(&body).ok();

    let outcome = json
        .as_ref()
        .filter(|v| v.get("resourceType").and_then(Value::as_str) == Some("OperationOutcome"));

    if !status.is_success() || outcome.is_some_and(has_error_issue) {
        let message = outcome
            .and_then(outcome_messages)
            .unwrap_or_else(|| body.clone());
        return Err(TransportError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    Ok(ShrResponse {
        status: status.as_u16(),
        body: json.unwrap_or(Value::Null),
    })
}

fn has_error_issue(outcome: &Value) -> bool {
    outcome
        .get("issue")
        .and_then(Value::as_array)
        .is_some_and(|issues| {
            issues.iter().any(|i| {
                matches!(
                    i.get("severity").and_then(Value::as_str),
                    Some("error" | "fatal")
                )
            })
        })
}

fn outcome_messages(outcome: &Value) -> Option<String> {
    let msgs: Vec<&str> = outcome
        .get("issue")?
        .as_array()?
        .iter()
        .filter_map(|i| {
            i.get("diagnostics")
                .and_then(Value::as_str)
                .or_else(|| i.get("details")?.get("text")?.as_str())
        })
        .collect();
    if msgs.is_empty() {
        None
    } else {
        Some(msgs.join("; "))
    }
}
