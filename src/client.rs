//! Standalone HTTP client for the beestat API (thermostat read only).
//!
//! - Blocking client using `ureq` (no async).
//! - One GET per snapshot: `?api_key=…&resource=thermostat&method=read_id`.
//! - The response envelope is validated here; the raw document is handed to the
//!   normalizer untouched so the `data` mapping checks stay in one place.
//!
//! The client applies its own request timeout and performs no retries.

use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Beestat Rust Client)";

#[derive(Debug)]
pub enum BeestatClientError {
    Transport(String),
    Http { status: u16, message: String },
    Json(String),
    Api(String),
}

impl core::fmt::Display for BeestatClientError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BeestatClientError::Transport(s) => write!(f, "transport error: {}", s),
            BeestatClientError::Http { status, message } => write!(f, "http {}: {}", status, message),
            BeestatClientError::Json(e) => write!(f, "json error: {}", e),
            BeestatClientError::Api(e) => write!(f, "api error: {}", e),
        }
    }
}

impl std::error::Error for BeestatClientError {}

/// Typed view of the beestat response envelope, used only for validation;
/// unknown fields stay in the raw document returned to the caller.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    error_message: Option<String>,
}

pub struct BeestatClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl BeestatClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).user_agent(USER_AGENT).build();
        BeestatClient {
            agent,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Fetches the full thermostat document (`resource=thermostat&method=read_id`).
    pub fn read_thermostats(&self) -> Result<Value, BeestatClientError> {
        self.get(&[("resource", "thermostat"), ("method", "read_id")])
    }

    fn get(&self, query: &[(&str, &str)]) -> Result<Value, BeestatClientError> {
        let mut req = self
            .agent
            .get(&self.base_url)
            .set("Accept", "application/json")
            .query("api_key", &self.api_key);
        for (k, v) in query {
            req = req.query(k, v);
        }

        match req.call() {
            Ok(res) => Self::parse_document(res),
            Err(ureq::Error::Transport(t)) => Err(BeestatClientError::Transport(t.to_string())),
            Err(ureq::Error::Status(status, res)) => {
                let body = res.into_string().unwrap_or_else(|_| String::from("<no body>"));
                Err(BeestatClientError::Http { status, message: body })
            }
        }
    }

    fn parse_document(res: ureq::Response) -> Result<Value, BeestatClientError> {
        let body = res
            .into_string()
            .map_err(|e| BeestatClientError::Transport(e.to_string()))?;

        // Envelope first, with path-annotated decode errors.
        let mut de = serde_json::Deserializer::from_str(&body);
        let envelope: ApiEnvelope =
            serde_path_to_error::deserialize(&mut de).map_err(|e| BeestatClientError::Json(e.to_string()))?;
        Self::check_envelope(&envelope)?;

        let document: Value = serde_json::from_str(&body).map_err(|e| BeestatClientError::Json(e.to_string()))?;
        if !(envelope.success.unwrap_or(false) || document.get("data").is_some()) {
            return Err(BeestatClientError::Api("unexpected response format".to_string()));
        }
        Ok(document)
    }

    fn check_envelope(envelope: &ApiEnvelope) -> Result<(), BeestatClientError> {
        if let Some(code) = envelope.error_code {
            let message = envelope.error_message.as_deref().unwrap_or("<no message>");
            return Err(BeestatClientError::Api(format!("beestat error {}: {}", code, message)));
        }
        if envelope.success == Some(false) {
            return Err(BeestatClientError::Api("request reported success=false".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_is_rejected() {
        let envelope = ApiEnvelope {
            success: Some(false),
            error_code: Some(1004),
            error_message: Some("Invalid API key.".to_string()),
        };
        let err = BeestatClient::check_envelope(&envelope).unwrap_err();
        assert!(matches!(err, BeestatClientError::Api(msg) if msg.contains("1004")));
    }

    #[test]
    fn successful_envelope_passes() {
        let envelope = ApiEnvelope {
            success: Some(true),
            error_code: None,
            error_message: None,
        };
        assert!(BeestatClient::check_envelope(&envelope).is_ok());
    }
}
