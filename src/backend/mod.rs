//! Typed client for the TaraG REST backend
//!
//! Every response is parsed into an explicit schema here; anything that does
//! not match is a [`AdminError::Schema`] instead of a half-filled view model.
//! Each API area is a trait so workflows can run against a fake in tests.

pub mod activity;
pub mod alerts;
pub mod auth;
pub mod moderation;
pub mod safety;
pub mod users;

#[cfg(test)]
pub mod fake;
#[cfg(test)]
pub mod mock;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ConsoleConfig;
use crate::error::{AdminError, Result};

pub use activity::ActivityApi;
pub use alerts::AlertApi;
pub use auth::{AuthApi, ChangePasswordRequest, LoginResponse};
pub use moderation::{CreateLogRequest, ModerationApi, ReverseLogRequest};
pub use safety::{SafetyApi, SafetyFilter};
pub use users::UserApi;

/// Everything the console needs from the backend
pub trait Backend: AuthApi + UserApi + ModerationApi + AlertApi + SafetyApi + ActivityApi {}

impl<T> Backend for T where
    T: AuthApi + UserApi + ModerationApi + AlertApi + SafetyApi + ActivityApi
{
}

/// HTTP client for the backend
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    api_base_url: String,
    alerts_base_url: String,
}

impl BackendClient {
    pub fn new(config: &ConsoleConfig) -> Self {
        Self::with_base_urls(&config.api_base_url, &config.alerts_base_url)
    }

    pub fn with_base_urls(api_base_url: &str, alerts_base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            alerts_base_url: alerts_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    fn alerts_url(&self, path: &str) -> String {
        format!("{}{}", self.alerts_base_url, path)
    }

    /// Send a request and return the raw body of a 2xx response
    async fn send(&self, request: reqwest::RequestBuilder, endpoint: &str) -> Result<String> {
        let response = request.send().await.map_err(|e| {
            warn!("Request to {} failed: {}", endpoint, e);
            AdminError::from(e)
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = server_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });
            warn!("{} returned {}: {}", endpoint, status.as_u16(), message);
            return Err(AdminError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("{} returned {}", endpoint, status.as_u16());
        Ok(body)
    }

    /// Send and parse the body, looking inside the first matching envelope key
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
        envelope_keys: &[&str],
    ) -> Result<T> {
        let body = self.send(request, endpoint).await?;
        let value: Value = parse_schema(&body, endpoint)?;
        decode(unwrap_envelope(value, envelope_keys), endpoint)
    }

    /// Send and ignore the body
    async fn send_empty(&self, request: reqwest::RequestBuilder, endpoint: &str) -> Result<()> {
        self.send(request, endpoint).await.map(|_| ())
    }
}

fn parse_schema<T: DeserializeOwned>(body: &str, endpoint: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| AdminError::Schema {
        endpoint: endpoint.to_string(),
        source,
    })
}

fn decode<T: DeserializeOwned>(value: Value, endpoint: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|source| AdminError::Schema {
        endpoint: endpoint.to_string(),
        source,
    })
}

/// `{"users": [...]}` and `[...]` are both accepted
fn unwrap_envelope(value: Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(mut map) => {
            for key in keys {
                if let Some(inner) = map.remove(*key) {
                    return inner;
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}

/// Error text the backend put in a failed response, if any
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error", "msg"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Ids sometimes arrive as numbers
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(i64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}
