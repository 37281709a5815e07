//! Firebase REST integration
//!
//! Email/password sign-in through the Identity Toolkit, and writes to the
//! Firestore `adminlogs` collection with the signed-in admin's id token.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::FirebaseConfig;
use crate::error::{AdminError, Result};
use crate::models::ActivityEntry;

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";

/// Firestore collection the admin audit trail lives in
pub const ADMIN_LOGS_COLLECTION: &str = "adminlogs";

/// Signed-in Firebase user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseSession {
    pub id_token: String,
    pub local_id: String,
    pub expires_at: DateTime<Utc>,
}

impl FirebaseSession {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    local_id: String,
    expires_in: String,
}

/// Somewhere admin activity entries are appended
#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn append(&self, id_token: &str, entry: &ActivityEntry) -> Result<()>;
}

#[derive(Clone)]
pub struct FirebaseClient {
    http: reqwest::Client,
    api_key: String,
    project_id: String,
    identity_url: String,
    firestore_url: String,
}

impl FirebaseClient {
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            project_id: config.project_id.clone(),
            identity_url: IDENTITY_TOOLKIT_URL.to_string(),
            firestore_url: FIRESTORE_URL.to_string(),
        }
    }

    /// Point both APIs at another host (emulator or test server)
    pub fn with_endpoint(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        self.identity_url = format!("{}/identitytoolkit", base_url);
        self.firestore_url = format!("{}/firestore", base_url);
        self
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<FirebaseSession> {
        let url = format!(
            "{}/accounts:signInWithPassword?key={}",
            self.identity_url,
            urlencoding::encode(&self.api_key)
        );

        let response = self
            .http
            .post(&url)
            .json(&SignInRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!("Firebase sign-in failed ({}): {}", status, text);
            return Err(AdminError::Firebase {
                message: firebase_error_message(&text)
                    .unwrap_or_else(|| format!("sign-in failed with status {}", status)),
            });
        }

        let body: SignInResponse = response.json().await.map_err(|e| AdminError::Firebase {
            message: format!("unexpected sign-in response: {}", e),
        })?;
        let lifetime: i64 = body.expires_in.parse().unwrap_or(3600);

        debug!("Firebase sign-in succeeded for {}", body.local_id);
        Ok(FirebaseSession {
            id_token: body.id_token,
            local_id: body.local_id,
            expires_at: Utc::now() + Duration::seconds(lifetime),
        })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.firestore_url, self.project_id, collection
        )
    }
}

#[async_trait]
impl ActivitySink for FirebaseClient {
    async fn append(&self, id_token: &str, entry: &ActivityEntry) -> Result<()> {
        let response = self
            .http
            .post(self.collection_url(ADMIN_LOGS_COLLECTION))
            .bearer_auth(id_token)
            .json(&entry.to_firestore_document())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AdminError::Firebase {
                message: firebase_error_message(&text)
                    .unwrap_or_else(|| format!("Firestore write failed with status {}", status)),
            });
        }
        Ok(())
    }
}

/// Firebase errors look like `{"error": {"message": "INVALID_PASSWORD"}}`
fn firebase_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}
