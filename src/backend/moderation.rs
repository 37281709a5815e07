use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{string_or_number, BackendClient};
use crate::error::Result;
use crate::models::ModerationKind;

/// Body for `POST /api/moderation/create-log`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateLogRequest {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "adminID")]
    pub admin_id: String,
    #[serde(rename = "type")]
    pub kind: ModerationKind,
    pub duration: u32,
    pub reason: String,
    pub message: String,
}

/// Body for `PUT /api/moderation/unwarn` and `/unban`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverseLogRequest {
    #[serde(rename = "logID")]
    pub log_id: String,
    #[serde(rename = "adminID")]
    pub admin_id: String,
}

#[derive(Deserialize)]
struct CreateLogResponse {
    #[serde(rename = "logId", alias = "logID", deserialize_with = "string_or_number")]
    log_id: String,
}

#[async_trait]
pub trait ModerationApi: Send + Sync {
    /// Create a warning/ban log, returning its id
    async fn create_log(&self, token: &str, request: &CreateLogRequest) -> Result<String>;

    async fn unwarn(&self, token: &str, request: &ReverseLogRequest) -> Result<()>;

    async fn unban(&self, token: &str, request: &ReverseLogRequest) -> Result<()>;
}

#[async_trait]
impl ModerationApi for BackendClient {
    async fn create_log(&self, token: &str, request: &CreateLogRequest) -> Result<String> {
        let response: CreateLogResponse = self
            .send_json(
                self.http
                    .post(self.api_url("/api/moderation/create-log"))
                    .bearer_auth(token)
                    .json(request),
                "POST /api/moderation/create-log",
                &[],
            )
            .await?;
        Ok(response.log_id)
    }

    async fn unwarn(&self, token: &str, request: &ReverseLogRequest) -> Result<()> {
        self.send_empty(
            self.http
                .put(self.api_url("/api/moderation/unwarn"))
                .bearer_auth(token)
                .json(request),
            "PUT /api/moderation/unwarn",
        )
        .await
    }

    async fn unban(&self, token: &str, request: &ReverseLogRequest) -> Result<()> {
        self.send_empty(
            self.http
                .put(self.api_url("/api/moderation/unban"))
                .bearer_auth(token)
                .json(request),
            "PUT /api/moderation/unban",
        )
        .await
    }
}
