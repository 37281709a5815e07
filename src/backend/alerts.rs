use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{decode, parse_schema, unwrap_envelope, BackendClient};
use crate::error::Result;
use crate::models::{AlertPayload, AlertRecord};

#[async_trait]
pub trait AlertApi: Send + Sync {
    async fn list_alerts(&self, token: &str) -> Result<Vec<AlertRecord>>;

    /// Returns the stored alert, or `None` when the server sent no body
    async fn create_alert(&self, token: &str, payload: &AlertPayload)
        -> Result<Option<AlertRecord>>;

    async fn update_alert(
        &self,
        token: &str,
        alert_id: &str,
        payload: &AlertPayload,
    ) -> Result<Option<AlertRecord>>;

    async fn delete_alert(&self, token: &str, alert_id: &str) -> Result<()>;
}

impl BackendClient {
    /// Mutations may answer with the alert, a wrapper around it, or nothing
    async fn send_alert_mutation(
        &self,
        request: reqwest::RequestBuilder,
        endpoint: &str,
    ) -> Result<Option<AlertRecord>> {
        let body = self.send(request, endpoint).await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let value = unwrap_envelope(parse_schema::<Value>(&body, endpoint)?, &["alert", "data"]);
        let has_id = value.get("_id").is_some() || value.get("id").is_some();
        if !has_id {
            debug!("{} answered without an alert, keeping local copy", endpoint);
            return Ok(None);
        }
        decode(value, endpoint).map(Some)
    }
}

#[async_trait]
impl AlertApi for BackendClient {
    async fn list_alerts(&self, token: &str) -> Result<Vec<AlertRecord>> {
        self.send_json(
            self.http
                .get(self.alerts_url("/api/alerts"))
                .bearer_auth(token),
            "GET /api/alerts",
            &["alerts", "data"],
        )
        .await
    }

    async fn create_alert(
        &self,
        token: &str,
        payload: &AlertPayload,
    ) -> Result<Option<AlertRecord>> {
        self.send_alert_mutation(
            self.http
                .post(self.alerts_url("/api/alerts"))
                .bearer_auth(token)
                .json(payload),
            "POST /api/alerts",
        )
        .await
    }

    async fn update_alert(
        &self,
        token: &str,
        alert_id: &str,
        payload: &AlertPayload,
    ) -> Result<Option<AlertRecord>> {
        let path = format!("/api/alerts/{}", urlencoding::encode(alert_id));
        self.send_alert_mutation(
            self.http
                .put(self.alerts_url(&path))
                .bearer_auth(token)
                .json(payload),
            "PUT /api/alerts",
        )
        .await
    }

    async fn delete_alert(&self, token: &str, alert_id: &str) -> Result<()> {
        let path = format!("/api/alerts/{}", urlencoding::encode(alert_id));
        self.send_empty(
            self.http.delete(self.alerts_url(&path)).bearer_auth(token),
            "DELETE /api/alerts",
        )
        .await
    }
}
