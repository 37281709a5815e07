use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::BackendClient;
use crate::error::Result;
use crate::models::SafetyLogRecord;

/// Filters for `/api/safety/get-filtered-logs`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyFilter {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl SafetyFilter {
    /// Query pairs with blank values dropped
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        [("type", &self.kind), ("status", &self.status)]
            .into_iter()
            .filter_map(|(key, value)| {
                let value = value.as_deref()?.trim();
                (!value.is_empty()).then(|| (key, value.to_string()))
            })
            .collect()
    }
}

#[derive(Serialize)]
struct DeleteLogRequest<'a> {
    #[serde(rename = "logID")]
    log_id: &'a str,
}

#[async_trait]
pub trait SafetyApi: Send + Sync {
    async fn filtered_logs(&self, token: &str, filter: &SafetyFilter)
        -> Result<Vec<SafetyLogRecord>>;

    async fn delete_log(&self, token: &str, log_id: &str) -> Result<()>;
}

#[async_trait]
impl SafetyApi for BackendClient {
    async fn filtered_logs(
        &self,
        token: &str,
        filter: &SafetyFilter,
    ) -> Result<Vec<SafetyLogRecord>> {
        self.send_json(
            self.http
                .get(self.api_url("/api/safety/get-filtered-logs"))
                .bearer_auth(token)
                .query(&filter.query_pairs()),
            "GET /api/safety/get-filtered-logs",
            &["logs", "data"],
        )
        .await
    }

    async fn delete_log(&self, token: &str, log_id: &str) -> Result<()> {
        self.send_empty(
            self.http
                .delete(self.api_url("/api/safety/delete-log"))
                .bearer_auth(token)
                .json(&DeleteLogRequest { log_id }),
            "DELETE /api/safety/delete-log",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockServer;

    #[test]
    fn test_query_pairs_skip_blank() {
        let filter = SafetyFilter {
            kind: Some("medical".to_string()),
            status: Some(" ".to_string()),
        };
        assert_eq!(filter.query_pairs(), vec![("type", "medical".to_string())]);
    }

    #[tokio::test]
    async fn test_delete_log_sends_id_in_body() {
        let server = MockServer::start()
            .await
            .respond("DELETE", "/api/safety/delete-log", 200, r#"{"ok":true}"#);
        server.client().delete_log("tok", "s1").await.unwrap();
        assert_eq!(server.requests()[0].json()["logID"], "s1");
    }
}
