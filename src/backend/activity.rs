use async_trait::async_trait;

use super::BackendClient;
use crate::error::Result;
use crate::models::ActivityEntry;

#[async_trait]
pub trait ActivityApi: Send + Sync {
    async fn record_activity(&self, token: &str, entry: &ActivityEntry) -> Result<()>;

    async fn recent_activity(&self, token: &str, limit: usize) -> Result<Vec<ActivityEntry>>;
}

#[async_trait]
impl ActivityApi for BackendClient {
    async fn record_activity(&self, token: &str, entry: &ActivityEntry) -> Result<()> {
        self.send_empty(
            self.http
                .post(self.api_url("/api/admin-activity/log"))
                .bearer_auth(token)
                .json(entry),
            "POST /api/admin-activity/log",
        )
        .await
    }

    async fn recent_activity(&self, token: &str, limit: usize) -> Result<Vec<ActivityEntry>> {
        self.send_json(
            self.http
                .get(self.api_url("/api/admin-activity/logs"))
                .bearer_auth(token)
                .query(&[("limit", limit)]),
            "GET /api/admin-activity/logs",
            &["logs", "activities", "data"],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockServer;

    #[tokio::test]
    async fn test_missing_endpoint_is_404() {
        let server = MockServer::start().await;
        let entry = ActivityEntry::new("A1", "root", "Deleted user", "U1");
        let err = server
            .client()
            .record_activity("tok", &entry)
            .await
            .unwrap_err();
        assert!(err.is_not_found_response());
    }

    #[tokio::test]
    async fn test_recent_activity() {
        let server = MockServer::start().await.respond(
            "GET",
            "/api/admin-activity/logs",
            200,
            r#"{"logs":[{"adminID":"A1","action":"Login","timestamp":"2025-01-01T00:00:00Z"}]}"#,
        );
        let entries = server.client().recent_activity("tok", 20).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "Login");
        assert_eq!(server.requests()[0].query.as_deref(), Some("limit=20"));
    }
}
