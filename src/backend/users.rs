use async_trait::async_trait;

use super::BackendClient;
use crate::error::Result;
use crate::models::{User, UserFilter, UserProfile};

#[async_trait]
pub trait UserApi: Send + Sync {
    async fn filtered_users(&self, token: &str, filter: &UserFilter) -> Result<Vec<User>>;

    async fn secure_profile(&self, token: &str, user_id: &str) -> Result<UserProfile>;

    async fn delete_user(&self, token: &str, user_id: &str) -> Result<()>;
}

#[async_trait]
impl UserApi for BackendClient {
    async fn filtered_users(&self, token: &str, filter: &UserFilter) -> Result<Vec<User>> {
        self.send_json(
            self.http
                .get(self.api_url("/api/user/filtered-users"))
                .bearer_auth(token)
                .query(&filter.query_pairs()),
            "GET /api/user/filtered-users",
            &["users", "data"],
        )
        .await
    }

    async fn secure_profile(&self, token: &str, user_id: &str) -> Result<UserProfile> {
        let path = format!("/api/user/secure-profile/{}", urlencoding::encode(user_id));
        self.send_json(
            self.http.get(self.api_url(&path)).bearer_auth(token),
            "GET /api/user/secure-profile",
            &["user", "profile", "data"],
        )
        .await
    }

    async fn delete_user(&self, token: &str, user_id: &str) -> Result<()> {
        let path = format!("/api/user/{}", urlencoding::encode(user_id));
        self.send_empty(
            self.http.delete(self.api_url(&path)).bearer_auth(token),
            "DELETE /api/user",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockServer;
    use crate::error::AdminError;
    use crate::models::UserStatus;

    #[tokio::test]
    async fn test_filtered_users_envelope_and_query() {
        let server = MockServer::start().await.respond(
            "GET",
            "/api/user/filtered-users",
            200,
            r#"{"users":[{"_id":"U1","name":"Ana","status":"banned","moderationLogID":"l1"}]}"#,
        );

        let filter = UserFilter {
            status: Some(UserStatus::Banned),
            search: Some("ana".to_string()),
        };
        let users = server.client().filtered_users("tok", &filter).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].status, UserStatus::Banned);

        let requests = server.requests();
        assert_eq!(requests[0].query.as_deref(), Some("status=banned&search=ana"));
    }

    #[tokio::test]
    async fn test_bad_user_shape_is_schema_error() {
        let server = MockServer::start().await.respond(
            "GET",
            "/api/user/filtered-users",
            200,
            r#"{"users":[{"name":"no id"}]}"#,
        );
        let err = server
            .client()
            .filtered_users("tok", &UserFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Schema { .. }));
    }

    #[tokio::test]
    async fn test_delete_user_path() {
        let server = MockServer::start()
            .await
            .respond("DELETE", "/api/user/U7", 200, "");
        server.client().delete_user("tok", "U7").await.unwrap();
        assert_eq!(server.requests()[0].method, "DELETE");
    }
}
