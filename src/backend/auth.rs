use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::BackendClient;
use crate::error::Result;
use crate::models::AdminProfile;

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Response of `POST /api/auth/login`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(alias = "token", alias = "access_token")]
    pub access_token: String,
    #[serde(default)]
    pub user: Option<AdminProfile>,
}

/// Body for `POST /api/auth/change-password`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse>;

    async fn fetch_profile(&self, token: &str) -> Result<AdminProfile>;

    async fn change_password(&self, token: &str, request: &ChangePasswordRequest) -> Result<()>;
}

#[async_trait]
impl AuthApi for BackendClient {
    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        self.send_json(
            self.http
                .post(self.api_url("/api/auth/login"))
                .json(&LoginRequest { email, password }),
            "POST /api/auth/login",
            &[],
        )
        .await
    }

    async fn fetch_profile(&self, token: &str) -> Result<AdminProfile> {
        self.send_json(
            self.http
                .post(self.api_url("/api/auth/fetch-user-profile"))
                .bearer_auth(token),
            "POST /api/auth/fetch-user-profile",
            &["user", "profile", "data"],
        )
        .await
    }

    async fn change_password(&self, token: &str, request: &ChangePasswordRequest) -> Result<()> {
        self.send_empty(
            self.http
                .post(self.api_url("/api/auth/change-password"))
                .bearer_auth(token)
                .json(request),
            "POST /api/auth/change-password",
        )
        .await
    }
}
