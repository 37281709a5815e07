//! In-memory backend for workflow tests
//!
//! Records every call (method, path, JSON body) so tests can assert exactly
//! which requests a workflow issued, and can be told to fail the next call.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use super::{
    ActivityApi, AlertApi, AuthApi, ChangePasswordRequest, CreateLogRequest, LoginResponse,
    ModerationApi, ReverseLogRequest, SafetyApi, SafetyFilter, UserApi,
};
use crate::error::{AdminError, Result};
use crate::models::{
    ActivityEntry, AdminProfile, AlertPayload, AlertRecord, SafetyLogRecord, User, UserFilter,
    UserProfile, UserStatus,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    pub users: Mutex<Vec<User>>,
    pub alerts: Mutex<Vec<AlertRecord>>,
    pub safety_logs: Mutex<Vec<SafetyLogRecord>>,
    pub activity: Mutex<Vec<ActivityEntry>>,
    /// Status the activity endpoint answers with, if not success
    pub activity_status: Mutex<Option<u16>>,
    /// Alert mutations answer with an empty body
    pub empty_alert_responses: Mutex<bool>,
    failure: Mutex<Option<(u16, String)>>,
    next_id: AtomicU32,
}

pub fn user(id: &str, status: UserStatus, log_id: Option<&str>) -> User {
    User {
        id: id.to_string(),
        name: format!("User {}", id),
        username: id.to_lowercase(),
        email: format!("{}@example.com", id.to_lowercase()),
        status,
        warning_count: if status == UserStatus::Warned { 1 } else { 0 },
        moderation_log_id: log_id.map(str::to_string),
    }
}

pub fn admin_profile() -> AdminProfile {
    AdminProfile {
        id: "A1".to_string(),
        username: "root".to_string(),
        email: "root@tarag.ph".to_string(),
        role: "admin".to_string(),
        first_name: None,
        last_name: None,
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<User>) -> Self {
        let backend = Self::default();
        *backend.users.lock() = users;
        backend
    }

    /// Make the next call answer with an error status
    pub fn fail_next(&self, status: u16, message: &str) {
        *self.failure.lock() = Some((status, message.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Calls other than activity logging
    pub fn primary_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !c.path.starts_with("/api/admin-activity"))
            .collect()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }

    fn record(&self, method: &'static str, path: impl Into<String>, body: Value) -> Result<()> {
        self.calls.lock().push(Call {
            method,
            path: path.into(),
            body,
        });
        match self.failure.lock().take() {
            Some((status, message)) => Err(AdminError::Api { status, message }),
            None => Ok(()),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn record_from_payload(&self, id: String, payload: &AlertPayload) -> AlertRecord {
        AlertRecord {
            id,
            title: payload.title.clone(),
            description: payload.description.clone(),
            severity: payload.severity,
            start_on: json!(payload.start_on),
            end_on: json!(payload.end_on),
            locations: payload.locations.clone(),
            target: payload.target,
        }
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse> {
        self.record("POST", "/api/auth/login", json!({ "email": email }))?;
        Ok(LoginResponse {
            access_token: "token-1".to_string(),
            user: None,
        })
    }

    async fn fetch_profile(&self, _token: &str) -> Result<AdminProfile> {
        self.record("POST", "/api/auth/fetch-user-profile", Value::Null)?;
        Ok(admin_profile())
    }

    async fn change_password(&self, _token: &str, request: &ChangePasswordRequest) -> Result<()> {
        self.record(
            "POST",
            "/api/auth/change-password",
            serde_json::to_value(request)?,
        )
    }
}

#[async_trait]
impl UserApi for FakeBackend {
    async fn filtered_users(&self, _token: &str, filter: &UserFilter) -> Result<Vec<User>> {
        self.record(
            "GET",
            "/api/user/filtered-users",
            serde_json::to_value(filter)?,
        )?;
        Ok(self
            .users
            .lock()
            .iter()
            .filter(|u| filter.status.map_or(true, |s| u.status == s))
            .cloned()
            .collect())
    }

    async fn secure_profile(&self, _token: &str, user_id: &str) -> Result<UserProfile> {
        self.record("GET", format!("/api/user/secure-profile/{}", user_id), Value::Null)?;
        let users = self.users.lock();
        let user = users
            .iter()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AdminError::Api {
                status: 404,
                message: "User not found".to_string(),
            })?;
        Ok(UserProfile {
            id: user.id.clone(),
            name: user.name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            phone: None,
            status: user.status,
            warning_count: user.warning_count,
            moderation_log_id: user.moderation_log_id.clone(),
            created_at: None,
        })
    }

    async fn delete_user(&self, _token: &str, user_id: &str) -> Result<()> {
        self.record("DELETE", format!("/api/user/{}", user_id), Value::Null)?;
        self.users.lock().retain(|u| u.id != user_id);
        Ok(())
    }
}

#[async_trait]
impl ModerationApi for FakeBackend {
    async fn create_log(&self, _token: &str, request: &CreateLogRequest) -> Result<String> {
        self.record(
            "POST",
            "/api/moderation/create-log",
            serde_json::to_value(request)?,
        )?;
        Ok(self.next_id("log"))
    }

    async fn unwarn(&self, _token: &str, request: &ReverseLogRequest) -> Result<()> {
        self.record("PUT", "/api/moderation/unwarn", serde_json::to_value(request)?)
    }

    async fn unban(&self, _token: &str, request: &ReverseLogRequest) -> Result<()> {
        self.record("PUT", "/api/moderation/unban", serde_json::to_value(request)?)
    }
}

#[async_trait]
impl AlertApi for FakeBackend {
    async fn list_alerts(&self, _token: &str) -> Result<Vec<AlertRecord>> {
        self.record("GET", "/api/alerts", Value::Null)?;
        Ok(self.alerts.lock().clone())
    }

    async fn create_alert(
        &self,
        _token: &str,
        payload: &AlertPayload,
    ) -> Result<Option<AlertRecord>> {
        self.record("POST", "/api/alerts", serde_json::to_value(payload)?)?;
        let record = self.record_from_payload(self.next_id("alert"), payload);
        self.alerts.lock().insert(0, record.clone());
        if *self.empty_alert_responses.lock() {
            Ok(None)
        } else {
            Ok(Some(record))
        }
    }

    async fn update_alert(
        &self,
        _token: &str,
        alert_id: &str,
        payload: &AlertPayload,
    ) -> Result<Option<AlertRecord>> {
        self.record(
            "PUT",
            format!("/api/alerts/{}", alert_id),
            serde_json::to_value(payload)?,
        )?;
        let record = self.record_from_payload(alert_id.to_string(), payload);
        if *self.empty_alert_responses.lock() {
            Ok(None)
        } else {
            Ok(Some(record))
        }
    }

    async fn delete_alert(&self, _token: &str, alert_id: &str) -> Result<()> {
        self.record("DELETE", format!("/api/alerts/{}", alert_id), Value::Null)?;
        self.alerts.lock().retain(|a| a.id != alert_id);
        Ok(())
    }
}

#[async_trait]
impl SafetyApi for FakeBackend {
    async fn filtered_logs(
        &self,
        _token: &str,
        filter: &SafetyFilter,
    ) -> Result<Vec<SafetyLogRecord>> {
        self.record(
            "GET",
            "/api/safety/get-filtered-logs",
            serde_json::to_value(filter)?,
        )?;
        Ok(self.safety_logs.lock().clone())
    }

    async fn delete_log(&self, _token: &str, log_id: &str) -> Result<()> {
        self.record(
            "DELETE",
            "/api/safety/delete-log",
            json!({ "logID": log_id }),
        )?;
        self.safety_logs.lock().retain(|l| l.id != log_id);
        Ok(())
    }
}

#[async_trait]
impl ActivityApi for FakeBackend {
    async fn record_activity(&self, _token: &str, entry: &ActivityEntry) -> Result<()> {
        self.record("POST", "/api/admin-activity/log", serde_json::to_value(entry)?)?;
        if let Some(status) = *self.activity_status.lock() {
            return Err(AdminError::Api {
                status,
                message: "activity endpoint unavailable".to_string(),
            });
        }
        self.activity.lock().push(entry.clone());
        Ok(())
    }

    async fn recent_activity(&self, _token: &str, limit: usize) -> Result<Vec<ActivityEntry>> {
        self.record("GET", "/api/admin-activity/logs", json!({ "limit": limit }))?;
        let activity = self.activity.lock();
        Ok(activity.iter().rev().take(limit).cloned().collect())
    }
}
