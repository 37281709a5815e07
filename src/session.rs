//! Admin sessions
//!
//! A session is created on login and removed on logout. It holds the
//! backend access token, the admin id that moderation calls need, the cached
//! profile, and the per-session workspace (loaded lists and notices).

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine;
use tokio::sync::{Mutex, RwLock};

use crate::error::{AdminError, Result};
use crate::firebase::FirebaseSession;
use crate::models::{AdminProfile, Theme};
use crate::workflows::Workspace;

/// Session data for an authenticated admin
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub access_token: Option<String>,
    pub admin_id: Option<String>,
    pub profile: Option<AdminProfile>,
    pub firebase: Option<FirebaseSession>,
    pub theme: Theme,
    pub created_at: u64,
    pub expires_at: u64,
}

/// Token and admin id, both present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials<'a> {
    pub token: &'a str,
    pub admin_id: &'a str,
}

impl AdminSession {
    /// Create a session; expiry comes from the token's `exp` claim when it has one
    pub fn new(access_token: String, profile: Option<AdminProfile>, ttl_secs: u64) -> Self {
        let now = current_timestamp();
        let expires_at =
            jwt_expiry(&access_token).unwrap_or_else(|| now.saturating_add(ttl_secs));
        let admin_id = profile
            .as_ref()
            .map(|p| p.id.clone())
            .filter(|id| !id.is_empty());

        Self {
            access_token: Some(access_token).filter(|t| !t.is_empty()),
            admin_id,
            profile,
            firebase: None,
            theme: Theme::default(),
            created_at: now,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        current_timestamp() >= self.expires_at
    }

    /// Bearer token, or an authentication error
    pub fn token(&self) -> Result<&str> {
        if self.is_expired() {
            return Err(AdminError::SessionExpired);
        }
        self.access_token.as_deref().ok_or(AdminError::MissingToken)
    }

    /// Token plus admin id, required by every moderation call
    pub fn credentials(&self) -> Result<Credentials<'_>> {
        let token = self.token()?;
        let admin_id = self.admin_id.as_deref().ok_or(AdminError::MissingAdminId)?;
        Ok(Credentials { token, admin_id })
    }

    pub fn admin_name(&self) -> String {
        self.profile
            .as_ref()
            .map(AdminProfile::display_name)
            .unwrap_or_else(|| "Admin".to_string())
    }

    /// Firebase id token, if signed in and still valid
    pub fn firebase_token(&self) -> Option<&str> {
        self.firebase
            .as_ref()
            .filter(|f| !f.is_expired())
            .map(|f| f.id_token.as_str())
    }
}

/// Read `exp` from a JWT payload without verifying it
pub fn jwt_expiry(token: &str) -> Option<u64> {
    let payload = token.split('.').nth(1)?;
    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    claims.get("exp")?.as_u64()
}

struct SessionEntry {
    session: AdminSession,
    workspace: Arc<Mutex<Workspace>>,
}

/// Session store - maps cookie tokens to sessions and their workspaces
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new session and return its cookie token
    pub async fn create_session(&self, session: AdminSession) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let entry = SessionEntry {
            session,
            workspace: Arc::new(Mutex::new(Workspace::default())),
        };
        self.sessions.write().await.insert(token.clone(), entry);
        token
    }

    /// Get session by token (returns None if expired or not found)
    pub async fn get_session(&self, token: &str) -> Option<AdminSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|e| !e.session.is_expired())
            .map(|e| e.session.clone())
    }

    /// Session together with its workspace
    pub async fn get_with_workspace(
        &self,
        token: &str,
    ) -> Option<(AdminSession, Arc<Mutex<Workspace>>)> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|e| !e.session.is_expired())
            .map(|e| (e.session.clone(), e.workspace.clone()))
    }

    /// Apply a change to a stored session; false if it no longer exists
    pub async fn update_session(&self, token: &str, f: impl FnOnce(&mut AdminSession)) -> bool {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(token) {
            Some(entry) => {
                f(&mut entry.session);
                true
            }
            None => false,
        }
    }

    /// Remove a session and drop its workspace
    pub async fn remove_session(&self, token: &str) -> Option<AdminSession> {
        self.sessions.write().await.remove(token).map(|e| e.session)
    }

    /// Clean up expired sessions, returning how many were dropped
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, e| !e.session.is_expired());
        before - sessions.len()
    }
}

pub type SharedSessionStore = Arc<SessionStore>;

pub fn create_session_store() -> SharedSessionStore {
    Arc::new(SessionStore::new())
}

fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::admin_profile;

    fn jwt_with_exp(exp: u64) -> String {
        let payload = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(format!(r#"{{"sub":"A1","exp":{}}}"#, exp));
        format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", payload)
    }

    #[test]
    fn test_jwt_expiry() {
        assert_eq!(jwt_expiry(&jwt_with_exp(1_900_000_000)), Some(1_900_000_000));
        assert_eq!(jwt_expiry("opaque-token"), None);
        assert_eq!(jwt_expiry("a.%%%.c"), None);
    }

    #[test]
    fn test_credentials_require_token_and_admin_id() {
        let session = AdminSession::new("tok".to_string(), Some(admin_profile()), 60);
        let creds = session.credentials().unwrap();
        assert_eq!(creds.token, "tok");
        assert_eq!(creds.admin_id, "A1");

        let mut no_admin = session.clone();
        no_admin.admin_id = None;
        assert!(matches!(no_admin.credentials(), Err(AdminError::MissingAdminId)));

        let mut no_token = session.clone();
        no_token.access_token = None;
        assert!(matches!(no_token.credentials(), Err(AdminError::MissingToken)));
    }

    #[test]
    fn test_expired_token_from_claim() {
        let session = AdminSession::new(jwt_with_exp(1), Some(admin_profile()), 60);
        assert!(session.is_expired());
        assert!(matches!(session.token(), Err(AdminError::SessionExpired)));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let session = AdminSession::new("tok".to_string(), Some(admin_profile()), u64::MAX);
        assert_eq!(session.expires_at, u64::MAX);
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn test_store_lifecycle() {
        let store = create_session_store();
        let token = store
            .create_session(AdminSession::new("tok".to_string(), Some(admin_profile()), 60))
            .await;

        assert!(store.get_session(&token).await.is_some());
        assert!(store.update_session(&token, |s| s.theme = Theme::Light).await);
        assert_eq!(store.get_session(&token).await.unwrap().theme, Theme::Light);

        assert!(store.remove_session(&token).await.is_some());
        assert!(store.get_session(&token).await.is_none());
        assert!(!store.update_session(&token, |_| {}).await);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let store = create_session_store();
        store
            .create_session(AdminSession::new(jwt_with_exp(1), None, 60))
            .await;
        store
            .create_session(AdminSession::new("tok".to_string(), None, 60))
            .await;
        assert_eq!(store.cleanup_expired().await, 1);
    }
}
