//! User moderation
//!
//! A user's status moves through `active`, `warned` and `banned`. Every
//! change goes through the moderation API first; the roster is only updated
//! once the backend has accepted it. Transitions the state machine does not
//! allow are rejected before any request is made.

use serde::Deserialize;
use tracing::{debug, info};

use crate::backend::{CreateLogRequest, ModerationApi, ReverseLogRequest, UserApi};
use crate::error::{AdminError, Result, ValidationErrors};
use crate::models::{
    ModerationKind, User, UserFilter, UserProfile, UserStatus, MODERATION_REASONS, OTHER_REASON,
};
use crate::session::AdminSession;

/// Raw warn/ban form fields as submitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModerationForm {
    pub duration: String,
    pub reason: String,
    pub other_reason: String,
    pub message: String,
}

/// A validated warn/ban form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModerationRequest {
    pub duration: u32,
    pub reason: String,
    pub message: String,
}

impl ModerationForm {
    /// Empty form with the kind's prefilled duration
    pub fn for_kind(kind: ModerationKind) -> Self {
        Self {
            duration: kind
                .default_duration()
                .map(|days| days.to_string())
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn validate(&self, kind: ModerationKind) -> Result<ModerationRequest> {
        let mut errors = ValidationErrors::new();

        let duration = match self.duration.trim() {
            "" => match kind.default_duration() {
                Some(days) => Some(days),
                None => {
                    errors.add("duration", "Duration is required");
                    None
                }
            },
            raw => match raw.parse::<u32>() {
                Ok(days) if days >= 1 => Some(days),
                _ => {
                    errors.add("duration", "Duration must be a whole number of days (1 or more)");
                    None
                }
            },
        };

        let reason = match self.reason.trim() {
            "" => {
                errors.add("reason", "Reason is required");
                None
            }
            OTHER_REASON => match self.other_reason.trim() {
                "" => {
                    errors.add("other_reason", "Please describe the reason");
                    None
                }
                custom => Some(custom.to_string()),
            },
            listed if MODERATION_REASONS.contains(&listed) => Some(listed.to_string()),
            _ => {
                errors.add("reason", "Unknown reason");
                None
            }
        };

        let message = self.message.trim();
        if message.is_empty() {
            errors.add("message", "Message is required");
        }

        errors.into_result()?;
        match (duration, reason) {
            (Some(duration), Some(reason)) => Ok(ModerationRequest {
                duration,
                reason,
                message: message.to_string(),
            }),
            _ => Err(AdminError::Internal {
                message: "moderation form passed validation without all fields".to_string(),
            }),
        }
    }
}

/// The users list a session is looking at
#[derive(Debug, Default)]
pub struct UserRoster {
    users: Vec<User>,
    filter: UserFilter,
}

impl UserRoster {
    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn filter(&self) -> &UserFilter {
        &self.filter
    }

    pub fn get(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    pub async fn refresh<A: UserApi + ?Sized>(
        &mut self,
        api: &A,
        session: &AdminSession,
        filter: UserFilter,
    ) -> Result<()> {
        let token = session.token()?;
        let users = api.filtered_users(token, &filter).await?;
        debug!("Loaded {} users", users.len());
        self.users = users;
        self.filter = filter;
        Ok(())
    }

    pub async fn profile<A: UserApi + ?Sized>(
        &self,
        api: &A,
        session: &AdminSession,
        user_id: &str,
    ) -> Result<UserProfile> {
        api.secure_profile(session.token()?, user_id).await
    }

    /// active -> warned
    pub async fn add_warning<A: ModerationApi + ?Sized>(
        &mut self,
        api: &A,
        session: &AdminSession,
        user_id: &str,
        request: &ModerationRequest,
    ) -> Result<String> {
        let creds = session.credentials()?;
        let user = self.expect_status(user_id, "warn", &[UserStatus::Active])?;

        let log_id = api
            .create_log(
                creds.token,
                &CreateLogRequest {
                    user_id: user.id.clone(),
                    admin_id: creds.admin_id.to_string(),
                    kind: ModerationKind::Warning,
                    duration: request.duration,
                    reason: request.reason.clone(),
                    message: request.message.clone(),
                },
            )
            .await?;

        info!("Warned user {} (log {})", user_id, log_id);
        self.user_mut(user_id)?.apply_warning(log_id.clone());
        Ok(log_id)
    }

    /// warned -> active
    pub async fn remove_warning<A: ModerationApi + ?Sized>(
        &mut self,
        api: &A,
        session: &AdminSession,
        user_id: &str,
    ) -> Result<()> {
        let creds = session.credentials()?;
        let user = self.expect_status(user_id, "remove the warning of", &[UserStatus::Warned])?;
        let log_id = require_log_id(user)?;

        api.unwarn(
            creds.token,
            &ReverseLogRequest {
                log_id,
                admin_id: creds.admin_id.to_string(),
            },
        )
        .await?;

        info!("Removed warning from user {}", user_id);
        self.user_mut(user_id)?.apply_warning_removal();
        Ok(())
    }

    /// active | warned -> banned
    pub async fn ban_user<A: ModerationApi + ?Sized>(
        &mut self,
        api: &A,
        session: &AdminSession,
        user_id: &str,
        request: &ModerationRequest,
    ) -> Result<String> {
        let creds = session.credentials()?;
        let user = self.expect_status(user_id, "ban", &[UserStatus::Active, UserStatus::Warned])?;

        let log_id = api
            .create_log(
                creds.token,
                &CreateLogRequest {
                    user_id: user.id.clone(),
                    admin_id: creds.admin_id.to_string(),
                    kind: ModerationKind::Ban,
                    duration: request.duration,
                    reason: request.reason.clone(),
                    message: request.message.clone(),
                },
            )
            .await?;

        info!(
            "Banned user {} for {} days (log {})",
            user_id, request.duration, log_id
        );
        self.user_mut(user_id)?.apply_ban(log_id.clone());
        Ok(log_id)
    }

    /// banned -> active through unban, warned -> active through unwarn
    pub async fn activate<A: ModerationApi + ?Sized>(
        &mut self,
        api: &A,
        session: &AdminSession,
        user_id: &str,
    ) -> Result<UserStatus> {
        let creds = session.credentials()?;
        let user = self.expect_status(
            user_id,
            "activate",
            &[UserStatus::Warned, UserStatus::Banned],
        )?;
        let previous = user.status;
        let request = ReverseLogRequest {
            log_id: require_log_id(user)?,
            admin_id: creds.admin_id.to_string(),
        };

        match previous {
            UserStatus::Banned => api.unban(creds.token, &request).await?,
            _ => api.unwarn(creds.token, &request).await?,
        }

        info!("Activated user {} (was {})", user_id, previous);
        self.user_mut(user_id)?.reset_to_active();
        Ok(previous)
    }

    /// Delete the account and drop exactly that row
    pub async fn delete_user<A: UserApi + ?Sized>(
        &mut self,
        api: &A,
        session: &AdminSession,
        user_id: &str,
    ) -> Result<()> {
        let creds = session.credentials()?;
        if self.get(user_id).is_none() {
            return Err(AdminError::not_found("User", user_id));
        }

        api.delete_user(creds.token, user_id).await?;

        info!("Deleted user {}", user_id);
        self.users.retain(|u| u.id != user_id);
        Ok(())
    }

    fn expect_status(
        &self,
        user_id: &str,
        action: &'static str,
        allowed: &[UserStatus],
    ) -> Result<&User> {
        let user = self
            .get(user_id)
            .ok_or_else(|| AdminError::not_found("User", user_id))?;
        if !allowed.contains(&user.status) {
            return Err(AdminError::InvalidTransition {
                user_id: user_id.to_string(),
                from: user.status,
                action,
            });
        }
        Ok(user)
    }

    fn user_mut(&mut self, user_id: &str) -> Result<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| AdminError::not_found("User", user_id))
    }
}

fn require_log_id(user: &User) -> Result<String> {
    user.moderation_log_id
        .clone()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AdminError::MissingModerationLog {
            user_id: user.id.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{admin_profile, user, FakeBackend};

    fn session() -> AdminSession {
        AdminSession::new("tok".to_string(), Some(admin_profile()), 3600)
    }

    fn roster(users: Vec<User>) -> UserRoster {
        UserRoster {
            users,
            filter: UserFilter::default(),
        }
    }

    fn request(duration: u32) -> ModerationRequest {
        ModerationRequest {
            duration,
            reason: "Scamming or Fraud".to_string(),
            message: "repeat offender".to_string(),
        }
    }

    #[test]
    fn test_form_requires_fields() {
        let err = ModerationForm::default()
            .validate(ModerationKind::Warning)
            .unwrap_err();
        let errors = err.validation().unwrap();
        assert!(errors.get("duration").is_some());
        assert!(errors.get("reason").is_some());
        assert!(errors.get("message").is_some());
    }

    #[test]
    fn test_form_rejects_zero_and_fractional_duration() {
        for raw in ["0", "1.5", "-3", "abc"] {
            let form = ModerationForm {
                duration: raw.to_string(),
                reason: "Hate Speech".to_string(),
                message: "m".to_string(),
                ..Default::default()
            };
            let err = form.validate(ModerationKind::Warning).unwrap_err();
            assert!(err.validation().unwrap().get("duration").is_some(), "{}", raw);
        }
    }

    #[test]
    fn test_form_other_reason_uses_free_text() {
        let form = ModerationForm {
            duration: "7".to_string(),
            reason: OTHER_REASON.to_string(),
            other_reason: "  Fake reviews ".to_string(),
            message: "stop".to_string(),
        };
        let request = form.validate(ModerationKind::Warning).unwrap();
        assert_eq!(request.reason, "Fake reviews");
        assert_eq!(request.duration, 7);

        let blank = ModerationForm {
            other_reason: String::new(),
            ..form
        };
        let err = blank.validate(ModerationKind::Warning).unwrap_err();
        assert!(err.validation().unwrap().get("other_reason").is_some());
    }

    #[test]
    fn test_ban_form_defaults_duration() {
        let form = ModerationForm::for_kind(ModerationKind::Ban);
        assert_eq!(form.duration, "3650");

        let blank = ModerationForm {
            duration: String::new(),
            reason: "Hate Speech".to_string(),
            message: "m".to_string(),
            ..Default::default()
        };
        assert_eq!(blank.validate(ModerationKind::Ban).unwrap().duration, 3650);
    }

    #[tokio::test]
    async fn test_add_warning_transition() {
        let api = FakeBackend::new();
        let mut roster = roster(vec![user("U1", UserStatus::Active, None)]);

        let log_id = roster
            .add_warning(&api, &session(), "U1", &request(7))
            .await
            .unwrap();

        let u1 = roster.get("U1").unwrap();
        assert_eq!(u1.status, UserStatus::Warned);
        assert_eq!(u1.warning_count, 1);
        assert_eq!(u1.moderation_log_id.as_deref(), Some(log_id.as_str()));
        assert!(u1.is_consistent());

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].body["type"], "warning");
        assert_eq!(calls[0].body["adminID"], "A1");
        assert_eq!(calls[0].body["userID"], "U1");
    }

    #[tokio::test]
    async fn test_ban_scenario() {
        let api = FakeBackend::new();
        let mut roster = roster(vec![user("U1", UserStatus::Active, None)]);

        let form = ModerationForm {
            duration: "30".to_string(),
            reason: "Scamming or Fraud".to_string(),
            other_reason: String::new(),
            message: "repeat offender".to_string(),
        };
        let request = form.validate(ModerationKind::Ban).unwrap();
        roster
            .ban_user(&api, &session(), "U1", &request)
            .await
            .unwrap();

        let creates = api.calls_to("/api/moderation/create-log");
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].body["type"], "ban");
        assert_eq!(creates[0].body["duration"], 30);
        assert_eq!(creates[0].body["reason"], "Scamming or Fraud");
        assert_eq!(creates[0].body["message"], "repeat offender");

        let u1 = roster.get("U1").unwrap();
        assert_eq!(u1.status, UserStatus::Banned);
        assert!(u1.moderation_log_id.is_some());
    }

    #[tokio::test]
    async fn test_activate_banned_user_calls_unban() {
        let api = FakeBackend::new();
        let mut roster = roster(vec![user("U1", UserStatus::Banned, Some("log-9"))]);

        let previous = roster.activate(&api, &session(), "U1").await.unwrap();
        assert_eq!(previous, UserStatus::Banned);

        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/api/moderation/unban");
        assert_eq!(calls[0].body["logID"], "log-9");
        assert!(api.calls_to("/api/moderation/unwarn").is_empty());

        let u1 = roster.get("U1").unwrap();
        assert_eq!(u1.status, UserStatus::Active);
        assert_eq!(u1.moderation_log_id, None);
    }

    #[tokio::test]
    async fn test_activate_warned_user_calls_unwarn() {
        let api = FakeBackend::new();
        let mut roster = roster(vec![user("U2", UserStatus::Warned, Some("log-3"))]);

        roster.activate(&api, &session(), "U2").await.unwrap();
        assert_eq!(api.calls_to("/api/moderation/unwarn").len(), 1);
        assert_eq!(roster.get("U2").unwrap().status, UserStatus::Active);
    }

    #[tokio::test]
    async fn test_remove_warning_floors_count() {
        let api = FakeBackend::new();
        let mut warned = user("U1", UserStatus::Warned, Some("log-1"));
        warned.warning_count = 0;
        let mut roster = roster(vec![warned]);

        roster
            .remove_warning(&api, &session(), "U1")
            .await
            .unwrap();

        let u1 = roster.get("U1").unwrap();
        assert_eq!(u1.warning_count, 0);
        assert_eq!(u1.status, UserStatus::Active);
        assert_eq!(u1.moderation_log_id, None);
    }

    #[tokio::test]
    async fn test_missing_credentials_block_every_action() {
        let mut no_admin = session();
        no_admin.admin_id = None;
        let mut no_token = session();
        no_token.access_token = None;

        for session in [no_admin, no_token] {
            let api = FakeBackend::new();
            let mut roster = roster(vec![
                user("U1", UserStatus::Active, None),
                user("U2", UserStatus::Warned, Some("log-2")),
                user("U3", UserStatus::Banned, Some("log-3")),
            ]);

            let results = [
                roster.add_warning(&api, &session, "U1", &request(1)).await.map(|_| ()),
                roster.ban_user(&api, &session, "U1", &request(1)).await.map(|_| ()),
                roster.remove_warning(&api, &session, "U2").await,
                roster.activate(&api, &session, "U3").await.map(|_| ()),
                roster.delete_user(&api, &session, "U1").await,
            ];
            for result in results {
                let err = result.unwrap_err();
                assert!(matches!(
                    err,
                    AdminError::MissingAdminId | AdminError::MissingToken
                ));
            }
            assert!(api.calls().is_empty());
            assert_eq!(roster.get("U3").unwrap().status, UserStatus::Banned);
            assert_eq!(roster.users().len(), 3);
        }
    }

    #[tokio::test]
    async fn test_remove_warning_without_log_id_is_an_error() {
        let api = FakeBackend::new();
        let mut roster = roster(vec![user("U1", UserStatus::Warned, None)]);

        let err = roster
            .remove_warning(&api, &session(), "U1")
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::MissingModerationLog { .. }));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_transitions_rejected_before_network() {
        let api = FakeBackend::new();
        let mut roster = roster(vec![
            user("U1", UserStatus::Active, None),
            user("U2", UserStatus::Warned, Some("log-2")),
            user("U3", UserStatus::Banned, Some("log-3")),
        ]);
        let session = session();

        assert!(matches!(
            roster.remove_warning(&api, &session, "U1").await,
            Err(AdminError::InvalidTransition { .. })
        ));
        assert!(matches!(
            roster.activate(&api, &session, "U1").await,
            Err(AdminError::InvalidTransition { .. })
        ));
        assert!(matches!(
            roster.add_warning(&api, &session, "U2", &request(1)).await,
            Err(AdminError::InvalidTransition { .. })
        ));
        assert!(matches!(
            roster.ban_user(&api, &session, "U3", &request(1)).await,
            Err(AdminError::InvalidTransition { .. })
        ));
        assert!(matches!(
            roster.add_warning(&api, &session, "U3", &request(1)).await,
            Err(AdminError::InvalidTransition { .. })
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_server_failure_leaves_state_untouched() {
        let api = FakeBackend::new();
        api.fail_next(500, "database unavailable");
        let mut roster = roster(vec![user("U1", UserStatus::Active, None)]);

        let err = roster
            .ban_user(&api, &session(), "U1", &request(30))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Server error (500): database unavailable");

        let u1 = roster.get("U1").unwrap();
        assert_eq!(u1.status, UserStatus::Active);
        assert_eq!(u1.moderation_log_id, None);
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one_row() {
        let api = FakeBackend::new();
        let mut roster = roster(vec![
            user("U1", UserStatus::Active, None),
            user("U2", UserStatus::Warned, Some("log-2")),
            user("U3", UserStatus::Active, None),
        ]);

        roster.delete_user(&api, &session(), "U2").await.unwrap();

        let ids: Vec<&str> = roster.users().iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["U1", "U3"]);
        assert_eq!(api.calls_to("/api/user/U2").len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_keeps_filter() {
        let api = FakeBackend::with_users(vec![
            user("U1", UserStatus::Active, None),
            user("U2", UserStatus::Banned, Some("log-2")),
        ]);
        let mut roster = UserRoster::default();
        let filter = UserFilter {
            status: Some(UserStatus::Banned),
            search: None,
        };

        roster.refresh(&api, &session(), filter.clone()).await.unwrap();
        assert_eq!(roster.users().len(), 1);
        assert_eq!(roster.filter(), &filter);
    }
}
