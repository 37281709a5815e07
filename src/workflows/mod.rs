//! Console workflows
//!
//! Each page of the console is backed by a workflow that owns its loaded
//! list and talks to the backend through the API traits. [`Console`] ties
//! them together: login, and running confirmed actions followed by an
//! activity log entry.

pub mod activity;
pub mod agencies;
pub mod alerts;
pub mod dashboard;
pub mod moderation;
pub mod profile;
pub mod revenue;
pub mod safety;

use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::Backend;
use crate::error::{AdminError, Result, ValidationErrors};
use crate::firebase::{ActivitySink, FirebaseClient};
use crate::models::{AgencyStatus, ApplicationStatus};
use crate::notifications::{Notice, NoticeKind, Notices};
use crate::session::AdminSession;

pub use activity::ActivityLogger;
pub use agencies::{AgencyDirectory, SampleDirectory};
pub use alerts::{AlertBoard, AlertDraft};
pub use dashboard::DashboardSummary;
pub use moderation::{ModerationForm, ModerationRequest, UserRoster};
pub use profile::PasswordForm;
pub use revenue::RevenueReport;
pub use safety::SafetyBoard;

/// Per-session state: what each page last loaded, plus pending notices
#[derive(Debug, Default)]
pub struct Workspace {
    pub roster: UserRoster,
    pub alerts: AlertBoard,
    pub safety: SafetyBoard,
    pub notices: Notices,
}

/// An action that only runs after the admin confirms it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    AddWarning {
        user_id: String,
        request: ModerationRequest,
    },
    RemoveWarning {
        user_id: String,
    },
    BanUser {
        user_id: String,
        request: ModerationRequest,
    },
    ActivateUser {
        user_id: String,
    },
    DeleteUser {
        user_id: String,
    },
    DeleteAlert {
        alert_id: String,
    },
    DeleteSafetyLog {
        log_id: String,
    },
    SetAgencyStatus {
        agency_id: String,
        status: AgencyStatus,
    },
    ReviewApplication {
        application_id: String,
        decision: ApplicationStatus,
    },
}

impl ConsoleAction {
    pub fn title(&self) -> &'static str {
        match self {
            ConsoleAction::AddWarning { .. } => "Add Warning",
            ConsoleAction::RemoveWarning { .. } => "Remove Warning",
            ConsoleAction::BanUser { .. } => "Ban User",
            ConsoleAction::ActivateUser { .. } => "Activate User",
            ConsoleAction::DeleteUser { .. } => "Delete User",
            ConsoleAction::DeleteAlert { .. } => "Delete Alert",
            ConsoleAction::DeleteSafetyLog { .. } => "Delete Emergency Log",
            ConsoleAction::SetAgencyStatus { .. } => "Change Agency Status",
            ConsoleAction::ReviewApplication { .. } => "Review Application",
        }
    }

    /// Text shown in the confirmation dialog
    pub fn description(&self) -> String {
        match self {
            ConsoleAction::AddWarning { user_id, request } => format!(
                "Warn user {} for {} day(s). Reason: {}. Message: \"{}\"",
                user_id, request.duration, request.reason, request.message
            ),
            ConsoleAction::RemoveWarning { user_id } => {
                format!("Remove the active warning from user {}.", user_id)
            }
            ConsoleAction::BanUser { user_id, request } => format!(
                "Ban user {} for {} day(s). Reason: {}. Message: \"{}\"",
                user_id, request.duration, request.reason, request.message
            ),
            ConsoleAction::ActivateUser { user_id } => {
                format!("Lift the current restriction on user {} and set them active.", user_id)
            }
            ConsoleAction::DeleteUser { user_id } => {
                format!("Permanently delete user {}. This cannot be undone.", user_id)
            }
            ConsoleAction::DeleteAlert { alert_id } => {
                format!("Delete alert {}. Recipients will no longer see it.", alert_id)
            }
            ConsoleAction::DeleteSafetyLog { log_id } => {
                format!("Delete emergency log {}.", log_id)
            }
            ConsoleAction::SetAgencyStatus { agency_id, status } => {
                format!("Set agency {} to {}.", agency_id, status)
            }
            ConsoleAction::ReviewApplication {
                application_id,
                decision,
            } => format!("Mark application {} as {}.", application_id, decision),
        }
    }

    pub fn kind(&self) -> NoticeKind {
        match self {
            ConsoleAction::DeleteUser { .. }
            | ConsoleAction::DeleteAlert { .. }
            | ConsoleAction::DeleteSafetyLog { .. }
            | ConsoleAction::BanUser { .. } => NoticeKind::Error,
            ConsoleAction::AddWarning { .. } => NoticeKind::Warning,
            _ => NoticeKind::Info,
        }
    }

    /// Page to go back to after confirming or cancelling
    pub fn return_path(&self) -> &'static str {
        match self {
            ConsoleAction::AddWarning { .. }
            | ConsoleAction::RemoveWarning { .. }
            | ConsoleAction::BanUser { .. }
            | ConsoleAction::ActivateUser { .. }
            | ConsoleAction::DeleteUser { .. } => "/admin/users",
            ConsoleAction::DeleteAlert { .. } => "/admin/alerts",
            ConsoleAction::DeleteSafetyLog { .. } => "/admin/safety",
            ConsoleAction::SetAgencyStatus { .. } => "/admin/agencies",
            ConsoleAction::ReviewApplication { .. } => "/admin/applications",
        }
    }
}

/// Everything a request handler needs to act on the backend
pub struct Console {
    backend: Arc<dyn Backend>,
    activity: ActivityLogger,
    directory: Arc<dyn AgencyDirectory>,
    firebase: Option<FirebaseClient>,
}

impl Console {
    pub fn new<B: Backend + 'static>(backend: Arc<B>, firebase: Option<FirebaseClient>) -> Self {
        let sink = firebase
            .clone()
            .map(|client| Arc::new(client) as Arc<dyn ActivitySink>);
        Self {
            activity: ActivityLogger::new(backend.clone(), sink),
            backend,
            directory: Arc::new(SampleDirectory),
            firebase,
        }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn directory(&self) -> &dyn AgencyDirectory {
        self.directory.as_ref()
    }

    pub fn activity(&self) -> &ActivityLogger {
        &self.activity
    }

    /// Authenticate an admin and build their session
    pub async fn login(&self, email: &str, password: &str, ttl_secs: u64) -> Result<AdminSession> {
        let mut errors = ValidationErrors::new();
        if email.trim().is_empty() {
            errors.add("email", "Email is required");
        }
        if password.is_empty() {
            errors.add("password", "Password is required");
        }
        errors.into_result()?;

        let email = email.trim();
        let response = self.backend.login(email, password).await?;
        let profile = match self.backend.fetch_profile(&response.access_token).await {
            Ok(profile) => profile,
            Err(e) => match response.user {
                Some(profile) => {
                    warn!("Profile fetch failed, using login response: {}", e);
                    profile
                }
                None => return Err(e),
            },
        };

        if !profile.is_admin() {
            warn!("Login refused for {} (role '{}')", email, profile.role);
            return Err(AdminError::AccessDenied {
                message: "this account is not an administrator".to_string(),
            });
        }

        let mut session = AdminSession::new(response.access_token, Some(profile), ttl_secs);

        if let Some(firebase) = &self.firebase {
            match firebase.sign_in(email, password).await {
                Ok(firebase_session) => session.firebase = Some(firebase_session),
                Err(e) => warn!("Firebase sign-in failed, activity goes to REST only: {}", e),
            }
        }

        info!("Admin {} logged in", session.admin_name());
        self.activity.record(&session, "Logged in", email).await;
        Ok(session)
    }

    /// Run a confirmed action; the activity log is written only on success
    pub async fn execute(
        &self,
        session: &AdminSession,
        workspace: &mut Workspace,
        action: ConsoleAction,
    ) -> Result<Notice> {
        let backend = self.backend.as_ref();

        let (activity, details, notice) = match &action {
            ConsoleAction::AddWarning { user_id, request } => {
                let log_id = workspace
                    .roster
                    .add_warning(backend, session, user_id, request)
                    .await?;
                (
                    "Warned user",
                    format!("{} for {} day(s): {} (log {})", user_id, request.duration, request.reason, log_id),
                    Notice::success("Warning added", format!("User {} has been warned.", user_id)),
                )
            }
            ConsoleAction::RemoveWarning { user_id } => {
                workspace.roster.remove_warning(backend, session, user_id).await?;
                (
                    "Removed warning",
                    user_id.clone(),
                    Notice::success("Warning removed", format!("User {} is active again.", user_id)),
                )
            }
            ConsoleAction::BanUser { user_id, request } => {
                let log_id = workspace
                    .roster
                    .ban_user(backend, session, user_id, request)
                    .await?;
                (
                    "Banned user",
                    format!("{} for {} day(s): {} (log {})", user_id, request.duration, request.reason, log_id),
                    Notice::success("User banned", format!("User {} has been banned.", user_id)),
                )
            }
            ConsoleAction::ActivateUser { user_id } => {
                let previous = workspace.roster.activate(backend, session, user_id).await?;
                (
                    "Activated user",
                    format!("{} (was {})", user_id, previous),
                    Notice::success("User activated", format!("User {} is active again.", user_id)),
                )
            }
            ConsoleAction::DeleteUser { user_id } => {
                workspace.roster.delete_user(backend, session, user_id).await?;
                (
                    "Deleted user",
                    user_id.clone(),
                    Notice::success("User deleted", format!("User {} was deleted.", user_id)),
                )
            }
            ConsoleAction::DeleteAlert { alert_id } => {
                let alert = workspace.alerts.delete(backend, session, alert_id).await?;
                (
                    "Deleted alert",
                    format!("{} ({})", alert.title, alert_id),
                    Notice::success("Alert deleted", format!("\"{}\" was deleted.", alert.title)),
                )
            }
            ConsoleAction::DeleteSafetyLog { log_id } => {
                workspace.safety.delete(backend, session, log_id).await?;
                (
                    "Deleted emergency log",
                    log_id.clone(),
                    Notice::success("Log deleted", format!("Emergency log {} was deleted.", log_id)),
                )
            }
            ConsoleAction::SetAgencyStatus { agency_id, status } => {
                session.token()?;
                let agency = agencies::set_agency_status(self.directory(), agency_id, *status)?;
                (
                    "Changed agency status",
                    format!("{} ({}): {} -> {}", agency.name, agency_id, agency.status, status),
                    Notice::success("Agency updated", format!("{} set to {}.", agency.name, status)),
                )
            }
            ConsoleAction::ReviewApplication {
                application_id,
                decision,
            } => {
                session.token()?;
                let application =
                    agencies::review_application(self.directory(), application_id, *decision)?;
                (
                    "Reviewed application",
                    format!("{} ({}): {}", application.agency_name, application_id, decision),
                    Notice::success(
                        "Application reviewed",
                        format!("{} marked {}.", application.agency_name, decision),
                    ),
                )
            }
        };

        self.activity.record(session, activity, &details).await;
        Ok(notice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{admin_profile, user, FakeBackend};
    use crate::backend::mock::MockServer;
    use crate::config::FirebaseConfig;
    use crate::models::UserStatus;

    fn session() -> AdminSession {
        AdminSession::new("tok".to_string(), Some(admin_profile()), 3600)
    }

    fn ban_request() -> ModerationRequest {
        ModerationRequest {
            duration: 30,
            reason: "Scamming or Fraud".to_string(),
            message: "repeat offender".to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_builds_session() {
        let backend = Arc::new(FakeBackend::new());
        let console = Console::new(backend.clone(), None);

        let session = console.login("root@tarag.ph", "secret", 60).await.unwrap();
        assert_eq!(session.admin_id.as_deref(), Some("A1"));
        assert_eq!(session.token().unwrap(), "token-1");
        assert_eq!(backend.activity.lock()[0].action, "Logged in");
    }

    #[tokio::test]
    async fn test_login_validation_skips_network() {
        let backend = Arc::new(FakeBackend::new());
        let console = Console::new(backend.clone(), None);

        let err = console.login(" ", "", 60).await.unwrap_err();
        assert!(err.validation().is_some());
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_login_survives_firebase_failure() {
        let server = MockServer::start().await;
        let firebase = FirebaseClient::new(&FirebaseConfig {
            api_key: "k".to_string(),
            project_id: "p".to_string(),
        })
        .with_endpoint(&server.url());
        let console = Console::new(Arc::new(FakeBackend::new()), Some(firebase));

        let session = console.login("root@tarag.ph", "secret", 60).await.unwrap();
        assert!(session.firebase.is_none());
    }

    #[tokio::test]
    async fn test_execute_records_activity_after_success() {
        let backend = Arc::new(FakeBackend::with_users(vec![user(
            "U1",
            UserStatus::Active,
            None,
        )]));
        let console = Console::new(backend.clone(), None);
        let mut workspace = Workspace::default();
        workspace
            .roster
            .refresh(backend.as_ref(), &session(), Default::default())
            .await
            .unwrap();

        let action = ConsoleAction::BanUser {
            user_id: "U1".to_string(),
            request: ban_request(),
        };
        let notice = console
            .execute(&session(), &mut workspace, action)
            .await
            .unwrap();

        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(workspace.roster.get("U1").unwrap().status, UserStatus::Banned);
        let activity = backend.activity.lock();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].action, "Banned user");
        assert_eq!(activity[0].admin_id, "A1");
    }

    #[tokio::test]
    async fn test_failed_action_is_not_logged() {
        let backend = Arc::new(FakeBackend::with_users(vec![user(
            "U1",
            UserStatus::Active,
            None,
        )]));
        let console = Console::new(backend.clone(), None);
        let mut workspace = Workspace::default();
        workspace
            .roster
            .refresh(backend.as_ref(), &session(), Default::default())
            .await
            .unwrap();

        let action = ConsoleAction::ActivateUser {
            user_id: "U1".to_string(),
        };
        let err = console
            .execute(&session(), &mut workspace, action)
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidTransition { .. }));
        assert!(backend.activity.lock().is_empty());
    }

    #[tokio::test]
    async fn test_agency_actions_only_log() {
        let backend = Arc::new(FakeBackend::new());
        let console = Console::new(backend.clone(), None);
        let mut workspace = Workspace::default();

        let action = ConsoleAction::ReviewApplication {
            application_id: "APP-101".to_string(),
            decision: ApplicationStatus::Approved,
        };
        console
            .execute(&session(), &mut workspace, action)
            .await
            .unwrap();

        assert!(backend.primary_calls().is_empty());
        assert_eq!(backend.activity.lock()[0].action, "Reviewed application");
    }

    #[test]
    fn test_action_routing() {
        let action = ConsoleAction::DeleteAlert {
            alert_id: "a1".to_string(),
        };
        assert_eq!(action.return_path(), "/admin/alerts");
        assert_eq!(action.kind(), NoticeKind::Error);
        assert!(action.description().contains("a1"));
    }
}
