//! Admin profile and password settings

use serde::Deserialize;
use tracing::info;

use crate::backend::{AuthApi, ChangePasswordRequest};
use crate::error::{Result, ValidationErrors};
use crate::models::AdminProfile;
use crate::session::AdminSession;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl PasswordForm {
    pub fn validate(&self) -> Result<ChangePasswordRequest> {
        let mut errors = ValidationErrors::new();

        if self.current_password.is_empty() {
            errors.add("current_password", "Current password is required");
        }
        if self.new_password.chars().count() < MIN_PASSWORD_LEN {
            errors.add(
                "new_password",
                format!("New password must be at least {} characters", MIN_PASSWORD_LEN),
            );
        } else if self.new_password == self.current_password {
            errors.add("new_password", "New password must differ from the current one");
        }
        if self.confirm_password != self.new_password {
            errors.add("confirm_password", "Passwords do not match");
        }

        errors.into_result()?;
        Ok(ChangePasswordRequest {
            current_password: self.current_password.clone(),
            new_password: self.new_password.clone(),
        })
    }
}

pub async fn fetch_profile<A: AuthApi + ?Sized>(
    api: &A,
    session: &AdminSession,
) -> Result<AdminProfile> {
    api.fetch_profile(session.token()?).await
}

pub async fn change_password<A: AuthApi + ?Sized>(
    api: &A,
    session: &AdminSession,
    form: &PasswordForm,
) -> Result<()> {
    let request = form.validate()?;
    api.change_password(session.token()?, &request).await?;
    info!("Password changed for admin {}", session.admin_name());
    Ok(())
}
