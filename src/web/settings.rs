//! Profile, password and theme settings

use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use tracing::warn;

use super::admin::{render, require_auth, AdminState, Authed};
use super::layout::{field_error, html_escape, Nav};
use crate::error::ValidationErrors;
use crate::models::AdminProfile;
use crate::notifications::Notice;
use crate::workflows::profile::{self, MIN_PASSWORD_LEN};
use crate::workflows::PasswordForm;

pub fn routes() -> Router<AdminState> {
    Router::new()
        .route("/settings", get(settings_page))
        .route("/settings/password", post(change_password))
        .route("/settings/theme", post(toggle_theme))
}

fn profile_html(profile: Option<&AdminProfile>) -> String {
    match profile {
        Some(p) => format!(
            r#"<table>
    <tr><th>Name</th><td>{}</td></tr>
    <tr><th>Username</th><td>{}</td></tr>
    <tr><th>Email</th><td>{}</td></tr>
    <tr><th>Role</th><td>{}</td></tr>
    <tr><th>Admin ID</th><td>{}</td></tr>
</table>"#,
            html_escape(&p.display_name()),
            html_escape(&p.username),
            html_escape(&p.email),
            html_escape(&p.role),
            html_escape(&p.id)
        ),
        None => r#"<p class="muted">Profile unavailable.</p>"#.to_string(),
    }
}

fn settings_body(
    authed: &Authed,
    profile: Option<&AdminProfile>,
    errors: Option<&ValidationErrors>,
) -> String {
    let next_theme = authed.session.theme.toggled();
    format!(
        r#"<div class="card">
    <h3>Profile</h3>
    {profile}
</div>
<div class="card">
    <h3>Change password</h3>
    <form method="post" action="/admin/settings/password">
        <label for="current_password">Current password</label>
        <input type="password" id="current_password" name="current_password">
        {current_error}
        <label for="new_password">New password (at least {min} characters)</label>
        <input type="password" id="new_password" name="new_password">
        {new_error}
        <label for="confirm_password">Confirm new password</label>
        <input type="password" id="confirm_password" name="confirm_password">
        {confirm_error}
        <p style="margin-top: 1.25rem;"><button type="submit" class="btn">Update password</button></p>
    </form>
</div>
<div class="card">
    <h3>Appearance</h3>
    <p class="muted">Current theme: {theme}</p>
    <form method="post" action="/admin/settings/theme"><button type="submit" class="btn muted">Switch to {next} theme</button></form>
</div>"#,
        profile = profile_html(profile),
        current_error = field_error(errors, "current_password"),
        min = MIN_PASSWORD_LEN,
        new_error = field_error(errors, "new_password"),
        confirm_error = field_error(errors, "confirm_password"),
        theme = authed.session.theme.as_str(),
        next = next_theme.as_str(),
    )
}

/// Fresh profile from the backend, falling back to the one cached at login
async fn load_profile(state: &AdminState, authed: &Authed) -> Option<AdminProfile> {
    match profile::fetch_profile(state.console.backend(), &authed.session).await {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!("Failed to fetch admin profile: {}", e);
            authed.notify(Notice::from_error("Could not load profile", &e)).await;
            authed.session.profile.clone()
        }
    }
}

/// GET /admin/settings
async fn settings_page(headers: HeaderMap, State(state): State<AdminState>) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };
    let profile = load_profile(&state, &authed).await;
    let body = settings_body(&authed, profile.as_ref(), None);

    let mut ws = authed.workspace.lock().await;
    render(&authed.session, &mut ws, "Settings", Nav::Settings, &body)
}

/// POST /admin/settings/password
async fn change_password(
    headers: HeaderMap,
    State(state): State<AdminState>,
    Form(form): Form<PasswordForm>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };

    match profile::change_password(state.console.backend(), &authed.session, &form).await {
        Ok(()) => {
            authed
                .notify(Notice::success("Password changed", "Your password has been updated."))
                .await;
            state
                .console
                .activity()
                .record(&authed.session, "Changed password", "")
                .await;
            Redirect::to("/admin/settings").into_response()
        }
        Err(e) => {
            if e.validation().is_none() {
                warn!("Password change failed: {}", e);
                authed
                    .notify(Notice::from_error("Could not change password", &e))
                    .await;
            }
            let body = settings_body(&authed, authed.session.profile.as_ref(), e.validation());
            let mut ws = authed.workspace.lock().await;
            render(&authed.session, &mut ws, "Settings", Nav::Settings, &body)
        }
    }
}

/// POST /admin/settings/theme
async fn toggle_theme(headers: HeaderMap, State(state): State<AdminState>) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };
    state
        .session_store
        .update_session(&authed.token, |session| {
            session.theme = session.theme.toggled();
        })
        .await;
    Redirect::to("/admin/settings").into_response()
}
