//! Console login and logout
//!
//! Admins sign in with their TaraG email and password. The backend token,
//! admin id and profile end up in an [`AdminSession`](crate::session::AdminSession);
//! the browser only holds an opaque cookie pointing at it.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use super::admin::AdminState;
use super::layout::{bare_page, field_error, html_escape};
use crate::error::{AdminError, ValidationErrors};
use crate::models::Theme;

pub const SESSION_COOKIE: &str = "tarag_admin";

/// Extract session token from cookies
pub fn get_session_token(headers: &HeaderMap) -> Option<String> {
    let prefix = format!("{}=", SESSION_COOKIE);
    headers
        .get(axum::http::header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(prefix.as_str())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        })
}

/// Create a session cookie
pub fn create_session_cookie(token: &str, max_age_secs: u64) -> String {
    format!(
        "{}={}; Path=/admin; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age_secs
    )
}

/// Create a logout cookie (clears the session)
pub fn create_logout_cookie() -> String {
    format!("{}=; Path=/admin; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login page HTML, optionally with the previous attempt's errors
pub fn login_page(email: &str, error: Option<&AdminError>) -> String {
    let errors: Option<&ValidationErrors> = error.and_then(AdminError::validation);
    let banner = match error {
        Some(e) if errors.is_none() => {
            format!(r#"<div class="notice error">{}</div>"#, html_escape(&e.to_string()))
        }
        _ => String::new(),
    };

    let body = format!(
        r#"<h2>TaraG Admin</h2>
<p class="muted">Sign in with your administrator account</p>
{banner}
<form method="post" action="/admin/login">
    <label for="email">Email</label>
    <input type="email" id="email" name="email" value="{email}" autofocus>
    {email_error}
    <label for="password">Password</label>
    <input type="password" id="password" name="password">
    {password_error}
    <p style="margin-top: 1.25rem;"><button type="submit" class="btn">Log in</button></p>
</form>"#,
        banner = banner,
        email = html_escape(email),
        email_error = field_error(errors, "email"),
        password_error = field_error(errors, "password"),
    );
    bare_page("Login", Theme::default(), &body)
}

/// GET /admin/login
pub async fn login(headers: HeaderMap, State(state): State<AdminState>) -> Response {
    if let Some(token) = get_session_token(&headers) {
        if state.session_store.get_session(&token).await.is_some() {
            return Redirect::to("/admin").into_response();
        }
    }
    Html(login_page("", None)).into_response()
}

/// POST /admin/login
pub async fn login_submit(
    State(state): State<AdminState>,
    Form(form): Form<LoginForm>,
) -> Response {
    let session = match state
        .console
        .login(&form.email, &form.password, state.session_ttl_secs)
        .await
    {
        Ok(session) => session,
        Err(e) => {
            let status = match e {
                AdminError::Validation(_) => StatusCode::OK,
                AdminError::AccessDenied { .. } => StatusCode::FORBIDDEN,
                _ => StatusCode::UNAUTHORIZED,
            };
            warn!("Login failed for '{}': {}", form.email.trim(), e);
            return (status, Html(login_page(&form.email, Some(&e)))).into_response();
        }
    };

    let now = chrono::Utc::now().timestamp().max(0) as u64;
    let max_age = session.expires_at.saturating_sub(now);
    let token = state.session_store.create_session(session).await;
    info!("Created console session");

    (
        [(SET_COOKIE, create_session_cookie(&token, max_age))],
        Redirect::to("/admin"),
    )
        .into_response()
}

/// GET /admin/logout - Clear session and redirect to login
pub async fn logout(headers: HeaderMap, State(state): State<AdminState>) -> impl IntoResponse {
    if let Some(token) = get_session_token(&headers) {
        if let Some(session) = state.session_store.remove_session(&token).await {
            info!("Admin {} logged out", session.admin_name());
        }
        state.confirmations.clear_session(&token);
    }

    (
        [(SET_COOKIE, create_logout_cookie())],
        Redirect::to("/admin/login"),
    )
}
