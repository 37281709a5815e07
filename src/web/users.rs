//! Traveler list, profiles and moderation forms

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;
use tracing::warn;

use super::admin::{ask_confirmation, reload_roster, render, require_auth, AdminState};
use super::layout::{action_button, badge, field_error, html_escape, options, Nav};
use crate::error::{AdminError, ValidationErrors};
use crate::models::{
    time, ModerationKind, User, UserFilter, UserStatus, MODERATION_REASONS, OTHER_REASON,
};
use crate::notifications::Notice;
use crate::workflows::{ConsoleAction, ModerationForm};

pub fn routes() -> Router<AdminState> {
    Router::new()
        .route("/users", get(users_page))
        .route("/users/:id", get(user_profile))
        .route("/users/:id/warn", get(warn_form).post(warn_submit))
        .route("/users/:id/ban", get(ban_form).post(ban_submit))
        .route("/users/:id/remove-warning", post(remove_warning))
        .route("/users/:id/activate", post(activate))
        .route("/users/:id/delete", post(delete))
}

#[derive(Debug, Default, Deserialize)]
struct UsersQuery {
    status: Option<String>,
    search: Option<String>,
}

impl UsersQuery {
    fn filter(&self) -> UserFilter {
        UserFilter {
            status: self.status.as_deref().and_then(UserStatus::parse),
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// Row actions the state machine allows from the user's current status
fn row_actions(user: &User) -> String {
    let id = urlencoding::encode(&user.id);
    let warn_link = format!(r#"<a class="btn warning" href="/admin/users/{}/warn">Warn</a>"#, id);
    let ban_link = format!(r#"<a class="btn danger" href="/admin/users/{}/ban">Ban</a>"#, id);
    let activate = action_button(&format!("/admin/users/{}/activate", id), "Activate", "");
    let delete = action_button(&format!("/admin/users/{}/delete", id), "Delete", "danger");

    match user.status {
        UserStatus::Active => format!("{}{}{}", warn_link, ban_link, delete),
        UserStatus::Warned => format!(
            "{}{}{}{}",
            action_button(
                &format!("/admin/users/{}/remove-warning", id),
                "Remove warning",
                "muted"
            ),
            ban_link,
            activate,
            delete
        ),
        UserStatus::Banned => format!("{}{}", activate, delete),
    }
}

/// GET /admin/users
async fn users_page(
    headers: HeaderMap,
    Query(query): Query<UsersQuery>,
    State(state): State<AdminState>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };
    let mut ws = authed.workspace.lock().await;

    let filter = query.filter();
    if let Err(e) = ws
        .roster
        .refresh(state.console.backend(), &authed.session, filter.clone())
        .await
    {
        warn!("Failed to load users: {}", e);
        ws.notices.push(Notice::from_error("Could not load users", &e));
    }

    let rows: String = ws
        .roster
        .users()
        .iter()
        .map(|user| {
            format!(
                r#"<tr><td><a href="/admin/users/{id}">{name}</a><div class="muted">@{username}</div></td><td>{email}</td><td>{status}</td><td>{warnings}</td><td>{actions}</td></tr>"#,
                id = urlencoding::encode(&user.id),
                name = html_escape(user.display_name()),
                username = html_escape(&user.username),
                email = html_escape(&user.email),
                status = badge(user.status.as_str(), user.status.as_str()),
                warnings = user.warning_count,
                actions = row_actions(user),
            )
        })
        .collect();
    let rows = if rows.is_empty() {
        r#"<tr><td colspan="5" class="muted">No users match these filters.</td></tr>"#.to_string()
    } else {
        rows
    };

    let selected = filter.status.map(|s| s.as_str()).unwrap_or("");
    let status_options = options(
        std::iter::once(("", "All statuses"))
            .chain(UserStatus::ALL.iter().map(|s| (s.as_str(), s.as_str()))),
        selected,
    );

    let body = format!(
        r#"<form class="filters" method="get" action="/admin/users">
    <input type="search" name="search" placeholder="Search name, username or email" value="{search}">
    <select name="status">{status_options}</select>
    <button type="submit" class="btn">Filter</button>
</form>
<table>
<tr><th>User</th><th>Email</th><th>Status</th><th>Warnings</th><th>Actions</th></tr>
{rows}
</table>"#,
        search = html_escape(filter.search.as_deref().unwrap_or("")),
        status_options = status_options,
        rows = rows,
    );

    render(&authed.session, &mut ws, "Users", Nav::Users, &body)
}

/// GET /admin/users/:id - Secure profile
async fn user_profile(
    headers: HeaderMap,
    Path(user_id): Path<String>,
    State(state): State<AdminState>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };
    let mut ws = authed.workspace.lock().await;

    let profile = match ws
        .roster
        .profile(state.console.backend(), &authed.session, &user_id)
        .await
    {
        Ok(profile) => profile,
        Err(e) => {
            warn!("Failed to load profile for {}: {}", user_id, e);
            ws.notices
                .push(Notice::from_error("Could not load profile", &e));
            drop(ws);
            return Redirect::to("/admin/users").into_response();
        }
    };

    let actions = ws.roster.get(&user_id).map(row_actions).unwrap_or_default();
    let body = format!(
        r#"<div class="card">
    <h3>{name}</h3>
    <table>
        <tr><th>User ID</th><td>{id}</td></tr>
        <tr><th>Username</th><td>{username}</td></tr>
        <tr><th>Email</th><td>{email}</td></tr>
        <tr><th>Phone</th><td>{phone}</td></tr>
        <tr><th>Status</th><td>{status}</td></tr>
        <tr><th>Warnings</th><td>{warnings}</td></tr>
        <tr><th>Moderation log</th><td>{log}</td></tr>
        <tr><th>Joined</th><td>{joined}</td></tr>
    </table>
    <p>{actions}</p>
</div>
<p><a href="/admin/users">&larr; Back to users</a></p>"#,
        name = html_escape(if profile.name.is_empty() {
            &profile.username
        } else {
            &profile.name
        }),
        id = html_escape(&profile.id),
        username = html_escape(&profile.username),
        email = html_escape(&profile.email),
        phone = html_escape(profile.phone.as_deref().unwrap_or("-")),
        status = badge(profile.status.as_str(), profile.status.as_str()),
        warnings = profile.warning_count,
        log = html_escape(profile.moderation_log_id.as_deref().unwrap_or("-")),
        joined = time::display(profile.created_at),
        actions = actions,
    );

    render(&authed.session, &mut ws, "User Profile", Nav::Users, &body)
}

fn moderation_form_html(
    user: &User,
    kind: ModerationKind,
    form: &ModerationForm,
    errors: Option<&ValidationErrors>,
) -> String {
    let reasons = options(
        std::iter::once(("", "Select a reason")).chain(MODERATION_REASONS.iter().map(|r| (*r, *r))),
        &form.reason,
    );
    let (verb, class) = match kind {
        ModerationKind::Warning => ("warn", "warning"),
        ModerationKind::Ban => ("ban", "danger"),
    };
    let duration_hint = match kind.default_duration() {
        Some(days) => format!("Leave empty for {} days", days),
        None => "Required".to_string(),
    };

    format!(
        r#"<div class="card narrow">
<p>{verb_title} <strong>{name}</strong> (<code>{id}</code>), currently {status}.</p>
<form method="post" action="/admin/users/{url_id}/{verb}">
    <label for="duration">Duration (days)</label>
    <input type="number" min="1" id="duration" name="duration" value="{duration}" placeholder="{hint}">
    {duration_error}
    <label for="reason">Reason</label>
    <select id="reason" name="reason">{reasons}</select>
    {reason_error}
    <label for="other_reason">If "{other}", describe the reason</label>
    <input type="text" id="other_reason" name="other_reason" value="{other_reason}">
    {other_error}
    <label for="message">Message to the user</label>
    <textarea id="message" name="message">{message}</textarea>
    {message_error}
    <p style="margin-top: 1.25rem;">
        <button type="submit" class="btn {class}">Continue</button>
        <a href="/admin/users" class="btn muted">Cancel</a>
    </p>
</form>
</div>"#,
        verb_title = if kind == ModerationKind::Ban { "Ban" } else { "Warn" },
        name = html_escape(user.display_name()),
        id = html_escape(&user.id),
        status = user.status,
        url_id = urlencoding::encode(&user.id),
        verb = verb,
        duration = html_escape(&form.duration),
        hint = duration_hint,
        duration_error = field_error(errors, "duration"),
        reasons = reasons,
        reason_error = field_error(errors, "reason"),
        other = OTHER_REASON,
        other_reason = html_escape(&form.other_reason),
        other_error = field_error(errors, "other_reason"),
        message = html_escape(&form.message),
        message_error = field_error(errors, "message"),
        class = class,
    )
}

async fn show_moderation_form(
    headers: HeaderMap,
    state: AdminState,
    user_id: String,
    kind: ModerationKind,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };
    let mut ws = authed.workspace.lock().await;
    if ws.roster.get(&user_id).is_none() {
        reload_roster(&state, &authed, &mut ws).await;
    }
    let Some(user) = ws.roster.get(&user_id).cloned() else {
        ws.notices.push(Notice::from_error(
            "Cannot moderate user",
            &AdminError::not_found("User", user_id),
        ));
        return Redirect::to("/admin/users").into_response();
    };

    let body = moderation_form_html(&user, kind, &ModerationForm::for_kind(kind), None);
    let title = if kind == ModerationKind::Ban { "Ban User" } else { "Warn User" };
    render(&authed.session, &mut ws, title, Nav::Users, &body)
}

async fn submit_moderation_form(
    headers: HeaderMap,
    state: AdminState,
    user_id: String,
    kind: ModerationKind,
    form: ModerationForm,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };

    let request = match form.validate(kind) {
        Ok(request) => request,
        Err(e) => {
            let mut ws = authed.workspace.lock().await;
            let Some(user) = ws.roster.get(&user_id).cloned() else {
                return Redirect::to("/admin/users").into_response();
            };
            let body = moderation_form_html(&user, kind, &form, e.validation());
            let title = if kind == ModerationKind::Ban { "Ban User" } else { "Warn User" };
            return render(&authed.session, &mut ws, title, Nav::Users, &body);
        }
    };

    let action = match kind {
        ModerationKind::Warning => ConsoleAction::AddWarning { user_id, request },
        ModerationKind::Ban => ConsoleAction::BanUser { user_id, request },
    };
    ask_confirmation(&state, &authed, action)
}

/// GET /admin/users/:id/warn
async fn warn_form(
    headers: HeaderMap,
    Path(user_id): Path<String>,
    State(state): State<AdminState>,
) -> Response {
    show_moderation_form(headers, state, user_id, ModerationKind::Warning).await
}

/// POST /admin/users/:id/warn
async fn warn_submit(
    headers: HeaderMap,
    Path(user_id): Path<String>,
    State(state): State<AdminState>,
    Form(form): Form<ModerationForm>,
) -> Response {
    submit_moderation_form(headers, state, user_id, ModerationKind::Warning, form).await
}

/// GET /admin/users/:id/ban
async fn ban_form(
    headers: HeaderMap,
    Path(user_id): Path<String>,
    State(state): State<AdminState>,
) -> Response {
    show_moderation_form(headers, state, user_id, ModerationKind::Ban).await
}

/// POST /admin/users/:id/ban
async fn ban_submit(
    headers: HeaderMap,
    Path(user_id): Path<String>,
    State(state): State<AdminState>,
    Form(form): Form<ModerationForm>,
) -> Response {
    submit_moderation_form(headers, state, user_id, ModerationKind::Ban, form).await
}

async fn confirm_user_action(
    headers: HeaderMap,
    state: AdminState,
    action: ConsoleAction,
) -> Response {
    match require_auth(&headers, &state).await {
        Ok(authed) => ask_confirmation(&state, &authed, action),
        Err(redirect) => redirect,
    }
}

/// POST /admin/users/:id/remove-warning
async fn remove_warning(
    headers: HeaderMap,
    Path(user_id): Path<String>,
    State(state): State<AdminState>,
) -> Response {
    confirm_user_action(headers, state, ConsoleAction::RemoveWarning { user_id }).await
}

/// POST /admin/users/:id/activate
async fn activate(
    headers: HeaderMap,
    Path(user_id): Path<String>,
    State(state): State<AdminState>,
) -> Response {
    confirm_user_action(headers, state, ConsoleAction::ActivateUser { user_id }).await
}

/// POST /admin/users/:id/delete
async fn delete(
    headers: HeaderMap,
    Path(user_id): Path<String>,
    State(state): State<AdminState>,
) -> Response {
    confirm_user_action(headers, state, ConsoleAction::DeleteUser { user_id }).await
}
