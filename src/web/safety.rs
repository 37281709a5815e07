//! Emergency log monitoring page

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::warn;

use super::admin::{ask_confirmation, render, require_auth, AdminState};
use super::layout::{action_button, badge, html_escape, options, Nav};
use crate::backend::SafetyFilter;
use crate::models::time;
use crate::notifications::Notice;
use crate::workflows::safety::EMERGENCY_TYPES;
use crate::workflows::ConsoleAction;

const LOG_STATUSES: &[&str] = &["pending", "responding", "resolved"];

pub fn routes() -> Router<AdminState> {
    Router::new()
        .route("/safety", get(safety_page))
        .route("/safety/:id/delete", post(delete_log))
}

#[derive(Debug, Default, Deserialize)]
struct SafetyQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    status: Option<String>,
}

impl From<SafetyQuery> for SafetyFilter {
    fn from(query: SafetyQuery) -> Self {
        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        SafetyFilter {
            kind: non_blank(query.kind),
            status: non_blank(query.status),
        }
    }
}

/// GET /admin/safety
async fn safety_page(
    headers: HeaderMap,
    Query(query): Query<SafetyQuery>,
    State(state): State<AdminState>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };
    let mut ws = authed.workspace.lock().await;

    let filter = SafetyFilter::from(query);
    if let Err(e) = ws
        .safety
        .refresh(state.console.backend(), &authed.session, filter.clone())
        .await
    {
        warn!("Failed to load emergency logs: {}", e);
        ws.notices
            .push(Notice::from_error("Could not load emergency logs", &e));
    }

    let rows: String = ws
        .safety
        .logs()
        .iter()
        .map(|log| {
            format!(
                r#"<tr><td>{when}</td><td>{user}<div class="muted">{user_id}</div></td><td>{kind}</td><td>{message}</td><td>{location}</td><td>{status}</td><td>{delete}</td></tr>"#,
                when = time::display(log.timestamp),
                user = html_escape(&log.user_name),
                user_id = html_escape(&log.user_id),
                kind = html_escape(&log.kind.replace('_', " ")),
                message = html_escape(&log.message),
                location = html_escape(&log.location),
                status = badge(&log.status, &log.status),
                delete = action_button(
                    &format!("/admin/safety/{}/delete", urlencoding::encode(&log.id)),
                    "Delete",
                    "danger"
                ),
            )
        })
        .collect();
    let rows = if rows.is_empty() {
        r#"<tr><td colspan="7" class="muted">No emergency logs.</td></tr>"#.to_string()
    } else {
        rows
    };

    let type_options = options(
        std::iter::once(("", "All types")).chain(EMERGENCY_TYPES.iter().map(|t| (*t, *t))),
        filter.kind.as_deref().unwrap_or(""),
    );
    let status_options = options(
        std::iter::once(("", "All statuses")).chain(LOG_STATUSES.iter().map(|s| (*s, *s))),
        filter.status.as_deref().unwrap_or(""),
    );

    let body = format!(
        r#"<form class="filters" method="get" action="/admin/safety">
    <select name="type">{}</select>
    <select name="status">{}</select>
    <button type="submit" class="btn">Filter</button>
</form>
<table>
<tr><th>When</th><th>User</th><th>Type</th><th>Message</th><th>Location</th><th>Status</th><th></th></tr>
{}
</table>"#,
        type_options, status_options, rows
    );
    render(&authed.session, &mut ws, "Emergency Logs", Nav::Safety, &body)
}

/// POST /admin/safety/:id/delete
async fn delete_log(
    headers: HeaderMap,
    Path(log_id): Path<String>,
    State(state): State<AdminState>,
) -> Response {
    match require_auth(&headers, &state).await {
        Ok(authed) => ask_confirmation(&state, &authed, ConsoleAction::DeleteSafetyLog { log_id }),
        Err(redirect) => redirect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_filters_are_dropped() {
        let filter = SafetyFilter::from(SafetyQuery {
            kind: Some("medical".to_string()),
            status: Some(" ".to_string()),
        });
        assert_eq!(filter.kind.as_deref(), Some("medical"));
        assert_eq!(filter.status, None);
    }
}
