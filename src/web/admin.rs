//! Admin console routes and shared handler plumbing
//!
//! Provides:
//! - The dashboard with platform counters
//! - The confirmation step every destructive action goes through
//! - The admin activity trail
//! - Live server logs (page + SSE stream)
//!
//! Page-specific handlers live in the sibling modules and are merged here.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse, Redirect, Response,
    },
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{warn, Level};
use uuid::Uuid;

use super::auth::{self, get_session_token};
use super::layout::{badge, html_escape, page, Nav};
use super::{agencies, alerts, revenue, safety, settings, users};
use crate::logging::SharedLogBuffer;
use crate::models::{time, AlertStatus, UserFilter};
use crate::notifications::{ConfirmationQueue, Notice, NoticeKind};
use crate::session::{AdminSession, SharedSessionStore};
use crate::workflows::{Console, ConsoleAction, DashboardSummary, RevenueReport, Workspace};

/// Shared state for every console handler
#[derive(Clone)]
pub struct AdminState {
    pub console: Arc<Console>,
    pub session_store: SharedSessionStore,
    pub confirmations: Arc<ConfirmationQueue<ConsoleAction>>,
    pub log_buffer: SharedLogBuffer,
    pub session_ttl_secs: u64,
}

/// Create admin router
pub fn admin_router(state: AdminState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/login", get(auth::login).post(auth::login_submit))
        .route("/logout", get(auth::logout))
        .route("/confirm/:id", get(confirm_page).post(confirm_action))
        .route("/confirm/:id/cancel", post(cancel_action))
        .route("/activity", get(activity_page))
        .route("/logs", get(logs_page))
        .route("/logs/stream", get(logs_stream))
        .merge(users::routes())
        .merge(alerts::routes())
        .merge(safety::routes())
        .merge(agencies::routes())
        .merge(revenue::routes())
        .merge(settings::routes())
        .with_state(state)
}

/// An authenticated request: cookie token, session snapshot and workspace
pub struct Authed {
    pub token: String,
    pub session: AdminSession,
    pub workspace: Arc<Mutex<Workspace>>,
}

impl Authed {
    /// Queue a notice for the next rendered page
    pub async fn notify(&self, notice: Notice) {
        self.workspace.lock().await.notices.push(notice);
    }
}

/// Check authentication and return the session or a redirect to login
pub async fn require_auth(headers: &HeaderMap, state: &AdminState) -> Result<Authed, Response> {
    let token =
        get_session_token(headers).ok_or_else(|| Redirect::to("/admin/login").into_response())?;

    let (session, workspace) = state
        .session_store
        .get_with_workspace(&token)
        .await
        .ok_or_else(|| Redirect::to("/admin/login").into_response())?;

    Ok(Authed {
        token,
        session,
        workspace,
    })
}

/// Render a console page, draining the workspace's pending notices into it
pub fn render(
    session: &AdminSession,
    workspace: &mut Workspace,
    title: &str,
    nav: Nav,
    body: &str,
) -> Response {
    let notices = workspace.notices.drain();
    Html(page(title, nav, session, &notices, body)).into_response()
}

/// Park a destructive action and send the admin to its confirmation dialog
pub fn ask_confirmation(state: &AdminState, authed: &Authed, action: ConsoleAction) -> Response {
    let id = state.confirmations.request(
        &authed.token,
        action.title(),
        action.description(),
        action.kind(),
        action,
    );
    Redirect::to(&format!("/admin/confirm/{}", id)).into_response()
}

/// GET /admin - Dashboard
async fn dashboard(headers: HeaderMap, State(state): State<AdminState>) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };
    let console = &state.console;
    let session = &authed.session;
    let mut ws = authed.workspace.lock().await;

    let now = Utc::now();
    let backend = console.backend();
    let user_filter = ws.roster.filter().clone();
    let safety_filter = ws.safety.filter().clone();
    let loads = [
        ("users", ws.roster.refresh(backend, session, user_filter).await),
        ("alerts", ws.alerts.refresh(backend, session, now).await),
        ("emergencies", ws.safety.refresh(backend, session, safety_filter).await),
    ];
    for (what, result) in loads {
        if let Err(e) = result {
            warn!("Dashboard could not load {}: {}", what, e);
            ws.notices
                .push(Notice::from_error(format!("Could not load {}", what), &e));
        }
    }

    let directory = console.directory();
    let revenue = RevenueReport::sample();
    let summary = DashboardSummary::build(
        ws.roster.users(),
        ws.alerts.alerts(),
        ws.safety.logs(),
        &directory.agencies(),
        &directory.applications(),
        &revenue,
    );

    let card = |label: &str, value: String, href: &str| {
        format!(
            r#"<a class="card stat" href="{}"><div class="value">{}</div><div class="label">{}</div></a>"#,
            href, value, label
        )
    };
    let growth = summary
        .revenue_growth
        .map(|g| format!("{:+.1}% vs last month", g))
        .unwrap_or_else(|| "no previous month".to_string());

    let cards = [
        card("Travelers", summary.total_users.to_string(), "/admin/users"),
        card("Warned", summary.warned_users.to_string(), "/admin/users?status=warned"),
        card("Banned", summary.banned_users.to_string(), "/admin/users?status=banned"),
        card(
            "Active alerts",
            format!("{} / {}", summary.active_alerts, summary.total_alerts),
            "/admin/alerts",
        ),
        card("Open emergencies", summary.open_emergencies.to_string(), "/admin/safety"),
        card(
            "Agencies (active / pending)",
            format!("{} / {}", summary.agencies.active, summary.agencies.pending),
            "/admin/agencies",
        ),
        card(
            "Open applications",
            summary.open_applications.to_string(),
            "/admin/applications",
        ),
        card(
            &html_escape(&growth),
            crate::workflows::revenue::format_peso(summary.total_revenue),
            "/admin/revenue",
        ),
    ]
    .join("\n");

    let active_alerts: Vec<String> = ws
        .alerts
        .alerts()
        .iter()
        .filter(|a| a.status == AlertStatus::Active)
        .take(5)
        .map(|a| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                html_escape(&a.title),
                badge(a.severity.as_str(), a.severity.as_str()),
                time::display(a.end_on)
            )
        })
        .collect();
    let alerts_html = if active_alerts.is_empty() {
        r#"<p class="muted">No active alerts.</p>"#.to_string()
    } else {
        format!(
            "<table><tr><th>Title</th><th>Severity</th><th>Ends</th></tr>{}</table>",
            active_alerts.join("")
        )
    };

    let body = format!(
        r#"<p class="muted">Welcome back, {}.</p>
<div class="cards">{}</div>
<h3>Active alerts</h3>
{}"#,
        html_escape(&session.admin_name()),
        cards,
        alerts_html
    );

    render(session, &mut ws, "Dashboard", Nav::Dashboard, &body)
}

fn parse_confirmation_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

/// GET /admin/confirm/:id - Confirmation dialog
async fn confirm_page(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AdminState>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };

    let pending = parse_confirmation_id(&id)
        .and_then(|id| state.confirmations.peek(id, &authed.token));
    let Some(pending) = pending else {
        authed
            .notify(Notice::new(
                NoticeKind::Warning,
                "Nothing to confirm",
                "That confirmation has expired or was already handled.",
            ))
            .await;
        return Redirect::to("/admin").into_response();
    };

    let button_class = match pending.kind {
        NoticeKind::Error => "danger",
        NoticeKind::Warning => "warning",
        _ => "",
    };
    let body = format!(
        r#"<div class="card narrow">
    <h3>{title}</h3>
    <p>{message}</p>
    <p style="margin-top: 1.25rem;">
        <form method="post" action="/admin/confirm/{id}" class="inline"><button type="submit" class="btn {class}">Confirm</button></form>
        <form method="post" action="/admin/confirm/{id}/cancel" class="inline"><button type="submit" class="btn muted">Cancel</button></form>
    </p>
</div>"#,
        title = html_escape(&pending.title),
        message = html_escape(&pending.message),
        id = pending.id,
        class = button_class,
    );

    let nav = nav_for(pending.action.return_path());
    let mut ws = authed.workspace.lock().await;
    render(&authed.session, &mut ws, "Please confirm", nav, &body)
}

/// POST /admin/confirm/:id - Run the confirmed action
async fn confirm_action(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AdminState>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };

    let action = parse_confirmation_id(&id)
        .and_then(|id| state.confirmations.confirm(id, &authed.token));
    let Some(action) = action else {
        authed
            .notify(Notice::new(
                NoticeKind::Warning,
                "Nothing to confirm",
                "That confirmation has expired or was already handled.",
            ))
            .await;
        return Redirect::to("/admin").into_response();
    };

    let title = action.title();
    let return_path = action.return_path();
    let mut ws = authed.workspace.lock().await;
    let notice = match state.console.execute(&authed.session, &mut ws, action).await {
        Ok(notice) => notice,
        Err(e) => {
            warn!("{} failed: {}", title, e);
            Notice::from_error(format!("{} failed", title), &e)
        }
    };
    ws.notices.push(notice);

    Redirect::to(return_path).into_response()
}

/// POST /admin/confirm/:id/cancel
async fn cancel_action(
    headers: HeaderMap,
    Path(id): Path<String>,
    State(state): State<AdminState>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };

    let return_path = parse_confirmation_id(&id)
        .and_then(|id| {
            let pending = state.confirmations.peek(id, &authed.token)?;
            state.confirmations.cancel(id, &authed.token);
            Some(pending.action.return_path())
        })
        .unwrap_or("/admin");

    authed
        .notify(Notice::new(NoticeKind::Info, "Cancelled", "No changes were made."))
        .await;
    Redirect::to(return_path).into_response()
}

fn nav_for(path: &str) -> Nav {
    match path {
        "/admin/users" => Nav::Users,
        "/admin/alerts" => Nav::Alerts,
        "/admin/safety" => Nav::Safety,
        "/admin/agencies" => Nav::Agencies,
        "/admin/applications" => Nav::Applications,
        _ => Nav::Dashboard,
    }
}

/// GET /admin/activity - Recent admin actions
async fn activity_page(headers: HeaderMap, State(state): State<AdminState>) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };

    let rows = match state.console.activity().recent(&authed.session, 100).await {
        Ok(entries) if entries.is_empty() => {
            r#"<tr><td colspan="4" class="muted">No activity recorded yet.</td></tr>"#.to_string()
        }
        Ok(entries) => entries
            .iter()
            .map(|entry| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    time::display(Some(entry.timestamp)),
                    html_escape(&entry.admin_name),
                    html_escape(&entry.action),
                    html_escape(&entry.details)
                )
            })
            .collect(),
        Err(e) => {
            warn!("Failed to load activity log: {}", e);
            authed
                .notify(Notice::from_error("Could not load activity", &e))
                .await;
            String::new()
        }
    };

    let body = format!(
        "<table><tr><th>When</th><th>Admin</th><th>Action</th><th>Details</th></tr>{}</table>",
        rows
    );
    let mut ws = authed.workspace.lock().await;
    render(&authed.session, &mut ws, "Admin Activity", Nav::Activity, &body)
}

#[derive(Debug, Default, Deserialize)]
struct LogsQuery {
    level: Option<String>,
}

/// GET /admin/logs - Log viewer page
async fn logs_page(
    headers: HeaderMap,
    Query(query): Query<LogsQuery>,
    State(state): State<AdminState>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };

    let min_level = query
        .level
        .as_deref()
        .and_then(|l| l.parse::<Level>().ok())
        .unwrap_or(Level::TRACE);
    let logs_html: String = state
        .log_buffer
        .recent(100, min_level)
        .iter()
        .map(|entry| {
            format!(
                r#"<div class="log-entry {}">{}</div>"#,
                entry.level,
                html_escape(&entry.format())
            )
        })
        .collect();

    let level_options = super::layout::options(
        [
            ("trace", "All"),
            ("debug", "Debug+"),
            ("info", "Info+"),
            ("warn", "Warnings+"),
            ("error", "Errors"),
        ],
        &min_level.to_string().to_lowercase(),
    );

    let body = format!(
        r#"<form class="filters" method="get" action="/admin/logs">
    <select name="level">{options}</select>
    <button type="submit" class="btn">Filter</button>
    <span class="muted" id="status">Connecting...</span>
</form>
<div class="log-container" id="logs">{logs}</div>
<script>
    const logs = document.getElementById('logs');
    const status = document.getElementById('status');
    const order = ['TRACE', 'DEBUG', 'INFO', 'WARN', 'ERROR'];
    const minLevel = order.indexOf('{min}');

    function escapeHtml(text) {{
        const div = document.createElement('div');
        div.textContent = text;
        return div.innerHTML;
    }}

    const source = new EventSource('/admin/logs/stream');
    source.onopen = () => {{ status.textContent = 'Live'; }};
    source.onerror = () => {{ status.textContent = 'Disconnected - reconnecting...'; }};
    source.onmessage = (event) => {{
        let entry;
        try {{ entry = JSON.parse(event.data); }} catch (e) {{ return; }}
        if (order.indexOf(entry.level) < minLevel) return;
        const div = document.createElement('div');
        div.className = 'log-entry ' + entry.level;
        const time = new Date(entry.timestamp).toLocaleTimeString('en-US', {{ hour12: false }});
        const fields = (entry.fields || []).join(' ');
        div.innerHTML = escapeHtml(time + ' ' + entry.level + ' ' + entry.target + ' ' + entry.message + (fields ? ' ' + fields : ''));
        logs.appendChild(div);
        while (logs.children.length > 500) logs.removeChild(logs.firstChild);
        logs.scrollTop = logs.scrollHeight;
    }};
    logs.scrollTop = logs.scrollHeight;
</script>"#,
        options = level_options,
        logs = logs_html,
        min = min_level,
    );

    let mut ws = authed.workspace.lock().await;
    render(&authed.session, &mut ws, "Live Logs", Nav::Logs, &body)
}

/// GET /admin/logs/stream - SSE endpoint for live logs
async fn logs_stream(headers: HeaderMap, State(state): State<AdminState>) -> Response {
    let Some(token) = get_session_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
    };
    if state.session_store.get_session(&token).await.is_none() {
        return (StatusCode::UNAUTHORIZED, "Session expired").into_response();
    }

    let rx = state.log_buffer.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => Some(Ok::<_, Infallible>(Event::default().data(entry.to_json()))),
        // Lagged receivers skip what they missed
        Err(_) => None,
    });

    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("ping"),
        )
        .into_response()
}

/// Reload the roster with the filter it was last loaded with
pub async fn reload_roster(state: &AdminState, authed: &Authed, ws: &mut Workspace) {
    let filter: UserFilter = ws.roster.filter().clone();
    if let Err(e) = ws
        .roster
        .refresh(state.console.backend(), &authed.session, filter)
        .await
    {
        warn!("Failed to load users: {}", e);
        ws.notices.push(Notice::from_error("Could not load users", &e));
    }
}
