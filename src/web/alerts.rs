//! Alert list and create/edit form

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use super::admin::{ask_confirmation, render, require_auth, AdminState};
use super::layout::{action_button, badge, field_error, html_escape, options, Nav};
use crate::error::ValidationErrors;
use crate::models::{time, AlertTarget, Severity};
use crate::notifications::Notice;
use crate::workflows::{AlertDraft, ConsoleAction};

pub fn routes() -> Router<AdminState> {
    Router::new()
        .route("/alerts", get(alerts_page).post(save_alert))
        .route("/alerts/new", get(new_alert))
        .route("/alerts/:id/edit", get(edit_alert))
        .route("/alerts/:id/delete", post(delete_alert))
}

/// Alert form as posted; locations arrive as one comma/newline separated field
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlertForm {
    id: String,
    title: String,
    description: String,
    severity: String,
    start_on: String,
    end_on: String,
    locations: String,
    target: String,
    /// Set by a location's remove button; the form is re-rendered instead of saved
    remove: String,
}

impl AlertForm {
    fn into_draft(self) -> AlertDraft {
        let mut draft = AlertDraft {
            id: Some(self.id).filter(|id| !id.trim().is_empty()),
            title: self.title,
            description: self.description,
            severity: Severity::parse(&self.severity).unwrap_or_default(),
            start_on: self.start_on,
            end_on: self.end_on,
            locations: Vec::new(),
            target: AlertTarget::parse(&self.target).unwrap_or_default(),
        };
        draft.set_locations_from_text(&self.locations);
        draft
    }
}

fn alert_form_html(draft: &AlertDraft, errors: Option<&ValidationErrors>) -> String {
    let severities = options(
        Severity::ALL.iter().map(|s| (s.as_str(), s.as_str())),
        draft.severity.as_str(),
    );
    let targets = options(
        AlertTarget::ALL.iter().map(|t| (t.as_str(), t.label())),
        draft.target.as_str(),
    );

    format!(
        r#"<div class="card">
<form method="post" action="/admin/alerts" id="alert-form">
    <input type="hidden" name="id" value="{id}">
    <label for="title">Title</label>
    <input type="text" id="title" name="title" value="{title}">
    {title_error}
    <label for="description">Description</label>
    <textarea id="description" name="description">{description}</textarea>
    {description_error}
    <label for="severity">Severity</label>
    <select id="severity" name="severity">{severities}</select>
    <label for="start_on">Start</label>
    <input type="datetime-local" id="start_on" name="start_on" value="{start_on}">
    {start_error}
    <label for="end_on">End</label>
    <input type="datetime-local" id="end_on" name="end_on" value="{end_on}">
    {end_error}
    <label for="locations">Locations (one per line or comma separated)</label>
    <textarea id="locations" name="locations">{locations}</textarea>
    {locations_error}
    <label for="target">Recipients</label>
    <select id="target" name="target">{targets}</select>
    <p style="margin-top: 1.25rem;">
        <button type="submit" class="btn" id="submit"{disabled}>{submit}</button>
        <a href="/admin/alerts" class="btn muted">Cancel</a>
    </p>
    {chips}
</form>
</div>
<script>
    const form = document.getElementById('alert-form');
    const submit = document.getElementById('submit');
    const filled = (name) => form.elements[name].value.trim().length > 0;
    form.addEventListener('input', () => {{
        submit.disabled = !(filled('title') && filled('description') && filled('locations'));
    }});
</script>"#,
        id = html_escape(draft.id.as_deref().unwrap_or("")),
        title = html_escape(&draft.title),
        title_error = field_error(errors, "title"),
        description = html_escape(&draft.description),
        description_error = field_error(errors, "description"),
        severities = severities,
        start_on = html_escape(&draft.start_on),
        start_error = field_error(errors, "start_on"),
        end_on = html_escape(&draft.end_on),
        end_error = field_error(errors, "end_on"),
        locations = html_escape(&draft.locations.join("\n")),
        chips = location_chips(&draft.locations),
        locations_error = field_error(errors, "locations"),
        targets = targets,
        disabled = if draft.is_submittable() { "" } else { " disabled" },
        submit = if draft.id.is_some() { "Save changes" } else { "Create alert" },
    )
}

fn location_chips(locations: &[String]) -> String {
    let chips: String = locations
        .iter()
        .map(|location| {
            let location = html_escape(location);
            format!(
                r#"<button type="submit" class="btn muted" name="remove" value="{0}" title="Remove {0}">{0} &times;</button> "#,
                location
            )
        })
        .collect();
    if chips.is_empty() {
        chips
    } else {
        format!(r#"<p class="chips"><span class="muted">Remove a location:</span> {}</p>"#, chips)
    }
}

fn form_title(draft: &AlertDraft) -> &'static str {
    if draft.id.is_some() {
        "Edit Alert"
    } else {
        "New Alert"
    }
}

/// GET /admin/alerts
async fn alerts_page(headers: HeaderMap, State(state): State<AdminState>) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };
    let mut ws = authed.workspace.lock().await;

    if let Err(e) = ws
        .alerts
        .refresh(state.console.backend(), &authed.session, Utc::now())
        .await
    {
        warn!("Failed to load alerts: {}", e);
        ws.notices.push(Notice::from_error("Could not load alerts", &e));
        // Keep showing the cached board with current statuses
        ws.alerts.refresh_statuses(Utc::now());
    }

    let rows: String = ws
        .alerts
        .alerts()
        .iter()
        .map(|alert| {
            let id = urlencoding::encode(&alert.id);
            format!(
                r#"<tr><td><strong>{title}</strong><div class="muted">{description}</div></td><td>{severity}</td><td>{start}<br>{end}</td><td>{locations}</td><td>{target}</td><td>{status}</td><td><a class="btn" href="/admin/alerts/{id}/edit">Edit</a>{delete}</td></tr>"#,
                title = html_escape(&alert.title),
                description = html_escape(&alert.description),
                severity = badge(alert.severity.as_str(), alert.severity.as_str()),
                start = time::display(alert.start_on),
                end = time::display(alert.end_on),
                locations = html_escape(&alert.locations.join(", ")),
                target = alert.target.label(),
                status = badge(&alert.status.to_string(), &alert.status.to_string()),
                id = id,
                delete = action_button(&format!("/admin/alerts/{}/delete", id), "Delete", "danger"),
            )
        })
        .collect();
    let rows = if rows.is_empty() {
        r#"<tr><td colspan="7" class="muted">No alerts yet.</td></tr>"#.to_string()
    } else {
        rows
    };

    let body = format!(
        r#"<p><a class="btn" href="/admin/alerts/new">New alert</a></p>
<table>
<tr><th>Alert</th><th>Severity</th><th>Window</th><th>Locations</th><th>Recipients</th><th>Status</th><th></th></tr>
{}
</table>"#,
        rows
    );
    render(&authed.session, &mut ws, "Alerts", Nav::Alerts, &body)
}

/// GET /admin/alerts/new
async fn new_alert(headers: HeaderMap, State(state): State<AdminState>) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };
    let draft = AlertDraft::new();
    let body = alert_form_html(&draft, None);
    let mut ws = authed.workspace.lock().await;
    render(&authed.session, &mut ws, form_title(&draft), Nav::Alerts, &body)
}

/// GET /admin/alerts/:id/edit
async fn edit_alert(
    headers: HeaderMap,
    Path(alert_id): Path<String>,
    State(state): State<AdminState>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };
    let mut ws = authed.workspace.lock().await;

    let Some(draft) = ws.alerts.get(&alert_id).map(AlertDraft::from_alert) else {
        ws.notices.push(Notice::from_error(
            "Cannot edit alert",
            &crate::error::AdminError::not_found("Alert", alert_id),
        ));
        return Redirect::to("/admin/alerts").into_response();
    };

    let body = alert_form_html(&draft, None);
    render(&authed.session, &mut ws, form_title(&draft), Nav::Alerts, &body)
}

/// POST /admin/alerts - Create or update
async fn save_alert(
    headers: HeaderMap,
    State(state): State<AdminState>,
    Form(mut form): Form<AlertForm>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };
    let remove = std::mem::take(&mut form.remove);
    let mut draft = form.into_draft();
    let mut ws = authed.workspace.lock().await;

    if !remove.trim().is_empty() {
        draft.remove_location(&remove);
        let body = alert_form_html(&draft, None);
        return render(&authed.session, &mut ws, form_title(&draft), Nav::Alerts, &body);
    }

    match ws
        .alerts
        .save(state.console.backend(), &authed.session, &draft, Utc::now())
        .await
    {
        Ok(alert) => {
            let (action, title) = if draft.id.is_some() {
                ("Updated alert", "Alert updated")
            } else {
                ("Created alert", "Alert created")
            };
            ws.notices.push(Notice::success(
                title,
                format!("\"{}\" is {}.", alert.title, alert.status),
            ));
            drop(ws);
            state
                .console
                .activity()
                .record(
                    &authed.session,
                    action,
                    &format!("{} ({})", alert.title, alert.id),
                )
                .await;
            Redirect::to("/admin/alerts").into_response()
        }
        Err(e) => {
            if e.validation().is_none() {
                warn!("Failed to save alert: {}", e);
                ws.notices.push(Notice::from_error("Could not save alert", &e));
            }
            let body = alert_form_html(&draft, e.validation());
            render(&authed.session, &mut ws, form_title(&draft), Nav::Alerts, &body)
        }
    }
}

/// POST /admin/alerts/:id/delete
async fn delete_alert(
    headers: HeaderMap,
    Path(alert_id): Path<String>,
    State(state): State<AdminState>,
) -> Response {
    match require_auth(&headers, &state).await {
        Ok(authed) => ask_confirmation(&state, &authed, ConsoleAction::DeleteAlert { alert_id }),
        Err(redirect) => redirect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::FakeBackend;
    use crate::web::admin::admin_router;
    use crate::web::admin::tests::{body_text, get, location, login, post_form, test_state};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[test]
    fn test_form_to_draft() {
        let draft = AlertForm {
            id: " ".to_string(),
            title: "Storm Warning".to_string(),
            severity: "high".to_string(),
            locations: "Cebu, Bohol\nCebu\n".to_string(),
            target: "tourGuide".to_string(),
            ..AlertForm::default()
        }
        .into_draft();

        assert_eq!(draft.id, None);
        assert_eq!(draft.severity, Severity::High);
        assert_eq!(draft.target, AlertTarget::TourGuide);
        assert_eq!(draft.locations, vec!["Cebu", "Bohol"]);
    }

    #[test]
    fn test_empty_form_submit_is_disabled() {
        assert!(alert_form_html(&AlertDraft::new(), None).contains(r#"id="submit" disabled"#));
    }

    #[tokio::test]
    async fn test_create_storm_warning() {
        let backend = Arc::new(FakeBackend::new());
        let app = admin_router(test_state(backend.clone()));
        let cookie = login(&app).await;

        let now = Utc::now();
        let start = (now - chrono::Duration::hours(1)).format("%Y-%m-%dT%H:%M").to_string();
        let end = (now + chrono::Duration::days(1)).format("%Y-%m-%dT%H:%M").to_string();
        let form = format!(
            "title=Storm+Warning&description=Typhoon+approaching&severity=high&start_on={}&end_on={}&locations=Cebu&target=everyone",
            urlencoding::encode(&start),
            urlencoding::encode(&end)
        );

        let res = app
            .clone()
            .oneshot(post_form("/alerts", &cookie, &form))
            .await
            .unwrap();
        assert_eq!(location(&res), "/admin/alerts");
        assert_eq!(backend.calls_to("/api/alerts").len(), 1);

        let html = body_text(app.clone().oneshot(get("/alerts", &cookie)).await.unwrap()).await;
        assert!(html.contains("Alert created"));
        assert!(html.contains("Storm Warning"));
        assert!(html.contains(r#"<span class="badge Active">Active</span>"#));
    }

    #[tokio::test]
    async fn test_alert_without_locations_is_never_sent() {
        let backend = Arc::new(FakeBackend::new());
        let app = admin_router(test_state(backend.clone()));
        let cookie = login(&app).await;

        let res = app
            .clone()
            .oneshot(post_form(
                "/alerts",
                &cookie,
                "title=Storm&description=Rain&severity=low&start_on=2025-01-01T00%3A00&end_on=2025-01-02T00%3A00&locations=+&target=everyone",
            ))
            .await
            .unwrap();
        let html = body_text(res).await;
        assert!(html.contains("Add at least one location"));
        assert!(backend.calls_to("/api/alerts").is_empty());
    }

    #[tokio::test]
    async fn test_remove_location_rerenders_without_saving() {
        let backend = Arc::new(FakeBackend::new());
        let app = admin_router(test_state(backend.clone()));
        let cookie = login(&app).await;

        let res = app
            .clone()
            .oneshot(post_form(
                "/alerts",
                &cookie,
                "title=Storm&description=Rain&severity=low&start_on=2025-01-01T00%3A00&end_on=2025-01-02T00%3A00&locations=Cebu%0ABohol&target=everyone&remove=Cebu",
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), axum::http::StatusCode::OK);
        let html = body_text(res).await;
        assert!(html.contains(r#"<textarea id="locations" name="locations">Bohol</textarea>"#));
        assert!(html.contains(r#"name="remove" value="Bohol""#));
        assert!(!html.contains(r#"name="remove" value="Cebu""#));
        assert!(backend.calls_to("/api/alerts").is_empty());
    }
}
