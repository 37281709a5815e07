//! Agency directory and partner applications

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use serde::Deserialize;

use super::admin::{ask_confirmation, render, require_auth, AdminState};
use super::layout::{badge, html_escape, options, Nav};
use crate::models::{Agency, AgencyStatus, ApplicationStatus};
use crate::notifications::{Notice, NoticeKind};
use crate::workflows::agencies::count_agencies;
use crate::workflows::ConsoleAction;

pub fn routes() -> Router<AdminState> {
    Router::new()
        .route("/agencies", get(agencies_page))
        .route("/agencies/:id/status", post(change_status))
        .route("/applications", get(applications_page))
        .route("/applications/:id/review", post(review))
}

#[derive(Debug, Default, Deserialize)]
struct AgencyQuery {
    status: Option<String>,
    search: Option<String>,
}

impl AgencyQuery {
    fn matches(&self, agency: &Agency) -> bool {
        let status = self.status.as_deref().and_then(AgencyStatus::parse);
        let search = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        status.map_or(true, |s| agency.status == s)
            && search.map_or(true, |term| {
                [&agency.name, &agency.owner, &agency.location]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&term))
            })
    }
}

/// GET /admin/agencies
async fn agencies_page(
    headers: HeaderMap,
    Query(query): Query<AgencyQuery>,
    State(state): State<AdminState>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };

    let agencies = state.console.directory().agencies();
    let counts = count_agencies(&agencies);

    let rows: String = agencies
        .iter()
        .filter(|a| query.matches(a))
        .map(|agency| {
            let statuses = options(
                AgencyStatus::ALL.iter().map(|s| (s.as_str(), s.as_str())),
                agency.status.as_str(),
            );
            format!(
                r#"<tr><td><strong>{name}</strong><div class="muted">{id}</div></td><td>{owner}<div class="muted">{email}</div></td><td>{location}</td><td>{tours}</td><td>{rating:.1}</td><td>{joined}</td><td>{status}</td><td><form method="post" action="/admin/agencies/{url_id}/status" class="inline"><select name="status">{statuses}</select> <button type="submit" class="btn">Update</button></form></td></tr>"#,
                name = html_escape(&agency.name),
                id = html_escape(&agency.id),
                owner = html_escape(&agency.owner),
                email = html_escape(&agency.email),
                location = html_escape(&agency.location),
                tours = agency.tours,
                rating = agency.rating,
                joined = agency.joined.format("%Y-%m-%d"),
                status = badge(agency.status.as_str(), agency.status.as_str()),
                url_id = urlencoding::encode(&agency.id),
                statuses = statuses,
            )
        })
        .collect();

    let status_filter = options(
        std::iter::once(("", "All statuses"))
            .chain(AgencyStatus::ALL.iter().map(|s| (s.as_str(), s.as_str()))),
        query.status.as_deref().unwrap_or(""),
    );

    let body = format!(
        r#"<div class="cards">
    <div class="card stat"><div class="value">{total}</div><div class="label">Agencies</div></div>
    <div class="card stat"><div class="value">{active}</div><div class="label">Active</div></div>
    <div class="card stat"><div class="value">{pending}</div><div class="label">Pending</div></div>
    <div class="card stat"><div class="value">{suspended}</div><div class="label">Suspended</div></div>
</div>
<form class="filters" method="get" action="/admin/agencies">
    <input type="search" name="search" placeholder="Search name, owner or location" value="{search}">
    <select name="status">{status_filter}</select>
    <button type="submit" class="btn">Filter</button>
</form>
<table>
<tr><th>Agency</th><th>Owner</th><th>Location</th><th>Tours</th><th>Rating</th><th>Joined</th><th>Status</th><th>Change status</th></tr>
{rows}
</table>"#,
        total = counts.total,
        active = counts.active,
        pending = counts.pending,
        suspended = counts.suspended,
        search = html_escape(query.search.as_deref().unwrap_or("")),
        status_filter = status_filter,
        rows = rows,
    );

    let mut ws = authed.workspace.lock().await;
    render(&authed.session, &mut ws, "Agencies", Nav::Agencies, &body)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusForm {
    status: String,
}

/// POST /admin/agencies/:id/status
async fn change_status(
    headers: HeaderMap,
    Path(agency_id): Path<String>,
    State(state): State<AdminState>,
    Form(form): Form<StatusForm>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };

    match AgencyStatus::parse(&form.status) {
        Some(status) => ask_confirmation(
            &state,
            &authed,
            ConsoleAction::SetAgencyStatus { agency_id, status },
        ),
        None => {
            authed
                .notify(Notice::new(
                    NoticeKind::Warning,
                    "Invalid status",
                    format!("'{}' is not an agency status.", form.status),
                ))
                .await;
            Redirect::to("/admin/agencies").into_response()
        }
    }
}

/// GET /admin/applications
async fn applications_page(headers: HeaderMap, State(state): State<AdminState>) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };

    let applications = state.console.directory().applications();
    let cards: String = applications
        .iter()
        .map(|app| {
            let url_id = urlencoding::encode(&app.id);
            let decision = |value: ApplicationStatus, label: &str, class: &str| {
                format!(
                    r#"<form method="post" action="/admin/applications/{}/review" class="inline"><input type="hidden" name="decision" value="{}"><button type="submit" class="btn {}">{}</button></form>"#,
                    url_id,
                    value.as_str(),
                    class,
                    label
                )
            };
            let actions = if app.status.is_open() {
                format!(
                    "{}{}",
                    decision(ApplicationStatus::Approved, "Approve", ""),
                    decision(ApplicationStatus::Rejected, "Reject", "danger")
                )
            } else {
                String::new()
            };
            format!(
                r#"<div class="card"><h3>{name} {status}</h3>
<p class="muted">{id} &middot; submitted {submitted}</p>
<p>{applicant} &lt;{email}&gt;, {location}</p>
<p>Documents: {documents}</p>
<p>{actions}</p></div>"#,
                name = html_escape(&app.agency_name),
                status = badge(app.status.as_str(), app.status.as_str()),
                id = html_escape(&app.id),
                submitted = app.submitted.format("%Y-%m-%d"),
                applicant = html_escape(&app.applicant),
                email = html_escape(&app.email),
                location = html_escape(&app.location),
                documents = html_escape(&app.documents.join(", ")),
                actions = actions,
            )
        })
        .collect();

    let open = applications.iter().filter(|a| a.status.is_open()).count();
    let body = format!(
        r#"<p class="muted">{} application(s) awaiting a decision.</p>{}"#,
        open, cards
    );

    let mut ws = authed.workspace.lock().await;
    render(&authed.session, &mut ws, "Applications", Nav::Applications, &body)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ReviewForm {
    decision: String,
}

/// POST /admin/applications/:id/review
async fn review(
    headers: HeaderMap,
    Path(application_id): Path<String>,
    State(state): State<AdminState>,
    Form(form): Form<ReviewForm>,
) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };

    match ApplicationStatus::parse(&form.decision) {
        Some(decision) => ask_confirmation(
            &state,
            &authed,
            ConsoleAction::ReviewApplication {
                application_id,
                decision,
            },
        ),
        None => {
            authed
                .notify(Notice::new(
                    NoticeKind::Warning,
                    "Invalid decision",
                    format!("'{}' is not a review decision.", form.decision),
                ))
                .await;
            Redirect::to("/admin/applications").into_response()
        }
    }
}
