//! Alert (announcement) management

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::backend::AlertApi;
use crate::error::{AdminError, Result, ValidationErrors};
use crate::models::time::{parse_timestamp, to_input_value};
use crate::models::{Alert, AlertPayload, AlertRecord, AlertTarget, Severity};
use crate::session::AdminSession;

/// Create/edit form state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertDraft {
    /// Set when editing an existing alert
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    /// `datetime-local` or ISO-8601 text
    pub start_on: String,
    pub end_on: String,
    pub locations: Vec<String>,
    pub target: AlertTarget,
}

impl AlertDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the edit form; dates that did not parse come back empty
    pub fn from_alert(alert: &Alert) -> Self {
        Self {
            id: Some(alert.id.clone()),
            title: alert.title.clone(),
            description: alert.description.clone(),
            severity: alert.severity,
            start_on: to_input_value(alert.start_on),
            end_on: to_input_value(alert.end_on),
            locations: alert.locations.clone(),
            target: alert.target,
        }
    }

    /// Replace locations with the comma or newline separated entries in `text`
    pub fn set_locations_from_text(&mut self, text: &str) {
        self.locations.clear();
        for location in text.split([',', '\n']) {
            self.add_location(location);
        }
    }

    pub fn add_location(&mut self, location: &str) {
        let location = location.trim();
        if !location.is_empty() && !self.locations.iter().any(|l| l == location) {
            self.locations.push(location.to_string());
        }
    }

    pub fn remove_location(&mut self, location: &str) {
        let location = location.trim();
        self.locations.retain(|l| l != location);
    }

    /// Whether the submit control is enabled
    pub fn is_submittable(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.description.trim().is_empty()
            && !self.locations.is_empty()
    }

    pub fn validate(&self) -> Result<AlertPayload> {
        let mut errors = ValidationErrors::new();

        if self.title.trim().is_empty() {
            errors.add("title", "Title is required");
        }
        if self.description.trim().is_empty() {
            errors.add("description", "Description is required");
        }
        if self.locations.is_empty() {
            errors.add("locations", "Add at least one location");
        }

        let start = parse_date(&self.start_on, "start_on", "Start", &mut errors);
        let end = parse_date(&self.end_on, "end_on", "End", &mut errors);
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                errors.add("end_on", "End must not be before start");
            }
        }

        errors.into_result()?;
        match (start, end) {
            (Some(start), Some(end)) => Ok(AlertPayload {
                title: self.title.trim().to_string(),
                description: self.description.trim().to_string(),
                severity: self.severity,
                start_on: start.to_rfc3339(),
                end_on: end.to_rfc3339(),
                locations: self.locations.clone(),
                target: self.target,
            }),
            _ => Err(AdminError::Internal {
                message: "alert form passed validation without dates".to_string(),
            }),
        }
    }
}

fn parse_date(
    raw: &str,
    field: &'static str,
    label: &str,
    errors: &mut ValidationErrors,
) -> Option<DateTime<Utc>> {
    if raw.trim().is_empty() {
        errors.add(field, format!("{} date is required", label));
        return None;
    }
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        errors.add(field, format!("{} date is not a valid date", label));
    }
    parsed
}

/// Alerts list for a session
#[derive(Debug, Default)]
pub struct AlertBoard {
    alerts: Vec<Alert>,
}

impl AlertBoard {
    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn get(&self, alert_id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == alert_id)
    }

    /// Recompute Active/Sent for every alert
    pub fn refresh_statuses(&mut self, now: DateTime<Utc>) {
        for alert in &mut self.alerts {
            alert.refresh_status(now);
        }
    }

    pub async fn refresh<A: AlertApi + ?Sized>(
        &mut self,
        api: &A,
        session: &AdminSession,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let records = api.list_alerts(session.token()?).await?;
        self.alerts = records
            .into_iter()
            .map(|record| Alert::from_record(record, now))
            .collect();
        Ok(())
    }

    /// Create or update; nothing is sent unless the draft validates
    pub async fn save<A: AlertApi + ?Sized>(
        &mut self,
        api: &A,
        session: &AdminSession,
        draft: &AlertDraft,
        now: DateTime<Utc>,
    ) -> Result<Alert> {
        let payload = draft.validate()?;
        let token = session.token()?;

        let alert = match &draft.id {
            Some(id) => {
                let response = api.update_alert(token, id, &payload).await?;
                let alert = merge_response(response, id.clone(), &payload, now);
                match self.alerts.iter_mut().find(|a| a.id == *id) {
                    Some(existing) => *existing = alert.clone(),
                    None => self.alerts.insert(0, alert.clone()),
                }
                info!("Updated alert {}", alert.id);
                alert
            }
            None => {
                let response = api.create_alert(token, &payload).await?;
                let local_id = format!("local-{}", Uuid::new_v4());
                let alert = merge_response(response, local_id, &payload, now);
                self.alerts.insert(0, alert.clone());
                info!("Created alert {} ({})", alert.id, alert.title);
                alert
            }
        };
        Ok(alert)
    }

    pub async fn delete<A: AlertApi + ?Sized>(
        &mut self,
        api: &A,
        session: &AdminSession,
        alert_id: &str,
    ) -> Result<Alert> {
        let token = session.token()?;
        let index = self
            .alerts
            .iter()
            .position(|a| a.id == alert_id)
            .ok_or_else(|| AdminError::not_found("Alert", alert_id))?;

        api.delete_alert(token, alert_id).await?;

        info!("Deleted alert {}", alert_id);
        Ok(self.alerts.remove(index))
    }
}

/// Server shape when it sent one, otherwise what we submitted
fn merge_response(
    response: Option<AlertRecord>,
    fallback_id: String,
    payload: &AlertPayload,
    now: DateTime<Utc>,
) -> Alert {
    match response {
        Some(record) => Alert::from_record(record, now),
        None => {
            warn!("Alert response had no body, using submitted values");
            Alert::from_payload(fallback_id, payload, now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{admin_profile, FakeBackend};
    use crate::models::AlertStatus;
    use chrono::Duration;

    fn session() -> AdminSession {
        AdminSession::new("tok".to_string(), Some(admin_profile()), 3600)
    }

    fn storm_warning(now: DateTime<Utc>) -> AlertDraft {
        AlertDraft {
            title: "Storm Warning".to_string(),
            description: "Heavy rain expected".to_string(),
            start_on: (now - Duration::hours(1)).to_rfc3339(),
            end_on: (now + Duration::hours(1)).to_rfc3339(),
            locations: vec!["Cebu".to_string()],
            target: AlertTarget::Everyone,
            ..AlertDraft::new()
        }
    }

    #[tokio::test]
    async fn test_storm_warning_scenario() {
        let api = FakeBackend::new();
        let now = Utc::now();
        let mut board = AlertBoard::default();
        board.alerts.push(Alert::from_payload(
            "old".to_string(),
            &storm_warning(now - Duration::days(3)).validate().unwrap(),
            now,
        ));

        let alert = board
            .save(&api, &session(), &storm_warning(now), now)
            .await
            .unwrap();

        let posts = api.calls_to("/api/alerts");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].method, "POST");
        assert_eq!(posts[0].body["title"], "Storm Warning");
        assert_eq!(posts[0].body["target"], "everyone");

        assert_eq!(board.alerts()[0].id, alert.id);
        assert_eq!(board.alerts()[0].status, AlertStatus::Active);
        assert_eq!(board.alerts()[1].status, AlertStatus::Sent);
    }

    #[tokio::test]
    async fn test_no_locations_never_submitted() {
        let api = FakeBackend::new();
        let now = Utc::now();
        let mut draft = storm_warning(now);
        draft.locations.clear();
        assert!(!draft.is_submittable());

        let err = AlertBoard::default()
            .save(&api, &session(), &draft, now)
            .await
            .unwrap_err();
        assert!(err.validation().unwrap().get("locations").is_some());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_response_uses_local_shape() {
        let api = FakeBackend::new();
        *api.empty_alert_responses.lock() = true;
        let now = Utc::now();
        let mut board = AlertBoard::default();

        let alert = board
            .save(&api, &session(), &storm_warning(now), now)
            .await
            .unwrap();
        assert!(alert.id.starts_with("local-"));
        assert_eq!(alert.locations, vec!["Cebu".to_string()]);
        assert_eq!(alert.status, AlertStatus::Active);
    }

    #[tokio::test]
    async fn test_edit_replaces_in_place() {
        let api = FakeBackend::new();
        let now = Utc::now();
        let mut board = AlertBoard::default();
        let created = board
            .save(&api, &session(), &storm_warning(now), now)
            .await
            .unwrap();

        let mut draft = AlertDraft::from_alert(&created);
        draft.title = "Storm Update".to_string();
        draft.end_on = (now - Duration::minutes(5)).to_rfc3339();
        draft.start_on = (now - Duration::hours(2)).to_rfc3339();
        board.save(&api, &session(), &draft, now).await.unwrap();

        assert_eq!(board.alerts().len(), 1);
        assert_eq!(board.alerts()[0].title, "Storm Update");
        assert_eq!(board.alerts()[0].status, AlertStatus::Sent);
        assert_eq!(
            api.calls_to(&format!("/api/alerts/{}", created.id))[0].method,
            "PUT"
        );
    }

    #[test]
    fn test_edit_population_with_bad_dates() {
        let alert = Alert {
            id: "a1".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            severity: Severity::Low,
            start_on: None,
            end_on: None,
            locations: vec!["Bohol".to_string()],
            target: AlertTarget::Traveler,
            status: AlertStatus::Sent,
        };
        let draft = AlertDraft::from_alert(&alert);
        assert_eq!(draft.start_on, "");
        assert_eq!(draft.end_on, "");

        let err = draft.validate().unwrap_err();
        assert!(err.validation().unwrap().get("start_on").is_some());
    }

    #[test]
    fn test_end_before_start_rejected() {
        let now = Utc::now();
        let mut draft = storm_warning(now);
        draft.end_on = (now - Duration::hours(3)).to_rfc3339();
        let err = draft.validate().unwrap_err();
        assert!(err.validation().unwrap().get("end_on").is_some());
    }

    #[test]
    fn test_locations_from_text() {
        let mut draft = AlertDraft::new();
        draft.set_locations_from_text("Cebu, Bohol\n Cebu ,,");
        assert_eq!(draft.locations, vec!["Cebu".to_string(), "Bohol".to_string()]);
        draft.remove_location(" Cebu ");
        assert_eq!(draft.locations, vec!["Bohol".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_removes_alert() {
        let api = FakeBackend::new();
        let now = Utc::now();
        let mut board = AlertBoard::default();
        let created = board
            .save(&api, &session(), &storm_warning(now), now)
            .await
            .unwrap();

        board.delete(&api, &session(), &created.id).await.unwrap();
        assert!(board.alerts().is_empty());

        let err = board.delete(&api, &session(), "missing").await.unwrap_err();
        assert!(matches!(err, AdminError::NotFound { .. }));
    }
}
