use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::time::normalize_timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[serde(alias = "Low")]
    Low,
    #[default]
    #[serde(alias = "Medium")]
    Medium,
    #[serde(alias = "High")]
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            _ => None,
        }
    }
}

/// Who receives an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AlertTarget {
    #[default]
    #[serde(rename = "everyone")]
    Everyone,
    #[serde(rename = "traveler")]
    Traveler,
    #[serde(rename = "tourGuide")]
    TourGuide,
}

impl AlertTarget {
    pub const ALL: [AlertTarget; 3] = [
        AlertTarget::Everyone,
        AlertTarget::Traveler,
        AlertTarget::TourGuide,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertTarget::Everyone => "everyone",
            AlertTarget::Traveler => "traveler",
            AlertTarget::TourGuide => "tourGuide",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AlertTarget::Everyone => "Everyone",
            AlertTarget::Traveler => "Travelers",
            AlertTarget::TourGuide => "Tour Guides",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "everyone" => Some(AlertTarget::Everyone),
            "traveler" => Some(AlertTarget::Traveler),
            "tourGuide" => Some(AlertTarget::TourGuide),
            _ => None,
        }
    }
}

/// Display status derived from the alert window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertStatus {
    Active,
    Sent,
}

impl AlertStatus {
    /// Active while `now` lies inside `[start, end]`
    pub fn compute(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        match (start, end) {
            (Some(start), Some(end)) if start <= now && now <= end => AlertStatus::Active,
            _ => AlertStatus::Sent,
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertStatus::Active => f.write_str("Active"),
            AlertStatus::Sent => f.write_str("Sent"),
        }
    }
}

/// Alert as the backend sends it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub start_on: Value,
    #[serde(default)]
    pub end_on: Value,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub target: AlertTarget,
}

/// Body for `POST /api/alerts` and `PUT /api/alerts/:id`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub start_on: String,
    pub end_on: String,
    pub locations: Vec<String>,
    pub target: AlertTarget,
}

/// Alert row as shown in the alerts table
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub start_on: Option<DateTime<Utc>>,
    pub end_on: Option<DateTime<Utc>>,
    pub locations: Vec<String>,
    pub target: AlertTarget,
    pub status: AlertStatus,
}

impl Alert {
    pub fn from_record(record: AlertRecord, now: DateTime<Utc>) -> Self {
        let start_on = normalize_timestamp(&record.start_on);
        let end_on = normalize_timestamp(&record.end_on);
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            severity: record.severity,
            start_on,
            end_on,
            locations: record.locations,
            target: record.target,
            status: AlertStatus::compute(start_on, end_on, now),
        }
    }

    /// Build from a payload we sent when the server echoed nothing back
    pub fn from_payload(id: String, payload: &AlertPayload, now: DateTime<Utc>) -> Self {
        let start_on = super::time::parse_timestamp(&payload.start_on);
        let end_on = super::time::parse_timestamp(&payload.end_on);
        Self {
            id,
            title: payload.title.clone(),
            description: payload.description.clone(),
            severity: payload.severity,
            start_on,
            end_on,
            locations: payload.locations.clone(),
            target: payload.target,
            status: AlertStatus::compute(start_on, end_on, now),
        }
    }

    pub fn refresh_status(&mut self, now: DateTime<Utc>) {
        self.status = AlertStatus::compute(self.start_on, self.end_on, now);
    }
}
