use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgencyStatus {
    Active,
    Pending,
    Suspended,
}

impl AgencyStatus {
    pub const ALL: [AgencyStatus; 3] = [
        AgencyStatus::Active,
        AgencyStatus::Pending,
        AgencyStatus::Suspended,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgencyStatus::Active => "active",
            AgencyStatus::Pending => "pending",
            AgencyStatus::Suspended => "suspended",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s.trim())
    }
}

impl fmt::Display for AgencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::Pending,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s.trim())
    }

    /// Approve/reject is only offered while a decision is open
    pub fn is_open(&self) -> bool {
        matches!(self, ApplicationStatus::Pending | ApplicationStatus::UnderReview)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered tour agency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub email: String,
    pub location: String,
    pub status: AgencyStatus,
    pub tours: u32,
    pub rating: f32,
    pub joined: NaiveDate,
}

/// Application from an agency that wants to join the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub agency_name: String,
    pub applicant: String,
    pub email: String,
    pub location: String,
    pub submitted: NaiveDate,
    pub documents: Vec<String>,
    pub status: ApplicationStatus,
}
