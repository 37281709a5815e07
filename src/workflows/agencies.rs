//! Tour agencies and partner applications
//!
//! There are no backend endpoints for these yet, so the directory serves
//! fixed sample data. Status changes are validated and recorded in the
//! activity log, then the (unchanged) list is fetched again.

use chrono::NaiveDate;

use crate::error::{AdminError, Result, ValidationErrors};
use crate::models::{Agency, AgencyStatus, Application, ApplicationStatus};

pub trait AgencyDirectory: Send + Sync {
    fn agencies(&self) -> Vec<Agency>;

    fn applications(&self) -> Vec<Application>;
}

/// Built-in sample data
#[derive(Debug, Default, Clone, Copy)]
pub struct SampleDirectory;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

impl AgencyDirectory for SampleDirectory {
    fn agencies(&self) -> Vec<Agency> {
        let agency = |id: &str,
                      name: &str,
                      owner: &str,
                      location: &str,
                      status: AgencyStatus,
                      tours: u32,
                      rating: f32,
                      joined: NaiveDate| Agency {
            id: id.to_string(),
            name: name.to_string(),
            owner: owner.to_string(),
            email: format!("{}@agencies.tarag.ph", id),
            location: location.to_string(),
            status,
            tours,
            rating,
            joined,
        };
        vec![
            agency(
                "AG-001",
                "Island Hoppers Travel",
                "Maria Santos",
                "Cebu City",
                AgencyStatus::Active,
                24,
                4.8,
                date(2023, 3, 15),
            ),
            agency(
                "AG-002",
                "Mountain Trail Adventures",
                "Jose Reyes",
                "Baguio",
                AgencyStatus::Active,
                12,
                4.6,
                date(2023, 6, 2),
            ),
            agency(
                "AG-003",
                "Palawan Dive Co.",
                "Ana Cruz",
                "Puerto Princesa",
                AgencyStatus::Pending,
                0,
                0.0,
                date(2024, 11, 20),
            ),
            agency(
                "AG-004",
                "Bohol Countryside Tours",
                "Ramon Garcia",
                "Tagbilaran",
                AgencyStatus::Suspended,
                8,
                3.9,
                date(2023, 9, 8),
            ),
            agency(
                "AG-005",
                "Siargao Surf Camps",
                "Liza Mendoza",
                "General Luna",
                AgencyStatus::Active,
                15,
                4.7,
                date(2024, 1, 30),
            ),
        ]
    }

    fn applications(&self) -> Vec<Application> {
        let application = |id: &str,
                           agency: &str,
                           applicant: &str,
                           location: &str,
                           submitted: NaiveDate,
                           documents: &[&str],
                           status: ApplicationStatus| Application {
            id: id.to_string(),
            agency_name: agency.to_string(),
            applicant: applicant.to_string(),
            email: format!("{}@applicants.tarag.ph", id.to_lowercase()),
            location: location.to_string(),
            submitted,
            documents: documents.iter().map(|d| d.to_string()).collect(),
            status,
        };
        vec![
            application(
                "APP-101",
                "Vigan Heritage Walks",
                "Carlo Bautista",
                "Vigan",
                date(2025, 1, 8),
                &["Business Permit", "DOT Accreditation"],
                ApplicationStatus::Pending,
            ),
            application(
                "APP-102",
                "Davao Eco Trails",
                "Grace Lim",
                "Davao City",
                date(2025, 1, 5),
                &["Business Permit", "DTI Registration", "Insurance"],
                ApplicationStatus::UnderReview,
            ),
            application(
                "APP-103",
                "Coron Island Escapes",
                "Mark Villanueva",
                "Coron",
                date(2024, 12, 28),
                &["Business Permit"],
                ApplicationStatus::Approved,
            ),
            application(
                "APP-104",
                "Manila Food Crawls",
                "Bea Torres",
                "Manila",
                date(2024, 12, 20),
                &["DTI Registration"],
                ApplicationStatus::Rejected,
            ),
        ]
    }
}

/// Summary counts for the agencies page header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgencyCounts {
    pub total: usize,
    pub active: usize,
    pub pending: usize,
    pub suspended: usize,
}

pub fn count_agencies(agencies: &[Agency]) -> AgencyCounts {
    agencies.iter().fold(
        AgencyCounts {
            total: agencies.len(),
            ..Default::default()
        },
        |mut counts, agency| {
            match agency.status {
                AgencyStatus::Active => counts.active += 1,
                AgencyStatus::Pending => counts.pending += 1,
                AgencyStatus::Suspended => counts.suspended += 1,
            }
            counts
        },
    )
}

/// Check a status change; returns the agency as it is now
pub fn set_agency_status(
    directory: &dyn AgencyDirectory,
    agency_id: &str,
    status: AgencyStatus,
) -> Result<Agency> {
    let agency = directory
        .agencies()
        .into_iter()
        .find(|a| a.id == agency_id)
        .ok_or_else(|| AdminError::not_found("Agency", agency_id))?;

    if agency.status == status {
        let mut errors = ValidationErrors::new();
        errors.add("status", format!("{} is already {}", agency.name, status));
        errors.into_result()?;
    }
    Ok(agency)
}

/// Approve or reject an open application
pub fn review_application(
    directory: &dyn AgencyDirectory,
    application_id: &str,
    decision: ApplicationStatus,
) -> Result<Application> {
    let application = directory
        .applications()
        .into_iter()
        .find(|a| a.id == application_id)
        .ok_or_else(|| AdminError::not_found("Application", application_id))?;

    let mut errors = ValidationErrors::new();
    if !matches!(decision, ApplicationStatus::Approved | ApplicationStatus::Rejected) {
        errors.add("status", "Decision must be approved or rejected");
    }
    if !application.status.is_open() {
        errors.add(
            "status",
            format!("Application {} was already {}", application.id, application.status),
        );
    }
    errors.into_result()?;
    Ok(application)
}
