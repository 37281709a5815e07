//! View models for the data the console displays
//!
//! Nothing here is persisted by the console; the backend owns the records.
//! Backend shapes are parsed into these types at the network boundary.

pub mod activity;
pub mod agency;
pub mod alert;
pub mod profile;
pub mod safety;
pub mod time;
pub mod user;

pub use activity::ActivityEntry;
pub use agency::{Agency, AgencyStatus, Application, ApplicationStatus};
pub use alert::{Alert, AlertPayload, AlertRecord, AlertStatus, AlertTarget, Severity};
pub use profile::{AdminProfile, Theme};
pub use safety::{SafetyLog, SafetyLogRecord};
pub use user::{
    ModerationKind, User, UserFilter, UserProfile, UserStatus, MODERATION_REASONS, OTHER_REASON,
};
