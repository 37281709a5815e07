use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reasons offered in the warn/ban forms. "Other" switches to free text.
pub const MODERATION_REASONS: &[&str] = &[
    "Harassment or Bullying",
    "Spam or Misleading Content",
    "Scamming or Fraud",
    "Inappropriate Content",
    "Hate Speech",
    "Impersonation",
    "Violation of Community Guidelines",
    OTHER_REASON,
];

pub const OTHER_REASON: &str = "Other";

/// Moderation status of a traveler account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    #[serde(alias = "Active")]
    Active,
    #[serde(alias = "Warned")]
    Warned,
    #[serde(alias = "Banned")]
    Banned,
}

impl UserStatus {
    pub const ALL: [UserStatus; 3] = [UserStatus::Active, UserStatus::Warned, UserStatus::Banned];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Warned => "warned",
            UserStatus::Banned => "banned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(UserStatus::Active),
            "warned" => Some(UserStatus::Warned),
            "banned" => Some(UserStatus::Banned),
            _ => None,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of moderation log the backend creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationKind {
    Warning,
    Ban,
}

impl ModerationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationKind::Warning => "warning",
            ModerationKind::Ban => "ban",
        }
    }

    /// Prefilled duration in days; bans default to ten years
    pub fn default_duration(&self) -> Option<u32> {
        match self {
            ModerationKind::Warning => None,
            ModerationKind::Ban => Some(3650),
        }
    }
}

/// Traveler row as shown in the users table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub warning_count: u32,
    #[serde(default, rename = "moderationLogID", alias = "moderationLogId")]
    pub moderation_log_id: Option<String>,
}

impl User {
    /// A non-active status must point at the log that caused it
    pub fn is_consistent(&self) -> bool {
        match self.status {
            UserStatus::Active => true,
            _ => self.moderation_log_id.is_some(),
        }
    }

    /// Record a confirmed warning
    pub fn apply_warning(&mut self, log_id: String) {
        self.status = UserStatus::Warned;
        self.warning_count = self.warning_count.saturating_add(1);
        self.moderation_log_id = Some(log_id);
    }

    /// Record a confirmed ban
    pub fn apply_ban(&mut self, log_id: String) {
        self.status = UserStatus::Banned;
        self.moderation_log_id = Some(log_id);
    }

    /// Record a confirmed warning removal
    pub fn apply_warning_removal(&mut self) {
        self.warning_count = self.warning_count.saturating_sub(1);
        self.reset_to_active();
    }

    /// Record a confirmed unban/activation
    pub fn reset_to_active(&mut self) {
        self.status = UserStatus::Active;
        self.moderation_log_id = None;
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.username
        } else {
            &self.name
        }
    }
}

/// Detailed profile from `/api/user/secure-profile/:id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub warning_count: u32,
    #[serde(default, rename = "moderationLogID", alias = "moderationLogId")]
    pub moderation_log_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Filters for `/api/user/filtered-users`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl UserFilter {
    /// Query pairs with empty values dropped
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                pairs.push(("search", search.to_string()));
            }
        }
        pairs
    }
}
