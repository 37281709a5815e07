use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit trail entry: which admin did what
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    #[serde(rename = "adminID", alias = "adminId")]
    pub admin_id: String,
    #[serde(default)]
    pub admin_name: String,
    pub action: String,
    #[serde(default)]
    pub details: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn new(
        admin_id: impl Into<String>,
        admin_name: impl Into<String>,
        action: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            admin_id: admin_id.into(),
            admin_name: admin_name.into(),
            action: action.into(),
            details: details.into(),
            timestamp: Utc::now(),
        }
    }

    /// Document body for the Firestore REST API
    pub fn to_firestore_document(&self) -> serde_json::Value {
        serde_json::json!({
            "fields": {
                "adminId": { "stringValue": self.admin_id },
                "adminName": { "stringValue": self.admin_name },
                "action": { "stringValue": self.action },
                "details": { "stringValue": self.details },
                "timestamp": { "timestampValue": self.timestamp.to_rfc3339() }
            }
        })
    }
}
