use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::time::normalize_timestamp;

/// Emergency/safety log as the backend sends it
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyLogRecord {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, rename = "userID", alias = "userId")]
    pub user_id: Option<String>,
    #[serde(default, alias = "name")]
    pub user_name: Option<String>,
    #[serde(default, rename = "type", alias = "emergencyType")]
    pub kind: Option<String>,
    #[serde(default, alias = "description")]
    pub message: Option<String>,
    #[serde(default)]
    pub location: Value,
    #[serde(default, alias = "createdAt")]
    pub timestamp: Value,
    #[serde(default)]
    pub status: Option<String>,
}

/// Safety log row as shown in the emergency monitor
#[derive(Debug, Clone, PartialEq)]
pub struct SafetyLog {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub kind: String,
    pub message: String,
    pub location: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub status: String,
}

impl From<SafetyLogRecord> for SafetyLog {
    fn from(record: SafetyLogRecord) -> Self {
        Self {
            id: record.id,
            user_id: record.user_id.unwrap_or_default(),
            user_name: record.user_name.unwrap_or_else(|| "Unknown".to_string()),
            kind: record.kind.unwrap_or_else(|| "other".to_string()),
            message: record.message.unwrap_or_default(),
            location: describe_location(&record.location),
            timestamp: normalize_timestamp(&record.timestamp),
            status: record.status.unwrap_or_else(|| "pending".to_string()),
        }
    }
}

/// Locations are either free text or a coordinate object
fn describe_location(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => {
            let lat = map
                .get("latitude")
                .or_else(|| map.get("lat"))
                .and_then(Value::as_f64);
            let lng = map
                .get("longitude")
                .or_else(|| map.get("lng"))
                .and_then(Value::as_f64);
            match (lat, lng) {
                (Some(lat), Some(lng)) => format!("{:.5}, {:.5}", lat, lng),
                _ => map
                    .get("address")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            }
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_normalization() {
        let record: SafetyLogRecord = serde_json::from_value(json!({
            "_id": "s1",
            "userID": "U9",
            "userName": "Maria",
            "emergencyType": "medical",
            "message": "Needs help",
            "location": { "latitude": 10.3157, "longitude": 123.8854 },
            "createdAt": { "_seconds": 1704067200, "_nanoseconds": 0 }
        }))
        .unwrap();

        let log = SafetyLog::from(record);
        assert_eq!(log.kind, "medical");
        assert_eq!(log.location, "10.31570, 123.88540");
        assert_eq!(log.timestamp.map(|t| t.timestamp()), Some(1704067200));
        assert_eq!(log.status, "pending");
    }

    #[test]
    fn test_minimal_record() {
        let record: SafetyLogRecord =
            serde_json::from_value(json!({ "id": "s2", "location": "Moalboal" })).unwrap();
        let log = SafetyLog::from(record);
        assert_eq!(log.user_name, "Unknown");
        assert_eq!(log.location, "Moalboal");
        assert_eq!(log.timestamp, None);
    }
}
