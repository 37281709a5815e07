//! Admin activity trail
//!
//! Best-effort: a failed write is logged and never fails the action that
//! triggered it. The REST endpoint is optional on some deployments, so a 404
//! from it is ignored without a warning.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::backend::ActivityApi;
use crate::error::Result;
use crate::firebase::ActivitySink;
use crate::models::ActivityEntry;
use crate::session::AdminSession;

#[derive(Clone)]
pub struct ActivityLogger {
    rest: Arc<dyn ActivityApi>,
    sink: Option<Arc<dyn ActivitySink>>,
}

impl ActivityLogger {
    pub fn new(rest: Arc<dyn ActivityApi>, sink: Option<Arc<dyn ActivitySink>>) -> Self {
        Self { rest, sink }
    }

    /// Record an action for the session's admin
    pub async fn record(&self, session: &AdminSession, action: &str, details: &str) {
        let admin_id = session.admin_id.clone().unwrap_or_default();
        let entry = ActivityEntry::new(admin_id, session.admin_name(), action, details);

        if let (Some(sink), Some(id_token)) = (&self.sink, session.firebase_token()) {
            if let Err(e) = sink.append(id_token, &entry).await {
                warn!("Failed to write activity to Firestore: {}", e);
            }
        }

        let Ok(token) = session.token() else {
            debug!("No access token, skipping activity endpoint");
            return;
        };
        match self.rest.record_activity(token, &entry).await {
            Ok(()) => debug!("Recorded activity: {}", action),
            Err(e) if e.is_not_found_response() => {}
            Err(e) => warn!("Failed to record activity '{}': {}", action, e),
        }
    }

    pub async fn recent(&self, session: &AdminSession, limit: usize) -> Result<Vec<ActivityEntry>> {
        self.rest.recent_activity(session.token()?, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{admin_profile, FakeBackend};
    use crate::firebase::FirebaseSession;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        entries: Mutex<Vec<(String, ActivityEntry)>>,
    }

    #[async_trait]
    impl ActivitySink for RecordingSink {
        async fn append(&self, id_token: &str, entry: &ActivityEntry) -> Result<()> {
            self.entries
                .lock()
                .push((id_token.to_string(), entry.clone()));
            Ok(())
        }
    }

    fn session() -> AdminSession {
        AdminSession::new("tok".to_string(), Some(admin_profile()), 60)
    }

    #[tokio::test]
    async fn test_404_is_swallowed() {
        let api = Arc::new(FakeBackend::new());
        *api.activity_status.lock() = Some(404);
        let logger = ActivityLogger::new(api.clone(), None);

        logger.record(&session(), "Deleted user", "U1").await;
        assert_eq!(api.calls_to("/api/admin-activity/log").len(), 1);
        assert!(api.activity.lock().is_empty());
    }

    #[tokio::test]
    async fn test_firestore_gets_entry_when_signed_in() {
        let api = Arc::new(FakeBackend::new());
        let sink = Arc::new(RecordingSink::default());
        let logger = ActivityLogger::new(api.clone(), Some(sink.clone()));

        logger.record(&session(), "Banned user", "U1").await;
        assert!(sink.entries.lock().is_empty());

        let mut signed_in = session();
        signed_in.firebase = Some(FirebaseSession {
            id_token: "fb".to_string(),
            local_id: "uid".to_string(),
            expires_at: Utc::now() + Duration::hours(1),
        });
        logger.record(&signed_in, "Banned user", "U2").await;

        let entries = sink.entries.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "fb");
        assert_eq!(entries[0].1.admin_id, "A1");
        assert_eq!(api.activity.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_recent() {
        let api = Arc::new(FakeBackend::new());
        let logger = ActivityLogger::new(api.clone(), None);
        logger.record(&session(), "Login", "").await;
        logger.record(&session(), "Deleted alert", "a1").await;

        let recent = logger.recent(&session(), 1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].action, "Deleted alert");
    }
}
