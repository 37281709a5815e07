//! Emergency (safety) log monitoring

use std::cmp::Reverse;

use tracing::info;

use crate::backend::{SafetyApi, SafetyFilter};
use crate::error::{AdminError, Result};
use crate::models::SafetyLog;
use crate::session::AdminSession;

/// Emergency types offered in the filter dropdown
pub const EMERGENCY_TYPES: &[&str] = &["medical", "accident", "crime", "natural_disaster", "lost", "other"];

#[derive(Debug, Default)]
pub struct SafetyBoard {
    logs: Vec<SafetyLog>,
    filter: SafetyFilter,
}

impl SafetyBoard {
    pub fn logs(&self) -> &[SafetyLog] {
        &self.logs
    }

    pub fn filter(&self) -> &SafetyFilter {
        &self.filter
    }

    pub fn get(&self, log_id: &str) -> Option<&SafetyLog> {
        self.logs.iter().find(|l| l.id == log_id)
    }

    /// Load logs newest first; logs without a usable timestamp go last
    pub async fn refresh<A: SafetyApi + ?Sized>(
        &mut self,
        api: &A,
        session: &AdminSession,
        filter: SafetyFilter,
    ) -> Result<()> {
        let records = api.filtered_logs(session.token()?, &filter).await?;
        let mut logs: Vec<SafetyLog> = records.into_iter().map(SafetyLog::from).collect();
        logs.sort_by_key(|log| Reverse(log.timestamp));
        self.logs = logs;
        self.filter = filter;
        Ok(())
    }

    pub async fn delete<A: SafetyApi + ?Sized>(
        &mut self,
        api: &A,
        session: &AdminSession,
        log_id: &str,
    ) -> Result<()> {
        let token = session.token()?;
        if self.get(log_id).is_none() {
            return Err(AdminError::not_found("Safety log", log_id));
        }

        api.delete_log(token, log_id).await?;

        info!("Deleted safety log {}", log_id);
        self.logs.retain(|l| l.id != log_id);
        Ok(())
    }
}
