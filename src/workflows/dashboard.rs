use super::agencies::{count_agencies, AgencyCounts};
use super::revenue::RevenueReport;
use crate::models::{Agency, Alert, AlertStatus, Application, SafetyLog, User, UserStatus};

/// Numbers shown on the dashboard cards
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub total_users: usize,
    pub warned_users: usize,
    pub banned_users: usize,
    pub active_alerts: usize,
    pub total_alerts: usize,
    pub open_emergencies: usize,
    pub agencies: AgencyCounts,
    pub open_applications: usize,
    pub total_revenue: f64,
    pub revenue_growth: Option<f64>,
}

impl DashboardSummary {
    pub fn build(
        users: &[User],
        alerts: &[Alert],
        safety_logs: &[SafetyLog],
        agencies: &[Agency],
        applications: &[Application],
        revenue: &RevenueReport,
    ) -> Self {
        let with_status = |status: UserStatus| users.iter().filter(|u| u.status == status).count();
        Self {
            total_users: users.len(),
            warned_users: with_status(UserStatus::Warned),
            banned_users: with_status(UserStatus::Banned),
            active_alerts: alerts
                .iter()
                .filter(|a| a.status == AlertStatus::Active)
                .count(),
            total_alerts: alerts.len(),
            open_emergencies: safety_logs
                .iter()
                .filter(|l| !matches!(l.status.as_str(), "resolved" | "closed"))
                .count(),
            agencies: count_agencies(agencies),
            open_applications: applications.iter().filter(|a| a.status.is_open()).count(),
            total_revenue: revenue.total_revenue(),
            revenue_growth: revenue.month_over_month_growth(),
        }
    }
}
