//! Revenue analytics page

use axum::{extract::State, http::HeaderMap, response::Response, routing::get, Router};

use super::admin::{render, require_auth, AdminState};
use super::layout::{badge, html_escape, Nav};
use crate::workflows::revenue::format_peso;
use crate::workflows::RevenueReport;

pub fn routes() -> Router<AdminState> {
    Router::new().route("/revenue", get(revenue_page))
}

fn revenue_body(report: &RevenueReport) -> String {
    let peak = report.peak_month();
    let bars: String = report
        .monthly
        .iter()
        .map(|month| {
            let width = if peak > 0.0 {
                month.total() / peak * 100.0
            } else {
                0.0
            };
            format!(
                r#"<div class="bar-row"><span class="bar-label">{}</span><div class="bar-track"><div class="bar" style="width: {:.1}%"></div></div><span>{}</span></div>"#,
                month.month,
                width,
                format_peso(month.total())
            )
        })
        .collect();

    let shares: String = report
        .source_shares()
        .iter()
        .map(|share| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{:.1}%</td></tr>",
                share.source,
                format_peso(share.amount),
                share.percent
            )
        })
        .collect();

    let commissions: String = report
        .commissions
        .iter()
        .map(|c| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.0}%</td><td>{}</td></tr>",
                html_escape(c.agency),
                c.bookings,
                format_peso(c.booking_value),
                c.rate * 100.0,
                format_peso(c.amount())
            )
        })
        .collect();

    let ads: String = report
        .ads
        .iter()
        .map(|ad| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                html_escape(ad.advertiser),
                html_escape(ad.placement),
                ad.impressions,
                format_peso(ad.revenue)
            )
        })
        .collect();

    let transactions: String = report
        .transactions
        .iter()
        .map(|tx| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                tx.id,
                tx.date.format("%Y-%m-%d"),
                html_escape(tx.description),
                badge(tx.kind, tx.kind),
                format_peso(tx.amount)
            )
        })
        .collect();

    let growth = report
        .month_over_month_growth()
        .map(|g| format!("{:+.1}%", g))
        .unwrap_or_else(|| "n/a".to_string());

    format!(
        r#"<div class="cards">
    <div class="card stat"><div class="value">{total}</div><div class="label">Total revenue</div></div>
    <div class="card stat"><div class="value">{growth}</div><div class="label">Month over month</div></div>
    <div class="card stat"><div class="value">{commission_total}</div><div class="label">Agency commissions</div></div>
    <div class="card stat"><div class="value">{ad_total}</div><div class="label">Advertising</div></div>
</div>
<h3>Monthly revenue</h3>
<div class="card">{bars}</div>
<h3>Revenue sources</h3>
<table><tr><th>Source</th><th>Amount</th><th>Share</th></tr>{shares}</table>
<h3>Agency commissions</h3>
<table><tr><th>Agency</th><th>Bookings</th><th>Booking value</th><th>Rate</th><th>Commission</th></tr>{commissions}</table>
<h3>Advertising</h3>
<table><tr><th>Advertiser</th><th>Placement</th><th>Impressions</th><th>Revenue</th></tr>{ads}</table>
<h3>Recent transactions</h3>
<table><tr><th>ID</th><th>Date</th><th>Description</th><th>Type</th><th>Amount</th></tr>{transactions}</table>"#,
        total = format_peso(report.total_revenue()),
        growth = growth,
        commission_total = format_peso(report.total_commissions()),
        ad_total = format_peso(report.total_ad_revenue()),
        bars = bars,
        shares = shares,
        commissions = commissions,
        ads = ads,
        transactions = transactions,
    )
}

/// GET /admin/revenue
async fn revenue_page(headers: HeaderMap, State(state): State<AdminState>) -> Response {
    let authed = match require_auth(&headers, &state).await {
        Ok(a) => a,
        Err(redirect) => return redirect,
    };
    let body = revenue_body(&RevenueReport::sample());
    let mut ws = authed.workspace.lock().await;
    render(&authed.session, &mut ws, "Revenue", Nav::Revenue, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_lists_every_section() {
        let report = RevenueReport::sample();
        let html = revenue_body(&report);

        assert!(html.contains(&format_peso(report.total_revenue())));
        assert!(html.contains("Island Hoppers Travel"));
        assert!(html.contains("TX-9001"));
        assert_eq!(html.matches(r#"class="bar-row""#).count(), report.monthly.len());
    }
}
