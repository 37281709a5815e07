//! Revenue analytics over the sample series
//!
//! Read-only. Totals, growth and shares are computed from the series on
//! every render.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRevenue {
    pub month: &'static str,
    pub bookings: f64,
    pub commissions: f64,
    pub ads: f64,
}

impl MonthlyRevenue {
    pub fn total(&self) -> f64 {
        self.bookings + self.commissions + self.ads
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgencyCommission {
    pub agency: &'static str,
    pub bookings: u32,
    pub booking_value: f64,
    /// Fraction of booking value kept by the platform
    pub rate: f64,
}

impl AgencyCommission {
    pub fn amount(&self) -> f64 {
        self.booking_value * self.rate
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdPlacement {
    pub advertiser: &'static str,
    pub placement: &'static str,
    pub impressions: u64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: &'static str,
    pub date: NaiveDate,
    pub description: &'static str,
    pub kind: &'static str,
    pub amount: f64,
}

/// Share of one revenue source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceShare {
    pub source: &'static str,
    pub amount: f64,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevenueReport {
    pub monthly: Vec<MonthlyRevenue>,
    pub commissions: Vec<AgencyCommission>,
    pub ads: Vec<AdPlacement>,
    pub transactions: Vec<Transaction>,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

impl RevenueReport {
    pub fn sample() -> Self {
        let month =
            |month: &'static str, bookings: f64, commissions: f64, ads: f64| MonthlyRevenue {
                month,
                bookings,
                commissions,
                ads,
            };
        Self {
            monthly: vec![
                month("Jul", 182_000.0, 27_300.0, 9_800.0),
                month("Aug", 195_500.0, 29_325.0, 10_250.0),
                month("Sep", 171_200.0, 25_680.0, 9_100.0),
                month("Oct", 208_900.0, 31_335.0, 11_400.0),
                month("Nov", 226_300.0, 33_945.0, 12_050.0),
                month("Dec", 254_800.0, 38_220.0, 14_600.0),
            ],
            commissions: vec![
                AgencyCommission { agency: "Island Hoppers Travel", bookings: 142, booking_value: 568_000.0, rate: 0.15 },
                AgencyCommission { agency: "Mountain Trail Adventures", bookings: 76, booking_value: 243_200.0, rate: 0.12 },
                AgencyCommission { agency: "Siargao Surf Camps", bookings: 98, booking_value: 352_800.0, rate: 0.15 },
                AgencyCommission { agency: "Bohol Countryside Tours", bookings: 41, booking_value: 110_700.0, rate: 0.10 },
            ],
            ads: vec![
                AdPlacement { advertiser: "Cebu Pacific", placement: "Home banner", impressions: 412_000, revenue: 24_500.0 },
                AdPlacement { advertiser: "Shangri-La Mactan", placement: "Search results", impressions: 186_500, revenue: 15_200.0 },
                AdPlacement { advertiser: "Globe Telecom", placement: "Trip details", impressions: 98_300, revenue: 7_800.0 },
            ],
            transactions: vec![
                Transaction { id: "TX-9001", date: date(2024, 12, 30), description: "Island Hoppers Travel payout", kind: "payout", amount: -48_200.0 },
                Transaction { id: "TX-9000", date: date(2024, 12, 29), description: "Cebu Pacific ad invoice", kind: "ad", amount: 8_500.0 },
                Transaction { id: "TX-8999", date: date(2024, 12, 28), description: "Booking commission, Siargao Surf Camps", kind: "commission", amount: 3_150.0 },
                Transaction { id: "TX-8998", date: date(2024, 12, 27), description: "Booking commission, Island Hoppers Travel", kind: "commission", amount: 2_700.0 },
                Transaction { id: "TX-8997", date: date(2024, 12, 26), description: "Refund, cancelled Bohol tour", kind: "refund", amount: -1_200.0 },
            ],
        }
    }

    pub fn total_revenue(&self) -> f64 {
        self.monthly.iter().map(MonthlyRevenue::total).sum()
    }

    pub fn total_commissions(&self) -> f64 {
        self.commissions.iter().map(AgencyCommission::amount).sum()
    }

    pub fn total_ad_revenue(&self) -> f64 {
        self.ads.iter().map(|a| a.revenue).sum()
    }

    /// Percent change of the latest month over the one before it
    pub fn month_over_month_growth(&self) -> Option<f64> {
        let [.., previous, latest] = self.monthly.as_slice() else {
            return None;
        };
        let previous = previous.total();
        if previous == 0.0 {
            return None;
        }
        Some((latest.total() - previous) / previous * 100.0)
    }

    /// Largest monthly total, used to scale the bar chart
    pub fn peak_month(&self) -> f64 {
        self.monthly
            .iter()
            .map(MonthlyRevenue::total)
            .fold(0.0, f64::max)
    }

    /// Bookings, commissions and ads as shares of all revenue
    pub fn source_shares(&self) -> Vec<SourceShare> {
        let sources = [
            ("Bookings", self.monthly.iter().map(|m| m.bookings).sum::<f64>()),
            ("Commissions", self.monthly.iter().map(|m| m.commissions).sum()),
            ("Advertising", self.monthly.iter().map(|m| m.ads).sum()),
        ];
        let total: f64 = sources.iter().map(|(_, amount)| amount).sum();
        sources
            .into_iter()
            .map(|(source, amount)| SourceShare {
                source,
                amount,
                percent: if total > 0.0 { amount / total * 100.0 } else { 0.0 },
            })
            .collect()
    }
}

/// `₱1,234,567.89`
pub fn format_peso(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}₱{}.{:02}", sign, grouped, cents % 100)
}
