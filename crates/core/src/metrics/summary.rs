use crate::domain::record::FinancialRecord;
use serde::Serialize;

/// Dashboard totals across every stored record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub record_count: usize,
    pub total_revenue: f64,
    pub total_net_income: f64,
    pub total_assets: f64,
    pub average_profit_margin: f64,
}

pub fn summarize<'a>(records: impl IntoIterator<Item = &'a FinancialRecord>) -> PortfolioSummary {
    let mut out = PortfolioSummary::default();
    for r in records {
        out.record_count += 1;
        out.total_revenue += r.income_statement.revenue;
        out.total_net_income += r.income_statement.net_income;
        out.total_assets += r.balance_sheet.total_assets;
    }
    // Revenue-weighted, not a mean of per-record margins. 0 when there is no revenue to weigh
    // by, including the empty set.
    if out.total_revenue != 0.0 {
        out.average_profit_margin = out.total_net_income / out.total_revenue * 100.0;
    }
    out
}
