use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type RecordId = i64;

// Identities the dashboard expects a record to satisfy. They are reported, never enforced.
const CONSISTENCY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatement {
    pub revenue: f64,
    pub cost_of_goods_sold: f64,
    pub gross_profit: f64,
    pub operating_expenses: f64,
    pub operating_income: f64,
    pub interest_expense: f64,
    pub net_income: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheet {
    pub current_assets: f64,
    pub total_assets: f64,
    pub current_liabilities: f64,
    pub total_liabilities: f64,
    pub shareholder_equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
    pub operating_cash_flow: f64,
    pub investing_cash_flow: f64,
    pub financing_cash_flow: f64,
    pub net_cash_flow: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialRecord {
    pub id: RecordId,
    #[serde(default)]
    pub company_name: Option<String>,
    pub period: String,
    pub income_statement: IncomeStatement,
    pub balance_sheet: BalanceSheet,
    pub cash_flow: CashFlow,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A record as submitted by the data-entry form, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFinancialRecord {
    #[serde(default)]
    pub company_name: Option<String>,
    pub period: String,
    pub income_statement: IncomeStatement,
    pub balance_sheet: BalanceSheet,
    pub cash_flow: CashFlow,
}

/// Partial update. Every field that is present replaces the stored one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub income_statement: Option<IncomeStatement>,
    #[serde(default)]
    pub balance_sheet: Option<BalanceSheet>,
    #[serde(default)]
    pub cash_flow: Option<CashFlow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Inconsistency {
    GrossProfit,
    OperatingIncome,
    ShareholderEquity,
    NetCashFlow,
}

impl Inconsistency {
    pub fn describe(self) -> &'static str {
        match self {
            Inconsistency::GrossProfit => "grossProfit != revenue - costOfGoodsSold",
            Inconsistency::OperatingIncome => "operatingIncome != grossProfit - operatingExpenses",
            Inconsistency::ShareholderEquity => {
                "shareholderEquity != totalAssets - totalLiabilities"
            }
            Inconsistency::NetCashFlow => "netCashFlow != operating + investing + financing",
        }
    }
}

impl FinancialRecord {
    pub fn from_new(id: RecordId, new: NewFinancialRecord, now: DateTime<Utc>) -> Self {
        Self {
            id,
            company_name: new.company_name,
            period: new.period,
            income_statement: new.income_statement,
            balance_sheet: new.balance_sheet,
            cash_flow: new.cash_flow,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_patch(&mut self, patch: RecordPatch, now: DateTime<Utc>) {
        if let Some(company_name) = patch.company_name {
            self.company_name = Some(company_name).filter(|s| !s.trim().is_empty());
        }
        if let Some(period) = patch.period {
            self.period = period;
        }
        if let Some(income) = patch.income_statement {
            self.income_statement = income;
        }
        if let Some(balance) = patch.balance_sheet {
            self.balance_sheet = balance;
        }
        if let Some(cash_flow) = patch.cash_flow {
            self.cash_flow = cash_flow;
        }
        self.updated_at = now;
    }

    pub fn display_name(&self) -> &str {
        self.company_name.as_deref().unwrap_or("Personal profile")
    }

    pub fn inconsistencies(&self) -> Vec<Inconsistency> {
        let is = &self.income_statement;
        let bs = &self.balance_sheet;
        let cf = &self.cash_flow;

        let checks = [
            (
                Inconsistency::GrossProfit,
                is.gross_profit,
                is.revenue - is.cost_of_goods_sold,
            ),
            (
                Inconsistency::OperatingIncome,
                is.operating_income,
                is.gross_profit - is.operating_expenses,
            ),
            (
                Inconsistency::ShareholderEquity,
                bs.shareholder_equity,
                bs.total_assets - bs.total_liabilities,
            ),
            (
                Inconsistency::NetCashFlow,
                cf.net_cash_flow,
                cf.operating_cash_flow + cf.investing_cash_flow + cf.financing_cash_flow,
            ),
        ];

        checks
            .into_iter()
            .filter(|(_, actual, expected)| (actual - expected).abs() > CONSISTENCY_TOLERANCE)
            .map(|(which, _, _)| which)
            .collect()
    }
}
