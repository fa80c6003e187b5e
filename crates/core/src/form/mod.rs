//! Data-entry form state.
//!
//! Numeric inputs are held as [`Entry`] so that "unset" and "zero" stay distinct. Editing a field
//! through [`FormDraft::edit`] recomputes the derived totals (see [`derive`]), and
//! [`FormDraft::into_new_record`] is the only path from a draft to something the store accepts.

pub mod derive;
pub mod validation;

use crate::domain::record::{BalanceSheet, CashFlow, IncomeStatement, NewFinancialRecord};
use crate::error::{Error, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(Option<f64>);

impl Entry {
    pub const UNSET: Entry = Entry(None);

    pub fn new(value: f64) -> Self {
        Self(Some(value))
    }

    pub fn value(self) -> Option<f64> {
        self.0
    }

    pub fn is_set(self) -> bool {
        self.0.is_some()
    }

    /// Parses raw input text. Blank text clears the entry.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(Self::UNSET);
        }
        let value: f64 = text
            .replace(',', "")
            .parse()
            .with_context(|| format!("not a number: {text:?}"))?;
        anyhow::ensure!(value.is_finite(), "value must be finite (got {text:?})");
        Ok(Self::new(value))
    }

    fn or_zero(self) -> f64 {
        self.0.unwrap_or(0.0)
    }
}

impl From<f64> for Entry {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncomeField {
    Revenue,
    CostOfGoodsSold,
    GrossProfit,
    OperatingExpenses,
    OperatingIncome,
    InterestExpense,
    NetIncome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BalanceField {
    CurrentAssets,
    TotalAssets,
    CurrentLiabilities,
    TotalLiabilities,
    ShareholderEquity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CashFlowField {
    OperatingCashFlow,
    InvestingCashFlow,
    FinancingCashFlow,
    NetCashFlow,
}

/// A numeric form field, addressed by statement section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Income(IncomeField),
    Balance(BalanceField),
    CashFlow(CashFlowField),
}

impl Field {
    pub const ALL: [Field; 16] = [
        Field::Income(IncomeField::Revenue),
        Field::Income(IncomeField::CostOfGoodsSold),
        Field::Income(IncomeField::GrossProfit),
        Field::Income(IncomeField::OperatingExpenses),
        Field::Income(IncomeField::OperatingIncome),
        Field::Income(IncomeField::InterestExpense),
        Field::Income(IncomeField::NetIncome),
        Field::Balance(BalanceField::CurrentAssets),
        Field::Balance(BalanceField::TotalAssets),
        Field::Balance(BalanceField::CurrentLiabilities),
        Field::Balance(BalanceField::TotalLiabilities),
        Field::Balance(BalanceField::ShareholderEquity),
        Field::CashFlow(CashFlowField::OperatingCashFlow),
        Field::CashFlow(CashFlowField::InvestingCashFlow),
        Field::CashFlow(CashFlowField::FinancingCashFlow),
        Field::CashFlow(CashFlowField::NetCashFlow),
    ];

    pub fn path(self) -> &'static str {
        match self {
            Field::Income(f) => match f {
                IncomeField::Revenue => "incomeStatement.revenue",
                IncomeField::CostOfGoodsSold => "incomeStatement.costOfGoodsSold",
                IncomeField::GrossProfit => "incomeStatement.grossProfit",
                IncomeField::OperatingExpenses => "incomeStatement.operatingExpenses",
                IncomeField::OperatingIncome => "incomeStatement.operatingIncome",
                IncomeField::InterestExpense => "incomeStatement.interestExpense",
                IncomeField::NetIncome => "incomeStatement.netIncome",
            },
            Field::Balance(f) => match f {
                BalanceField::CurrentAssets => "balanceSheet.currentAssets",
                BalanceField::TotalAssets => "balanceSheet.totalAssets",
                BalanceField::CurrentLiabilities => "balanceSheet.currentLiabilities",
                BalanceField::TotalLiabilities => "balanceSheet.totalLiabilities",
                BalanceField::ShareholderEquity => "balanceSheet.shareholderEquity",
            },
            Field::CashFlow(f) => match f {
                CashFlowField::OperatingCashFlow => "cashFlow.operatingCashFlow",
                CashFlowField::InvestingCashFlow => "cashFlow.investingCashFlow",
                CashFlowField::FinancingCashFlow => "cashFlow.financingCashFlow",
                CashFlowField::NetCashFlow => "cashFlow.netCashFlow",
            },
        }
    }

    pub fn from_path(path: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.path() == path)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl Serialize for Field {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.path())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let path = String::deserialize(deserializer)?;
        Field::from_path(&path)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown form field: {path}")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IncomeDraft {
    pub revenue: Entry,
    pub cost_of_goods_sold: Entry,
    pub gross_profit: Entry,
    pub operating_expenses: Entry,
    pub operating_income: Entry,
    pub interest_expense: Entry,
    pub net_income: Entry,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BalanceDraft {
    pub current_assets: Entry,
    pub total_assets: Entry,
    pub current_liabilities: Entry,
    pub total_liabilities: Entry,
    pub shareholder_equity: Entry,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CashFlowDraft {
    pub operating_cash_flow: Entry,
    pub investing_cash_flow: Entry,
    pub financing_cash_flow: Entry,
    pub net_cash_flow: Entry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormDraft {
    pub company_name: String,
    pub period: String,
    pub income_statement: IncomeDraft,
    pub balance_sheet: BalanceDraft,
    pub cash_flow: CashFlowDraft,
}

impl FormDraft {
    pub fn get(&self, field: Field) -> Entry {
        match field {
            Field::Income(f) => {
                let s = &self.income_statement;
                match f {
                    IncomeField::Revenue => s.revenue,
                    IncomeField::CostOfGoodsSold => s.cost_of_goods_sold,
                    IncomeField::GrossProfit => s.gross_profit,
                    IncomeField::OperatingExpenses => s.operating_expenses,
                    IncomeField::OperatingIncome => s.operating_income,
                    IncomeField::InterestExpense => s.interest_expense,
                    IncomeField::NetIncome => s.net_income,
                }
            }
            Field::Balance(f) => {
                let s = &self.balance_sheet;
                match f {
                    BalanceField::CurrentAssets => s.current_assets,
                    BalanceField::TotalAssets => s.total_assets,
                    BalanceField::CurrentLiabilities => s.current_liabilities,
                    BalanceField::TotalLiabilities => s.total_liabilities,
                    BalanceField::ShareholderEquity => s.shareholder_equity,
                }
            }
            Field::CashFlow(f) => {
                let s = &self.cash_flow;
                match f {
                    CashFlowField::OperatingCashFlow => s.operating_cash_flow,
                    CashFlowField::InvestingCashFlow => s.investing_cash_flow,
                    CashFlowField::FinancingCashFlow => s.financing_cash_flow,
                    CashFlowField::NetCashFlow => s.net_cash_flow,
                }
            }
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Entry {
        match field {
            Field::Income(f) => {
                let s = &mut self.income_statement;
                match f {
                    IncomeField::Revenue => &mut s.revenue,
                    IncomeField::CostOfGoodsSold => &mut s.cost_of_goods_sold,
                    IncomeField::GrossProfit => &mut s.gross_profit,
                    IncomeField::OperatingExpenses => &mut s.operating_expenses,
                    IncomeField::OperatingIncome => &mut s.operating_income,
                    IncomeField::InterestExpense => &mut s.interest_expense,
                    IncomeField::NetIncome => &mut s.net_income,
                }
            }
            Field::Balance(f) => {
                let s = &mut self.balance_sheet;
                match f {
                    BalanceField::CurrentAssets => &mut s.current_assets,
                    BalanceField::TotalAssets => &mut s.total_assets,
                    BalanceField::CurrentLiabilities => &mut s.current_liabilities,
                    BalanceField::TotalLiabilities => &mut s.total_liabilities,
                    BalanceField::ShareholderEquity => &mut s.shareholder_equity,
                }
            }
            Field::CashFlow(f) => {
                let s = &mut self.cash_flow;
                match f {
                    CashFlowField::OperatingCashFlow => &mut s.operating_cash_flow,
                    CashFlowField::InvestingCashFlow => &mut s.investing_cash_flow,
                    CashFlowField::FinancingCashFlow => &mut s.financing_cash_flow,
                    CashFlowField::NetCashFlow => &mut s.net_cash_flow,
                }
            }
        }
    }

    /// Sets a field and recomputes every derived field that depends on it.
    pub fn edit(&mut self, field: Field, value: impl Into<Entry>) {
        *self.slot_mut(field) = value.into();
        derive::propagate(self, field);
    }

    pub fn clear(&mut self, field: Field) {
        self.edit(field, Entry::UNSET);
    }

    pub fn into_new_record(self) -> Result<NewFinancialRecord> {
        let errors = validation::validate(&self);
        if !errors.is_empty() {
            return Err(Error::ValidationFailed(errors));
        }

        let is = self.income_statement;
        let bs = self.balance_sheet;
        let cf = self.cash_flow;

        Ok(NewFinancialRecord {
            company_name: Some(self.company_name.trim().to_string()).filter(|s| !s.is_empty()),
            period: self.period.trim().to_string(),
            income_statement: IncomeStatement {
                revenue: is.revenue.or_zero(),
                cost_of_goods_sold: is.cost_of_goods_sold.or_zero(),
                gross_profit: is.gross_profit.or_zero(),
                operating_expenses: is.operating_expenses.or_zero(),
                operating_income: is.operating_income.or_zero(),
                interest_expense: is.interest_expense.or_zero(),
                net_income: is.net_income.or_zero(),
            },
            balance_sheet: BalanceSheet {
                current_assets: bs.current_assets.or_zero(),
                total_assets: bs.total_assets.or_zero(),
                current_liabilities: bs.current_liabilities.or_zero(),
                total_liabilities: bs.total_liabilities.or_zero(),
                shareholder_equity: bs.shareholder_equity.or_zero(),
            },
            cash_flow: CashFlow {
                operating_cash_flow: cf.operating_cash_flow.or_zero(),
                investing_cash_flow: cf.investing_cash_flow.or_zero(),
                financing_cash_flow: cf.financing_cash_flow.or_zero(),
                net_cash_flow: cf.net_cash_flow.or_zero(),
            },
        })
    }
}
