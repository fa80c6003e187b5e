//! Ratio engine.
//!
//! [`calculate`] is a pure function of a [`FinancialRecord`]. Division is left unguarded: a zero
//! denominator yields an IEEE infinity (or NaN for 0/0) rather than an error. Callers decide what
//! to show; [`MetricsResult::undefined_ratios`] lists the ratios that have no value at all.

pub mod rating;
pub mod summary;

use crate::domain::record::{FinancialRecord, RecordId};
use crate::error::{Error, Result};
use rating::RatioKind;
use serde::{Deserialize, Serialize};

// Proxies for balance-sheet lines the record does not carry.
const QUICK_ASSET_SHARE: f64 = 0.8;
const CASH_SHARE: f64 = 0.25;
const INVENTORY_SHARE: f64 = 0.15;
const RECEIVABLES_SHARE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityRatios {
    pub current_ratio: f64,
    pub quick_ratio: f64,
    pub cash_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitabilityRatios {
    pub gross_profit_margin: f64,
    pub operating_margin: f64,
    pub net_profit_margin: f64,
    pub return_on_assets: f64,
    pub return_on_equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyRatios {
    pub asset_turnover: f64,
    pub inventory_turnover: f64,
    pub receivables_turnover: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageRatios {
    pub debt_to_equity: f64,
    pub debt_to_assets: f64,
    pub interest_coverage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResult {
    pub financial_data_id: RecordId,
    pub liquidity_ratios: LiquidityRatios,
    pub profitability_ratios: ProfitabilityRatios,
    pub efficiency_ratios: EfficiencyRatios,
    pub leverage_ratios: LeverageRatios,
}

pub fn calculate(record: &FinancialRecord) -> MetricsResult {
    let is = &record.income_statement;
    let bs = &record.balance_sheet;

    MetricsResult {
        financial_data_id: record.id,
        liquidity_ratios: LiquidityRatios {
            current_ratio: bs.current_assets / bs.current_liabilities,
            quick_ratio: (bs.current_assets * QUICK_ASSET_SHARE) / bs.current_liabilities,
            cash_ratio: (bs.current_assets * CASH_SHARE) / bs.current_liabilities,
        },
        profitability_ratios: ProfitabilityRatios {
            gross_profit_margin: is.gross_profit / is.revenue * 100.0,
            operating_margin: is.operating_income / is.revenue * 100.0,
            net_profit_margin: is.net_income / is.revenue * 100.0,
            return_on_assets: is.net_income / bs.total_assets * 100.0,
            return_on_equity: is.net_income / bs.shareholder_equity * 100.0,
        },
        efficiency_ratios: EfficiencyRatios {
            asset_turnover: is.revenue / bs.total_assets,
            inventory_turnover: is.cost_of_goods_sold / (bs.total_assets * INVENTORY_SHARE),
            receivables_turnover: is.revenue / (bs.current_assets * RECEIVABLES_SHARE),
        },
        leverage_ratios: LeverageRatios {
            debt_to_equity: bs.total_liabilities / bs.shareholder_equity,
            debt_to_assets: bs.total_liabilities / bs.total_assets,
            interest_coverage: is.operating_income / is.interest_expense,
        },
    }
}

impl MetricsResult {
    pub fn value(&self, kind: RatioKind) -> f64 {
        let l = &self.liquidity_ratios;
        let p = &self.profitability_ratios;
        let e = &self.efficiency_ratios;
        let v = &self.leverage_ratios;
        match kind {
            RatioKind::CurrentRatio => l.current_ratio,
            RatioKind::QuickRatio => l.quick_ratio,
            RatioKind::CashRatio => l.cash_ratio,
            RatioKind::GrossProfitMargin => p.gross_profit_margin,
            RatioKind::OperatingMargin => p.operating_margin,
            RatioKind::NetProfitMargin => p.net_profit_margin,
            RatioKind::ReturnOnAssets => p.return_on_assets,
            RatioKind::ReturnOnEquity => p.return_on_equity,
            RatioKind::AssetTurnover => e.asset_turnover,
            RatioKind::InventoryTurnover => e.inventory_turnover,
            RatioKind::ReceivablesTurnover => e.receivables_turnover,
            RatioKind::DebtToEquity => v.debt_to_equity,
            RatioKind::DebtToAssets => v.debt_to_assets,
            RatioKind::InterestCoverage => v.interest_coverage,
        }
    }

    pub fn undefined_ratios(&self) -> Vec<&'static str> {
        RatioKind::ALL
            .into_iter()
            .filter(|k| self.value(*k).is_nan())
            .map(RatioKind::key)
            .collect()
    }

    /// Fails with `CalculationUnavailable` when any ratio is NaN. Infinite ratios pass.
    pub fn ensure_defined(self) -> Result<Self> {
        let ratios = self.undefined_ratios();
        if ratios.is_empty() {
            Ok(self)
        } else {
            Err(Error::CalculationUnavailable {
                record_id: self.financial_data_id,
                ratios,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::tests::sample_record;

    const EPS: f64 = 1e-9;

    #[test]
    fn formulas_match_the_ratio_table() {
        let m = calculate(&sample_record(4));
        assert_eq!(m.financial_data_id, 4);

        assert!((m.liquidity_ratios.current_ratio - 2.0).abs() < EPS);
        assert!((m.liquidity_ratios.quick_ratio - 1.6).abs() < EPS);
        assert!((m.liquidity_ratios.cash_ratio - 0.5).abs() < EPS);

        assert!((m.profitability_ratios.gross_profit_margin - 60.0).abs() < EPS);
        assert!((m.profitability_ratios.operating_margin - 40.0).abs() < EPS);
        assert!((m.profitability_ratios.net_profit_margin - 26.25).abs() < EPS);
        assert!((m.profitability_ratios.return_on_assets - 13.125).abs() < EPS);
        assert!((m.profitability_ratios.return_on_equity - 21.875).abs() < EPS);

        assert!((m.efficiency_ratios.asset_turnover - 0.5).abs() < EPS);
        assert!((m.efficiency_ratios.inventory_turnover - 400.0 / 300.0).abs() < EPS);
        assert!((m.efficiency_ratios.receivables_turnover - 1000.0 / 150.0).abs() < EPS);

        assert!((m.leverage_ratios.debt_to_equity - 800.0 / 1200.0).abs() < EPS);
        assert!((m.leverage_ratios.debt_to_assets - 0.4).abs() < EPS);
        assert!((m.leverage_ratios.interest_coverage - 8.0).abs() < EPS);
    }

    #[test]
    fn current_ratio_holds_across_varied_balance_sheets() {
        let mut record = sample_record(1);
        for (ca, cl) in [(1.0, 3.0), (12_345.67, 0.01), (7e9, 3.5e8), (0.0, 42.0)] {
            record.balance_sheet.current_assets = ca;
            record.balance_sheet.current_liabilities = cl;
            let m = calculate(&record);
            assert!((m.liquidity_ratios.current_ratio - ca / cl).abs() < EPS);
        }
    }

    #[test]
    fn repeated_calculation_is_bit_identical() {
        let record = sample_record(9);
        let a = calculate(&record);
        let b = calculate(&record);
        for kind in RatioKind::ALL {
            assert_eq!(a.value(kind).to_bits(), b.value(kind).to_bits());
        }
    }

    #[test]
    fn zero_interest_expense_gives_infinite_coverage() {
        let mut record = sample_record(1);
        record.income_statement.interest_expense = 0.0;
        let m = calculate(&record);
        assert_eq!(m.leverage_ratios.interest_coverage, f64::INFINITY);
        assert!(m.undefined_ratios().is_empty());
        assert!(m.ensure_defined().is_ok());
    }

    #[test]
    fn zero_over_zero_is_reported_as_undefined() {
        let mut record = sample_record(5);
        record.income_statement.revenue = 0.0;
        record.income_statement.gross_profit = 0.0;
        let m = calculate(&record);
        assert_eq!(m.undefined_ratios(), vec!["grossProfitMargin"]);

        match m.ensure_defined() {
            Err(Error::CalculationUnavailable { record_id, ratios }) => {
                assert_eq!(record_id, 5);
                assert_eq!(ratios, vec!["grossProfitMargin"]);
            }
            other => panic!("expected CalculationUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn non_finite_ratios_serialize_as_null() {
        let mut record = sample_record(1);
        record.income_statement.interest_expense = 0.0;
        let v = serde_json::to_value(calculate(&record)).unwrap();
        assert!(v["leverageRatios"]["interestCoverage"].is_null());
        assert_eq!(v["financialDataId"], 1);
    }
}
