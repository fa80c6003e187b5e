use super::{BalanceField, CashFlowField, Field, FormDraft, IncomeField};

/// Flat rate applied when deriving net income from operating income.
pub const TAX_RATE: f64 = 0.25;

const REVENUE: Field = Field::Income(IncomeField::Revenue);
const COGS: Field = Field::Income(IncomeField::CostOfGoodsSold);
const GROSS_PROFIT: Field = Field::Income(IncomeField::GrossProfit);
const OPEX: Field = Field::Income(IncomeField::OperatingExpenses);
const OPERATING_INCOME: Field = Field::Income(IncomeField::OperatingIncome);
const INTEREST: Field = Field::Income(IncomeField::InterestExpense);
const NET_INCOME: Field = Field::Income(IncomeField::NetIncome);
const TOTAL_ASSETS: Field = Field::Balance(BalanceField::TotalAssets);
const TOTAL_LIABILITIES: Field = Field::Balance(BalanceField::TotalLiabilities);
const EQUITY: Field = Field::Balance(BalanceField::ShareholderEquity);
const OPERATING_CF: Field = Field::CashFlow(CashFlowField::OperatingCashFlow);
const INVESTING_CF: Field = Field::CashFlow(CashFlowField::InvestingCashFlow);
const FINANCING_CF: Field = Field::CashFlow(CashFlowField::FinancingCashFlow);
const NET_CF: Field = Field::CashFlow(CashFlowField::NetCashFlow);

pub struct DerivedRule {
    pub target: Field,
    pub sources: &'static [Field],
    formula: fn(&[f64]) -> f64,
}

impl DerivedRule {
    /// `None` while any source is unset.
    pub fn evaluate(&self, draft: &FormDraft) -> Option<f64> {
        let values = self
            .sources
            .iter()
            .map(|f| draft.get(*f).value())
            .collect::<Option<Vec<f64>>>()?;
        Some((self.formula)(&values))
    }
}

pub static RULES: [DerivedRule; 5] = [
    DerivedRule {
        target: GROSS_PROFIT,
        sources: &[REVENUE, COGS],
        formula: |v| v[0] - v[1],
    },
    DerivedRule {
        target: OPERATING_INCOME,
        sources: &[GROSS_PROFIT, OPEX],
        formula: |v| v[0] - v[1],
    },
    DerivedRule {
        target: NET_INCOME,
        sources: &[OPERATING_INCOME, INTEREST],
        formula: |v| (v[0] - v[1]) * (1.0 - TAX_RATE),
    },
    DerivedRule {
        target: EQUITY,
        sources: &[TOTAL_ASSETS, TOTAL_LIABILITIES],
        formula: |v| v[0] - v[1],
    },
    DerivedRule {
        target: NET_CF,
        sources: &[OPERATING_CF, INVESTING_CF, FINANCING_CF],
        formula: |v| v[0] + v[1] + v[2],
    },
];

/// Recomputes the targets of the rules that read `changed` directly. A recomputed target is not
/// fed onward. Targets whose sources are not all present keep their previous value.
pub(crate) fn propagate(draft: &mut FormDraft, changed: Field) {
    for rule in RULES.iter().filter(|r| r.sources.contains(&changed)) {
        if let Some(value) = rule.evaluate(draft) {
            *draft.slot_mut(rule.target) = value.into();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Entry;

    #[test]
    fn income_chain_fills_in_step_by_step() {
        let mut d = FormDraft::default();
        d.edit(REVENUE, 1000.0);
        assert_eq!(d.get(GROSS_PROFIT), Entry::UNSET);

        d.edit(COGS, 400.0);
        assert_eq!(d.get(GROSS_PROFIT).value(), Some(600.0));

        d.edit(OPEX, 200.0);
        assert_eq!(d.get(OPERATING_INCOME).value(), Some(400.0));

        d.edit(INTEREST, 50.0);
        assert_eq!(d.get(NET_INCOME).value(), Some(262.5));
    }

    #[test]
    fn upstream_edit_only_touches_direct_targets() {
        let mut d = FormDraft::default();
        d.edit(REVENUE, 1000.0);
        d.edit(COGS, 400.0);
        d.edit(OPEX, 200.0);
        d.edit(INTEREST, 50.0);

        d.edit(REVENUE, 1200.0);
        assert_eq!(d.get(GROSS_PROFIT).value(), Some(800.0));
        assert_eq!(d.get(OPERATING_INCOME).value(), Some(400.0));
        assert_eq!(d.get(NET_INCOME).value(), Some(262.5));

        d.edit(OPEX, 200.0);
        assert_eq!(d.get(OPERATING_INCOME).value(), Some(600.0));
        assert_eq!(d.get(NET_INCOME).value(), Some(262.5));
    }

    #[test]
    fn zero_counts_as_present() {
        let mut d = FormDraft::default();
        d.edit(REVENUE, 500.0);
        d.edit(COGS, 0.0);
        assert_eq!(d.get(GROSS_PROFIT).value(), Some(500.0));

        d.edit(TOTAL_ASSETS, 0.0);
        d.edit(TOTAL_LIABILITIES, 0.0);
        assert_eq!(d.get(EQUITY).value(), Some(0.0));
    }

    #[test]
    fn clearing_a_source_keeps_previous_target() {
        let mut d = FormDraft::default();
        d.edit(TOTAL_ASSETS, 900.0);
        d.edit(TOTAL_LIABILITIES, 300.0);
        assert_eq!(d.get(EQUITY).value(), Some(600.0));

        d.clear(TOTAL_LIABILITIES);
        assert_eq!(d.get(EQUITY).value(), Some(600.0));
    }

    #[test]
    fn net_cash_flow_needs_all_three_components() {
        let mut d = FormDraft::default();
        d.edit(OPERATING_CF, 300.0);
        d.edit(INVESTING_CF, -120.0);
        assert_eq!(d.get(NET_CF), Entry::UNSET);

        d.edit(FINANCING_CF, 0.0);
        assert_eq!(d.get(NET_CF).value(), Some(180.0));
    }

    #[test]
    fn direct_edit_of_derived_field_feeds_downstream() {
        let mut d = FormDraft::default();
        d.edit(OPEX, 100.0);
        d.edit(GROSS_PROFIT, 350.0);
        assert_eq!(d.get(OPERATING_INCOME).value(), Some(250.0));
    }

    #[test]
    fn unrelated_edit_leaves_derived_fields_alone() {
        let mut d = FormDraft::default();
        d.edit(Field::Balance(BalanceField::CurrentAssets), 10.0);
        assert_eq!(d, {
            let mut expected = FormDraft::default();
            expected.balance_sheet.current_assets = Entry::new(10.0);
            expected
        });
    }
}
