use super::{BalanceField, CashFlowField, Field, FormDraft, IncomeField};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const PERIOD_PATH: &str = "general.period";

const MUST_BE_POSITIVE: &str = "This field is required and must be greater than 0";

const REQUIRED_POSITIVE: [Field; 8] = [
    Field::Income(IncomeField::Revenue),
    Field::Income(IncomeField::CostOfGoodsSold),
    Field::Income(IncomeField::OperatingExpenses),
    Field::Income(IncomeField::InterestExpense),
    Field::Balance(BalanceField::CurrentAssets),
    Field::Balance(BalanceField::TotalAssets),
    Field::Balance(BalanceField::CurrentLiabilities),
    Field::Balance(BalanceField::TotalLiabilities),
];

/// Field path → message. Empty means the draft may be saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.0.get(path).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Drops the message for a field once the user edits it again.
    pub fn clear(&mut self, path: &str) {
        self.0.remove(path);
    }

    fn insert(&mut self, path: &str, message: &str) {
        self.0.insert(path.to_string(), message.to_string());
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{path}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

pub fn validate(draft: &FormDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if draft.period.trim().is_empty() {
        errors.insert(PERIOD_PATH, "Period is required");
    }

    for field in REQUIRED_POSITIVE {
        match draft.get(field).value() {
            Some(v) if v > 0.0 => {}
            _ => errors.insert(field.path(), MUST_BE_POSITIVE),
        }
    }

    // Operating cash flow may be zero or negative; it only has to be filled in.
    let operating = Field::CashFlow(CashFlowField::OperatingCashFlow);
    if !draft.get(operating).is_set() {
        errors.insert(operating.path(), "Operating cash flow is required");
    }

    errors
}
