use crate::domain::record::RecordId;
use crate::form::validation::ValidationErrors;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{kind} with ID {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("validation failed: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("metrics unavailable for financial data {record_id}: undefined {}", .ratios.join(", "))]
    CalculationUnavailable {
        record_id: RecordId,
        ratios: Vec<&'static str>,
    },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
