//! Client-side session over the repositories.
//!
//! Every operation reports its outcome through the [`Notifier`] and keeps the last failure message
//! on the session. Store and lookup failures stop here: callers get `None`/`false` back, never an
//! error.

use crate::domain::record::{FinancialRecord, RecordId, RecordPatch};
use crate::domain::report::{Report, ReportId, ReportTemplate};
use crate::error::Error;
use crate::form::validation::ValidationErrors;
use crate::form::FormDraft;
use crate::metrics::summary::{self, PortfolioSummary};
use crate::metrics::{self, MetricsResult};
use crate::notify::Notifier;
use crate::storage::{FinancialDataRepository, ReportRepository};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(FinancialRecord),
    Invalid(ValidationErrors),
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub record: FinancialRecord,
    /// Withheld when the ratios cannot be calculated for this record.
    pub metrics: Option<MetricsResult>,
}

pub struct Session {
    records: Arc<dyn FinancialDataRepository>,
    reports: Arc<dyn ReportRepository>,
    notifier: Arc<dyn Notifier>,
    loaded_records: Vec<FinancialRecord>,
    loaded_reports: Vec<Report>,
    last_error: Option<String>,
}

impl Session {
    pub fn new(
        records: Arc<dyn FinancialDataRepository>,
        reports: Arc<dyn ReportRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            records,
            reports,
            notifier,
            loaded_records: Vec::new(),
            loaded_reports: Vec::new(),
            last_error: None,
        }
    }

    pub fn records(&self) -> &[FinancialRecord] {
        &self.loaded_records
    }

    pub fn reports(&self) -> &[Report] {
        &self.loaded_reports
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn fail(&mut self, err: Error, message: &str) {
        tracing::warn!(error = %err, "{message}");
        self.last_error = Some(err.to_string());
        self.notifier.error(message);
    }

    pub async fn load(&mut self) -> bool {
        self.last_error = None;
        match self.records.get_all().await {
            Ok(records) => {
                self.loaded_records = records;
                true
            }
            Err(err) => {
                self.fail(err, "Failed to load financial data");
                false
            }
        }
    }

    /// Validates the draft and, only if it is clean, creates the record.
    pub async fn save_draft(&mut self, draft: FormDraft) -> SaveOutcome {
        self.last_error = None;
        let new_record = match draft.into_new_record() {
            Ok(r) => r,
            Err(Error::ValidationFailed(errors)) => {
                self.notifier
                    .error("Please fix the validation errors before saving");
                return SaveOutcome::Invalid(errors);
            }
            Err(err) => {
                self.fail(err, "Failed to save financial data");
                return SaveOutcome::Failed;
            }
        };

        match self.records.create(new_record).await {
            Ok(record) => {
                self.loaded_records.push(record.clone());
                self.notifier.success("Financial data saved successfully!");
                SaveOutcome::Saved(record)
            }
            Err(err) => {
                self.fail(err, "Failed to save financial data");
                SaveOutcome::Failed
            }
        }
    }

    pub async fn update_record(
        &mut self,
        id: RecordId,
        patch: RecordPatch,
    ) -> Option<FinancialRecord> {
        self.last_error = None;
        match self.records.update(id, patch).await {
            Ok(record) => {
                if let Some(slot) = self.loaded_records.iter_mut().find(|r| r.id == id) {
                    *slot = record.clone();
                }
                self.notifier.success("Financial data updated successfully");
                Some(record)
            }
            Err(err) => {
                self.fail(err, "Failed to update financial data");
                None
            }
        }
    }

    pub async fn delete_record(&mut self, id: RecordId) -> bool {
        self.last_error = None;
        match self.records.delete(id).await {
            Ok(_) => {
                self.loaded_records.retain(|r| r.id != id);
                self.notifier.success("Financial data deleted successfully");
                true
            }
            Err(err) => {
                self.fail(err, "Failed to delete financial data");
                false
            }
        }
    }

    /// The record the analysis view opens on: the newest one right after a save, else the first.
    pub fn default_selection(&self, just_saved: bool) -> Option<RecordId> {
        let pick = if just_saved {
            self.loaded_records.last()
        } else {
            self.loaded_records.first()
        };
        pick.map(|r| r.id)
    }

    pub async fn select_record(&mut self, id: RecordId) -> Option<Selection> {
        self.last_error = None;
        let record = match self.records.get_by_id(id).await {
            Ok(r) => r,
            Err(err) => {
                self.fail(err, "Failed to load financial data");
                return None;
            }
        };

        let metrics = match metrics::calculate(&record).ensure_defined() {
            Ok(m) => Some(m),
            Err(err) => {
                // The record itself is still shown.
                self.fail(err, "Failed to calculate financial metrics");
                None
            }
        };

        Some(Selection { record, metrics })
    }

    pub async fn load_reports(&mut self) -> bool {
        self.last_error = None;
        match self.reports.get_all().await {
            Ok(reports) => {
                self.loaded_reports = reports;
                true
            }
            Err(err) => {
                self.fail(err, "Failed to load reports");
                false
            }
        }
    }

    /// Generates and stores a report for an existing record. Newest reports are listed first.
    pub async fn generate_report(
        &mut self,
        financial_data_id: RecordId,
        template: &ReportTemplate,
    ) -> Option<Report> {
        self.last_error = None;
        if let Err(err) = self.records.get_by_id(financial_data_id).await {
            self.fail(err, "Failed to generate report");
            return None;
        }

        match self
            .reports
            .generate_report(financial_data_id, template)
            .await
        {
            Ok(report) => {
                self.loaded_reports.insert(0, report.clone());
                self.notifier.success("Report generated successfully!");
                Some(report)
            }
            Err(err) => {
                self.fail(err, "Failed to generate report");
                None
            }
        }
    }

    pub async fn delete_report(&mut self, id: ReportId) -> bool {
        self.last_error = None;
        match self.reports.delete(id).await {
            Ok(_) => {
                self.loaded_reports.retain(|r| r.id != id);
                self.notifier.success("Report deleted successfully");
                true
            }
            Err(err) => {
                self.fail(err, "Failed to delete report");
                false
            }
        }
    }

    pub fn search_reports(&self, term: &str) -> Vec<&Report> {
        let needle = term.to_lowercase();
        self.loaded_reports
            .iter()
            .filter(|r| r.title.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn summary(&self) -> PortfolioSummary {
        summary::summarize(&self.loaded_records)
    }
}
