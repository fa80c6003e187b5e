pub mod fixtures;
pub mod memory;

use crate::domain::record::{FinancialRecord, NewFinancialRecord, RecordId, RecordPatch};
use crate::domain::report::{NewReport, Report, ReportId, ReportPatch, ReportTemplate};
use crate::error::Result;
use std::time::Duration;

pub use memory::{MemoryRecordStore, MemoryReportStore, MemoryRepository};

#[async_trait::async_trait]
pub trait FinancialDataRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<FinancialRecord>>;

    async fn get_by_id(&self, id: RecordId) -> Result<FinancialRecord>;

    async fn create(&self, record: NewFinancialRecord) -> Result<FinancialRecord>;

    async fn update(&self, id: RecordId, patch: RecordPatch) -> Result<FinancialRecord>;

    async fn delete(&self, id: RecordId) -> Result<FinancialRecord>;

    /// Case-insensitive substring match on the company/profile name.
    async fn get_by_company(&self, term: &str) -> Result<Vec<FinancialRecord>>;

    async fn get_by_period(&self, period: &str) -> Result<Vec<FinancialRecord>>;
}

#[async_trait::async_trait]
pub trait ReportRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Report>>;

    async fn get_by_id(&self, id: ReportId) -> Result<Report>;

    async fn create(&self, report: NewReport) -> Result<Report>;

    async fn update(&self, id: ReportId, patch: ReportPatch) -> Result<Report>;

    async fn delete(&self, id: ReportId) -> Result<Report>;

    async fn get_by_financial_data_id(&self, financial_data_id: RecordId) -> Result<Vec<Report>>;

    /// Assembles a report from `template` (see [`crate::assembly::assemble`]) and stores it.
    async fn generate_report(
        &self,
        financial_data_id: RecordId,
        template: &ReportTemplate,
    ) -> Result<Report>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    GetAll,
    GetById,
    Create,
    Update,
    Delete,
    Generate,
}

/// Artificial per-operation delay, mimicking a remote backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Latency {
    pub get_all: Duration,
    pub get_by_id: Duration,
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
    pub generate: Duration,
}

impl Latency {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn records_backend() -> Self {
        Self {
            get_all: Duration::from_millis(300),
            get_by_id: Duration::from_millis(200),
            create: Duration::from_millis(400),
            update: Duration::from_millis(350),
            delete: Duration::from_millis(250),
            generate: Duration::ZERO,
        }
    }

    pub fn reports_backend() -> Self {
        Self {
            get_all: Duration::from_millis(300),
            get_by_id: Duration::from_millis(200),
            create: Duration::from_millis(500),
            update: Duration::from_millis(400),
            delete: Duration::from_millis(250),
            // On top of `create`, for 800ms in total.
            generate: Duration::from_millis(300),
        }
    }

    pub fn of(&self, op: Op) -> Duration {
        match op {
            Op::GetAll => self.get_all,
            Op::GetById => self.get_by_id,
            Op::Create => self.create,
            Op::Update => self.update,
            Op::Delete => self.delete,
            Op::Generate => self.generate,
        }
    }

    pub async fn pause(&self, op: Op) {
        let d = self.of(op);
        if !d.is_zero() {
            tokio::time::sleep(d).await;
        }
    }
}
