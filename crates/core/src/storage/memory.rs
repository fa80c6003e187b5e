use super::{FinancialDataRepository, Latency, Op, ReportRepository};
use crate::assembly;
use crate::domain::record::{FinancialRecord, NewFinancialRecord, RecordId, RecordPatch};
use crate::domain::report::{NewReport, Report, ReportId, ReportPatch, ReportTemplate};
use crate::error::{Error, Result};
use chrono::Utc;
use tokio::sync::RwLock;

pub trait Stored: Clone + Send + Sync + 'static {
    const KIND: &'static str;

    fn id(&self) -> i64;
}

impl Stored for FinancialRecord {
    const KIND: &'static str = "Financial data";

    fn id(&self) -> i64 {
        self.id
    }
}

impl Stored for Report {
    const KIND: &'static str = "Report";

    fn id(&self) -> i64 {
        self.id
    }
}

/// Ordered in-memory collection. Each instance is independent; nothing is shared globally.
#[derive(Debug)]
pub struct MemoryRepository<T> {
    items: RwLock<Vec<T>>,
    latency: Latency,
}

pub type MemoryRecordStore = MemoryRepository<FinancialRecord>;
pub type MemoryReportStore = MemoryRepository<Report>;

impl<T: Stored> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::with_items(Vec::new(), Latency::none())
    }
}

impl<T: Stored> MemoryRepository<T> {
    pub fn with_items(items: Vec<T>, latency: Latency) -> Self {
        Self {
            items: RwLock::new(items),
            latency,
        }
    }

    pub fn latency(&self) -> Latency {
        self.latency
    }

    async fn all(&self) -> Vec<T> {
        self.latency.pause(Op::GetAll).await;
        self.items.read().await.clone()
    }

    async fn find(&self, id: i64) -> Result<T> {
        self.latency.pause(Op::GetById).await;
        self.items
            .read()
            .await
            .iter()
            .find(|item| item.id() == id)
            .cloned()
            .ok_or_else(|| Error::not_found(T::KIND, id))
    }

    async fn filter(&self, pred: impl Fn(&T) -> bool + Send) -> Vec<T> {
        self.latency.pause(Op::GetAll).await;
        self.items
            .read()
            .await
            .iter()
            .filter(|item| pred(item))
            .cloned()
            .collect()
    }

    /// Appends a new item under the next id (highest existing id + 1).
    async fn insert_with(&self, build: impl FnOnce(i64) -> T + Send) -> T {
        self.latency.pause(Op::Create).await;
        let mut items = self.items.write().await;
        let next_id = items.iter().map(Stored::id).max().unwrap_or(0) + 1;
        let item = build(next_id);
        items.push(item.clone());
        tracing::debug!(kind = T::KIND, id = next_id, "created");
        item
    }

    async fn modify(&self, id: i64, change: impl FnOnce(&mut T) + Send) -> Result<T> {
        self.latency.pause(Op::Update).await;
        let mut items = self.items.write().await;
        let item = items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| Error::not_found(T::KIND, id))?;
        change(item);
        tracing::debug!(kind = T::KIND, id, "updated");
        Ok(item.clone())
    }

    async fn remove(&self, id: i64) -> Result<T> {
        self.latency.pause(Op::Delete).await;
        let mut items = self.items.write().await;
        let idx = items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| Error::not_found(T::KIND, id))?;
        tracing::debug!(kind = T::KIND, id, "deleted");
        Ok(items.remove(idx))
    }
}

#[async_trait::async_trait]
impl FinancialDataRepository for MemoryRecordStore {
    async fn get_all(&self) -> Result<Vec<FinancialRecord>> {
        Ok(self.all().await)
    }

    async fn get_by_id(&self, id: RecordId) -> Result<FinancialRecord> {
        self.find(id).await
    }

    async fn create(&self, record: NewFinancialRecord) -> Result<FinancialRecord> {
        Ok(self
            .insert_with(|id| FinancialRecord::from_new(id, record, Utc::now()))
            .await)
    }

    async fn update(&self, id: RecordId, patch: RecordPatch) -> Result<FinancialRecord> {
        self.modify(id, |r| r.apply_patch(patch, Utc::now())).await
    }

    async fn delete(&self, id: RecordId) -> Result<FinancialRecord> {
        self.remove(id).await
    }

    async fn get_by_company(&self, term: &str) -> Result<Vec<FinancialRecord>> {
        let needle = term.to_lowercase();
        Ok(self
            .filter(|r| {
                r.company_name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .await)
    }

    async fn get_by_period(&self, period: &str) -> Result<Vec<FinancialRecord>> {
        Ok(self.filter(|r| r.period == period).await)
    }
}

#[async_trait::async_trait]
impl ReportRepository for MemoryReportStore {
    async fn get_all(&self) -> Result<Vec<Report>> {
        Ok(self.all().await)
    }

    async fn get_by_id(&self, id: ReportId) -> Result<Report> {
        self.find(id).await
    }

    async fn create(&self, report: NewReport) -> Result<Report> {
        Ok(self.insert_with(|id| Report::from_new(id, report)).await)
    }

    async fn update(&self, id: ReportId, patch: ReportPatch) -> Result<Report> {
        self.modify(id, |r| r.apply_patch(patch)).await
    }

    async fn delete(&self, id: ReportId) -> Result<Report> {
        self.remove(id).await
    }

    async fn get_by_financial_data_id(&self, financial_data_id: RecordId) -> Result<Vec<Report>> {
        Ok(self
            .filter(|r| r.financial_data_id == financial_data_id)
            .await)
    }

    async fn generate_report(
        &self,
        financial_data_id: RecordId,
        template: &ReportTemplate,
    ) -> Result<Report> {
        self.latency.pause(Op::Generate).await;
        let draft = assembly::assemble(financial_data_id, template, Utc::now());
        self.create(draft).await
    }
}
