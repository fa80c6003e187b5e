use super::{Latency, MemoryRecordStore, MemoryReportStore, MemoryRepository};
use crate::domain::record::FinancialRecord;
use crate::domain::report::Report;
use anyhow::Context;

const FINANCIAL_DATA_JSON: &str = include_str!("../../fixtures/financial_data.json");
const REPORTS_JSON: &str = include_str!("../../fixtures/reports.json");

pub fn financial_records() -> anyhow::Result<Vec<FinancialRecord>> {
    serde_json::from_str(FINANCIAL_DATA_JSON).context("financial data fixture is invalid")
}

pub fn reports() -> anyhow::Result<Vec<Report>> {
    serde_json::from_str(REPORTS_JSON).context("reports fixture is invalid")
}

/// Builds fresh stores, optionally seeded with the bundled sample data.
pub fn stores(
    seed: bool,
    simulate_latency: bool,
) -> anyhow::Result<(MemoryRecordStore, MemoryReportStore)> {
    let (record_latency, report_latency) = if simulate_latency {
        (Latency::records_backend(), Latency::reports_backend())
    } else {
        (Latency::none(), Latency::none())
    };

    let (records, reports) = if seed {
        (financial_records()?, reports()?)
    } else {
        (Vec::new(), Vec::new())
    };

    tracing::debug!(
        records = records.len(),
        reports = reports.len(),
        simulate_latency,
        "initialised in-memory stores"
    );

    Ok((
        MemoryRepository::with_items(records, record_latency),
        MemoryRepository::with_items(reports, report_latency),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FinancialDataRepository, ReportRepository};

    #[test]
    fn fixtures_parse_and_are_consistent() {
        let records = financial_records().unwrap();
        assert_eq!(records.len(), 3);
        for r in &records {
            assert!(r.inconsistencies().is_empty(), "record {} inconsistent", r.id);
        }

        let reports = reports().unwrap();
        assert_eq!(reports.len(), 1);
        assert!(records.iter().any(|r| r.id == reports[0].financial_data_id));
    }

    #[tokio::test]
    async fn unseeded_stores_start_empty() {
        let (records, reports) = stores(false, false).unwrap();
        assert!(FinancialDataRepository::get_all(&records).await.unwrap().is_empty());
        assert!(ReportRepository::get_all(&reports).await.unwrap().is_empty());
        assert_eq!(records.latency(), Latency::none());
    }

    #[test]
    fn latency_flag_selects_backend_delays() {
        let (records, reports) = stores(true, true).unwrap();
        assert_eq!(records.latency(), Latency::records_backend());
        assert_eq!(reports.latency(), Latency::reports_backend());
    }
}
