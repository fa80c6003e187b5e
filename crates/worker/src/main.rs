use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsight_core::domain::record::FinancialRecord;
use finsight_core::domain::report::{Report, ReportTemplate};
use finsight_core::form::FormDraft;
use finsight_core::metrics::rating::{self, RatedRatio};
use finsight_core::metrics::summary::{self, PortfolioSummary};
use finsight_core::notify::TracingNotifier;
use finsight_core::session::{SaveOutcome, Session};
use finsight_core::storage::fixtures;

#[derive(Debug, Parser)]
#[command(name = "finsight_worker")]
struct Args {
    /// JSON file holding one form draft or an array of drafts. Falls back to FINSIGHT_INPUT,
    /// then to the bundled sample data.
    #[arg(long)]
    input: Option<String>,

    /// Only analyse records whose company name contains this text (case-insensitive).
    #[arg(long)]
    company: Option<String>,

    /// Only analyse records for this exact period label.
    #[arg(long)]
    period: Option<String>,

    /// Generate a standard report for every analysed record.
    #[arg(long)]
    reports: bool,

    /// With --reports, log which records would get a report instead of generating them.
    #[arg(long, requires = "reports")]
    dry_run: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecordAnalysis {
    id: i64,
    name: String,
    period: String,
    warnings: Vec<&'static str>,
    /// Empty when the ratios are undefined for this record.
    ratios: Vec<RatedRatio>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunOutput {
    records: Vec<RecordAnalysis>,
    summary: PortfolioSummary,
    reports: Vec<Report>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finsight_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let output = match run(&args, &settings).await {
        Ok(output) => output,
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %err, "analysis run failed");
            return Err(err);
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(
    args: &Args,
    settings: &finsight_core::config::Settings,
) -> anyhow::Result<RunOutput> {
    let input = args.input.clone().or_else(|| settings.input_path.clone());

    let (records, reports) = fixtures::stores(
        input.is_none() && settings.seed_fixtures,
        settings.simulate_latency,
    )?;
    let mut session = Session::new(
        Arc::new(records),
        Arc::new(reports),
        Arc::new(TracingNotifier),
    );

    if let Some(path) = input.as_deref() {
        let text = std::fs::read_to_string(path).with_context(|| format!("read {path} failed"))?;
        let drafts = parse_drafts(&text).with_context(|| format!("parse {path} failed"))?;

        let mut rejected = 0usize;
        for (idx, draft) in drafts.into_iter().enumerate() {
            match session.save_draft(draft).await {
                SaveOutcome::Saved(record) => {
                    tracing::debug!(idx, id = record.id, "draft stored")
                }
                SaveOutcome::Invalid(errors) => {
                    rejected += 1;
                    tracing::warn!(idx, errors = %errors, "draft rejected");
                }
                SaveOutcome::Failed => {
                    anyhow::bail!(
                        "storing draft {idx} failed: {}",
                        session.last_error().unwrap_or("unknown error")
                    );
                }
            }
        }
        tracing::info!(path, stored = session.records().len(), rejected, "input loaded");
    } else {
        anyhow::ensure!(
            session.load().await,
            "loading financial data failed: {}",
            session.last_error().unwrap_or("unknown error")
        );
    }

    let selected: Vec<FinancialRecord> = session
        .records()
        .iter()
        .filter(|r| matches_filter(r, args.company.as_deref(), args.period.as_deref()))
        .cloned()
        .collect();

    if selected.is_empty() {
        tracing::warn!(
            company = ?args.company,
            period = ?args.period,
            "no records match the filter"
        );
    }

    let mut analyses = Vec::with_capacity(selected.len());
    for record in &selected {
        let warnings: Vec<&'static str> = record
            .inconsistencies()
            .into_iter()
            .map(|i| i.describe())
            .collect();
        for w in &warnings {
            tracing::warn!(id = record.id, warning = *w, "record is internally inconsistent");
        }

        let ratios = match session.select_record(record.id).await {
            Some(selection) => selection
                .metrics
                .map(|m| rating::rate_all(&m))
                .unwrap_or_default(),
            None => Vec::new(),
        };

        analyses.push(RecordAnalysis {
            id: record.id,
            name: record.display_name().to_string(),
            period: record.period.clone(),
            warnings,
            ratios,
        });
    }

    let mut generated = Vec::new();
    if args.reports && args.dry_run {
        tracing::info!(count = selected.len(), dry_run = true, "skipping report generation");
    } else if args.reports {
        for record in &selected {
            let template = ReportTemplate::for_record(record);
            if let Some(report) = session.generate_report(record.id, &template).await {
                tracing::info!(report_id = report.id, financial_data_id = record.id, "report generated");
                generated.push(report);
            }
        }
    }

    Ok(RunOutput {
        records: analyses,
        summary: summary::summarize(&selected),
        reports: generated,
    })
}

fn parse_drafts(text: &str) -> anyhow::Result<Vec<FormDraft>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(vec![serde_json::from_value(value)?])
    }
}

fn matches_filter(record: &FinancialRecord, company: Option<&str>, period: Option<&str>) -> bool {
    let company_ok = company.map_or(true, |term| {
        record
            .company_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains(&term.to_lowercase()))
    });
    let period_ok = period.map_or(true, |p| record.period == p);
    company_ok && period_ok
}

fn init_sentry(settings: &finsight_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
