use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsight_core::domain::record::{FinancialRecord, RecordId, RecordPatch};
use finsight_core::domain::report::{Report, ReportId, ReportPatch, ReportTemplate};
use finsight_core::form::validation::{self, ValidationErrors};
use finsight_core::form::{Entry, Field, FormDraft};
use finsight_core::metrics::rating::{self, RatedRatio};
use finsight_core::metrics::summary::{self, PortfolioSummary};
use finsight_core::metrics::{self, MetricsResult};
use finsight_core::storage::{fixtures, FinancialDataRepository, ReportRepository};
use finsight_core::Error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finsight_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let (records, reports) = fixtures::stores(settings.seed_fixtures, settings.simulate_latency)
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            e
        })?;

    let state = AppState {
        records: Arc::new(records),
        reports: Arc::new(reports),
    };

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(
        %addr,
        seeded = settings.seed_fixtures,
        simulate_latency = settings.simulate_latency,
        "api listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/records", get(list_records).post(create_record))
        .route(
            "/records/:id",
            get(get_record).patch(update_record).delete(delete_record),
        )
        .route("/records/:id/metrics", get(get_record_metrics))
        .route("/records/:id/reports", post(generate_report))
        .route("/reports", get(list_reports))
        .route(
            "/reports/:id",
            get(get_report).patch(update_report).delete(delete_report),
        )
        .route("/drafts/derive", post(derive_draft))
        .route("/summary", get(get_summary))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    records: Arc<dyn FinancialDataRepository>,
    reports: Arc<dyn ReportRepository>,
}

fn status_for(err: Error) -> StatusCode {
    match err {
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::ValidationFailed(_) | Error::CalculationUnavailable { .. } => {
            tracing::info!(error = %err, "request rejected");
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::Storage(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "storage failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[derive(Debug, Deserialize)]
struct RecordQuery {
    company: Option<String>,
    period: Option<String>,
}

async fn list_records(
    State(state): State<AppState>,
    Query(q): Query<RecordQuery>,
) -> Result<Json<Vec<FinancialRecord>>, StatusCode> {
    let mut records = match (&q.company, &q.period) {
        (Some(company), _) => state.records.get_by_company(company).await,
        (None, Some(period)) => state.records.get_by_period(period).await,
        (None, None) => state.records.get_all().await,
    }
    .map_err(status_for)?;

    if let (Some(_), Some(period)) = (&q.company, &q.period) {
        records.retain(|r| &r.period == period);
    }

    Ok(Json(records))
}

#[derive(Debug, Serialize)]
struct ValidationBody {
    errors: ValidationErrors,
}

async fn create_record(State(state): State<AppState>, Json(draft): Json<FormDraft>) -> Response {
    let new_record = match draft.into_new_record() {
        Ok(r) => r,
        Err(Error::ValidationFailed(errors)) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ValidationBody { errors }),
            )
                .into_response();
        }
        Err(e) => return status_for(e).into_response(),
    };

    match state.records.create(new_record).await {
        Ok(record) => {
            tracing::info!(id = record.id, period = %record.period, "financial data created");
            (StatusCode::CREATED, Json(record)).into_response()
        }
        Err(e) => status_for(e).into_response(),
    }
}

async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<FinancialRecord>, StatusCode> {
    let record = state.records.get_by_id(id).await.map_err(status_for)?;
    Ok(Json(record))
}

async fn update_record(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(patch): Json<RecordPatch>,
) -> Result<Json<FinancialRecord>, StatusCode> {
    let record = state.records.update(id, patch).await.map_err(status_for)?;
    Ok(Json(record))
}

async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<FinancialRecord>, StatusCode> {
    let record = state.records.delete(id).await.map_err(status_for)?;
    Ok(Json(record))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricsView {
    #[serde(flatten)]
    metrics: MetricsResult,
    ratings: Vec<RatedRatio>,
}

async fn get_record_metrics(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<MetricsView>, StatusCode> {
    let record = state.records.get_by_id(id).await.map_err(status_for)?;
    let metrics = metrics::calculate(&record)
        .ensure_defined()
        .map_err(status_for)?;
    Ok(Json(MetricsView {
        ratings: rating::rate_all(&metrics),
        metrics,
    }))
}

async fn generate_report(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    Json(template): Json<ReportTemplate>,
) -> Result<(StatusCode, Json<Report>), StatusCode> {
    state.records.get_by_id(id).await.map_err(status_for)?;
    let report = state
        .reports
        .generate_report(id, &template)
        .await
        .map_err(status_for)?;
    tracing::info!(report_id = report.id, financial_data_id = id, "report generated");
    Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Debug, Deserialize)]
struct ReportQuery {
    q: Option<String>,
    record: Option<RecordId>,
}

async fn list_reports(
    State(state): State<AppState>,
    Query(q): Query<ReportQuery>,
) -> Result<Json<Vec<Report>>, StatusCode> {
    let mut reports = match q.record {
        Some(id) => state.reports.get_by_financial_data_id(id).await,
        None => state.reports.get_all().await,
    }
    .map_err(status_for)?;

    if let Some(term) = q.q.as_deref().map(str::to_lowercase) {
        reports.retain(|r| r.title.to_lowercase().contains(&term));
    }

    Ok(Json(reports))
}

async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<ReportId>,
) -> Result<Json<Report>, StatusCode> {
    let report = state.reports.get_by_id(id).await.map_err(status_for)?;
    Ok(Json(report))
}

async fn update_report(
    State(state): State<AppState>,
    Path(id): Path<ReportId>,
    Json(patch): Json<ReportPatch>,
) -> Result<Json<Report>, StatusCode> {
    let report = state.reports.update(id, patch).await.map_err(status_for)?;
    Ok(Json(report))
}

async fn delete_report(
    State(state): State<AppState>,
    Path(id): Path<ReportId>,
) -> Result<Json<Report>, StatusCode> {
    let report = state.reports.delete(id).await.map_err(status_for)?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
struct DeriveRequest {
    #[serde(default)]
    draft: FormDraft,
    field: Field,
    #[serde(default)]
    value: Entry,
}

#[derive(Debug, Serialize)]
struct DeriveResponse {
    draft: FormDraft,
    errors: ValidationErrors,
}

async fn derive_draft(Json(req): Json<DeriveRequest>) -> Json<DeriveResponse> {
    let mut draft = req.draft;
    draft.edit(req.field, req.value);
    let errors = validation::validate(&draft);
    Json(DeriveResponse { draft, errors })
}

async fn get_summary(State(state): State<AppState>) -> Result<Json<PortfolioSummary>, StatusCode> {
    let records = state.records.get_all().await.map_err(status_for)?;
    Ok(Json(summary::summarize(&records)))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
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

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use finsight_core::domain::record::NewFinancialRecord;
    use finsight_core::storage::MemoryReportStore;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct BrokenRecords;

    fn broken<T>() -> finsight_core::Result<T> {
        Err(Error::Storage(anyhow::anyhow!("connection reset")))
    }

    #[async_trait::async_trait]
    impl FinancialDataRepository for BrokenRecords {
        async fn get_all(&self) -> finsight_core::Result<Vec<FinancialRecord>> {
            broken()
        }

        async fn get_by_id(&self, _id: RecordId) -> finsight_core::Result<FinancialRecord> {
            broken()
        }

        async fn create(&self, _record: NewFinancialRecord) -> finsight_core::Result<FinancialRecord> {
            broken()
        }

        async fn update(
            &self,
            _id: RecordId,
            _patch: RecordPatch,
        ) -> finsight_core::Result<FinancialRecord> {
            broken()
        }

        async fn delete(&self, _id: RecordId) -> finsight_core::Result<FinancialRecord> {
            broken()
        }

        async fn get_by_company(&self, _term: &str) -> finsight_core::Result<Vec<FinancialRecord>> {
            broken()
        }

        async fn get_by_period(&self, _period: &str) -> finsight_core::Result<Vec<FinancialRecord>> {
            broken()
        }
    }

    fn seeded_app() -> Router {
        let (records, reports) = fixtures::stores(true, false).unwrap();
        app(AppState {
            records: Arc::new(records),
            reports: Arc::new(reports),
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn valid_draft() -> Value {
        json!({
            "companyName": "Initech",
            "period": "2024-Q4",
            "incomeStatement": {
                "revenue": 1000, "costOfGoodsSold": 400, "grossProfit": 600,
                "operatingExpenses": 200, "operatingIncome": 400,
                "interestExpense": 50, "netIncome": 262.5
            },
            "balanceSheet": {
                "currentAssets": 500, "totalAssets": 2000, "currentLiabilities": 250,
                "totalLiabilities": 800, "shareholderEquity": 1200
            },
            "cashFlow": { "operatingCashFlow": 300 }
        })
    }

    #[tokio::test]
    async fn lists_and_filters_records() {
        let app = seeded_app();
        let (status, body) = send(&app, "GET", "/records", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);

        let (_, body) = send(&app, "GET", "/records?company=ACME&period=2024-Q2", None).await;
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], 2);
    }

    #[tokio::test]
    async fn create_validates_before_storing() {
        let app = seeded_app();
        let mut draft = valid_draft();
        draft["balanceSheet"]["totalLiabilities"] = Value::Null;

        let (status, body) = send(&app, "POST", "/records", Some(draft)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["errors"]["balanceSheet.totalLiabilities"].is_string());

        let (_, list) = send(&app, "GET", "/records", None).await;
        assert_eq!(list.as_array().unwrap().len(), 3);

        let (status, created) = send(&app, "POST", "/records", Some(valid_draft())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 4);
        assert_eq!(created["cashFlow"]["netCashFlow"], 0.0);
    }

    #[tokio::test]
    async fn delete_then_get_is_404() {
        let app = seeded_app();
        let (status, _) = send(&app, "DELETE", "/records/2", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", "/records/2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, "PATCH", "/records/2", Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_include_ratings() {
        let app = seeded_app();
        let (status, body) = send(&app, "GET", "/records/1/metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["financialDataId"], 1);
        assert_eq!(body["liquidityRatios"]["currentRatio"], 2.0);
        let ratings = body["ratings"].as_array().unwrap();
        assert_eq!(ratings.len(), 14);
        assert_eq!(ratings[0]["key"], "currentRatio");
        assert_eq!(ratings[0]["rating"], "Good");
    }

    #[tokio::test]
    async fn undefined_metrics_are_unprocessable() {
        let app = seeded_app();
        let patch = json!({
            "incomeStatement": {
                "revenue": 0, "costOfGoodsSold": 0, "grossProfit": 0,
                "operatingExpenses": 0, "operatingIncome": 0,
                "interestExpense": 0, "netIncome": 0
            }
        });
        let (status, _) = send(&app, "PATCH", "/records/3", Some(patch)).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", "/records/3/metrics", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn generates_and_searches_reports() {
        let app = seeded_app();
        let template = serde_json::to_value(ReportTemplate::standard()).unwrap();

        let (status, _) = send(&app, "POST", "/records/77/reports", Some(template.clone())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, report) = send(&app, "POST", "/records/2/reports", Some(template)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(report["id"], 2);
        assert_eq!(report["sections"].as_array().unwrap().len(), 3);
        assert!(report["title"]
            .as_str()
            .unwrap()
            .starts_with("Financial Analysis Report - "));

        let (_, found) = send(&app, "GET", "/reports?record=2", None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);
        let (_, found) = send(&app, "GET", "/reports?q=acme", None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (status, renamed) = send(&app, "PATCH", "/reports/2", Some(json!({"title": "Q2"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(renamed["title"], "Q2");

        let (status, _) = send(&app, "DELETE", "/reports/2", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, "GET", "/reports/2", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn derive_recomputes_dependent_fields() {
        let app = seeded_app();
        let req = json!({
            "draft": { "incomeStatement": { "revenue": 1000 } },
            "field": "incomeStatement.costOfGoodsSold",
            "value": 400
        });
        let (status, body) = send(&app, "POST", "/drafts/derive", Some(req)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["draft"]["incomeStatement"]["grossProfit"], 600.0);
        assert!(body["errors"]["general.period"].is_string());

        let bad = json!({ "field": "incomeStatement.bogus", "value": 1 });
        let (status, _) = send(&app, "POST", "/drafts/derive", Some(bad)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn summary_totals_all_records() {
        let app = seeded_app();
        let (status, body) = send(&app, "GET", "/summary", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recordCount"], 3);
        assert_eq!(body["totalRevenue"], 5_420_000.0);
    }

    #[tokio::test]
    async fn storage_failures_are_internal_errors() {
        let app = app(AppState {
            records: Arc::new(BrokenRecords),
            reports: Arc::new(MemoryReportStore::default()),
        });

        let (status, _) = send(&app, "GET", "/records", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let (status, _) = send(&app, "POST", "/records", Some(valid_draft())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let (status, _) = send(&app, "GET", "/summary", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
