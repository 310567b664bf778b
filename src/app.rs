#![cfg(feature = "web")]
use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Multipart, Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::downloader;
use crate::entry::{CATEGORIES, COLUMNS, Entry, EntryKind};
use crate::error::LedgerError;
use crate::graph::{ChartKind, GraphOptions, render_chart};
use crate::ledger::{GridRow, SaveReport};
use crate::saving;
use crate::service::{LedgerService, parse_month};
use crate::store::CsvWorkbook;

pub struct AppState {
    pub service: LedgerService,
}

#[derive(Deserialize)]
struct SaveRequest {
    rows: Vec<GridRow>,
}

#[derive(Serialize)]
struct SaveResponse {
    status: String,
    #[serde(flatten)]
    report: SaveReport,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
    message: Option<String>,
}

#[derive(Deserialize)]
struct BaseBalanceUpdate {
    value: serde_json::Value,
}

#[derive(Deserialize)]
struct SummaryQuery {
    month: Option<String>,
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

#[derive(Serialize)]
struct Options {
    kinds: Vec<&'static str>,
    categories: Vec<&'static str>,
    payment_methods: Vec<String>,
    members: Vec<String>,
}

#[derive(Serialize)]
struct LedgerResponse<'a> {
    columns: Vec<&'static str>,
    rows: &'a [Entry],
    next_id: u64,
    base_balance: f64,
    options: Options,
}

/// Library errors rendered as a JSON body with a matching status code
pub struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::InvalidInput(_)
            | LedgerError::InvalidWorksheetName { .. }
            | LedgerError::Snapshot(_) => StatusCode::BAD_REQUEST,
            LedgerError::Chart(msg) if msg == "no data" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        let body = StatusResponse {
            status: "error".to_string(),
            message: Some(self.0.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Builds the router over an already constructed service
pub fn router(service: LedgerService) -> Router {
    let state = Arc::new(AppState { service });

    Router::new()
        .route("/", get(serve_dashboard))
        .route("/api/ledger", get(get_ledger).post(save_ledger))
        .route("/api/summary", get(get_summary))
        .route(
            "/api/base_balance",
            get(get_base_balance).post(update_base_balance),
        )
        .route("/api/charts/:chart", get(get_chart))
        .route("/api/export", get(export_ledger))
        .route("/api/backup", get(download_backup))
        .route("/api/restore", post(restore_backup))
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = CsvWorkbook::open(&config.data_dir)?;
    info!("Using worksheets in {}", store.dir().display());

    let bind = config.bind.clone();
    let app = router(LedgerService::new(Arc::new(store), config));

    let listener = TcpListener::bind(&bind).await?;
    info!("Listening on http://{}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;
    info!(
        "{} {} -> {} ({:.1} ms)",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    response
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(include_str!("./static/dashboard.html"))
}

async fn get_ledger(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let snapshot = run_blocking(&state, |service| service.snapshot()).await?;
    let config = state.service.config();

    let body = LedgerResponse {
        columns: COLUMNS.to_vec(),
        rows: &snapshot.ledger.entries,
        next_id: snapshot.ledger.next_id(),
        base_balance: snapshot.base_balance,
        options: Options {
            kinds: EntryKind::all().iter().map(|k| k.label()).collect(),
            categories: CATEGORIES.to_vec(),
            payment_methods: config.payment_methods.clone(),
            members: config.members.clone(),
        },
    };
    Ok(Json(body).into_response())
}

async fn save_ledger(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SaveRequest>,
) -> ApiResult<Json<SaveResponse>> {
    let rows = payload.rows;
    let report = run_blocking(&state, move |service| service.save_grid(&rows)).await?;
    Ok(Json(SaveResponse {
        status: "ok".to_string(),
        report,
    }))
}

fn month_param(params: &SummaryQuery) -> Result<Option<(i32, u32)>, LedgerError> {
    match params.month.as_deref().filter(|m| !m.is_empty()) {
        Some(raw) => parse_month(raw).map(Some).ok_or_else(|| {
            LedgerError::InvalidInput(format!("month must look like YYYY-MM, got '{}'", raw))
        }),
        None => Ok(None),
    }
}

async fn get_summary(
    Query(params): Query<SummaryQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response> {
    let month = month_param(&params)?;
    let summary = run_blocking(&state, move |service| service.summary(month)).await?;
    Ok(Json(summary).into_response())
}

async fn get_base_balance(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let snapshot = run_blocking(&state, |service| service.snapshot()).await?;
    Ok(Json(serde_json::json!({ "base_balance": snapshot.base_balance })).into_response())
}

async fn update_base_balance(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BaseBalanceUpdate>,
) -> ApiResult<Json<StatusResponse>> {
    // Whole currency units only
    let value = crate::coerce::amount_from_json(&payload.value)
        .map(|v| v.round() as i64)
        .ok_or_else(|| LedgerError::InvalidInput("base balance must be a number".to_string()))?;

    run_blocking(&state, move |service| service.set_base_balance(value)).await?;
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
        message: None,
    }))
}

async fn get_chart(
    Path(chart): Path<String>,
    Query(params): Query<SummaryQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response> {
    let kind = ChartKind::from_name(&chart)
        .ok_or_else(|| LedgerError::InvalidInput(format!("unknown chart '{}'", chart)))?;
    let month = month_param(&params)?;
    let png = run_blocking(&state, move |service| {
        let (ledger, opening_balance) = service.scoped(month)?;
        render_chart(
            &ledger,
            opening_balance,
            kind,
            &GraphOptions::for_kind(kind),
        )
    })
    .await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn export_ledger(
    Query(params): Query<ExportQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Response> {
    let response = match params.format.as_deref().unwrap_or("csv") {
        "csv" => {
            let csv = run_blocking(&state, |service| {
                downloader::to_csv(&service.snapshot()?.ledger)
            })
            .await?;
            attachment("text/csv; charset=utf-8", "movimientos.csv", Bytes::from(csv))
        }
        "xlsx" => {
            let xlsx = run_blocking(&state, |service| {
                downloader::to_xlsx(&service.snapshot()?.ledger)
            })
            .await?;
            attachment(
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                "movimientos.xlsx",
                Bytes::from(xlsx),
            )
        }
        other => {
            return Err(LedgerError::InvalidInput(format!("unsupported format '{}'", other)).into());
        }
    };
    Ok(response)
}

async fn download_backup(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let buffer = run_blocking(&state, |service| {
        saving::snapshot_to_bytes(&service.backup()?)
    })
    .await?;
    Ok(attachment("application/gzip", "bitacora.bin.gz", Bytes::from(buffer)))
}

async fn restore_backup(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<StatusResponse>> {
    let mut file_data = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| LedgerError::InvalidInput(e.to_string()))?
    {
        if field.name() == Some("snapshot") {
            file_data = field
                .bytes()
                .await
                .map_err(|e| LedgerError::InvalidInput(e.to_string()))?
                .to_vec();
        }
    }

    if file_data.is_empty() {
        return Err(LedgerError::InvalidInput("No file data received".to_string()).into());
    }

    let restored = run_blocking(&state, move |service| {
        let backup = saving::snapshot_from_bytes(&file_data)?;
        service.restore(&backup)?;
        Ok(backup.ledger.len())
    })
    .await?;

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
        message: Some(format!("Restored {} entries", restored)),
    }))
}

/// Runs a service call on the blocking pool; worksheet access is plain file I/O.
async fn run_blocking<T, F>(state: &Arc<AppState>, task: F) -> ApiResult<T>
where
    F: FnOnce(&LedgerService) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = Arc::clone(state);
    let result = tokio::task::spawn_blocking(move || task(&state.service))
        .await
        .map_err(|e| LedgerError::Task(e.to_string()))?;
    Ok(result?)
}

fn attachment(content_type: &'static str, filename: &str, body: Bytes) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", filename);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(body),
    )
        .into_response()
}
