use crate::infra::{dashboard_source, AppState};
use agenda_sisreg::dashboard::filters::{ALL_MONTHS, ALL_UNITS};
use agenda_sisreg::dashboard::{DashboardFilter, DashboardSummary, DashboardView};
use agenda_sisreg::error::AppError;
use agenda_sisreg::escalas::format::format_number;
use agenda_sisreg::escalas::ingest::{normalize_entry, normalize_list};
use agenda_sisreg::escalas::{
    calculate_total_slots, export_csv, export_file_name, DraftBook, DraftError, ScheduleEntry,
};
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct VagasRequest {
    #[serde(default)]
    pub(crate) vagas: u32,
    #[serde(default)]
    pub(crate) dias_semana: String,
    #[serde(default)]
    pub(crate) vigencia_inicio: String,
    #[serde(default)]
    pub(crate) vigencia_fim: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct VagasResponse {
    pub(crate) total: u64,
    pub(crate) total_label: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardRequest {
    #[serde(default)]
    pub(crate) mes: Option<String>,
    #[serde(default)]
    pub(crate) unidade: Option<String>,
    /// Inline rows; when absent the cached data of the session is used.
    #[serde(default)]
    pub(crate) dados: Option<Value>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DraftsResponse {
    pub(crate) unidade: String,
    pub(crate) total: usize,
    pub(crate) total_vagas: u64,
    pub(crate) escalas: Vec<ScheduleEntry>,
}

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/vagas", post(vagas_endpoint))
        .route("/api/v1/dashboard", post(dashboard_endpoint))
        .route(
            "/api/v1/escalas",
            get(list_drafts_endpoint).post(add_draft_endpoint),
        )
        .route("/api/v1/escalas/export", get(export_drafts_endpoint))
        .route("/api/v1/escalas/:index", delete(remove_draft_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn vagas_endpoint(Json(payload): Json<VagasRequest>) -> Json<VagasResponse> {
    let total = calculate_total_slots(
        payload.vagas,
        &payload.dias_semana,
        &payload.vigencia_inicio,
        &payload.vigencia_fim,
    );
    Json(VagasResponse {
        total,
        total_label: format_number(total),
    })
}

pub(crate) async fn dashboard_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<DashboardRequest>,
) -> Result<Json<DashboardSummary>, AppError> {
    let filter = DashboardFilter::parse(
        payload.mes.as_deref().unwrap_or(ALL_MONTHS),
        payload.unidade.as_deref().unwrap_or(ALL_UNITS),
    )?;

    let sessions = state.sessions();
    let entries = match payload.dados {
        Some(dados) => normalize_list(&dados, &sessions.active_unit()?),
        None => dashboard_source(&*state.store, &sessions)?,
    };

    Ok(Json(DashboardView::new(entries).summarize(&filter)))
}

pub(crate) async fn list_drafts_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<DraftsResponse>, AppError> {
    let unit = state.sessions().active_unit()?;
    let escalas = DraftBook::new(&*state.store, unit.clone()).list()?;

    Ok(Json(DraftsResponse {
        unidade: unit,
        total: escalas.len(),
        total_vagas: escalas.iter().map(ScheduleEntry::total_slots).sum(),
        escalas,
    }))
}

pub(crate) async fn add_draft_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    let unit = state.sessions().active_unit()?;
    let entry = normalize_entry(&payload, &unit)
        .ok_or_else(|| AppError::Validation("escala deve ser um objeto JSON".to_string()))?;

    let _guard = state.writes.lock().await;
    let total = DraftBook::new(&*state.store, unit).add(entry)?;
    info!(total, "draft saved");

    Ok((StatusCode::CREATED, Json(json!({ "total": total }))))
}

pub(crate) async fn remove_draft_endpoint(
    Extension(state): Extension<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<Value>, AppError> {
    let unit = state.sessions().active_unit()?;

    let _guard = state.writes.lock().await;
    let book = DraftBook::new(&*state.store, unit);
    let removed = book.remove(index)?;
    let total = book.list()?.len();

    Ok(Json(json!({ "removida": removed, "total": total })))
}

pub(crate) async fn export_drafts_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let unit = state.sessions().active_unit()?;
    let drafts = DraftBook::new(&*state.store, unit.clone()).list()?;
    if drafts.is_empty() {
        return Err(DraftError::Empty.into());
    }

    let csv = export_csv(&drafts, &unit)?;
    let file_name = export_file_name(&unit, Local::now().date_naive());
    let content_type = mime_guess::from_path(&file_name).first_or_octet_stream();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        csv,
    ))
}
