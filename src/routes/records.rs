// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hydration and calorie logging, history and the daily summary.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{HistoryEntry, Record, RecordKind};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/registro/hidratacao", post(log_hydration))
        .route("/registro/calorias", post(log_calories))
        .route("/registro/hidratacao/historico", get(hydration_history))
        .route("/registro/calorias/historico", get(calorie_history))
        .route("/registro/resumo", get(daily_summary))
}

// ─── Logging ─────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct HydrationRequest {
    /// Liters
    #[validate(range(exclusive_min = 0.0, max = 20.0))]
    pub qntd_hid: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CaloriesRequest {
    /// Kcal
    #[validate(range(exclusive_min = 0.0, max = 20000.0))]
    pub qntd_cal: f64,
}

/// The stored record as echoed back to the client.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RecordResponse {
    pub id: i64,
    pub id_usuario: i64,
    pub quantidade: f64,
    pub data: String,
}

impl From<Record> for RecordResponse {
    fn from(record: Record) -> Self {
        Self {
            id: record.id,
            id_usuario: record.user_id,
            quantidade: record.amount,
            data: format_utc_rfc3339(record.recorded_at),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LogRecordResponse {
    pub message: String,
    pub registro: RecordResponse,
    /// Cumulative XP after this record and any awards it triggered
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp: u64,
    pub nivel: u32,
}

async fn log_hydration(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<HydrationRequest>, AppError>,
) -> Result<Json<LogRecordResponse>> {
    payload.validate()?;
    log_record(
        &state,
        user,
        RecordKind::Hydration,
        payload.qntd_hid,
        "Hidratação registrada com sucesso!",
    )
    .await
}

async fn log_calories(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<CaloriesRequest>, AppError>,
) -> Result<Json<LogRecordResponse>> {
    payload.validate()?;
    log_record(
        &state,
        user,
        RecordKind::Calories,
        payload.qntd_cal,
        "Calorias registradas com sucesso!",
    )
    .await
}

async fn log_record(
    state: &AppState,
    user: AuthUser,
    kind: RecordKind,
    amount: f64,
    message: &str,
) -> Result<Json<LogRecordResponse>> {
    let (record, progress) = state
        .tracking
        .log_record(user.user_id, kind, amount, chrono::Utc::now())
        .await?;

    Ok(Json(LogRecordResponse {
        message: message.to_string(),
        registro: record.into(),
        xp: progress.gamification.xp,
        nivel: progress.gamification.level(),
    }))
}

// ─── History ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HistoryResponse {
    pub registros: Vec<HistoryEntry>,
}

async fn hydration_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<HistoryResponse>> {
    history(&state, user, RecordKind::Hydration).await
}

async fn calorie_history(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<HistoryResponse>> {
    history(&state, user, RecordKind::Calories).await
}

async fn history(
    state: &AppState,
    user: AuthUser,
    kind: RecordKind,
) -> Result<Json<HistoryResponse>> {
    let records = state.tracking.history(user.user_id, kind).await?;
    Ok(Json(HistoryResponse {
        registros: records.iter().map(HistoryEntry::from).collect(),
    }))
}

// ─── Summary ─────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    /// Liters
    pub total_agua: f64,
    /// Kcal
    pub total_calorias: i64,
}

/// Today's totals.
async fn daily_summary(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SummaryResponse>> {
    let summary = state
        .tracking
        .daily_summary(user.user_id, chrono::Utc::now())
        .await?;

    Ok(Json(SummaryResponse {
        total_agua: summary.water_liters,
        // Calorie records are whole numbers.
        total_calorias: summary.calories.round() as i64,
    }))
}
