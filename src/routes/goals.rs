// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily goal routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::tracking::{DailyProgress, GoalTargets};
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/metas", get(get_goals).post(save_goals))
}

/// Today's goals with progress. Water values are in milliliters.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GoalsView {
    pub meta_hid: f64,
    pub meta_cal: f64,
    pub meta_peso: Option<f64>,
    /// YYYY-MM-DD
    pub data_meta: String,
    pub meta_hid_atual: f64,
    pub meta_cal_atual: f64,
    pub progresso_hid: u8,
    pub progresso_cal: u8,
    pub meta_hid_concluida: bool,
    pub meta_cal_concluida: bool,
}

impl From<DailyProgress> for GoalsView {
    fn from(progress: DailyProgress) -> Self {
        Self {
            meta_hid: progress.goal.meta_hid,
            meta_cal: progress.goal.meta_cal,
            meta_peso: progress.goal.meta_peso,
            data_meta: progress.goal.goal_date.to_string(),
            meta_hid_atual: progress.water_ml,
            meta_cal_atual: progress.calories,
            progresso_hid: progress.water.percent,
            progresso_cal: progress.calorie.percent,
            meta_hid_concluida: progress.water.met,
            meta_cal_concluida: progress.calorie.met,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GoalsResponse {
    pub metas: GoalsView,
}

async fn get_goals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<GoalsResponse>> {
    let progress = state
        .tracking
        .goals_today(user.user_id, chrono::Utc::now())
        .await?;
    Ok(Json(GoalsResponse {
        metas: progress.into(),
    }))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveGoalsRequest {
    /// Milliliters
    #[validate(range(exclusive_min = 0.0, max = 20000.0))]
    pub meta_agua: f64,
    /// Kcal
    #[validate(range(exclusive_min = 0.0, max = 20000.0))]
    pub meta_calorias: f64,
    /// Kilograms
    #[validate(range(min = 1.0, max = 500.0))]
    pub meta_peso: Option<f64>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SaveGoalsResponse {
    pub message: String,
    pub metas: GoalsView,
}

async fn save_goals(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<SaveGoalsRequest>, AppError>,
) -> Result<Json<SaveGoalsResponse>> {
    payload.validate()?;

    let targets = GoalTargets {
        water_ml: payload.meta_agua,
        calories: payload.meta_calorias,
        weight_kg: payload.meta_peso,
    };
    let progress = state
        .tracking
        .set_goals(user.user_id, targets, chrono::Utc::now())
        .await?;

    Ok(Json(SaveGoalsResponse {
        message: "Metas salvas com sucesso!".to_string(),
        metas: progress.into(),
    }))
}
