// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: profile, level and gamification.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ProfileUpdate, User};
use crate::routes::auth::normalize_email;
use crate::services::gamification::LevelProgress;
use crate::AppState;
use axum::{
    extract::State,
    routing::{get, put},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/usuarios/perfil", get(get_profile))
        .route("/usuarios/atualizar", put(update_profile))
        .route("/nivel", get(get_level))
        .route("/gamificacao", get(get_gamification))
}

// ─── User Profile ────────────────────────────────────────────

/// Get current user profile.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<User>> {
    let profile = state
        .db
        .get_user(user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;
    Ok(Json(profile))
}

/// Partial profile update. Omitted fields keep their stored values.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub nome: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(range(min = 1.0, max = 500.0))]
    pub peso: Option<f64>,
    #[validate(range(min = 0.3, max = 3.0))]
    pub altura: Option<f64>,
    #[validate(range(min = 1, max = 150))]
    pub idade: Option<i64>,
    #[validate(url)]
    pub avatar_url: Option<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UpdateProfileResponse {
    pub message: String,
    pub usuario: User,
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    WithRejection(Json(payload), _): WithRejection<Json<UpdateProfileRequest>, AppError>,
) -> Result<Json<UpdateProfileResponse>> {
    payload.validate()?;

    let update = ProfileUpdate {
        nome: payload.nome.map(|n| n.trim().to_string()),
        email: payload.email.as_deref().map(normalize_email),
        peso: payload.peso,
        altura: payload.altura,
        idade: payload.idade,
        avatar_url: payload.avatar_url,
    };

    let updated = state
        .db
        .update_profile(user.user_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    tracing::info!(user_id = user.user_id, "Profile updated");

    Ok(Json(UpdateProfileResponse {
        message: "Dados atualizados com sucesso".to_string(),
        usuario: updated,
    }))
}

// ─── Level & Gamification ────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct LevelResponse {
    pub nivel: u32,
}

/// Current level, derived from cumulative XP.
async fn get_level(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<LevelResponse>> {
    let gamification = state
        .tracking
        .gamification(user.user_id, chrono::Utc::now())
        .await?;
    Ok(Json(LevelResponse {
        nivel: gamification.level(),
    }))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AchievementResponse {
    pub codigo: String,
    pub titulo: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GamificationResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub xp: u64,
    pub nivel: u32,
    pub progresso: LevelProgress,
    pub sequencia: u32,
    /// Last login day (YYYY-MM-DD)
    pub ultimo_login: Option<String>,
    pub conquistas: Vec<AchievementResponse>,
}

async fn get_gamification(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<GamificationResponse>> {
    let gamification = state
        .tracking
        .gamification(user.user_id, chrono::Utc::now())
        .await?;

    Ok(Json(GamificationResponse {
        xp: gamification.xp,
        nivel: gamification.level(),
        progresso: gamification.progress(),
        sequencia: gamification.streak,
        ultimo_login: gamification.last_login_day.map(|d| d.to_string()),
        conquistas: gamification
            .achievements
            .iter()
            .map(|a| AchievementResponse {
                codigo: a.code().to_string(),
                titulo: a.title().to_string(),
            })
            .collect(),
    }))
}
