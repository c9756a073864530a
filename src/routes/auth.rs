// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Registration, login and logout routes.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, SESSION_COOKIE};
use crate::models::NewUser;
use crate::services::password::{hash_password, verify_password};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cadastro", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub nome: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub senha: String,
    /// Kilograms
    #[validate(range(min = 1.0, max = 500.0))]
    pub peso: f64,
    /// Meters
    #[validate(range(min = 0.3, max = 3.0))]
    pub altura: f64,
    #[validate(range(min = 1, max = 150))]
    pub idade: i64,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RegisterResponse {
    pub message: String,
    pub id_usuario: i64,
}

/// Create an account. Emails are stored trimmed and lowercased.
async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(payload), _): WithRejection<Json<RegisterRequest>, AppError>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    payload.validate()?;

    // PBKDF2 is CPU-bound; keep it off the async workers.
    let senha = payload.senha.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&senha))
        .await
        .map_err(anyhow::Error::from)??;
    let user = NewUser {
        nome: payload.nome.trim().to_string(),
        email: normalize_email(&payload.email),
        password_hash,
        peso: payload.peso,
        altura: payload.altura,
        idade: payload.idade,
    };

    let id = state.db.create_user(&user, chrono::Utc::now()).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Usuário cadastrado com sucesso!".to_string(),
            id_usuario: id,
        }),
    ))
}

// ─── Login / Logout ──────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub senha: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user_id: i64,
}

/// Verify credentials, record the day's login and start a session.
///
/// The token is returned in the body and set as an HTTP-only cookie.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(payload), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    payload.validate()?;

    let email = normalize_email(&payload.email);
    let credentials = state
        .db
        .find_credentials(&email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let senha = payload.senha;
    let stored = credentials.password_hash.clone();
    let password_ok = tokio::task::spawn_blocking(move || verify_password(&senha, &stored))
        .await
        .map_err(anyhow::Error::from)?;

    if !password_ok {
        tracing::info!(user_id = credentials.id, "Login rejected: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let gamification = state
        .tracking
        .register_login(credentials.id, chrono::Utc::now())
        .await?;

    let token = create_jwt(credentials.id, &state.config.jwt_signing_key)?;

    tracing::info!(
        user_id = credentials.id,
        streak = gamification.streak,
        "User logged in"
    );

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies())
        .same_site(SameSite::Lax);

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            message: format!("Bem-vindo, {}", credentials.nome),
            token,
            user_id: credentials.id,
        }),
    ))
}

/// Clear the session cookie.
async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
