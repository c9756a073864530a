// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;
use vita_tracker::config::Config;
use vita_tracker::db::Database;
use vita_tracker::routes::create_router;
use vita_tracker::AppState;

/// Create a test app backed by a private in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default()).await
}

/// Create a test app with a specific frontend URL (controls cookie `Secure`).
#[allow(dead_code)]
pub async fn create_test_app_with_frontend_url(frontend_url: &str) -> (Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with_config(config).await
}

/// Create a test app from an arbitrary config.
#[allow(dead_code)]
pub async fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let db = Database::in_memory()
        .await
        .expect("Failed to open in-memory database");
    let state = Arc::new(AppState::new(config, db));
    (create_router(state.clone()), state)
}

/// Create a test JWT token.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: i64, signing_key: &[u8]) -> String {
    #[derive(Serialize)]
    struct Claims {
        sub: String,
        exp: usize,
        iat: usize,
    }

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + 3600,
        iat: now,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .unwrap()
}

/// Build a JSON request, optionally authenticated with a bearer token.
#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Build an authenticated GET request.
#[allow(dead_code)]
pub fn get_request(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

/// Send a request and decode the JSON body (`Value::Null` when empty).
#[allow(dead_code)]
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

/// Registration payload for `email`.
#[allow(dead_code)]
pub fn registration(email: &str) -> Value {
    json!({
        "nome": "Maria",
        "email": email,
        "senha": "senha-segura",
        "peso": 65.0,
        "altura": 1.70,
        "idade": 31
    })
}

/// Register a user and log in. Returns the user ID and session token.
#[allow(dead_code)]
pub async fn register_and_login(app: &Router, email: &str) -> (i64, String) {
    let (status, body) = send(app, json_request("POST", "/cadastro", None, registration(email))).await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");

    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/login",
            None,
            json!({ "email": email, "senha": "senha-segura" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");

    let user_id = body["userId"].as_i64().unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    (user_id, token)
}
