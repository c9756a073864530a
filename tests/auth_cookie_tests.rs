// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie tests.
//!
//! These tests verify the cookie set on login, that it authenticates
//! requests on its own, and that logout removes it.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

async fn login_response(app: &axum::Router) -> Response {
    let (status, _) = common::send(
        app,
        common::json_request(
            "POST",
            "/cadastro",
            None,
            common::registration("cookie@example.com"),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    app.clone()
        .oneshot(common::json_request(
            "POST",
            "/login",
            None,
            json!({ "email": "cookie@example.com", "senha": "senha-segura" }),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_login_sets_http_only_cookie() {
    let (app, _) = common::create_test_app_with_frontend_url("http://localhost:5173").await;

    let response = login_response(&app).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = find_cookie(&set_cookie_headers(&response), "vita_token");
    assert!(cookie.contains("HttpOnly"), "{cookie}");
    assert!(cookie.contains("Path=/"), "{cookie}");
    assert!(cookie.contains("SameSite=Lax"), "{cookie}");
    assert!(!cookie.contains("Secure"), "{cookie}");
}

#[tokio::test]
async fn test_login_cookie_is_secure_for_https_frontend() {
    let (app, _) = common::create_test_app_with_frontend_url("https://vita.example.com").await;

    let response = login_response(&app).await;
    let cookie = find_cookie(&set_cookie_headers(&response), "vita_token");
    assert!(cookie.contains("Secure"), "{cookie}");
}

#[tokio::test]
async fn test_cookie_alone_authenticates() {
    let (app, _) = common::create_test_app().await;

    let response = login_response(&app).await;
    let cookie = find_cookie(&set_cookie_headers(&response), "vita_token");
    let pair = cookie.split(';').next().unwrap().to_string();

    let (status, body) = common::send(
        &app,
        Request::builder()
            .method("GET")
            .uri("/nivel")
            .header(header::COOKIE, pair)
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nivel"], 1);
}

#[tokio::test]
async fn test_logout_removes_cookie() {
    let (app, _) = common::create_test_app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header(header::COOKIE, "vita_token=test")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let cookie = find_cookie(&set_cookie_headers(&response), "vita_token");
    assert!(cookie.contains("Path=/"), "{cookie}");
    assert!(cookie.contains("Max-Age=0"), "{cookie}");
}
