// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end tests for record logging, summaries, goals and gamification.

use axum::http::StatusCode;
use serde_json::json;

mod common;

use common::{get_request, json_request, register_and_login, send};

#[tokio::test]
async fn test_new_user_summary_is_empty() {
    let (app, _) = common::create_test_app().await;
    let (_, token) = register_and_login(&app, "ana@example.com").await;

    let (status, body) = send(&app, get_request("/registro/resumo", &token)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "totalAgua": 0.0, "totalCalorias": 0 }));
}

#[tokio::test]
async fn test_logged_records_appear_in_summary_and_history() {
    let (app, _) = common::create_test_app().await;
    let (user_id, token) = register_and_login(&app, "ana@example.com").await;

    for liters in [0.5, 0.25] {
        let (status, body) = send(
            &app,
            json_request(
                "POST",
                "/registro/hidratacao",
                Some(&token),
                json!({ "qntd_hid": liters }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Hidratação registrada com sucesso!");
        assert_eq!(body["registro"]["id_usuario"], user_id);
        assert_eq!(body["registro"]["quantidade"], liters);
    }

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/registro/calorias",
            Some(&token),
            json!({ "qntd_cal": 420 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, summary) = send(&app, get_request("/registro/resumo", &token)).await;
    assert_eq!(summary["totalAgua"], 0.75);
    assert_eq!(summary["totalCalorias"], 420);

    let (status, history) = send(&app, get_request("/registro/hidratacao/historico", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let registros = history["registros"].as_array().unwrap();
    assert_eq!(registros.len(), 2);
    // Newest first
    assert_eq!(registros[0]["quantidade"], 0.25);
    assert!(registros[0]["data"].as_str().unwrap().ends_with('Z'));

    let (_, history) = send(&app, get_request("/registro/calorias/historico", &token)).await;
    assert_eq!(history["registros"][0]["quantidade"], 420.0);
}

#[tokio::test]
async fn test_records_are_private_to_each_user() {
    let (app, _) = common::create_test_app().await;
    let (_, ana) = register_and_login(&app, "ana@example.com").await;
    let (_, bia) = register_and_login(&app, "bia@example.com").await;

    send(
        &app,
        json_request("POST", "/registro/hidratacao", Some(&ana), json!({ "qntd_hid": 1.0 })),
    )
    .await;

    let (_, summary) = send(&app, get_request("/registro/resumo", &bia)).await;
    assert_eq!(summary["totalAgua"], 0.0);

    let (_, history) = send(&app, get_request("/registro/hidratacao/historico", &bia)).await;
    assert!(history["registros"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_goals_default_when_unset() {
    let (app, _) = common::create_test_app().await;
    let (_, token) = register_and_login(&app, "ana@example.com").await;

    let (status, body) = send(&app, get_request("/metas", &token)).await;

    assert_eq!(status, StatusCode::OK);
    let metas = &body["metas"];
    assert_eq!(metas["meta_hid"], 2000.0);
    assert_eq!(metas["meta_cal"], 2000.0);
    assert_eq!(metas["meta_hid_atual"], 0.0);
    assert_eq!(metas["meta_cal_atual"], 0.0);
    assert_eq!(metas["meta_hid_concluida"], false);
}

#[tokio::test]
async fn test_save_goals_and_progress() {
    let (app, _) = common::create_test_app().await;
    let (_, token) = register_and_login(&app, "ana@example.com").await;

    send(
        &app,
        json_request("POST", "/registro/hidratacao", Some(&token), json!({ "qntd_hid": 0.75 })),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/metas",
            Some(&token),
            json!({ "metaAgua": 1500, "metaCalorias": 1800, "metaPeso": 60 }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Metas salvas com sucesso!");
    let metas = &body["metas"];
    assert_eq!(metas["meta_hid"], 1500.0);
    assert_eq!(metas["meta_cal"], 1800.0);
    assert_eq!(metas["meta_peso"], 60.0);
    assert_eq!(metas["meta_hid_atual"], 750.0);
    assert_eq!(metas["progresso_hid"], 50);

    // Saving again overwrites the same day's row.
    let (_, body) = send(
        &app,
        json_request(
            "POST",
            "/metas",
            Some(&token),
            json!({ "metaAgua": 3000, "metaCalorias": 1800 }),
        ),
    )
    .await;
    assert_eq!(body["metas"]["meta_hid"], 3000.0);
    assert_eq!(body["metas"]["meta_peso"], 60.0);
    assert_eq!(body["metas"]["progresso_hid"], 25);
}

#[tokio::test]
async fn test_goal_completion_awards_once() {
    let (app, _) = common::create_test_app().await;
    let (_, token) = register_and_login(&app, "ana@example.com").await;

    // Login bonus only.
    let (_, body) = send(&app, get_request("/gamificacao", &token)).await;
    assert_eq!(body["xp"], 100);
    assert_eq!(body["sequencia"], 1);

    send(
        &app,
        json_request(
            "POST",
            "/metas",
            Some(&token),
            json!({ "metaAgua": 1000, "metaCalorias": 2000 }),
        ),
    )
    .await;

    let (_, body) = send(
        &app,
        json_request("POST", "/registro/hidratacao", Some(&token), json!({ "qntd_hid": 1.0 })),
    )
    .await;
    // 100 login + 100 activity (1000 ml) + 500 goal
    assert_eq!(body["xp"], 700);

    // Further records and reads do not re-award the goal.
    send(
        &app,
        json_request("POST", "/registro/hidratacao", Some(&token), json!({ "qntd_hid": 0.1 })),
    )
    .await;
    send(&app, get_request("/metas", &token)).await;

    let (_, body) = send(&app, get_request("/gamificacao", &token)).await;
    assert_eq!(body["xp"], 710);
    assert!(body["conquistas"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_level_up_and_achievement() {
    let (app, _) = common::create_test_app().await;
    let (_, token) = register_and_login(&app, "ana@example.com").await;

    let (_, body) = send(
        &app,
        json_request("POST", "/registro/hidratacao", Some(&token), json!({ "qntd_hid": 2.0 })),
    )
    .await;
    // 100 login + 200 activity + 500 water goal + 250 water_master
    assert_eq!(body["xp"], 1050);
    assert_eq!(body["nivel"], 2);

    let (_, body) = send(&app, get_request("/nivel", &token)).await;
    assert_eq!(body, json!({ "nivel": 2 }));

    let (_, body) = send(&app, get_request("/gamificacao", &token)).await;
    assert_eq!(body["progresso"]["current_level_xp"], 1000);
    assert_eq!(body["progresso"]["next_level_xp"], 2500);
    assert_eq!(body["progresso"]["percent"], 3);
    assert_eq!(body["conquistas"][0]["codigo"], "water_master");
    assert_eq!(body["conquistas"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_repeat_login_same_day_no_extra_bonus() {
    let (app, _) = common::create_test_app().await;
    let (_, token) = register_and_login(&app, "ana@example.com").await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/login",
            None,
            json!({ "email": "ana@example.com", "senha": "senha-segura" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get_request("/gamificacao", &token)).await;
    assert_eq!(body["xp"], 100);
    assert_eq!(body["sequencia"], 1);
    assert!(body["ultimo_login"].is_string());
}
