//! HTTP-level integration tests: login, question delivery, progress, ranking,
//! gabarito correction and history, driven through the full router.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app_with, get, get_auth, login, post_json, post_json_auth, ScriptedSynth,
};
use serde_json::json;

use chemquiz_backend::store::QuestionRepo;

// ---------------------------------------------------------------------------
// End-to-end session
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_session_levels_up_at_ten_correct() {
    let synth = Arc::new(ScriptedSynth::new());
    let (app, pool) = build_test_app_with(synth.clone()).await;

    let response = post_json(app.clone(), "/api/login", json!({ "username": "  Ana " })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["username"], "Ana");
    assert_eq!(json["user"]["total_acertos"], 0);
    assert_eq!(json["user"]["nivel"], 1);
    let token = json["token"].as_str().unwrap().to_string();

    let response = get_auth(
        app.clone(),
        "/api/generate-question?topic=Estequiometria&count=3",
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let questions = body_json(response).await;
    let questions = questions.as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(synth.calls(), 1);
    for q in questions {
        assert_eq!(q["source"], "generated");
        assert_eq!(q["options"].as_array().unwrap().len(), 5);
        assert!(q["questionId"].is_i64());
        assert!(q["id"].is_string());
    }
    assert_eq!(
        QuestionRepo::count_by_topic(&pool, "Estequiometria").await.unwrap(),
        3
    );

    let response = post_json_auth(
        app.clone(),
        "/api/update-stats",
        &token,
        json!({ "acertos": 2, "erros": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["nivel"], 1);

    let stats = body_json(get_auth(app.clone(), "/api/stats", &token).await).await;
    assert_eq!(stats["username"], "Ana");
    assert_eq!(stats["total_acertos"], 2);
    assert_eq!(stats["total_erros"], 1);
    assert_eq!(stats["nivel"], 1);

    for _ in 0..4 {
        post_json_auth(
            app.clone(),
            "/api/update-stats",
            &token,
            json!({ "acertos": 2, "erros": 0 }),
        )
        .await;
    }
    let stats = body_json(get_auth(app.clone(), "/api/stats", &token).await).await;
    assert_eq!(stats["total_acertos"], 10);
    assert_eq!(stats["nivel"], 2);
}

// ---------------------------------------------------------------------------
// Question delivery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_request_is_served_from_cache() {
    let synth = Arc::new(ScriptedSynth::new());
    let (app, _pool) = build_test_app_with(synth.clone()).await;

    let first = body_json(get(app.clone(), "/api/generate-question?topic=pH&count=3").await).await;
    let second = body_json(get(app.clone(), "/api/generate-question?topic=pH&count=3").await).await;

    assert_eq!(synth.calls(), 1);
    let second = second.as_array().unwrap();
    assert_eq!(second.len(), 3);
    assert!(second.iter().all(|q| q["source"] == "cache"));

    let first_ids: HashSet<_> = first
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_str().unwrap().to_string())
        .collect();
    assert!(second
        .iter()
        .all(|q| !first_ids.contains(q["id"].as_str().unwrap())));
}

#[tokio::test]
async fn count_is_clamped_and_defaults_apply() {
    let synth = Arc::new(ScriptedSynth::new());
    let (app, pool) = build_test_app_with(synth.clone()).await;

    let many = body_json(get(app.clone(), "/api/generate-question?count=50").await).await;
    assert_eq!(many.as_array().unwrap().len(), 5);
    assert_eq!(many[0]["topic"], "Estequiometria");

    let junk = body_json(get(app.clone(), "/api/generate-question?topic=Gases&count=abc").await).await;
    assert_eq!(junk.as_array().unwrap().len(), 1);
    assert_eq!(QuestionRepo::count_by_topic(&pool, "Gases").await.unwrap(), 1);
}

#[tokio::test]
async fn ai_outage_serves_offline_questions_without_caching_them() {
    let synth = Arc::new(ScriptedSynth::failing());
    let (app, pool) = build_test_app_with(synth.clone()).await;

    let response = get(app.clone(), "/api/generate-question?topic=Pilhas&count=2").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let items = json.as_array().unwrap();
    assert_eq!(items.len(), 2);
    let first_id = items[0]["id"].as_str().unwrap().to_string();
    assert!(first_id.starts_with("fallback-") && first_id.ends_with("-0"));
    assert!(items[1]["id"].as_str().unwrap().ends_with("-1"));
    assert!(items.iter().all(|q| q["source"] == "fallback" && q["questionId"].is_null()));
    assert_eq!(QuestionRepo::count_by_topic(&pool, "Pilhas").await.unwrap(), 0);

    let again = body_json(get(app, "/api/generate-question?topic=Pilhas&count=2").await).await;
    assert_ne!(again[0]["id"].as_str().unwrap(), first_id);
}

#[tokio::test]
async fn invalid_token_degrades_to_guest_for_questions() {
    let (app, _pool) = build_test_app_with(Arc::new(ScriptedSynth::new())).await;
    let response = get_auth(app, "/api/generate-question?count=1", "not-a-token").await;
    assert_eq!(response.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Identity and progress
// ---------------------------------------------------------------------------

#[tokio::test]
async fn blank_login_is_rejected() {
    let (app, _pool) = build_test_app_with(Arc::new(ScriptedSynth::new())).await;
    let response = post_json(app, "/api/login", json!({ "username": "   " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn stats_require_identity() {
    let (app, _pool) = build_test_app_with(Arc::new(ScriptedSynth::new())).await;

    let response = get(app.clone(), "/api/stats").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(app, "/api/stats", "garbage").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn guest_update_is_a_successful_noop() {
    let (app, pool) = build_test_app_with(Arc::new(ScriptedSynth::new())).await;
    let token = login(app.clone(), "Bia").await;

    let response = post_json(app.clone(), "/api/update-stats", json!({ "acertos": 7, "erros": 2 })).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert!(json["nivel"].is_null());

    let stats = body_json(get_auth(app, "/api/stats", &token).await).await;
    assert_eq!(stats["total_acertos"], 0);

    let totals: Vec<i64> = sqlx::query_scalar("SELECT total_acertos FROM users")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(totals, vec![0]);
}

#[tokio::test]
async fn rankings_are_ordered_by_correct_answers() {
    let (app, _pool) = build_test_app_with(Arc::new(ScriptedSynth::new())).await;
    for (name, acertos) in [("Caio", 3), ("Duda", 12), ("Enzo", 7)] {
        let token = login(app.clone(), name).await;
        post_json_auth(
            app.clone(),
            "/api/update-stats",
            &token,
            json!({ "acertos": acertos, "erros": 0 }),
        )
        .await;
    }

    let json = body_json(get(app, "/api/rankings").await).await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["nickname"], "Duda");
    assert_eq!(rows[0]["xp"], 12);
    assert_eq!(rows[0]["nivel"], 2);
    assert_eq!(rows[1]["nickname"], "Enzo");
    assert_eq!(rows[2]["nickname"], "Caio");
}

// ---------------------------------------------------------------------------
// Gabarito correction
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fix_question_rewrites_index_and_reports_errors() {
    let (app, pool) = build_test_app_with(Arc::new(ScriptedSynth::new())).await;
    let served = body_json(get(app.clone(), "/api/generate-question?topic=Mol&count=1").await).await;
    let question_id = served[0]["questionId"].as_i64().unwrap();

    let response = post_json(
        app.clone(),
        "/api/fix-question",
        json!({ "questionId": question_id, "correctAnswer": 4 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["success"], true);
    let stored = QuestionRepo::find_by_id(&pool, question_id).await.unwrap().unwrap();
    assert_eq!(stored.correct_answer, 4);

    let response = post_json(
        app.clone(),
        "/api/fix-question",
        json!({ "questionId": question_id + 99, "correctAnswer": 1 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_json(
        app,
        "/api/fix-question",
        json!({ "questionId": question_id, "correctAnswer": 9 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[tokio::test]
async fn history_records_signed_in_attempts_only() {
    let (app, _pool) = build_test_app_with(Arc::new(ScriptedSynth::new())).await;
    let token = login(app.clone(), "Gabi").await;

    let attempt = json!({
        "topic": "pH",
        "correct": true,
        "questionText": "Qual o pH da água pura a 25 °C?",
        "userAnswer": "7",
        "timeTaken": 14
    });
    let response = post_json_auth(app.clone(), "/api/submit", &token, attempt.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = post_json(app.clone(), "/api/submit", attempt).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get_auth(app.clone(), "/api/history", &token).await).await;
    let entries = json.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["questionText"], "Qual o pH da água pura a 25 °C?");
    assert_eq!(entries[0]["timeTaken"], 14);

    let response = get(app, "/api/history").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _pool) = build_test_app_with(Arc::new(ScriptedSynth::new())).await;
    let response = get(app, "/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["ok"], true);
}
