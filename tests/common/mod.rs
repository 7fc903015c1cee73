#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use chemquiz_backend::config::{AiConfig, ServerConfig};
use chemquiz_backend::db::{create_memory_pool, DbPool};
use chemquiz_backend::domain::QuestionDraft;
use chemquiz_backend::routes::build_router;
use chemquiz_backend::state::AppState;
use chemquiz_backend::synth::{
    FallbackReason, QuestionSynthesizer, Synthesis, SynthesisOrigin, SynthesisRequest,
};

/// Test configuration: no model key, small request clamp.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        database_max_connections: 1,
        jwt_secret: "integration-test-secret".to_string(),
        jwt_expiry_days: 1,
        max_questions_per_request: 5,
        persist_fallback: false,
        ai: AiConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9/v1".to_string(),
            model: "test-model".to_string(),
            temperature: 0.7,
            timeout_secs: 1,
        },
    }
}

/// Synthesizer that produces fresh, valid drafts with unique texts on every call.
pub struct ScriptedSynth {
    pub calls: AtomicUsize,
    pub fail: bool,
}

impl ScriptedSynth {
    pub fn new() -> Self {
        Self { calls: AtomicUsize::new(0), fail: false }
    }

    pub fn failing() -> Self {
        Self { calls: AtomicUsize::new(0), fail: true }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionSynthesizer for ScriptedSynth {
    async fn synthesize(&self, req: &SynthesisRequest<'_>) -> Synthesis {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Synthesis::fallback(req.topic, req.count, FallbackReason::Upstream("down".into()));
        }
        let drafts = (0..req.count)
            .map(|i| QuestionDraft {
                topic: req.topic.to_string(),
                text: format!("{} - questão {call}.{i}", req.topic),
                options: ["1", "2", "3", "4", "5"].into_iter().map(String::from).collect(),
                correct_answer: i % 5,
                explanation: Some("explicação".into()),
            })
            .collect();
        Synthesis { drafts, origin: SynthesisOrigin::Model }
    }
}

pub async fn build_test_app_with(synth: Arc<dyn QuestionSynthesizer>) -> (Router, DbPool) {
    let pool = create_memory_pool().await.expect("in-memory pool");
    let state = AppState::new(pool.clone(), &test_config(), synth);
    (build_router(Arc::new(state)), pool)
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {t}"));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log in through the API and return the bearer token.
pub async fn login(app: Router, username: &str) -> String {
    let response = post_json(app, "/api/login", serde_json::json!({ "username": username })).await;
    assert_eq!(response.status(), 200);
    body_json(response).await["token"].as_str().unwrap().to_string()
}
