// tests/common/mod.rs

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use grammar_tutor::{
    clock::ManualClock,
    config::Config,
    error::AppError,
    routes,
    services::completion::{ChatTurn, CompletionClient},
    state::AppState,
};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub const INCORRECT: &str = "If I was you, I would of studied harder.";
pub const CORRECT: &str = "If I were you, I would have studied harder.";

pub fn challenge_reply() -> String {
    serde_json::json!({ "incorrect": INCORRECT, "correct": CORRECT }).to_string()
}

/// 2025-11-05, a Wednesday.
pub fn wednesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 11, 5).unwrap()
}

/// Completion client that replays queued replies, then a fallback.
/// `None` entries fail the call.
pub struct ScriptedCompletion {
    queue: Mutex<VecDeque<Option<String>>>,
    fallback: Option<String>,
    calls: AtomicUsize,
    pub last_turns: Mutex<Vec<ChatTurn>>,
}

impl ScriptedCompletion {
    pub fn always(reply: impl Into<String>) -> Self {
        Self::new(Vec::new(), Some(reply.into()))
    }

    pub fn failing() -> Self {
        Self::new(Vec::new(), None)
    }

    pub fn new(queue: Vec<Option<String>>, fallback: Option<String>) -> Self {
        Self {
            queue: Mutex::new(queue.into()),
            fallback,
            calls: AtomicUsize::new(0),
            last_turns: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    async fn complete(&self, turns: &[ChatTurn], _max_tokens: u32) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_turns.lock().unwrap() = turns.to_vec();

        let next = self
            .queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        next.ok_or_else(|| AppError::UpstreamUnavailable("scripted failure".to_string()))
    }
}

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub clock: Arc<ManualClock>,
    pub completion: Arc<ScriptedCompletion>,
    pub client: reqwest::Client,
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        server_port: 0,
        admin_username: None,
        admin_password: None,
        openai: None,
        practice_service_url: None,
        challenge_generation_attempts: 2,
    }
}

/// Fresh in-memory database with migrations applied.
pub async fn test_pool() -> SqlitePool {
    // A single connection that never expires keeps the in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    pool
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(), ScriptedCompletion::always(challenge_reply())).await
}

/// Spawns the app on a random port with the given configuration and model.
pub async fn spawn_app_with(config: Config, completion: ScriptedCompletion) -> TestApp {
    let pool = test_pool().await;
    let clock = Arc::new(ManualClock::new(wednesday()));
    let completion = Arc::new(completion);

    let state = AppState::new(pool.clone(), config, clock.clone(), completion.clone());
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        clock,
        completion,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Registers a user and returns their id.
    pub async fn register(&self, username: &str, password: &str) -> i64 {
        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Register failed");
        assert_eq!(response.status().as_u16(), 201);

        let user: serde_json::Value = response.json().await.unwrap();
        user["id"].as_i64().expect("id missing")
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let body: serde_json::Value = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login failed")
            .json()
            .await
            .expect("Failed to parse login json");

        body["token"].as_str().expect("Token not found").to_string()
    }

    /// Registers a fresh user and returns (id, bearer token).
    pub async fn user_with_token(&self) -> (i64, String) {
        let username = unique_name("u");
        let id = self.register(&username, "password123").await;
        let token = self.login(&username, "password123").await;
        (id, token)
    }

    pub async fn promote_to_admin(&self, user_id: i64) {
        sqlx::query("UPDATE users SET role = 'admin' WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .unwrap();
    }

    pub async fn today_challenge_id(&self) -> i64 {
        let body: serde_json::Value = self
            .client
            .get(self.url("/api/daily-challenges/today"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["id"].as_i64().expect("challenge id missing")
    }

    pub async fn submit(&self, user_id: i64, challenge_id: i64, answer: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/daily-challenges/submit"))
            .json(&serde_json::json!({
                "userId": user_id,
                "challengeId": challenge_id,
                "userAnswer": answer,
            }))
            .send()
            .await
            .expect("Submit failed")
    }

    pub async fn weekly_progress(&self, user_id: i64) -> serde_json::Value {
        self.client
            .get(self.url(&format!("/api/daily-challenges/weekly-progress/{}", user_id)))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }
}

pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().to_string()[..8])
}
