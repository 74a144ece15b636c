// tests/practice_chat_tests.rs

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{Json, Router, routing::post};
use chrono::Utc;
use common::{
    CORRECT, INCORRECT, ScriptedCompletion, spawn_app, spawn_app_with, test_config, test_pool,
    wednesday,
};
use grammar_tutor::{
    error::AppError,
    services::{
        challenge,
        completion::{ChatTurn, CompletionClient},
    },
};
use serde_json::{Value, json};
use sqlx::SqlitePool;

/// Inserts the day's challenge itself while "generating", simulating a
/// concurrent request that wins the insert.
struct RacingCompletion {
    pool: SqlitePool,
    calls: AtomicUsize,
}

#[async_trait]
impl CompletionClient for RacingCompletion {
    async fn complete(&self, _turns: &[ChatTurn], _max_tokens: u32) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        sqlx::query(
            "INSERT INTO daily_challenges (date, incorrect_sentence, correct_sentence, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(wednesday())
        .bind("Him and me goes there.")
        .bind("He and I go there.")
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .unwrap();

        Ok(json!({ "incorrect": INCORRECT, "correct": CORRECT }).to_string())
    }
}

#[tokio::test]
async fn losing_the_insert_race_returns_the_stored_challenge() {
    // Arrange
    let pool = test_pool().await;
    let racer = RacingCompletion {
        pool: pool.clone(),
        calls: AtomicUsize::new(0),
    };

    // Act
    let result = challenge::get_or_create(&pool, &racer, wednesday(), 2)
        .await
        .unwrap();

    // Assert: the other writer's row wins, no duplicate
    assert_eq!(result.incorrect_sentence, "Him and me goes there.");
    assert_eq!(racer.calls.load(Ordering::SeqCst), 1);
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM daily_challenges")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn chat_answer_is_stored_for_known_user() {
    // Arrange
    let completion = ScriptedCompletion::always("Use **whom** for objects.");
    let app = spawn_app_with(test_config(), completion).await;
    let (user_id, _) = app.user_with_token().await;

    // Act
    let response = app
        .client
        .post(app.url("/api/grammar-chat/ask"))
        .json(&json!({ "question": "  Who or whom?  ", "userId": user_id }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["answer"], "Use **whom** for objects.");

    let turns = app.completion.last_turns.lock().unwrap().clone();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, "system");
    assert_eq!(turns[1].content, "Who or whom?");

    let history: Vec<Value> = app
        .client
        .get(app.url(&format!("/api/grammar-chat/history/{}", user_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[0]["content"], "Who or whom?");
    assert_eq!(history[1]["role"], "assistant");
}

#[tokio::test]
async fn chat_without_model_is_503() {
    let app = spawn_app_with(test_config(), ScriptedCompletion::failing()).await;

    let response = app
        .client
        .post(app.url("/api/grammar-chat/ask"))
        .json(&json!({ "question": "What is a gerund?" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 503);
}

#[tokio::test]
async fn chat_rejects_blank_question() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/grammar-chat/ask"))
        .json(&json!({ "question": "   " }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.completion.calls(), 0);
}

#[tokio::test]
async fn practice_attempts_are_saved_and_listed_newest_first() {
    // Arrange
    let app = spawn_app().await;
    let (user_id, _) = app.user_with_token().await;

    // Act
    for topic in ["Commas", "Tenses"] {
        let response = app
            .client
            .post(app.url("/api/grammar-practice/save"))
            .json(&json!({
                "userId": user_id,
                "topic": topic,
                "prompt": "Fix the sentence.",
                "answer": "My answer.",
                "feedback": "Looks good."
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
    }

    // Assert
    let history: Vec<Value> = app
        .client
        .get(app.url(&format!("/api/grammar-practice/history/{}", user_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["topic"], "Tenses");
    assert_eq!(history[1]["topic"], "Commas");
}

#[tokio::test]
async fn practice_save_for_unknown_user_is_400() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/grammar-practice/save"))
        .json(&json!({
            "userId": 777_777,
            "topic": "Commas",
            "prompt": "Fix the sentence.",
            "answer": "",
            "feedback": ""
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn practice_proxy_without_upstream_is_503() {
    let app = spawn_app().await;

    let response = app
        .client
        .post(app.url("/api/grammar-practice/correct"))
        .json(&json!({ "sentence": "He go home." }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 503);
}

async fn spawn_practice_upstream() -> String {
    let upstream = Router::new()
        .route(
            "/correct",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "corrected": "He goes home.", "echo": body }))
            }),
        )
        .route(
            "/practice/generate",
            post(|| async { (axum::http::StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());
    tokio::spawn(async move {
        axum::serve(listener, upstream).await.unwrap();
    });
    address
}

#[tokio::test]
async fn practice_proxy_passes_json_through() {
    // Arrange
    let upstream = spawn_practice_upstream().await;
    let mut config = test_config();
    config.practice_service_url = Some(upstream);
    let app = spawn_app_with(config, ScriptedCompletion::failing()).await;

    // Act
    let corrected: Value = app
        .client
        .post(app.url("/api/grammar-practice/correct"))
        .json(&json!({ "sentence": "He go home." }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let failed = app
        .client
        .post(app.url("/api/grammar-practice/generate"))
        .json(&json!({ "topic": "Tenses" }))
        .send()
        .await
        .unwrap();

    // Assert
    assert_eq!(corrected["corrected"], "He goes home.");
    assert_eq!(corrected["echo"]["sentence"], "He go home.");
    assert_eq!(failed.status().as_u16(), 503);
}
