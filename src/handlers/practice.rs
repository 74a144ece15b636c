use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::practice_attempt::{PracticeAttempt, SavePracticeRequest},
    services::practice::PracticeClient,
};

/// Forwards a sentence to the practice service for correction.
pub async fn correct(
    State(practice): State<PracticeClient>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(practice.forward("/correct", &body).await?))
}

/// Asks the practice service for a new exercise on a topic.
pub async fn generate(
    State(practice): State<PracticeClient>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(practice.forward("/practice/generate", &body).await?))
}

/// Stores a finished practice attempt.
pub async fn save(
    State(pool): State<SqlitePool>,
    Json(req): Json<SavePracticeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO practice_attempts (user_id, topic, prompt, answer, feedback, date)
        SELECT id, ?, ?, ?, ?, ? FROM users WHERE id = ?
        RETURNING id
        "#,
    )
    .bind(&req.topic)
    .bind(&req.prompt)
    .bind(&req.answer)
    .bind(&req.feedback)
    .bind(Utc::now())
    .bind(req.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::BadRequest("User not found.".to_string()))?;

    Ok(Json(json!({ "success": true, "id": id })))
}

/// Lists a user's practice attempts, newest first.
pub async fn history(
    State(pool): State<SqlitePool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = sqlx::query_as::<_, PracticeAttempt>(
        r#"
        SELECT id, user_id, topic, prompt, answer, feedback, date
        FROM practice_attempts
        WHERE user_id = ?
        ORDER BY date DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(attempts))
}
