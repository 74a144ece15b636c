// src/models/practice_attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'practice_attempts' table in the database.
/// Stores one graded free-form practice exercise.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeAttempt {
    pub id: i64,
    pub user_id: i64,
    pub topic: String,
    pub prompt: String,
    pub answer: String,
    pub feedback: String,
    pub date: chrono::DateTime<chrono::Utc>,
}

/// DTO for saving a practice attempt.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SavePracticeRequest {
    pub user_id: i64,
    #[validate(length(min = 1, max = 100))]
    pub topic: String,
    #[validate(length(min = 1, max = 4000))]
    pub prompt: String,
    #[validate(length(max = 4000))]
    pub answer: String,
    #[validate(length(max = 8000))]
    pub feedback: String,
}
