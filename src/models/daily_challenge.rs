// src/models/daily_challenge.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::streak::WeeklyProgress;

/// Represents the 'daily_challenges' table in the database.
/// One row per calendar date, never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
    pub id: i64,
    pub date: NaiveDate,
    pub incorrect_sentence: String,
    pub correct_sentence: String,
}

/// DTO for sending today's challenge to the client (excludes the correction).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicChallenge {
    pub id: i64,
    pub date: NaiveDate,
    pub incorrect_sentence: String,
}

impl From<DailyChallenge> for PublicChallenge {
    fn from(challenge: DailyChallenge) -> Self {
        Self {
            id: challenge.id,
            date: challenge.date,
            incorrect_sentence: challenge.incorrect_sentence,
        }
    }
}

/// DTO for submitting an answer to a daily challenge.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub user_id: i64,
    pub challenge_id: i64,
    #[validate(length(max = 1000, message = "Answer must be at most 1000 characters."))]
    pub user_answer: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub was_correct: bool,
    pub new_streak_count: i64,
    pub weekly_progress: WeeklyProgress,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyProgressResponse {
    pub weekly_progress: WeeklyProgress,
    pub week_start_date: Option<NaiveDate>,
    pub streak_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearStreakResponse {
    pub message: String,
    pub new_streak_count: i64,
}
