// src/models/user.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::{
    error::AppError,
    streak::{StreakState, WeeklyProgress},
};

/// Column list matching [`User`]'s `FromRow` layout.
pub const USER_COLUMNS: &str = "id, username, password, role, streak_count, \
     last_challenge_date, week_start_date, weekly_progress, streak_version, created_at";

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,

    /// Unique username.
    pub username: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// User role: 'user' or 'admin'.
    pub role: String,

    /// Consecutive days with a correct daily-challenge answer.
    pub streak_count: i64,

    pub last_challenge_date: Option<NaiveDate>,

    pub week_start_date: Option<NaiveDate>,

    /// JSON array of seven day statuses, Sunday first.
    #[serde(skip)]
    pub weekly_progress: String,

    /// Bumped on every streak write; used as the compare-and-swap token.
    #[serde(skip)]
    pub streak_version: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl User {
    pub fn streak_state(&self) -> Result<StreakState, AppError> {
        let weekly_progress = WeeklyProgress::from_json(&self.weekly_progress).map_err(|e| {
            AppError::InternalServerError(format!(
                "Corrupt weekly progress for user {}: {}",
                self.id, e
            ))
        })?;

        Ok(StreakState {
            streak_count: self.streak_count,
            last_challenge_date: self.last_challenge_date,
            week_start_date: self.week_start_date,
            weekly_progress,
        })
    }
}

/// Aggregated user profile data for the current user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub streak_count: i64,
    pub last_challenge_date: Option<NaiveDate>,
    pub practice_count: i64,
}

/// DTO for creating a new user (Registration).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for editing the current user's profile. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: Option<String>,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: Option<String>,
}
