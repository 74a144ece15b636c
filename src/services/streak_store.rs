// src/services/streak_store.rs

//! Persistence around the streak state machine.
//!
//! Every operation loads the user row, runs a pure transition from
//! [`crate::streak`], and writes the result back with a compare-and-swap on
//! `streak_version`. A lost race re-reads and re-applies the transition, so a
//! duplicated submission sees the first one's result and becomes a no-op.

use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        daily_challenge::SubmitAnswerRequest,
        user::{USER_COLUMNS, User},
    },
    services::challenge,
    streak::{self, StreakState, SubmissionOutcome},
};

const MAX_CAS_ATTEMPTS: usize = 3;

pub const INVALID_SUBMISSION: &str = "Invalid user or challenge.";

pub async fn find_user(pool: &SqlitePool, user_id: i64) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Runs `transition` against the stored state and persists the result.
///
/// Returns `Ok(None)` if the user does not exist. Unchanged state is not written.
async fn apply<T>(
    pool: &SqlitePool,
    user_id: i64,
    transition: impl Fn(&StreakState) -> (StreakState, T),
) -> Result<Option<(StreakState, T)>, AppError> {
    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let Some(user) = find_user(pool, user_id).await? else {
            return Ok(None);
        };

        let current = user.streak_state()?;
        let (next, extra) = transition(&current);
        if next == current {
            return Ok(Some((next, extra)));
        }

        let result = sqlx::query(
            r#"
            UPDATE users SET
                streak_count = ?,
                last_challenge_date = ?,
                week_start_date = ?,
                weekly_progress = ?,
                streak_version = streak_version + 1
            WHERE id = ? AND streak_version = ?
            "#,
        )
        .bind(next.streak_count)
        .bind(next.last_challenge_date)
        .bind(next.week_start_date)
        .bind(next.weekly_progress.to_json())
        .bind(user_id)
        .bind(user.streak_version)
        .execute(pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(Some((next, extra)));
        }

        tracing::debug!(user_id, attempt, "Streak row changed concurrently, retrying");
    }

    tracing::warn!(user_id, "Giving up on contended streak update");
    Err(AppError::Conflict(
        "Streak is being updated by another request, please retry.".to_string(),
    ))
}

/// Grades an answer to a daily challenge and advances the user's streak.
pub async fn submit_answer(
    pool: &SqlitePool,
    today: NaiveDate,
    req: &SubmitAnswerRequest,
) -> Result<SubmissionOutcome, AppError> {
    let challenge = challenge::find_by_id(pool, req.challenge_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(INVALID_SUBMISSION.to_string()))?;

    let was_correct = streak::grade(req.user_answer.as_deref(), &challenge.correct_sentence);

    let (state, already_completed) = apply(pool, req.user_id, |current| {
        let outcome = current.submit(today, was_correct);
        (outcome.state, outcome.already_completed)
    })
    .await?
    .ok_or_else(|| AppError::BadRequest(INVALID_SUBMISSION.to_string()))?;

    tracing::info!(
        user_id = req.user_id,
        challenge_id = challenge.id,
        was_correct,
        already_completed,
        streak = state.streak_count,
        "Daily challenge answer graded"
    );

    Ok(SubmissionOutcome {
        was_correct,
        already_completed,
        state,
    })
}

/// Loads the user's streak after lazy week-rollover and skip repair.
pub async fn refresh(
    pool: &SqlitePool,
    today: NaiveDate,
    user_id: i64,
) -> Result<Option<StreakState>, AppError> {
    let repaired = apply(pool, user_id, |current| (current.repaired(today), ()))
        .await?
        .map(|(state, ())| state);

    Ok(repaired)
}

/// Resets the user's streak history.
pub async fn clear(
    pool: &SqlitePool,
    today: NaiveDate,
    user_id: i64,
) -> Result<Option<StreakState>, AppError> {
    let cleared = apply(pool, user_id, |_| (StreakState::cleared(today), ()))
        .await?
        .map(|(state, ())| state);

    if cleared.is_some() {
        tracing::info!(user_id, "Streak history cleared");
    }

    Ok(cleared)
}
