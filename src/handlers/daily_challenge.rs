// src/handlers/daily_challenge.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::daily_challenge::{
        ClearStreakResponse, PublicChallenge, SubmitAnswerRequest, SubmitAnswerResponse,
        WeeklyProgressResponse,
    },
    services::{challenge, streak_store},
    state::AppState,
    utils::jwt::Claims,
};

const USER_NOT_FOUND: &str = "User not found.";

/// Returns today's challenge, generating it on the first request of the day.
/// The corrected sentence is never sent to the client.
pub async fn get_today(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let today = state.clock.today();
    let challenge = challenge::get_or_create(
        &state.pool,
        state.completion.as_ref(),
        today,
        state.config.challenge_generation_attempts,
    )
    .await?;

    Ok(Json(PublicChallenge::from(challenge)))
}

/// Grades an answer and updates the user's streak and weekly calendar.
///
/// Returns 400 if the user or challenge does not exist.
pub async fn submit_answer(
    State(state): State<AppState>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let outcome = streak_store::submit_answer(&state.pool, state.clock.today(), &req).await?;

    Ok(Json(SubmitAnswerResponse {
        was_correct: outcome.was_correct,
        new_streak_count: outcome.state.streak_count,
        weekly_progress: outcome.state.weekly_progress,
    }))
}

/// Returns the current week's calendar, resetting stale weeks and lapsed streaks first.
pub async fn get_weekly_progress(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let streak = streak_store::refresh(&state.pool, state.clock.today(), user_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(USER_NOT_FOUND.to_string()))?;

    Ok(Json(WeeklyProgressResponse {
        weekly_progress: streak.weekly_progress,
        week_start_date: streak.week_start_date,
        streak_count: streak.streak_count,
    }))
}

/// Clears a user's streak history.
/// Allowed for the user themself or an admin.
pub async fn clear_streak(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    claims.ensure_self_or_admin(user_id)?;

    let streak = streak_store::clear(&state.pool, state.clock.today(), user_id)
        .await?
        .ok_or_else(|| AppError::BadRequest(USER_NOT_FOUND.to_string()))?;

    Ok(Json(ClearStreakResponse {
        message: "Streak history cleared successfully".to_string(),
        new_streak_count: streak.streak_count,
    }))
}
