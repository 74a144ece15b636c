use std::sync::Arc;

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    clock::Clock,
    error::{AppError, is_unique_violation},
    models::user::{MeResponse, UpdateProfileRequest},
    services::streak_store,
    utils::{hash::hash_password, jwt::Claims},
};

/// Get current user's profile and statistics.
///
/// The streak is repaired for missed days before it is reported.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    State(clock): State<Arc<dyn Clock>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let streak = streak_store::refresh(&pool, clock.today(), user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let user = streak_store::find_user(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let practice_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM practice_attempts WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&pool)
            .await?;

    Ok(Json(MeResponse {
        id: user.id,
        username: user.username,
        role: user.role,
        created_at: user.created_at,
        streak_count: streak.streak_count,
        last_challenge_date: streak.last_challenge_date,
        practice_count,
    }))
}

/// Updates the current user's username and/or password.
pub async fn update_me(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let hashed_password = payload
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;

    let result = sqlx::query(
        r#"
        UPDATE users SET
            username = COALESCE(?, username),
            password = COALESCE(?, password)
        WHERE id = ?
        "#,
    )
    .bind(&payload.username)
    .bind(hashed_password)
    .bind(user_id)
    .execute(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!(
                "Username '{}' already exists",
                payload.username.as_deref().unwrap_or_default()
            ))
        } else {
            tracing::error!("Failed to update profile: {:?}", e);
            AppError::from(e)
        }
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
