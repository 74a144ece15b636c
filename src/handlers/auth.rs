// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    clock::Clock,
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{CreateUserRequest, LoginRequest, USER_COLUMNS, User},
    streak::{WeeklyProgress, week_start},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it. The streak calendar
/// starts idle for the current week.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<SqlitePool>,
    State(clock): State<std::sync::Arc<dyn Clock>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, password, week_start_date, weekly_progress, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(&payload.username)
    .bind(hashed_password)
    .bind(week_start(clock.today()))
    .bind(WeeklyProgress::idle().to_json())
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict(format!("Username '{}' already exists", payload.username))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id = user.id, "Registered user");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user and returns a JWT token.
///
/// Verifies the username and password against the database.
/// If valid, signs a JWT token with the user's ID and role.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = ?"
    ))
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    let user = user.ok_or(AppError::AuthError("Invalid username or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid username or password".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "userId": user.id,
        "role": user.role,
    })))
}
