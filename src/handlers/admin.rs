// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        learning_resource::ResourceRequest,
        user::{USER_COLUMNS, User},
    },
    utils::{html::clean_html, jwt::Claims},
};

/// Lists all users in the system, including their streak counters.
/// Admin only.
pub async fn list_users(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY id DESC"
    ))
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list users: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(users))
}

/// Deletes a user by ID, along with their practice and chat history.
/// Admin only. Prevents deleting self.
pub async fn delete_user(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == claims.user_id()? {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete user: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Creates a new learning resource.
/// Admin only. Article HTML is sanitized before storage.
pub async fn create_resource(
    State(pool): State<SqlitePool>,
    Json(mut payload): Json<ResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.topic = payload.topic.trim().to_string();
    payload.validate()?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO learning_resources (topic, content)
        VALUES (?, ?)
        RETURNING id
        "#,
    )
    .bind(&payload.topic)
    .bind(clean_html(&payload.content))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create learning resource: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// DTO for updating a learning resource. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateResourceRequest {
    #[validate(length(min = 1, max = 100))]
    pub topic: Option<String>,
    #[validate(length(min = 1, max = 20000))]
    pub content: Option<String>,
}

/// Updates a learning resource by ID.
/// Admin only.
pub async fn update_resource(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(mut payload): Json<UpdateResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.topic = payload.topic.map(|topic| topic.trim().to_string());
    payload.validate()?;

    if payload.topic.is_none() && payload.content.is_none() {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE learning_resources SET ");
    let mut separated = builder.separated(", ");

    if let Some(topic) = payload.topic {
        separated.push("topic = ");
        separated.push_bind_unseparated(topic);
    }

    if let Some(content) = payload.content {
        separated.push("content = ");
        separated.push_bind_unseparated(clean_html(&content));
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update learning resource: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Learning resource not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a learning resource by ID.
/// Admin only.
pub async fn delete_resource(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM learning_resources WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Learning resource not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
