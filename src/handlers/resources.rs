// src/handlers/resources.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{error::AppError, models::learning_resource::LearningResource};

/// Lists all learning resources.
pub async fn list_resources(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let resources = sqlx::query_as::<_, LearningResource>(
        "SELECT id, topic, content FROM learning_resources ORDER BY id",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(resources))
}

/// Retrieves a single learning resource by ID.
pub async fn get_resource(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let resource = sqlx::query_as::<_, LearningResource>(
        "SELECT id, topic, content FROM learning_resources WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Learning resource not found".to_string()))?;

    Ok(Json(resource))
}
