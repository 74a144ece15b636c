// src/models/learning_resource.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'learning_resources' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct LearningResource {
    pub id: i64,

    /// Grammar topic (e.g., "Subject-Verb Agreement").
    pub topic: String,

    /// Article body. HTML is sanitized on write.
    pub content: String,
}

/// DTO for creating or replacing a learning resource.
/// `topic` is trimmed before validation.
#[derive(Debug, Deserialize, Validate)]
pub struct ResourceRequest {
    #[validate(length(min = 1, max = 100))]
    pub topic: String,
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
}
