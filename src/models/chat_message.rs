// src/models/chat_message.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'chat_messages' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: i64,

    /// 'user' or 'assistant'.
    pub role: String,

    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// DTO for asking the grammar tutor a question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AskRequest {
    #[validate(length(min = 1, max = 4000, message = "Question must be between 1 and 4000 characters."))]
    pub question: String,

    /// When set, the exchange is stored in the user's chat history.
    pub user_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
}
