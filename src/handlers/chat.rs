use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::chat_message::{AskRequest, AskResponse, ChatMessage},
    services::completion::{ChatTurn, DEFAULT_MAX_TOKENS},
    state::AppState,
};

const TUTOR_SYSTEM_PROMPT: &str = "You are a grammar tutor. Format your responses using Markdown. \
     Use bullet points, headings, and short paragraphs.";

/// Answers a grammar question with the language model.
///
/// The model sees only this question. If `userId` names an existing user the
/// question and the answer are appended to their chat history.
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let question = req.question.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("Question must not be empty.".to_string()));
    }

    let answer = state
        .completion
        .complete(
            &[ChatTurn::system(TUTOR_SYSTEM_PROMPT), ChatTurn::user(question)],
            DEFAULT_MAX_TOKENS,
        )
        .await?;

    if let Some(user_id) = req.user_id {
        let mut tx = state.pool.begin().await?;
        let now = Utc::now();
        for (role, content) in [("user", question), ("assistant", answer.as_str())] {
            sqlx::query(
                r#"
                INSERT INTO chat_messages (user_id, role, content, timestamp)
                SELECT id, ?, ?, ? FROM users WHERE id = ?
                "#,
            )
            .bind(role)
            .bind(content)
            .bind(now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
    }

    Ok(Json(AskResponse { answer }))
}

/// Lists a user's stored chat turns, oldest first.
pub async fn history(
    State(pool): State<SqlitePool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let messages = sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT id, user_id, role, content, timestamp
        FROM chat_messages
        WHERE user_id = ?
        ORDER BY id ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(messages))
}
