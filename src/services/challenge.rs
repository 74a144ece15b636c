// src/services/challenge.rs

//! Daily challenge lifecycle: look up today's row, or generate and persist it once.

use std::sync::LazyLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    error::{AppError, is_unique_violation},
    models::daily_challenge::DailyChallenge,
    services::completion::{ChatTurn, CompletionClient, DEFAULT_MAX_TOKENS},
};

/// The only failure message a client sees when today's challenge cannot be produced.
pub const CHALLENGE_UNAVAILABLE: &str = "Could not load today's challenge, try again later.";

const GENERATOR_SYSTEM_PROMPT: &str = "You are a grammar challenge generator.";

const GENERATOR_PROMPT: &str = r#"Write one English sentence for college-level students that contains an advanced grammatical error. Do not use simple spelling or capitalization mistakes. The error should come from one of these areas:
- advanced verb tense usage (subjunctive mood, past perfect continuous)
- parallelism
- conditional sentences
- misplaced modifiers
- pronoun reference
- punctuation in complex or compound sentences
- academic vocabulary misuse or word form confusion

Then give the corrected version of the same sentence.

Reply with valid JSON only, using exactly this structure:
{"incorrect": "...", "correct": "..."}"#;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("code fence pattern is valid")
});

/// Sentence pair returned by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratedChallenge {
    pub incorrect: String,
    pub correct: String,
}

/// Parses the model's reply into a sentence pair.
///
/// Markdown code fences and prose around the JSON object are tolerated. Empty
/// sentences, or a "mistake" identical to its correction, are rejected.
pub fn parse_generated(content: &str) -> Result<GeneratedChallenge, AppError> {
    let trimmed = content.trim();
    let unfenced = CODE_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str());

    let json = match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => {
            return Err(AppError::UpstreamUnavailable(
                "Generator reply contains no JSON object".to_string(),
            ));
        }
    };

    let parsed: GeneratedChallenge = serde_json::from_str(json).map_err(|e| {
        AppError::UpstreamUnavailable(format!("Generator reply is not a sentence pair: {}", e))
    })?;

    let pair = GeneratedChallenge {
        incorrect: parsed.incorrect.trim().to_string(),
        correct: parsed.correct.trim().to_string(),
    };

    if pair.incorrect.is_empty() || pair.correct.is_empty() {
        return Err(AppError::UpstreamUnavailable(
            "Generator returned an empty sentence".to_string(),
        ));
    }
    if pair.incorrect.eq_ignore_ascii_case(&pair.correct) {
        return Err(AppError::UpstreamUnavailable(
            "Generator returned identical sentences".to_string(),
        ));
    }

    Ok(pair)
}

/// Asks the model for a new sentence pair, making at most `attempts` calls.
pub async fn generate_challenge(
    client: &dyn CompletionClient,
    attempts: u32,
) -> Result<GeneratedChallenge, AppError> {
    let turns = [
        ChatTurn::system(GENERATOR_SYSTEM_PROMPT),
        ChatTurn::user(GENERATOR_PROMPT),
    ];
    let attempts = attempts.max(1);
    let mut last_error = AppError::UpstreamUnavailable(CHALLENGE_UNAVAILABLE.to_string());

    for attempt in 1..=attempts {
        let result = client
            .complete(&turns, DEFAULT_MAX_TOKENS)
            .await
            .and_then(|content| parse_generated(&content));

        match result {
            Ok(pair) => return Ok(pair),
            Err(e) => {
                tracing::warn!(attempt, attempts, "Challenge generation failed: {}", e);
                last_error = e;
            }
        }
    }

    Err(last_error)
}

pub async fn find_by_date(
    pool: &SqlitePool,
    date: NaiveDate,
) -> Result<Option<DailyChallenge>, AppError> {
    let challenge = sqlx::query_as::<_, DailyChallenge>(
        r#"
        SELECT id, date, incorrect_sentence, correct_sentence
        FROM daily_challenges
        WHERE date = ?
        "#,
    )
    .bind(date)
    .fetch_optional(pool)
    .await?;

    Ok(challenge)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<DailyChallenge>, AppError> {
    let challenge = sqlx::query_as::<_, DailyChallenge>(
        r#"
        SELECT id, date, incorrect_sentence, correct_sentence
        FROM daily_challenges
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(challenge)
}

/// Returns the challenge for `date`, generating and storing it if missing.
///
/// Concurrent first requests may both generate; the UNIQUE index on `date`
/// keeps the first insert and the loser re-reads it. Nothing is stored when
/// generation fails.
pub async fn get_or_create(
    pool: &SqlitePool,
    client: &dyn CompletionClient,
    date: NaiveDate,
    attempts: u32,
) -> Result<DailyChallenge, AppError> {
    if let Some(existing) = find_by_date(pool, date).await? {
        return Ok(existing);
    }

    let pair = generate_challenge(client, attempts).await.map_err(|e| {
        tracing::error!(%date, "Could not generate daily challenge: {}", e);
        AppError::UpstreamUnavailable(CHALLENGE_UNAVAILABLE.to_string())
    })?;

    let inserted = sqlx::query_as::<_, DailyChallenge>(
        r#"
        INSERT INTO daily_challenges (date, incorrect_sentence, correct_sentence, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, date, incorrect_sentence, correct_sentence
        "#,
    )
    .bind(date)
    .bind(&pair.incorrect)
    .bind(&pair.correct)
    .bind(Utc::now())
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(challenge) => {
            tracing::info!(%date, id = challenge.id, "Created daily challenge");
            Ok(challenge)
        }
        Err(e) if is_unique_violation(&e) => {
            tracing::debug!(%date, "Daily challenge created concurrently, re-reading");
            find_by_date(pool, date).await?.ok_or_else(|| {
                AppError::InternalServerError(format!(
                    "Daily challenge for {} vanished after a duplicate insert",
                    date
                ))
            })
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let pair = parse_generated(r#"{"incorrect": "If I was you, I would go.", "correct": "If I were you, I would go."}"#)
            .unwrap();
        assert_eq!(pair.incorrect, "If I was you, I would go.");
        assert_eq!(pair.correct, "If I were you, I would go.");
    }

    #[test]
    fn parses_fenced_json_with_padding() {
        let reply = "```json\n{\n  \"incorrect\": \" She like running, to swim, and biking. \",\n  \"correct\": \"She likes running, swimming, and biking.\"\n}\n```";
        let pair = parse_generated(reply).unwrap();
        assert_eq!(pair.incorrect, "She like running, to swim, and biking.");
        assert_eq!(pair.correct, "She likes running, swimming, and biking.");
    }

    #[test]
    fn parses_json_surrounded_by_prose() {
        let reply = r#"Sure! {"incorrect": "Walking home, the rain soaked me.", "correct": "Walking home, I was soaked by the rain."} Hope this helps."#;
        assert!(parse_generated(reply).is_ok());
    }

    #[test]
    fn rejects_unusable_replies() {
        for reply in [
            "",
            "no json here",
            r#"{"incorrect": "only one field"}"#,
            r#"{"incorrect": "", "correct": "Something."}"#,
            r#"{"incorrect": "Same.", "correct": "same."}"#,
        ] {
            let err = parse_generated(reply).unwrap_err();
            assert!(
                matches!(err, AppError::UpstreamUnavailable(_)),
                "reply {:?} gave {:?}",
                reply,
                err
            );
        }
    }
}
