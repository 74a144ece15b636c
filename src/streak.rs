// src/streak.rs

//! Daily-streak state machine.
//!
//! Everything here is pure: the persistence layer loads a [`StreakState`],
//! calls one of the transition functions with "today", and writes the result
//! back atomically.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DAYS_PER_WEEK: usize = 7;

/// Status of one day in the weekly calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    #[default]
    Idle,
    Correct,
    Wrong,
}

/// Seven day cells, index 0 = Sunday ... index 6 = Saturday.
///
/// Serialized as a JSON array of lowercase strings. Arrays of the wrong length
/// are padded with `idle` or truncated when read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<DayStatus>")]
pub struct WeeklyProgress([DayStatus; DAYS_PER_WEEK]);

impl WeeklyProgress {
    pub fn idle() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn cells(&self) -> &[DayStatus; DAYS_PER_WEEK] {
        &self.0
    }

    #[cfg(test)]
    fn on(&self, date: NaiveDate) -> DayStatus {
        self.0[day_index(date)]
    }

    pub fn set(&mut self, date: NaiveDate, status: DayStatus) {
        self.0[day_index(date)] = status;
    }

    pub fn to_json(&self) -> String {
        // A fixed array of unit enum variants always serializes.
        serde_json::to_string(&self.0).unwrap_or_else(|_| IDLE_WEEK_JSON.to_string())
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

const IDLE_WEEK_JSON: &str = r#"["idle","idle","idle","idle","idle","idle","idle"]"#;

impl From<Vec<DayStatus>> for WeeklyProgress {
    fn from(cells: Vec<DayStatus>) -> Self {
        let mut week = [DayStatus::Idle; DAYS_PER_WEEK];
        for (slot, status) in week.iter_mut().zip(cells) {
            *slot = status;
        }
        Self(week)
    }
}

/// Per-user streak fields as stored on the user row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakState {
    pub streak_count: i64,
    /// Date of the most recent correct submission.
    pub last_challenge_date: Option<NaiveDate>,
    /// Sunday of the week cached in `weekly_progress`.
    pub week_start_date: Option<NaiveDate>,
    pub weekly_progress: WeeklyProgress,
}

/// Result of grading one submission against the current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub was_correct: bool,
    /// True when a correct answer had already been scored today.
    pub already_completed: bool,
    pub state: StreakState,
}

/// The Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    days_before(date, u64::from(date.weekday().num_days_from_sunday()))
}

/// Case-insensitive, whitespace-trimmed exact match. Blank answers never match.
pub fn grade(user_answer: Option<&str>, correct_sentence: &str) -> bool {
    let answer = user_answer.map(str::trim).unwrap_or_default();
    let expected = correct_sentence.trim();

    if answer.is_empty() || expected.is_empty() {
        return false;
    }

    answer.to_lowercase() == expected.to_lowercase()
}

fn day_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_sunday() as usize
}

fn days_before(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(date)
}

impl Default for StreakState {
    fn default() -> Self {
        Self {
            streak_count: 0,
            last_challenge_date: None,
            week_start_date: None,
            weekly_progress: WeeklyProgress::idle(),
        }
    }
}

impl StreakState {
    /// State after an administrative reset performed on `today`.
    pub fn cleared(today: NaiveDate) -> Self {
        Self {
            week_start_date: Some(week_start(today)),
            ..Self::default()
        }
    }

    /// Normalizes stale state before any read or write.
    ///
    /// * A cached calendar from another week is reset to all-idle.
    /// * A last completion dated after today (clock rollback) is dropped.
    /// * A streak whose last completion is older than yesterday has lapsed.
    pub fn repaired(&self, today: NaiveDate) -> Self {
        let mut next = self.clone();

        if next.last_challenge_date.is_some_and(|last| last > today) {
            next.last_challenge_date = None;
        }

        let current_week = week_start(today);
        if next.week_start_date != Some(current_week) {
            next.weekly_progress = WeeklyProgress::idle();
            next.week_start_date = Some(current_week);
        }

        let yesterday = days_before(today, 1);
        let lapsed = next
            .last_challenge_date
            .is_none_or(|last| last < yesterday);
        if next.streak_count > 0 && lapsed {
            next.streak_count = 0;
        }
        if next.streak_count < 0 {
            next.streak_count = 0;
        }

        next
    }

    /// Applies one graded submission made on `today`.
    ///
    /// Only the first correct answer of a day moves the streak. Until then every
    /// attempt overwrites today's calendar cell; afterwards the cell stays
    /// `correct` and further attempts change nothing.
    pub fn submit(&self, today: NaiveDate, was_correct: bool) -> SubmissionOutcome {
        let mut next = self.repaired(today);
        let already_completed = next.last_challenge_date == Some(today);

        if already_completed {
            next.weekly_progress.set(today, DayStatus::Correct);
        } else if was_correct {
            let yesterday = days_before(today, 1);
            next.streak_count = if next.last_challenge_date == Some(yesterday) {
                next.streak_count + 1
            } else {
                1
            };
            next.last_challenge_date = Some(today);
            next.weekly_progress.set(today, DayStatus::Correct);
        } else {
            next.streak_count = 0;
            next.weekly_progress.set(today, DayStatus::Wrong);
        }

        SubmissionOutcome {
            was_correct,
            already_completed,
            state: next,
        }
    }
}
