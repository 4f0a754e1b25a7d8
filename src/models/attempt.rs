// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::pagination::PageParams;

/// Represents the 'quiz_attempts' table in the database.
///
/// Lifecycle: created by start (score and finished_at null), graded exactly
/// once by submit, immutable afterwards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quiz_id: Uuid,

    /// 1-based, unique per (user_id, quiz_id).
    pub attempt_number: i32,

    /// Normalized 0-10 score with one decimal. `None` until graded.
    pub score: Option<f64>,

    pub started_at: DateTime<Utc>,

    /// `None` while the attempt is in progress.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Attempt {
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

/// Represents the 'quiz_attempt_answers' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AttemptAnswer {
    pub id: Uuid,
    pub attempt_id: Uuid,
    pub question_id: Uuid,
    pub option_id: Option<Uuid>,
    pub is_correct: bool,

    /// Binary per-question score: 1 when correct, else 0.
    pub score: i32,
}

/// A graded answer ready to be persisted with its attempt.
#[derive(Debug, Clone)]
pub struct NewAttemptAnswer {
    pub question_id: Uuid,
    pub option_id: Option<Uuid>,
    pub is_correct: bool,
    pub score: i32,
}

/// Attempt joined with the owning user's display name.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptWithUser {
    #[sqlx(flatten)]
    pub attempt: Attempt,
    pub user_name: Option<String>,
}

/// DTO for starting an attempt.
#[derive(Debug, Deserialize)]
pub struct StartAttemptRequest {
    pub user_id: Uuid,
    pub quiz_id: Uuid,
}

/// One entry of a submission body.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    #[serde(default)]
    pub option_id: Option<Uuid>,
}

/// Graded attempt as returned by submit and get.
#[derive(Debug, Serialize)]
pub struct AttemptDetail {
    #[serde(flatten)]
    pub attempt: Attempt,
    pub correct_count: i64,
    pub total_questions: i64,
    pub answers: Vec<AttemptAnswer>,
}

/// Query parameters for listing attempts.
#[derive(Debug, Deserialize)]
pub struct AttemptListParams {
    pub user_id: Option<Uuid>,
    pub quiz_id: Option<Uuid>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl AttemptListParams {
    pub fn page_params(&self) -> PageParams {
        let defaults = PageParams::default();
        PageParams::new(
            self.page.unwrap_or(defaults.page),
            self.page_size.unwrap_or(defaults.page_size),
        )
    }
}

/// Filter for attempt listings. Both fields are optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptFilter {
    pub user_id: Option<Uuid>,
    pub quiz_id: Option<Uuid>,
}

/// One attempt inside a grouped report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptSummary {
    pub attempt_id: Uuid,
    pub attempt_number: i32,
    pub score: Option<f64>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// All attempts of one user on one quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAttemptGroup {
    pub user_id: Uuid,
    pub user_name: String,
    pub attempts: Vec<AttemptSummary>,
}
