// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Question type tag. Stored as the Postgres enum `question_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "question_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    #[default]
    SingleChoice,
    MultipleChoice,
    TrueFalse,
}

/// Represents the 'quiz_questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub quiz_id: Uuid,

    /// The text content of the question.
    pub content: String,

    /// Mapped from the database column 'type' since `type` is a reserved keyword in Rust.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Configured point value. Stored and returned, not used for grading.
    pub points: i32,

    /// Insertion order inside the quiz.
    #[serde(skip)]
    pub position: i32,
}

/// Represents the 'question_options' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: Uuid,
    pub question_id: Uuid,
    pub content: String,
    pub is_correct: bool,

    #[serde(skip)]
    pub position: i32,
}

/// A question together with its ordered options.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionWithOptions {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<QuestionOption>,
}

/// DTO for adding one question to a quiz.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    #[serde(rename = "type", default)]
    pub question_type: QuestionType,
    #[validate(range(min = 0, max = 1000))]
    pub points: i32,
    #[validate(nested)]
    pub options: Vec<CreateOptionRequest>,
}

/// Bounds on the number of options a single question may carry.
pub const MIN_OPTIONS: usize = 1;
pub const MAX_OPTIONS: usize = 20;

impl CreateQuestionRequest {
    pub fn check_option_count(&self) -> Result<(), String> {
        if self.options.len() < MIN_OPTIONS || self.options.len() > MAX_OPTIONS {
            return Err(format!(
                "A question must have between {} and {} options",
                MIN_OPTIONS, MAX_OPTIONS
            ));
        }
        Ok(())
    }
}

/// DTO for one option of a new question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOptionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[serde(default)]
    pub is_correct: bool,
}
