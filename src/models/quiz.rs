// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::double_option;

/// Represents the 'course_quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub course_id: Uuid,
    pub teacher_id: Option<Uuid>,

    /// Time limit in minutes. Informational only.
    pub time_limit: Option<i32>,

    /// Maximum attempts per user. `None` or `0` means unlimited.
    pub max_attempts: Option<i32>,

    pub total_points: Option<i32>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// Quiz as listed inside a course, enriched with the caller's attempt counters.
#[derive(Debug, Serialize)]
pub struct QuizSummary {
    #[serde(flatten)]
    pub quiz: Quiz,

    /// `finished_at` of the caller's highest-numbered attempt, if any.
    pub latest_attempt_finished_at: Option<DateTime<Utc>>,

    pub attempt_count: i64,

    /// `None` when the quiz has no attempt cap.
    pub remaining_attempts: Option<i64>,
}

/// DTO for creating a new quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub course_id: Uuid,
    #[validate(range(min = 1))]
    pub time_limit: Option<i32>,
    #[validate(range(min = 0))]
    pub max_attempts: Option<i32>,
    #[validate(range(min = 0))]
    pub total_points: Option<i32>,
    #[serde(default)]
    pub is_published: bool,
}

/// Partial update for a quiz.
/// Nullable columns accept an explicit `null` to clear them.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct QuizPatch {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub time_limit: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub max_attempts: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub total_points: Option<Option<i32>>,
    pub is_published: Option<bool>,
}

impl QuizPatch {
    /// Range checks for the nullable numeric fields, which the derive cannot reach.
    pub fn check_ranges(&self) -> Result<(), String> {
        if let Some(Some(limit)) = self.time_limit {
            if limit < 1 {
                return Err("time_limit must be at least 1".to_string());
            }
        }
        if let Some(Some(max)) = self.max_attempts {
            if max < 0 {
                return Err("max_attempts must not be negative".to_string());
            }
        }
        if let Some(Some(points)) = self.total_points {
            if points < 0 {
                return Err("total_points must not be negative".to_string());
            }
        }
        Ok(())
    }

    pub fn apply_to(self, quiz: &mut Quiz) {
        if let Some(title) = self.title {
            quiz.title = title;
        }
        if let Some(description) = self.description {
            quiz.description = description;
        }
        if let Some(time_limit) = self.time_limit {
            quiz.time_limit = time_limit;
        }
        if let Some(max_attempts) = self.max_attempts {
            quiz.max_attempts = max_attempts;
        }
        if let Some(total_points) = self.total_points {
            quiz.total_points = total_points;
        }
        if let Some(is_published) = self.is_published {
            quiz.is_published = is_published;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_quiz() -> Quiz {
        Quiz {
            id: Uuid::new_v4(),
            title: "Week 1".to_string(),
            description: Some("Intro".to_string()),
            course_id: Uuid::new_v4(),
            teacher_id: None,
            time_limit: Some(30),
            max_attempts: Some(3),
            total_points: Some(10),
            is_published: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_patch_clears_and_keeps() {
        let mut quiz = sample_quiz();
        let patch: QuizPatch =
            serde_json::from_str(r#"{"max_attempts": null, "is_published": true}"#).unwrap();

        patch.apply_to(&mut quiz);

        assert_eq!(quiz.max_attempts, None);
        assert!(quiz.is_published);
        assert_eq!(quiz.description.as_deref(), Some("Intro"));
        assert_eq!(quiz.time_limit, Some(30));
    }

    #[test]
    fn test_patch_rejects_negative_cap() {
        let patch: QuizPatch = serde_json::from_str(r#"{"max_attempts": -1}"#).unwrap();
        assert!(patch.check_ranges().is_err());
    }

    #[test]
    fn test_summary_flattens_quiz_fields() {
        let quiz = sample_quiz();
        let id = quiz.id;
        let summary = QuizSummary {
            quiz,
            latest_attempt_finished_at: None,
            attempt_count: 1,
            remaining_attempts: Some(2),
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["id"], serde_json::json!(id));
        assert_eq!(value["remaining_attempts"], 2);
        assert!(value["latest_attempt_finished_at"].is_null());
    }
}
