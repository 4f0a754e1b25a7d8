// src/models/course.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::double_option;

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub name: String,

    /// Short join code handed out to students. Unique.
    pub code: String,

    pub teacher_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Represents the 'course_enrollments' table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

/// DTO for creating a new course.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    pub teacher_id: Option<Uuid>,
}

/// Partial update for a course.
/// `teacher_id: null` clears the teacher, an absent key leaves it alone.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CoursePatch {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub teacher_id: Option<Option<Uuid>>,
}

impl CoursePatch {
    pub fn apply_to(self, course: &mut Course) {
        if let Some(name) = self.name {
            course.name = name;
        }
        if let Some(code) = self.code {
            course.code = code;
        }
        if let Some(teacher_id) = self.teacher_id {
            course.teacher_id = teacher_id;
        }
    }
}

/// Query parameters for joining a course by code.
#[derive(Debug, Deserialize)]
pub struct JoinCourseParams {
    pub course_code: String,
}
