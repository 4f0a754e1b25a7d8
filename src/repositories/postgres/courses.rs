// src/repositories/postgres/courses.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{is_unique_violation, violated_constraint};
use crate::{
    error::{AppError, AppResult},
    models::{
        course::{Course, Enrollment},
        user::User,
    },
    repositories::CourseRepository,
};

const COLUMNS: &str = "id, name, code, teacher_id, created_at";

pub struct PgCourseRepository {
    pool: PgPool,
}

impl PgCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_course_conflict(err: sqlx::Error, course: &Course) -> AppError {
    if is_unique_violation(&err) {
        match violated_constraint(&err).as_deref() {
            Some("courses_code_key") => {
                AppError::Conflict(format!("Course code '{}' already exists", course.code))
            }
            _ => AppError::Conflict(format!("Course name '{}' already exists", course.name)),
        }
    } else {
        tracing::error!("Course write failed: {:?}", err);
        AppError::from(err)
    }
}

#[async_trait]
impl CourseRepository for PgCourseRepository {
    async fn create(&self, course: Course) -> AppResult<Course> {
        sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses (id, name, code, teacher_id, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        ))
        .bind(course.id)
        .bind(&course.name)
        .bind(&course.code)
        .bind(course.teacher_id)
        .bind(course.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_course_conflict(e, &course))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COLUMNS} FROM courses WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn find_by_code(&self, code: &str) -> AppResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COLUMNS} FROM courses WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(course)
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Course>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
            .fetch_one(&self.pool)
            .await?;

        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COLUMNS} FROM courses
             ORDER BY created_at ASC, id ASC
             OFFSET $1 LIMIT $2"
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok((courses, total))
    }

    async fn list_enrolled(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Course>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM course_enrollments WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        let courses = sqlx::query_as::<_, Course>(
            "SELECT c.id, c.name, c.code, c.teacher_id, c.created_at
             FROM courses c
             JOIN course_enrollments e ON e.course_id = c.id
             WHERE e.user_id = $1
             ORDER BY e.joined_at ASC, c.id ASC
             OFFSET $2 LIMIT $3",
        )
        .bind(user_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok((courses, total))
    }

    async fn update(&self, course: &Course) -> AppResult<Option<Course>> {
        sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses SET name = $1, code = $2, teacher_id = $3
             WHERE id = $4
             RETURNING {COLUMNS}"
        ))
        .bind(&course.name)
        .bind(&course.code)
        .bind(course.teacher_id)
        .bind(course.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_course_conflict(e, course))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_enrollment(
        &self,
        course_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            "SELECT id, course_id, user_id, joined_at
             FROM course_enrollments
             WHERE course_id = $1 AND user_id = $2",
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(enrollment)
    }

    async fn create_enrollment(&self, enrollment: Enrollment) -> AppResult<Enrollment> {
        sqlx::query_as::<_, Enrollment>(
            "INSERT INTO course_enrollments (id, course_id, user_id, joined_at)
             VALUES ($1, $2, $3, $4)
             RETURNING id, course_id, user_id, joined_at",
        )
        .bind(enrollment.id)
        .bind(enrollment.course_id)
        .bind(enrollment.user_id)
        .bind(enrollment.joined_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("User already enrolled".to_string())
            } else {
                tracing::error!("Failed to create enrollment: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn delete_enrollment(&self, course_id: Uuid, user_id: Uuid) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM course_enrollments WHERE course_id = $1 AND user_id = $2")
                .bind(course_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_students(
        &self,
        course_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<User>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM course_enrollments WHERE course_id = $1")
                .bind(course_id)
                .fetch_one(&self.pool)
                .await?;

        let users = sqlx::query_as::<_, User>(
            "SELECT u.id, u.full_name, u.email, u.role, u.is_active, u.created_at
             FROM app_users u
             JOIN course_enrollments e ON e.user_id = u.id
             WHERE e.course_id = $1
             ORDER BY e.joined_at ASC, u.id ASC
             OFFSET $2 LIMIT $3",
        )
        .bind(course_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }
}
