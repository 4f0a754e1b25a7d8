// src/repositories/postgres/quizzes.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{error::AppResult, models::quiz::Quiz, repositories::QuizRepository};

const COLUMNS: &str = "\
    id, title, description, course_id, teacher_id, time_limit, max_attempts, \
    total_points, is_published, created_at";

pub struct PgQuizRepository {
    pool: PgPool,
}

impl PgQuizRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuizRepository for PgQuizRepository {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "INSERT INTO course_quizzes
             (id, title, description, course_id, teacher_id, time_limit, max_attempts,
              total_points, is_published, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {COLUMNS}"
        ))
        .bind(quiz.id)
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(quiz.course_id)
        .bind(quiz.teacher_id)
        .bind(quiz.time_limit)
        .bind(quiz.max_attempts)
        .bind(quiz.total_points)
        .bind(quiz.is_published)
        .bind(quiz.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create quiz: {:?}", e);
            e
        })?;
        Ok(quiz)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Quiz>> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {COLUMNS} FROM course_quizzes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quiz)
    }

    async fn list_by_course(
        &self,
        course_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Quiz>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM course_quizzes WHERE course_id = $1")
                .bind(course_id)
                .fetch_one(&self.pool)
                .await?;

        let quizzes = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {COLUMNS} FROM course_quizzes
             WHERE course_id = $1
             ORDER BY created_at ASC, id ASC
             OFFSET $2 LIMIT $3"
        ))
        .bind(course_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok((quizzes, total))
    }

    async fn update(&self, quiz: &Quiz) -> AppResult<Option<Quiz>> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "UPDATE course_quizzes
             SET title = $1, description = $2, time_limit = $3, max_attempts = $4,
                 total_points = $5, is_published = $6
             WHERE id = $7
             RETURNING {COLUMNS}"
        ))
        .bind(&quiz.title)
        .bind(&quiz.description)
        .bind(quiz.time_limit)
        .bind(quiz.max_attempts)
        .bind(quiz.total_points)
        .bind(quiz.is_published)
        .bind(quiz.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quiz)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM course_quizzes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
