// src/repositories/postgres/attempts.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::is_unique_violation;
use crate::{
    config::ATTEMPT_NUMBER_RETRIES,
    error::{AppError, AppResult},
    models::attempt::{Attempt, AttemptAnswer, AttemptFilter, AttemptWithUser, NewAttemptAnswer},
    repositories::AttemptRepository,
};

const COLUMNS: &str = "id, user_id, quiz_id, attempt_number, score, started_at, finished_at";

pub struct PgAttemptRepository {
    pool: PgPool,
}

impl PgAttemptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttemptRepository for PgAttemptRepository {
    async fn count_for(&self, user_id: Uuid, quiz_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_attempts WHERE user_id = $1 AND quiz_id = $2",
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn latest_for(&self, user_id: Uuid, quiz_id: Uuid) -> AppResult<Option<Attempt>> {
        let attempt = sqlx::query_as::<_, Attempt>(&format!(
            "SELECT {COLUMNS} FROM quiz_attempts
             WHERE user_id = $1 AND quiz_id = $2
             ORDER BY attempt_number DESC
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(quiz_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    async fn create_next(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
        started_at: DateTime<Utc>,
        max_attempts: Option<i32>,
    ) -> AppResult<Option<Attempt>> {
        // Numbering and the cap check happen in one statement; two concurrent
        // starts that compute the same number collide on the unique key and
        // the loser retries.
        let sql = format!(
            "INSERT INTO quiz_attempts (id, user_id, quiz_id, attempt_number, started_at)
             SELECT $1, $2, $3, COALESCE(MAX(attempt_number), 0) + 1, $4
             FROM quiz_attempts
             WHERE user_id = $2 AND quiz_id = $3
             HAVING $5::INT IS NULL OR COUNT(*) < $5
             RETURNING {COLUMNS}"
        );

        let mut tries = 0;
        loop {
            let result = sqlx::query_as::<_, Attempt>(&sql)
                .bind(Uuid::new_v4())
                .bind(user_id)
                .bind(quiz_id)
                .bind(started_at)
                .bind(max_attempts)
                .fetch_optional(&self.pool)
                .await;

            match result {
                Ok(attempt) => return Ok(attempt),
                Err(e) if is_unique_violation(&e) && tries < ATTEMPT_NUMBER_RETRIES => {
                    tries += 1;
                    tracing::warn!(
                        "Attempt number collision for user {} on quiz {}, retry {}",
                        user_id,
                        quiz_id,
                        tries
                    );
                }
                Err(e) if is_unique_violation(&e) => {
                    return Err(AppError::Conflict(
                        "Concurrent attempt start, please retry".to_string(),
                    ));
                }
                Err(e) => {
                    tracing::error!("Failed to create attempt: {:?}", e);
                    return Err(e.into());
                }
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Attempt>> {
        let attempt = sqlx::query_as::<_, Attempt>(&format!(
            "SELECT {COLUMNS} FROM quiz_attempts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    async fn finish(
        &self,
        attempt_id: Uuid,
        answers: Vec<NewAttemptAnswer>,
        score: f64,
        finished_at: DateTime<Utc>,
    ) -> AppResult<Option<Attempt>> {
        let mut tx = self.pool.begin().await?;

        let attempt = sqlx::query_as::<_, Attempt>(&format!(
            "UPDATE quiz_attempts
             SET score = $1, finished_at = $2
             WHERE id = $3 AND finished_at IS NULL
             RETURNING {COLUMNS}"
        ))
        .bind(score)
        .bind(finished_at)
        .bind(attempt_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(attempt) = attempt else {
            tx.rollback().await?;
            return Ok(None);
        };

        for answer in answers {
            sqlx::query(
                "INSERT INTO quiz_attempt_answers
                 (id, attempt_id, question_id, option_id, is_correct, score)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::new_v4())
            .bind(attempt_id)
            .bind(answer.question_id)
            .bind(answer.option_id)
            .bind(answer.is_correct)
            .bind(answer.score)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to store answer for attempt {}: {:?}", attempt_id, e);
                e
            })?;
        }

        tx.commit().await?;
        Ok(Some(attempt))
    }

    async fn answers_for(&self, attempt_id: Uuid) -> AppResult<Vec<AttemptAnswer>> {
        let answers = sqlx::query_as::<_, AttemptAnswer>(
            "SELECT a.id, a.attempt_id, a.question_id, a.option_id, a.is_correct, a.score
             FROM quiz_attempt_answers a
             JOIN quiz_questions q ON q.id = a.question_id
             WHERE a.attempt_id = $1
             ORDER BY q.position ASC",
        )
        .bind(attempt_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    async fn list(
        &self,
        filter: AttemptFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Attempt>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM quiz_attempts
             WHERE ($1::UUID IS NULL OR user_id = $1)
               AND ($2::UUID IS NULL OR quiz_id = $2)",
        )
        .bind(filter.user_id)
        .bind(filter.quiz_id)
        .fetch_one(&self.pool)
        .await?;

        let attempts = sqlx::query_as::<_, Attempt>(&format!(
            "SELECT {COLUMNS} FROM quiz_attempts
             WHERE ($1::UUID IS NULL OR user_id = $1)
               AND ($2::UUID IS NULL OR quiz_id = $2)
             ORDER BY started_at ASC, attempt_number ASC, id ASC
             OFFSET $3 LIMIT $4"
        ))
        .bind(filter.user_id)
        .bind(filter.quiz_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok((attempts, total))
    }

    async fn list_by_quiz_with_users(&self, quiz_id: Uuid) -> AppResult<Vec<AttemptWithUser>> {
        let rows = sqlx::query_as::<_, AttemptWithUser>(
            "SELECT a.id, a.user_id, a.quiz_id, a.attempt_number, a.score,
                    a.started_at, a.finished_at, u.full_name AS user_name
             FROM quiz_attempts a
             LEFT JOIN app_users u ON u.id = a.user_id
             WHERE a.quiz_id = $1
             ORDER BY a.started_at ASC, a.attempt_number ASC, a.id ASC",
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
