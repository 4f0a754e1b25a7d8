// src/repositories/postgres/questions.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::question::{CreateQuestionRequest, Question, QuestionOption, QuestionWithOptions},
    repositories::QuestionRepository,
};

const QUESTION_COLUMNS: &str = "id, quiz_id, content, type, points, position";
const OPTION_COLUMNS: &str = "id, question_id, content, is_correct, position";

pub struct PgQuestionRepository {
    pool: PgPool,
}

impl PgQuestionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn options_for(&self, question_ids: &[Uuid]) -> AppResult<Vec<QuestionOption>> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }

        let options = sqlx::query_as::<_, QuestionOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM question_options
             WHERE question_id = ANY($1)
             ORDER BY position ASC"
        ))
        .bind(question_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(options)
    }
}

#[async_trait]
impl QuestionRepository for PgQuestionRepository {
    async fn add_questions(
        &self,
        quiz_id: Uuid,
        questions: Vec<CreateQuestionRequest>,
    ) -> AppResult<Vec<QuestionWithOptions>> {
        let mut tx = self.pool.begin().await?;

        let mut position: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM quiz_questions WHERE quiz_id = $1",
        )
        .bind(quiz_id)
        .fetch_one(&mut *tx)
        .await?;

        let mut created = Vec::with_capacity(questions.len());
        for req in questions {
            let question = sqlx::query_as::<_, Question>(&format!(
                "INSERT INTO quiz_questions (id, quiz_id, content, type, points, position)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 RETURNING {QUESTION_COLUMNS}"
            ))
            .bind(Uuid::new_v4())
            .bind(quiz_id)
            .bind(&req.content)
            .bind(req.question_type)
            .bind(req.points)
            .bind(position)
            .fetch_one(&mut *tx)
            .await?;
            position += 1;

            let mut options = Vec::with_capacity(req.options.len());
            for (index, opt) in req.options.iter().enumerate() {
                let option = sqlx::query_as::<_, QuestionOption>(&format!(
                    "INSERT INTO question_options (id, question_id, content, is_correct, position)
                     VALUES ($1, $2, $3, $4, $5)
                     RETURNING {OPTION_COLUMNS}"
                ))
                .bind(Uuid::new_v4())
                .bind(question.id)
                .bind(&opt.content)
                .bind(opt.is_correct)
                .bind(index as i32)
                .fetch_one(&mut *tx)
                .await?;
                options.push(option);
            }

            created.push(QuestionWithOptions { question, options });
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_question(&self, id: Uuid) -> AppResult<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM quiz_questions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(question)
    }

    async fn find_option(&self, id: Uuid) -> AppResult<Option<QuestionOption>> {
        let option = sqlx::query_as::<_, QuestionOption>(&format!(
            "SELECT {OPTION_COLUMNS} FROM question_options WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(option)
    }

    async fn count_by_quiz(&self, quiz_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM quiz_questions WHERE quiz_id = $1")
            .bind(quiz_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_by_quiz(
        &self,
        quiz_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<QuestionWithOptions>, i64)> {
        let total = self.count_by_quiz(quiz_id).await?;

        let questions = sqlx::query_as::<_, Question>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM quiz_questions
             WHERE quiz_id = $1
             ORDER BY position ASC
             OFFSET $2 LIMIT $3"
        ))
        .bind(quiz_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = questions.iter().map(|q| q.id).collect();
        let mut by_question: HashMap<Uuid, Vec<QuestionOption>> = HashMap::new();
        for option in self.options_for(&ids).await? {
            by_question.entry(option.question_id).or_default().push(option);
        }

        let items = questions
            .into_iter()
            .map(|question| {
                let options = by_question.remove(&question.id).unwrap_or_default();
                QuestionWithOptions { question, options }
            })
            .collect();

        Ok((items, total))
    }
}
