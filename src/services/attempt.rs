// src/services/attempt.rs

use std::{collections::HashSet, sync::Arc};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        attempt::{Attempt, AttemptDetail, AttemptFilter, NewAttemptAnswer, SubmittedAnswer},
        pagination::{PageParams, PaginatedResponse},
    },
    repositories::{AttemptRepository, QuestionRepository, QuizRepository, UserRepository},
    services::scoring::{effective_cap, normalized_score},
};

/// Attempt lifecycle: start, single-shot submit, read back, list.
pub struct AttemptService {
    users: Arc<dyn UserRepository>,
    quizzes: Arc<dyn QuizRepository>,
    questions: Arc<dyn QuestionRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        quizzes: Arc<dyn QuizRepository>,
        questions: Arc<dyn QuestionRepository>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            users,
            quizzes,
            questions,
            attempts,
        }
    }

    /// Opens the next attempt of `user_id` on `quiz_id`.
    ///
    /// Fails with `Conflict` once the quiz's attempt cap is used up.
    pub async fn start(&self, user_id: Uuid, quiz_id: Uuid) -> AppResult<Attempt> {
        let quiz = self
            .quizzes
            .find_by_id(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

        if self.users.find_by_id(user_id).await?.is_none() {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let cap = effective_cap(quiz.max_attempts);
        let Some(attempt) = self
            .attempts
            .create_next(user_id, quiz_id, Utc::now(), cap)
            .await?
        else {
            return Err(AppError::Conflict(format!(
                "Maximum number of attempts ({}) reached",
                cap.unwrap_or_default()
            )));
        };

        tracing::info!(
            "User {} started attempt #{} on quiz {}",
            user_id,
            attempt.attempt_number,
            quiz_id
        );
        Ok(attempt)
    }

    /// Grades `answers` against the attempt's quiz and closes the attempt.
    pub async fn submit(
        &self,
        attempt_id: Uuid,
        answers: Vec<SubmittedAnswer>,
    ) -> AppResult<AttemptDetail> {
        let attempt = self.find(attempt_id).await?;
        if attempt.is_finished() {
            return Err(AppError::AlreadySubmitted);
        }

        let graded = self.grade(attempt.quiz_id, answers).await?;
        let correct_count = graded.iter().filter(|a| a.is_correct).count() as i64;
        let total_questions = self.questions.count_by_quiz(attempt.quiz_id).await?;
        let score = normalized_score(correct_count, total_questions);

        // The store re-checks that the attempt is still open, so only one of
        // two racing submissions gets through.
        let attempt = self
            .attempts
            .finish(attempt_id, graded, score, Utc::now())
            .await?
            .ok_or(AppError::AlreadySubmitted)?;

        tracing::info!(
            "Attempt {} submitted: {}/{} correct, score {}",
            attempt_id,
            correct_count,
            total_questions,
            score
        );

        let answers = self.attempts.answers_for(attempt_id).await?;
        Ok(AttemptDetail {
            attempt,
            correct_count,
            total_questions,
            answers,
        })
    }

    /// Reads an attempt with its persisted answers.
    ///
    /// A finished attempt whose score was never stored gets it recomputed on
    /// the fly (not persisted). In-progress attempts keep `score: null`.
    pub async fn get(&self, attempt_id: Uuid) -> AppResult<AttemptDetail> {
        let mut attempt = self.find(attempt_id).await?;
        let answers = self.attempts.answers_for(attempt_id).await?;
        let correct_count = answers.iter().filter(|a| a.is_correct).count() as i64;
        let total_questions = self.questions.count_by_quiz(attempt.quiz_id).await?;

        if attempt.is_finished() && attempt.score.is_none() {
            attempt.score = Some(normalized_score(correct_count, total_questions));
        }

        Ok(AttemptDetail {
            attempt,
            correct_count,
            total_questions,
            answers,
        })
    }

    pub async fn list(
        &self,
        filter: AttemptFilter,
        params: PageParams,
    ) -> AppResult<PaginatedResponse<Attempt>> {
        let (attempts, total) = self
            .attempts
            .list(filter, params.offset(), params.limit())
            .await?;
        Ok(PaginatedResponse::new(params, total, attempts))
    }

    async fn find(&self, attempt_id: Uuid) -> AppResult<Attempt> {
        self.attempts
            .find_by_id(attempt_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))
    }

    /// Binary grading: an answer is correct when its option is marked correct.
    ///
    /// Answers to questions outside the quiz, and repeated answers to the same
    /// question, are dropped. An option that does not belong to the answered
    /// question counts as no option.
    async fn grade(
        &self,
        quiz_id: Uuid,
        answers: Vec<SubmittedAnswer>,
    ) -> AppResult<Vec<NewAttemptAnswer>> {
        let mut seen = HashSet::new();
        let mut graded = Vec::with_capacity(answers.len());

        for answer in answers {
            let question = match self.questions.find_question(answer.question_id).await? {
                Some(q) if q.quiz_id == quiz_id => q,
                _ => {
                    tracing::debug!("Skipping answer to unknown question {}", answer.question_id);
                    continue;
                }
            };
            if !seen.insert(question.id) {
                tracing::debug!("Skipping repeated answer to question {}", question.id);
                continue;
            }

            let option = match answer.option_id {
                Some(option_id) => self
                    .questions
                    .find_option(option_id)
                    .await?
                    .filter(|o| o.question_id == question.id),
                None => None,
            };

            let is_correct = option.as_ref().is_some_and(|o| o.is_correct);
            graded.push(NewAttemptAnswer {
                question_id: question.id,
                option_id: option.map(|o| o.id),
                is_correct,
                score: i32::from(is_correct),
            });
        }

        Ok(graded)
    }
}
