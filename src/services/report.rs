// src/services/report.rs

use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    config::UNKNOWN_USER_NAME,
    error::{AppError, AppResult},
    models::{
        attempt::{AttemptSummary, AttemptWithUser, UserAttemptGroup},
        pagination::{PageParams, PaginatedResponse},
    },
    repositories::{AttemptRepository, QuizRepository},
};

/// Groups a flat list of attempts by user.
///
/// Groups are ordered by their earliest `started_at`, ties broken by
/// `user_id`. Attempts inside a group are ordered by `attempt_number`.
pub fn group_attempts_by_user(rows: Vec<AttemptWithUser>) -> Vec<UserAttemptGroup> {
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut groups: Vec<UserAttemptGroup> = Vec::new();

    for row in rows {
        let user_id = row.attempt.user_id;
        let slot = *index.entry(user_id).or_insert_with(|| {
            groups.push(UserAttemptGroup {
                user_id,
                user_name: UNKNOWN_USER_NAME.to_string(),
                attempts: Vec::new(),
            });
            groups.len() - 1
        });

        let group = &mut groups[slot];
        if let Some(name) = row.user_name {
            group.user_name = name;
        }
        group.attempts.push(AttemptSummary {
            attempt_id: row.attempt.id,
            attempt_number: row.attempt.attempt_number,
            score: row.attempt.score,
            started_at: row.attempt.started_at,
            finished_at: row.attempt.finished_at,
        });
    }

    for group in &mut groups {
        group.attempts.sort_by_key(|a| (a.attempt_number, a.attempt_id));
    }
    groups.sort_by_key(|g| {
        let earliest = g.attempts.iter().map(|a| a.started_at).min();
        (earliest, g.user_id)
    });
    groups
}

pub struct ReportService {
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl ReportService {
    pub fn new(quizzes: Arc<dyn QuizRepository>, attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { quizzes, attempts }
    }

    /// Per-user attempt history for one quiz, paginated over users.
    pub async fn by_quiz(
        &self,
        quiz_id: Uuid,
        params: PageParams,
    ) -> AppResult<PaginatedResponse<UserAttemptGroup>> {
        if self.quizzes.find_by_id(quiz_id).await?.is_none() {
            return Err(AppError::NotFound("Quiz not found".to_string()));
        }

        let rows = self.attempts.list_by_quiz_with_users(quiz_id).await?;
        let groups = group_attempts_by_user(rows);
        tracing::debug!("Quiz {} report has {} user groups", quiz_id, groups.len());

        Ok(PaginatedResponse::from_items(params, groups))
    }
}
