// src/repositories/mod.rs

//! Storage port consumed by the services.
//!
//! Every trait has a Postgres implementation in [`postgres`] and an in-memory
//! implementation in [`memory`] (used by the test suites and for running the
//! server without a database).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        attempt::{Attempt, AttemptAnswer, AttemptFilter, AttemptWithUser, NewAttemptAnswer},
        course::{Course, Enrollment},
        question::{CreateQuestionRequest, Question, QuestionOption, QuestionWithOptions},
        quiz::Quiz,
        user::User,
    },
};

pub use memory::MemoryStore;
pub use postgres::{
    PgAttemptRepository, PgCourseRepository, PgQuestionRepository, PgQuizRepository,
    PgUserRepository,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the e-mail is taken.
    async fn create(&self, user: User) -> AppResult<User>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)>;
    /// Overwrites every column of an existing user. `None` when it is gone.
    async fn update(&self, user: &User) -> AppResult<Option<User>>;
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Fails with `Conflict` when the name or code is taken.
    async fn create(&self, course: Course) -> AppResult<Course>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Course>>;
    async fn find_by_code(&self, code: &str) -> AppResult<Option<Course>>;
    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Course>, i64)>;
    async fn list_enrolled(
        &self,
        user_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Course>, i64)>;
    async fn update(&self, course: &Course) -> AppResult<Option<Course>>;
    /// Cascades to the course's quizzes and enrollments.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn find_enrollment(&self, course_id: Uuid, user_id: Uuid)
    -> AppResult<Option<Enrollment>>;
    /// Fails with `Conflict` when the user is already enrolled.
    async fn create_enrollment(&self, enrollment: Enrollment) -> AppResult<Enrollment>;
    async fn delete_enrollment(&self, course_id: Uuid, user_id: Uuid) -> AppResult<bool>;
    async fn list_students(
        &self,
        course_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<User>, i64)>;
}

#[async_trait]
pub trait QuizRepository: Send + Sync {
    async fn create(&self, quiz: Quiz) -> AppResult<Quiz>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Quiz>>;
    async fn list_by_course(
        &self,
        course_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Quiz>, i64)>;
    async fn update(&self, quiz: &Quiz) -> AppResult<Option<Quiz>>;
    /// Cascades to questions, options, attempts and answers.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Inserts all questions with their options as one unit.
    async fn add_questions(
        &self,
        quiz_id: Uuid,
        questions: Vec<CreateQuestionRequest>,
    ) -> AppResult<Vec<QuestionWithOptions>>;
    async fn find_question(&self, id: Uuid) -> AppResult<Option<Question>>;
    async fn find_option(&self, id: Uuid) -> AppResult<Option<QuestionOption>>;
    async fn count_by_quiz(&self, quiz_id: Uuid) -> AppResult<i64>;
    async fn list_by_quiz(
        &self,
        quiz_id: Uuid,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<QuestionWithOptions>, i64)>;
}

#[async_trait]
pub trait AttemptRepository: Send + Sync {
    async fn count_for(&self, user_id: Uuid, quiz_id: Uuid) -> AppResult<i64>;

    /// The user's highest-numbered attempt on the quiz.
    async fn latest_for(&self, user_id: Uuid, quiz_id: Uuid) -> AppResult<Option<Attempt>>;

    /// Creates the next attempt for (user, quiz), assigning
    /// `attempt_number = existing + 1` atomically.
    ///
    /// `max_attempts` is the effective cap (`None` = unlimited). Returns
    /// `None` when the cap is already reached.
    async fn create_next(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
        started_at: DateTime<Utc>,
        max_attempts: Option<i32>,
    ) -> AppResult<Option<Attempt>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Attempt>>;

    /// Persists the graded answers, the score and `finished_at` as one unit.
    ///
    /// Returns `None` without writing anything when the attempt is missing
    /// or already finished.
    async fn finish(
        &self,
        attempt_id: Uuid,
        answers: Vec<NewAttemptAnswer>,
        score: f64,
        finished_at: DateTime<Utc>,
    ) -> AppResult<Option<Attempt>>;

    async fn answers_for(&self, attempt_id: Uuid) -> AppResult<Vec<AttemptAnswer>>;

    /// Ordered by `started_at`, then `attempt_number`, then id.
    async fn list(
        &self,
        filter: AttemptFilter,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<Attempt>, i64)>;

    /// Every attempt of the quiz with the owner's display name, unpaginated.
    async fn list_by_quiz_with_users(&self, quiz_id: Uuid) -> AppResult<Vec<AttemptWithUser>>;
}
