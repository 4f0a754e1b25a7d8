// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::{
    config::Config,
    repositories::{
        MemoryStore, PgAttemptRepository, PgCourseRepository, PgQuestionRepository,
        PgQuizRepository, PgUserRepository,
    },
    services::{AttemptService, CourseService, QuizService, ReportService, UserService},
};

#[derive(Clone)]
pub struct AppState {
    pub attempts: Arc<AttemptService>,
    pub reports: Arc<ReportService>,
    pub users: Arc<UserService>,
    pub courses: Arc<CourseService>,
    pub quizzes: Arc<QuizService>,
    pub config: Config,
}

impl AppState {
    /// Wires every service to the Postgres repositories.
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        let users = Arc::new(PgUserRepository::new(pool.clone()));
        let courses = Arc::new(PgCourseRepository::new(pool.clone()));
        let quizzes = Arc::new(PgQuizRepository::new(pool.clone()));
        let questions = Arc::new(PgQuestionRepository::new(pool.clone()));
        let attempts = Arc::new(PgAttemptRepository::new(pool));

        Self {
            attempts: Arc::new(AttemptService::new(
                users.clone(),
                quizzes.clone(),
                questions.clone(),
                attempts.clone(),
            )),
            reports: Arc::new(ReportService::new(quizzes.clone(), attempts.clone())),
            users: Arc::new(UserService::new(users.clone())),
            courses: Arc::new(CourseService::new(courses.clone(), users)),
            quizzes: Arc::new(QuizService::new(quizzes, courses, questions, attempts)),
            config,
        }
    }

    /// Wires every service to one shared in-memory store.
    pub fn in_memory(store: Arc<MemoryStore>, config: Config) -> Self {
        Self {
            attempts: Arc::new(AttemptService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            reports: Arc::new(ReportService::new(store.clone(), store.clone())),
            users: Arc::new(UserService::new(store.clone())),
            courses: Arc::new(CourseService::new(store.clone(), store.clone())),
            quizzes: Arc::new(QuizService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store,
            )),
            config,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for Arc<AttemptService> {
    fn from_ref(state: &AppState) -> Self {
        state.attempts.clone()
    }
}

impl FromRef<AppState> for Arc<ReportService> {
    fn from_ref(state: &AppState) -> Self {
        state.reports.clone()
    }
}

impl FromRef<AppState> for Arc<UserService> {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

impl FromRef<AppState> for Arc<CourseService> {
    fn from_ref(state: &AppState) -> Self {
        state.courses.clone()
    }
}

impl FromRef<AppState> for Arc<QuizService> {
    fn from_ref(state: &AppState) -> Self {
        state.quizzes.clone()
    }
}
