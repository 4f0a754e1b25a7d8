// src/repositories/postgres/mod.rs

mod attempts;
mod courses;
mod questions;
mod quizzes;
mod users;

pub use attempts::PgAttemptRepository;
pub use courses::PgCourseRepository;
pub use questions::PgQuestionRepository;
pub use quizzes::PgQuizRepository;
pub use users::PgUserRepository;

/// True when `err` is a Postgres unique-constraint violation (SQLSTATE 23505).
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Name of the violated constraint, when the database reported one.
pub(crate) fn violated_constraint(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) => db.constraint().map(str::to_string),
        _ => None,
    }
}
