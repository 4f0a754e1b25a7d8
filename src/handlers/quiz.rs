// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        pagination::PageParams,
        question::CreateQuestionRequest,
        quiz::{CreateQuizRequest, QuizPatch},
    },
    services::QuizService,
    utils::jwt::Claims,
};

/// Creates a quiz authored by the current user.
/// Requires: teacher or admin role (enforced by `teacher_middleware`).
pub async fn create_quiz(
    State(quizzes): State<Arc<QuizService>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let teacher_id = claims.user_id()?;
    let quiz = quizzes.create(teacher_id, payload).await?;
    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Quizzes of a course with the current user's attempt counters.
pub async fn list_course_quizzes(
    State(quizzes): State<Arc<QuizService>>,
    Extension(claims): Extension<Claims>,
    Path(course_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id()?;
    Ok(Json(quizzes.list_by_course(course_id, user_id, params).await?))
}

pub async fn get_quiz(
    State(quizzes): State<Arc<QuizService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(quizzes.get(id).await?))
}

/// Partially updates a quiz. Nullable fields accept an explicit `null`.
pub async fn update_quiz(
    State(quizzes): State<Arc<QuizService>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<QuizPatch>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    Ok(Json(quizzes.update(id, payload).await?))
}

pub async fn delete_quiz(
    State(quizzes): State<Arc<QuizService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    quizzes.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_questions(
    State(quizzes): State<Arc<QuizService>>,
    Path(id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    Ok(Json(quizzes.list_questions(id, params).await?))
}

/// Appends a batch of questions to a quiz.
/// Requires: teacher or admin role.
pub async fn add_questions(
    State(quizzes): State<Arc<QuizService>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<Vec<CreateQuestionRequest>>,
) -> Result<impl IntoResponse, AppError> {
    for question in &payload {
        if let Err(validation_errors) = question.validate() {
            return Err(AppError::BadRequest(validation_errors.to_string()));
        }
    }

    let created = quizzes.add_questions(id, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
