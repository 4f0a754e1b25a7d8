// src/handlers/attempt.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptFilter, AttemptListParams, StartAttemptRequest, SubmittedAnswer},
        pagination::PageParams,
    },
    services::{AttemptService, ReportService},
};

/// Starts a new attempt for a user on a quiz.
///
/// * 404 when the quiz or user does not exist.
/// * 409 when the quiz's attempt cap is already used up.
pub async fn start_attempt(
    State(attempts): State<Arc<AttemptService>>,
    Json(payload): Json<StartAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = attempts.start(payload.user_id, payload.quiz_id).await?;
    Ok((StatusCode::CREATED, Json(attempt)))
}

/// Grades the submitted answers and closes the attempt.
/// A second submission to the same attempt yields 400.
pub async fn submit_attempt(
    State(attempts): State<Arc<AttemptService>>,
    Path(id): Path<Uuid>,
    Json(answers): Json<Vec<SubmittedAnswer>>,
) -> Result<impl IntoResponse, AppError> {
    let detail = attempts.submit(id, answers).await?;
    Ok(Json(detail))
}

pub async fn get_attempt(
    State(attempts): State<Arc<AttemptService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = attempts.get(id).await?;
    Ok(Json(detail))
}

/// Lists attempts, optionally filtered by user and/or quiz.
pub async fn list_attempts(
    State(attempts): State<Arc<AttemptService>>,
    Query(params): Query<AttemptListParams>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page_params();
    if let Err(validation_errors) = page.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let filter = AttemptFilter {
        user_id: params.user_id,
        quiz_id: params.quiz_id,
    };
    let response = attempts.list(filter, page).await?;
    Ok(Json(response))
}

/// Attempt history of a quiz grouped per user, paginated over users.
pub async fn attempts_by_quiz(
    State(reports): State<Arc<ReportService>>,
    Path(quiz_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let response = reports.by_quiz(quiz_id, params).await?;
    Ok(Json(response))
}
