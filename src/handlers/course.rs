// src/handlers/course.rs

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
        course::{CoursePatch, CreateCourseRequest, JoinCourseParams},
        pagination::PageParams,
    },
    services::CourseService,
    utils::jwt::Claims,
};

pub async fn list_courses(
    State(courses): State<Arc<CourseService>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    Ok(Json(courses.list(params).await?))
}

pub async fn create_course(
    State(courses): State<Arc<CourseService>>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let course = courses.create(payload).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// Courses the current user is enrolled in.
pub async fn list_enrolled_courses(
    State(courses): State<Arc<CourseService>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user_id = claims.user_id()?;
    Ok(Json(courses.list_enrolled(user_id, params).await?))
}

/// Enrolls the current user using the course's join code.
pub async fn join_course(
    State(courses): State<Arc<CourseService>>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<JoinCourseParams>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let enrollment = courses.join(user_id, &params.course_code).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

pub async fn get_course(
    State(courses): State<Arc<CourseService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(courses.get(id).await?))
}

pub async fn update_course(
    State(courses): State<Arc<CourseService>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CoursePatch>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    Ok(Json(courses.update(id, payload).await?))
}

pub async fn delete_course(
    State(courses): State<Arc<CourseService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    courses.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_course_students(
    State(courses): State<Arc<CourseService>>,
    Path(id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    Ok(Json(courses.list_students(id, params).await?))
}

/// Removes a student from the course.
/// Only the course's teacher or an admin may do this (403 otherwise).
pub async fn kick_student(
    State(courses): State<Arc<CourseService>>,
    Extension(claims): Extension<Claims>,
    Path((id, student_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    let caller_id = claims.user_id()?;
    courses
        .kick(id, student_id, caller_id, claims.is_admin())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
