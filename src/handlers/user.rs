// src/handlers/user.rs

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
        pagination::PageParams,
        user::{CreateUserRequest, UserPatch},
    },
    services::UserService,
};

pub async fn list_users(
    State(users): State<Arc<UserService>>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = params.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    Ok(Json(users.list(params).await?))
}

pub async fn create_user(
    State(users): State<Arc<UserService>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = users.create(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(users): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(users.get(id).await?))
}

/// Partially updates a user. Only supplied fields change.
pub async fn update_user(
    State(users): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserPatch>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    Ok(Json(users.update(id, payload).await?))
}

pub async fn delete_user(
    State(users): State<Arc<UserService>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
