// src/services/user.rs

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        pagination::{PageParams, PaginatedResponse},
        user::{CreateUserRequest, User, UserPatch},
    },
    repositories::UserRepository,
};

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn create(&self, req: CreateUserRequest) -> AppResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            full_name: req.full_name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            role: req.role.unwrap_or_default(),
            is_active: true,
            created_at: Utc::now(),
        };

        let user = self.users.create(user).await?;
        tracing::info!("Created user {} ({})", user.id, user.role.as_str());
        Ok(user)
    }

    pub async fn list(&self, params: PageParams) -> AppResult<PaginatedResponse<User>> {
        let (users, total) = self.users.list(params.offset(), params.limit()).await?;
        Ok(PaginatedResponse::new(params, total, users))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update(&self, id: Uuid, mut patch: UserPatch) -> AppResult<User> {
        let mut user = self.get(id).await?;
        if patch.is_empty() {
            return Ok(user);
        }

        patch.email = patch.email.map(|e| e.trim().to_lowercase());
        patch.apply_to(&mut user);

        self.users
            .update(&user)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.users.delete(id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        tracing::info!("Deleted user {}", id);
        Ok(())
    }
}
