// src/repositories/postgres/users.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::is_unique_violation;
use crate::{
    error::{AppError, AppResult},
    models::user::User,
    repositories::UserRepository,
};

pub(crate) const COLUMNS: &str = "id, full_name, email, role, is_active, created_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_email_conflict(err: sqlx::Error, email: &str) -> AppError {
    if is_unique_violation(&err) {
        AppError::Conflict(format!("Email '{}' already exists", email))
    } else {
        tracing::error!("User write failed: {:?}", err);
        AppError::from(err)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> AppResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO app_users (id, full_name, email, role, is_active, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_email_conflict(e, &user.email))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM app_users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<User>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM app_users")
            .fetch_one(&self.pool)
            .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {COLUMNS} FROM app_users
             ORDER BY created_at ASC, id ASC
             OFFSET $1 LIMIT $2"
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok((users, total))
    }

    async fn update(&self, user: &User) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE app_users
             SET full_name = $1, email = $2, role = $3, is_active = $4
             WHERE id = $5
             RETURNING {COLUMNS}"
        ))
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_email_conflict(e, &user.email))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM app_users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
