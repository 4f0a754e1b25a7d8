// src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Account role. Stored as the Postgres enum `user_role`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

/// Represents the 'app_users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,

    /// Display name, also used as the label in grouped attempt reports.
    pub full_name: String,

    /// Unique e-mail address.
    pub email: String,

    pub role: Role,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

/// DTO for creating a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(
        min = 1,
        max = 255,
        message = "Full name length must be between 1 and 255 characters."
    ))]
    pub full_name: String,
    #[validate(email(message = "Email must be a valid address."), length(max = 255))]
    pub email: String,
    pub role: Option<Role>,
}

/// Partial update for a user. Only supplied fields change.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserPatch {
    #[validate(length(min = 1, max = 255))]
    pub full_name: Option<String>,
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }

    pub fn apply_to(self, user: &mut User) {
        if let Some(full_name) = self.full_name {
            user.full_name = full_name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::User,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_patch_changes_only_supplied_fields() {
        let mut user = sample_user();
        let patch = UserPatch {
            role: Some(Role::Teacher),
            ..Default::default()
        };

        patch.apply_to(&mut user);

        assert_eq!(user.role, Role::Teacher);
        assert_eq!(user.full_name, "Ada Lovelace");
        assert_eq!(user.email, "ada@example.com");
        assert!(user.is_active);
    }

    #[test]
    fn test_create_request_rejects_bad_email() {
        let req = CreateUserRequest {
            full_name: "Bob".to_string(),
            email: "not-an-email".to_string(),
            role: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Teacher).unwrap();
        assert_eq!(json, "\"teacher\"");
    }
}
