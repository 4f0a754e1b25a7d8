// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::Config, error::AppError, models::user::Role};

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - the user's UUID.
    pub sub: String,
    /// User's role ('user', 'teacher' or 'admin').
    pub role: String,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

impl Claims {
    /// The caller's user id. A token whose subject is not a UUID is rejected.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }

    /// Teachers and admins may author quizzes.
    pub fn can_author(&self) -> bool {
        self.is_admin() || self.role == Role::Teacher.as_str()
    }
}

/// Signs a new JWT for the user.
///
/// Token issuance belongs to the external identity provider; this helper
/// produces tokens with the same claim layout.
pub fn sign_jwt(
    id: Uuid,
    role: Role,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    // Calculate expiration: current time + expiration_seconds
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: id.to_string(),
        role: role.as_str().to_owned(),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if valid, otherwise returns an `AppError`.
pub fn verify_jwt(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Validates the 'Authorization: Bearer <token>' header and injects `Claims`
/// into the request extensions. Returns 401 when the token is missing or bad.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_jwt(token, &config.jwt_secret) {
        Ok(claims) if Uuid::parse_str(&claims.sub).is_ok() => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Ok(claims) => {
            tracing::warn!("Rejected token with non-UUID subject '{}'", claims.sub);
            Err(StatusCode::UNAUTHORIZED)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Axum Middleware: Teacher Authorization.
///
/// Must be used AFTER `auth_middleware`. Lets teachers and admins through,
/// everyone else gets 403 Forbidden.
pub async fn teacher_middleware(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !claims.can_author() {
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_sign_then_verify() {
        let id = Uuid::new_v4();
        let token = sign_jwt(id, Role::Teacher, SECRET, 60).unwrap();

        let claims = verify_jwt(&token, SECRET).unwrap();

        assert_eq!(claims.user_id().unwrap(), id);
        assert!(claims.can_author());
        assert!(!claims.is_admin());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = sign_jwt(Uuid::new_v4(), Role::User, SECRET, 60).unwrap();
        let err = verify_jwt(&token, "other-secret").unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
    }

    #[test]
    fn test_plain_user_cannot_author() {
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            role: "user".to_string(),
            exp: 0,
        };
        assert!(!claims.can_author());
    }

    #[test]
    fn test_non_uuid_subject() {
        let claims = Claims {
            sub: "42".to_string(),
            role: "admin".to_string(),
            exp: 0,
        };
        assert!(claims.user_id().is_err());
    }
}
