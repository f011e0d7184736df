//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password: String,
    pub phone_number: String,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(length(min = 1, max = 255, message = "name must be 1-255 characters"))]
    pub name: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 255, message = "email must be at most 255 characters")
    )]
    pub email: String,
    /// Plain-text password, checked against the configured length policy
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 32, message = "phone_number must be at most 32 characters"))]
    pub phone_number: String,
}

/// User row ready for insertion (password already hashed)
#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: String,
    pub is_active: bool,
    pub is_admin: bool,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub email: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    pub fn new(user_id: i32, email: &str, is_admin: bool, lifetime_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            user_id,
            email: email.to_string(),
            is_admin,
            exp: now + lifetime_secs,
            iat: now,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}
