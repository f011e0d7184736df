//! Authentication and user registration service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use once_cell::sync::Lazy;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{NewUser, RegisterUser, User, UserClaims},
    repository::Repository,
};

/// Same message for unknown email, wrong password and inactive account
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Verified on unknown emails so that every failed login pays one Argon2 run
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("no account has this password").ok());

/// Hash a password using Argon2 with a random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash string
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Reject passwords shorter than the configured minimum
    pub fn check_password_policy(&self, password: &str) -> AppResult<()> {
        if password.chars().count() < self.config.min_password_length {
            return Err(AppError::Validation(format!(
                "Password length can not be less than {}",
                self.config.min_password_length
            )));
        }
        Ok(())
    }

    /// Issue a signed token for a user
    pub fn issue_token(&self, user_id: i32, email: &str, is_admin: bool) -> AppResult<String> {
        UserClaims::new(user_id, email, is_admin, self.config.jwt_expiration_secs)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Parse and validate a token (signature and expiry)
    pub fn validate_token(&self, token: &str) -> AppResult<UserClaims> {
        UserClaims::from_token(token, &self.config.jwt_secret).map_err(|e| {
            use jsonwebtoken::errors::ErrorKind;
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "Token expired",
                ErrorKind::InvalidSignature => "Invalid token signature",
                _ => "Invalid token",
            };
            AppError::Authentication(reason.to_string())
        })
    }

    /// Token lifetime in seconds
    pub fn token_lifetime(&self) -> i64 {
        self.config.jwt_expiration_secs
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterUser) -> AppResult<User> {
        request.validate()?;
        self.check_password_policy(&request.password)?;

        if self.repository.users.email_exists(&request.email).await? {
            return Err(AppError::Conflict(format!(
                "User with email {} already exists",
                request.email
            )));
        }

        let user = NewUser {
            name: request.name,
            email: request.email,
            password_hash: hash_password(&request.password)?,
            phone_number: request.phone_number,
            is_active: true,
            is_admin: false,
        };

        let created = self.repository.users.create(&user).await?;
        tracing::info!("Registered user id={} email={}", created.id, created.email);
        Ok(created)
    }

    /// Authenticate by email and password, returning a token and the user
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, User)> {
        let Some(user) = self.repository.users.get_by_email(email).await? else {
            if let Some(hash) = DUMMY_HASH.as_deref() {
                verify_password(password, hash)?;
            }
            tracing::debug!("Login rejected: no account for {}", email);
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(password, &user.password)? {
            tracing::debug!("Login rejected: wrong password for user id={}", user.id);
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        if !user.is_active {
            tracing::debug!("Login rejected: user id={} is inactive", user.id);
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.issue_token(user.id, &user.email, user.is_admin)?;
        tracing::info!("User id={} logged in", user.id);
        Ok((token, user))
    }
}
