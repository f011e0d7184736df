//! Registration and login endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{RegisterUser, User},
};

use super::AuthenticatedUser;

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// Signed bearer token
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: User,
}

/// Identity carried by the presented token
#[derive(Serialize, ToSchema)]
pub struct UserInfo {
    pub user_id: i32,
    pub email: String,
    pub is_admin: bool,
    /// Expiry as a unix timestamp
    pub expires_at: i64,
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User registered", body = User),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(request): Json<RegisterUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.services.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let auth = &state.services.auth;
    let (token, user) = auth.login(&request.email, &request.password).await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: auth.token_lifetime(),
        user,
    }))
}

/// Describe the authenticated caller
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserInfo),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(AuthenticatedUser(claims): AuthenticatedUser) -> Json<UserInfo> {
    Json(UserInfo {
        user_id: claims.user_id,
        email: claims.email,
        is_admin: claims.is_admin,
        expires_at: claims.exp,
    })
}
