//! Author endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::author::{Author, AuthorQuery, CreateAuthor},
};

use super::AuthenticatedUser;

/// List authors, optionally filtered by name
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(AuthorQuery),
    responses(
        (status = 200, description = "Matching authors, newest first", body = Vec<Author>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_authors(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<AuthorQuery>,
) -> AppResult<Json<Vec<Author>>> {
    let authors = state.services.catalog.search_authors(&query).await?;
    Ok(Json(authors))
}

/// Get an author by ID
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "One-element list holding the author", body = Vec<Author>),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Author>>> {
    let authors = state.services.catalog.get_author(id).await?;
    Ok(Json(authors))
}

/// Create a new author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = CreateAuthor,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(author): Json<CreateAuthor>,
) -> AppResult<(StatusCode, Json<Author>)> {
    let created = state.services.catalog.insert_author(author).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
