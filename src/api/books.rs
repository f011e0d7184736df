//! Book (catalog) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{Map, Value};

use crate::{
    error::AppResult,
    models::book::{Book, BookQuery, BookWithAuthorName, CreateBook, UpdateBook},
};

use super::AuthenticatedUser;

/// Search books; every supplied filter must match
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Matching books, newest first", body = Vec<BookWithAuthorName>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<BookWithAuthorName>>> {
    let books = state.services.catalog.search_books(&query).await?;
    Ok(Json(books))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Category or author not found")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Json(book): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state.services.catalog.insert_book(book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update any subset of a book's fields
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body(
        content = Object,
        description = "Any of title, category, publisher, book_count, price, fine_per_day, author_id"
    ),
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Nothing to update or malformed value"),
        (status = 404, description = "Book, category or author not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(fields): Json<Map<String, Value>>,
) -> AppResult<Json<Book>> {
    let changes = UpdateBook::from_json(&fields)?;
    let updated = state.services.catalog.update_book(id, changes).await?;
    Ok(Json(updated))
}

/// List category labels
#[utoipa::path(
    get,
    path = "/categories",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Category labels", body = Vec<String>)
    )
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> AppResult<Json<Vec<String>>> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(Json(categories))
}
