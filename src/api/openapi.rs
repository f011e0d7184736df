//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, health};

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library API",
        version = "1.0.0",
        description = "Library management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&BearerAuth),
    paths(
        // Health
        health::health_check,
        health::ping,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::list_categories,
    ),
    components(
        schemas(
            // Auth
            auth::LoginRequest,
            auth::LoginResponse,
            auth::UserInfo,
            crate::models::user::User,
            crate::models::user::RegisterUser,
            // Catalog
            crate::models::author::Author,
            crate::models::author::CreateAuthor,
            crate::models::book::Book,
            crate::models::book::BookWithAuthorName,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Borrowing
            crate::models::borrow::BorrowList,
            crate::models::borrow::BorrowEntry,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration and login"),
        (name = "authors", description = "Author management"),
        (name = "books", description = "Book catalog management")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
