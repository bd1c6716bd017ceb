//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, health, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Catalog API",
        version = "1.0.0",
        description = "Authors, books and users REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api", description = "API")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::login,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Users
        users::register,
        users::list_users,
        users::get_user,
        users::change_password,
        users::delete_user,
    ),
    components(
        schemas(
            // Authors
            crate::models::author::AuthorDto,
            crate::models::author::AuthorRequest,
            // Books
            crate::models::book::BookDto,
            crate::models::book::BookRequest,
            crate::models::enums::Genre,
            // Users
            crate::models::enums::Role,
            crate::models::user::UserDto,
            crate::models::user::UserRequest,
            crate::models::user::ChangePasswordRequest,
            crate::models::user::AuthResponse,
            crate::models::user::TokenResponse,
            // Paging
            crate::models::paging::PagedAuthors,
            crate::models::paging::PagedBooks,
            crate::models::paging::PagedUsers,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
            crate::error::FieldErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "authors", description = "Author management"),
        (name = "books", description = "Book catalog and search"),
        (name = "users", description = "User management")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
