//! Book endpoints

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book::BOOK_SORT_FIELDS,
        paging::{PageParams, PagedBooks, PagedResponse},
        BookDto, BookQuery, BookRequest,
    },
};

use super::{page_request, ApiPath, ApiQuery, AuthenticatedUser, ValidatedJson};

/// List books, filtered by at most one criterion
///
/// Precedence when several are given: authorId, authorName, releaseYear,
/// startYear+endYear, genre, title.
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery, PageParams),
    responses(
        (status = 200, description = "Page of books", body = PagedBooks),
        (status = 400, description = "Invalid query", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    ApiQuery(query): ApiQuery<BookQuery>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> AppResult<Json<PagedResponse<BookDto>>> {
    let page = page_request(&state, &params, BOOK_SORT_FIELDS)?;
    let books = state.services.books.find_books(&query, &page).await?;
    Ok(Json(books.map(BookDto::from).into()))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookDto),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<BookDto>> {
    let book = state.services.books.get_by_id(id).await?;
    Ok(Json(book.into()))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = BookDto),
        (status = 400, description = "Invalid input", body = [crate::error::FieldErrorResponse]),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<BookRequest>,
) -> AppResult<impl IntoResponse> {
    let book = state.services.books.create(&request).await?;
    let location = format!("/api/books/{}", book.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(BookDto::from(book)),
    ))
}

/// Replace an existing book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookDto),
        (status = 400, description = "Invalid input", body = [crate::error::FieldErrorResponse]),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "Book or author not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Book already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<BookRequest>,
) -> AppResult<Json<BookDto>> {
    caller.require_admin()?;

    let book = state.services.books.update(id, &request).await?;
    Ok(Json(book.into()))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    caller.require_admin()?;

    state.services.books.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
