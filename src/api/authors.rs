//! Author endpoints

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
        author::AUTHOR_SORT_FIELDS,
        paging::{PageParams, PagedAuthors, PagedResponse},
        AuthorDto, AuthorRequest,
    },
};

use super::{page_request, ApiPath, ApiQuery, AuthenticatedUser, ValidatedJson};

/// List authors with pagination
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    params(PageParams),
    responses(
        (status = 200, description = "Page of authors", body = PagedAuthors),
        (status = 400, description = "Invalid sort key", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_authors(
    State(state): State<crate::AppState>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> AppResult<Json<PagedResponse<AuthorDto>>> {
    let page = page_request(&state, &params, AUTHOR_SORT_FIELDS)?;
    let authors = state.services.authors.list_all(&page).await?;
    Ok(Json(authors.map(AuthorDto::from).into()))
}

/// Get author by ID
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(
        ("id" = Uuid, Path, description = "Author ID")
    ),
    responses(
        (status = 200, description = "Author details", body = AuthorDto),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<crate::AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<AuthorDto>> {
    let author = state.services.authors.get_by_id(id).await?;
    Ok(Json(author.into()))
}

/// Create a new author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorRequest,
    responses(
        (status = 201, description = "Author created", body = AuthorDto),
        (status = 400, description = "Invalid input", body = [crate::error::FieldErrorResponse]),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 409, description = "Author already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_caller): AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<AuthorRequest>,
) -> AppResult<impl IntoResponse> {
    let author = state.services.authors.create(&request).await?;
    let location = format!("/api/authors/{}", author.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(AuthorDto::from(author)),
    ))
}

/// Replace an existing author
#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Author ID")
    ),
    request_body = AuthorRequest,
    responses(
        (status = 200, description = "Author updated", body = AuthorDto),
        (status = 400, description = "Invalid input", body = [crate::error::FieldErrorResponse]),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Author already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ValidatedJson(request): ValidatedJson<AuthorRequest>,
) -> AppResult<Json<AuthorDto>> {
    caller.require_admin()?;

    let author = state.services.authors.update(id, &request).await?;
    Ok(Json(author.into()))
}

/// Delete an author without books
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Author still has books", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_author(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<StatusCode> {
    caller.require_admin()?;

    state.services.authors.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
