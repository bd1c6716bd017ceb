//! User management endpoints

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        paging::{PageParams, PagedResponse, PagedUsers},
        user::{AuthResponse, ChangePasswordRequest, RegisterParams, USER_SORT_FIELDS},
        UserDto, UserRequest,
    },
};

use super::{page_request, ApiPath, ApiQuery, AuthenticatedUser, ValidatedJson};

/// Register a new account
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    params(RegisterParams),
    request_body = UserRequest,
    responses(
        (status = 201, description = "User registered", body = AuthResponse),
        (status = 400, description = "Invalid input", body = [crate::error::FieldErrorResponse]),
        (status = 409, description = "Username already in use", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    ApiQuery(params): ApiQuery<RegisterParams>,
    ValidatedJson(request): ValidatedJson<UserRequest>,
) -> AppResult<impl IntoResponse> {
    let role = params.role.unwrap_or_default();
    let (user, token) = state.services.users.register(&request, role).await?;

    let location = format!("/api/users/{}", user.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(AuthResponse {
            token,
            id: user.id,
            username: user.username,
        }),
    ))
}

/// List all users (administrators only)
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(PageParams),
    responses(
        (status = 200, description = "Page of users", body = PagedUsers),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Administrator privileges required", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiQuery(params): ApiQuery<PageParams>,
) -> AppResult<Json<PagedResponse<UserDto>>> {
    let page = page_request(&state, &params, USER_SORT_FIELDS)?;
    let users = state.services.users.list_all(&caller, &page).await?;
    Ok(Json(users.map(UserDto::from).into()))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserDto),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Not this user and not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<Json<UserDto>> {
    let user = state.services.users.get_by_id(&caller, id).await?;
    Ok(Json(user.into()))
}

/// Change a user's password
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Invalid input", body = [crate::error::FieldErrorResponse]),
        (status = 403, description = "Not this user and not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn change_password(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    state
        .services
        .users
        .change_password(&caller, id, &request.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Not this user and not an administrator", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> AppResult<StatusCode> {
    state.services.users.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
