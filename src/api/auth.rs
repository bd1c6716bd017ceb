//! Authentication endpoints

use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::{user::TokenResponse, UserRequest},
};

use super::ApiJson;

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = UserRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    ApiJson(request): ApiJson<UserRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .services
        .users
        .login(&request.username, &request.password)
        .await?;
    Ok(Json(TokenResponse { token }))
}
