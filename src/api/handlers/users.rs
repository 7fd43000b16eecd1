use crate::api::error::AppError;
use crate::models::AuthenticatedIdentity;
use crate::services::accounts::{PasswordChange, ProfileUpdate};
use axum::{Extension, Json, extract::State, http::StatusCode};

use super::types::*;

#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "users"
)]
pub async fn get_profile(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.accounts.profile(&identity).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/users/me",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Invalid profile"),
        (status = 409, description = "Email already registered")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "users"
)]
pub async fn update_profile(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Json(req): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.accounts.update_profile(&identity, req).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/users/me/password",
    request_body = PasswordChange,
    responses(
        (status = 204, description = "Password changed"),
        (status = 401, description = "Current password is incorrect")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "users"
)]
pub async fn change_password(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Json(req): Json<PasswordChange>,
) -> Result<StatusCode, AppError> {
    state.accounts.change_password(&identity, req).await?;
    Ok(StatusCode::NO_CONTENT)
}
