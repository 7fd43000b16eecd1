use crate::api::error::AppError;
use crate::services::accounts::Registration;
use axum::{Json, extract::State, http::StatusCode};

use super::types::*;

#[utoipa::path(
    post,
    path = "/register",
    request_body = Registration,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Invalid registration"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(payload): Json<Registration>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let user = state.accounts.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let token = state
        .accounts
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(AuthResponse { token }))
}
