use crate::AppState;
use crate::api::error::AppError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;

#[derive(Deserialize)]
struct AuthQuery {
    token: Option<String>,
}

/// Resolves the bearer token (header, or `?token=` for download links) into an
/// `AuthenticatedIdentity` request extension.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|s| s.to_string());

    let token = if let Some(t) = auth_header {
        Some(t)
    } else {
        let query = req.uri().query().unwrap_or_default();
        serde_urlencoded::from_str::<AuthQuery>(query)
            .ok()
            .and_then(|q| q.token)
    };

    let token =
        token.ok_or_else(|| AppError::Unauthenticated("Missing bearer token".to_string()))?;
    let identity = state.accounts.authenticate(&token).await?;

    tracing::debug!("Authenticated user {} ({})", identity.user_id, identity.email);
    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}
