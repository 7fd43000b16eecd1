use crate::AppState;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use utoipa::ToSchema;

/// Key looked up to prove the blob backend answers; it never exists.
const STORAGE_CHECK_KEY: &str = "health/check";

fn label(ok: bool, up: &str, down: &str) -> String {
    let text = if ok { up } else { down };
    text.to_string()
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database and blob storage reachable", body = HealthResponse),
        (status = 503, description = "A backend is unreachable", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database_ok = state.db.ping().await.is_ok();
    let storage_ok = match state.blobs.exists(STORAGE_CHECK_KEY).await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Blob storage health check failed: {}", e);
            false
        }
    };

    let status = if database_ok && storage_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: label(database_ok && storage_ok, "ok", "degraded"),
            database: label(database_ok, "connected", "disconnected"),
            storage: label(storage_ok, "reachable", "unreachable"),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}
