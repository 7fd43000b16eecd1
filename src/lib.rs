pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::accounts::AccountService;
use crate::services::blob_store::BlobStore;
use crate::services::deletion::DeletionOrchestrator;
use crate::services::hierarchy::HierarchyStore;
use crate::services::reconciliation::ReconciliationService;
use crate::services::upload::UploadPipeline;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::users::get_profile,
        api::handlers::users::update_profile,
        api::handlers::users::change_password,
        api::handlers::folders::list_folders,
        api::handlers::folders::create_folder,
        api::handlers::folders::get_folder,
        api::handlers::folders::delete_folder,
        api::handlers::folders::rename_folder,
        api::handlers::folders::move_folder,
        api::handlers::folders::get_folder_path,
        api::handlers::files::upload_file,
        api::handlers::files::upload_multiple,
        api::handlers::files::get_file,
        api::handlers::files::download_file,
        api::handlers::files::delete_file,
        api::handlers::files::rename_file,
        api::handlers::files::move_file,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::types::LoginRequest,
            api::handlers::types::AuthResponse,
            api::handlers::types::UserResponse,
            api::handlers::types::CreateFolderRequest,
            api::handlers::types::RenameRequest,
            api::handlers::types::MoveFolderRequest,
            api::handlers::types::MoveFileRequest,
            api::handlers::types::FolderResponse,
            api::handlers::types::FileResponse,
            api::handlers::types::FolderDetailsResponse,
            api::handlers::types::UploadResponse,
            api::handlers::types::DeletionResponse,
            services::accounts::Registration,
            services::accounts::ProfileUpdate,
            services::accounts::PasswordChange,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "system", description = "Health endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "Account endpoints"),
        (name = "folders", description = "Folder hierarchy endpoints"),
        (name = "files", description = "File management endpoints")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
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

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub blobs: Arc<dyn BlobStore>,
    pub accounts: Arc<AccountService>,
    pub hierarchy: Arc<HierarchyStore>,
    pub uploads: Arc<UploadPipeline>,
    pub deletions: Arc<DeletionOrchestrator>,
    pub reconciler: Arc<ReconciliationService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: DatabaseConnection, blobs: Arc<dyn BlobStore>, config: AppConfig) -> Self {
        let accounts = Arc::new(AccountService::new(db.clone(), config.jwt_secret.clone()));
        let hierarchy = Arc::new(HierarchyStore::new(db.clone()));
        let reconciler = Arc::new(ReconciliationService::new(
            db.clone(),
            blobs.clone(),
            hierarchy.clone(),
        ));
        let uploads = Arc::new(UploadPipeline::new(
            hierarchy.clone(),
            blobs.clone(),
            reconciler.clone(),
            &config,
        ));
        let deletions = Arc::new(DeletionOrchestrator::new(hierarchy.clone(), blobs.clone()));

        Self {
            db,
            blobs,
            accounts,
            hierarchy,
            uploads,
            deletions,
            reconciler,
            config,
        }
    }
}

/// One batch of maximum-size files plus multipart framing.
fn body_limit(config: &AppConfig) -> usize {
    config
        .max_file_size
        .saturating_mul(config.max_batch_files)
        .saturating_add(1024 * 1024)
}

pub fn create_app(state: AppState) -> Router {
    use api::handlers::{auth, files, folders, health, users};

    let protected = Router::new()
        .route("/users/me", get(users::get_profile).put(users::update_profile))
        .route("/users/me/password", put(users::change_password))
        .route(
            "/folders",
            get(folders::list_folders).post(folders::create_folder),
        )
        .route(
            "/folders/:id",
            get(folders::get_folder).delete(folders::delete_folder),
        )
        .route("/folders/:id/rename", put(folders::rename_folder))
        .route("/folders/:id/move", put(folders::move_folder))
        .route("/folders/:id/path", get(folders::get_folder_path))
        .route("/files/upload", post(files::upload_file))
        .route("/files/upload-multiple", post(files::upload_multiple))
        .route("/files/:id", get(files::get_file).delete(files::delete_file))
        .route("/files/:id/download", get(files::download_file))
        .route("/files/:id/rename", put(files::rename_file))
        .route("/files/:id/move", put(files::move_file))
        .route_layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    let body_limit = body_limit(&state.config);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::health_check))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(protected)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
