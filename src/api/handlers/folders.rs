use crate::api::error::AppError;
use crate::models::AuthenticatedIdentity;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::types::*;

#[utoipa::path(
    get,
    path = "/folders",
    responses(
        (status = 200, description = "All folders of the caller", body = [FolderResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "folders"
)]
pub async fn list_folders(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
) -> Result<Json<Vec<FolderResponse>>, AppError> {
    let folders = state.hierarchy.list_folders(&identity).await?;
    Ok(Json(folders.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/folders",
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = FolderResponse),
        (status = 400, description = "Invalid name"),
        (status = 404, description = "Parent folder not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "folders"
)]
pub async fn create_folder(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Json(req): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<FolderResponse>), AppError> {
    let folder = state
        .hierarchy
        .create_folder(&identity, &req.name, req.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(folder.into())))
}

#[utoipa::path(
    get,
    path = "/folders/{id}",
    params(
        ("id" = i32, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Folder with its direct children", body = FolderDetailsResponse),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "folders"
)]
pub async fn get_folder(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Path(id): Path<String>,
) -> Result<Json<FolderDetailsResponse>, AppError> {
    let details = state.hierarchy.get_folder(&identity, parse_id(&id)?).await?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    delete,
    path = "/folders/{id}",
    params(
        ("id" = i32, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Folder and its contents deleted", body = DeletionResponse),
        (status = 404, description = "Folder not found"),
        (status = 502, description = "Blob storage failure; retry to resume")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "folders"
)]
pub async fn delete_folder(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Path(id): Path<String>,
) -> Result<Json<DeletionResponse>, AppError> {
    let report = state
        .deletions
        .delete_folder(&identity, parse_id(&id)?)
        .await?;
    Ok(Json(report.into()))
}

#[utoipa::path(
    put,
    path = "/folders/{id}/rename",
    params(
        ("id" = i32, Path, description = "Folder ID")
    ),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "Folder renamed", body = FolderResponse),
        (status = 400, description = "Invalid name"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "folders"
)]
pub async fn rename_folder(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<FolderResponse>, AppError> {
    let folder = state
        .hierarchy
        .rename_folder(&identity, parse_id(&id)?, &req.name)
        .await?;
    Ok(Json(folder.into()))
}

#[utoipa::path(
    put,
    path = "/folders/{id}/move",
    params(
        ("id" = i32, Path, description = "Folder ID")
    ),
    request_body = MoveFolderRequest,
    responses(
        (status = 200, description = "Folder moved", body = FolderResponse),
        (status = 400, description = "Move would create a cycle"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "folders"
)]
pub async fn move_folder(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Path(id): Path<String>,
    Json(req): Json<MoveFolderRequest>,
) -> Result<Json<FolderResponse>, AppError> {
    let folder = state
        .hierarchy
        .move_folder(&identity, parse_id(&id)?, req.parent_id)
        .await?;
    Ok(Json(folder.into()))
}

#[utoipa::path(
    get,
    path = "/folders/{id}/path",
    params(
        ("id" = i32, Path, description = "Folder ID")
    ),
    responses(
        (status = 200, description = "Folders from the root down to this one", body = [FolderResponse]),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "folders"
)]
pub async fn get_folder_path(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FolderResponse>>, AppError> {
    let path = state.hierarchy.folder_path(&identity, parse_id(&id)?).await?;
    Ok(Json(path.into_iter().map(Into::into).collect()))
}
