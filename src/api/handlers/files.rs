use crate::api::error::AppError;
use crate::models::{AuthenticatedIdentity, UploadItem};
use crate::utils::validation::sanitize_for_key;
use axum::{
    Extension, Json,
    body::Body,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use super::types::*;

#[derive(Default)]
struct UploadForm {
    items: Vec<UploadItem>,
    folder_id: Option<i32>,
    name: Option<String>,
}

/// Collects the whole form first; `folder_id` may arrive after the files.
async fn read_upload_form(
    mut multipart: Multipart,
    file_fields: &[&str],
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "folder_id" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                if !text.trim().is_empty() {
                    form.folder_id = Some(parse_id(&text)?);
                }
            }
            "name" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidInput(e.to_string()))?;
                if !text.trim().is_empty() {
                    form.name = Some(text);
                }
            }
            name if file_fields.contains(&name) => {
                let file_name = field.file_name().unwrap_or("unnamed").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?;
                form.items.push(UploadItem::new(file_name, data));
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    Ok(form)
}

#[utoipa::path(
    post,
    path = "/files/upload",
    request_body(content = String, content_type = "multipart/form-data", description = "Fields: file, folder_id, optional name"),
    responses(
        (status = 201, description = "File uploaded", body = FileResponse),
        (status = 400, description = "Empty upload or missing folder"),
        (status = 404, description = "Folder not found"),
        (status = 413, description = "File too large")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), AppError> {
    let form = read_upload_form(multipart, &["file"]).await?;

    let mut items = form.items.into_iter();
    let item = match (items.next(), items.next()) {
        (Some(item), None) => item,
        (None, _) => return Err(AppError::InvalidInput("No file uploaded".to_string())),
        (Some(_), Some(_)) => {
            return Err(AppError::InvalidInput(
                "Use /files/upload-multiple for more than one file".to_string(),
            ));
        }
    };
    let item = match form.name {
        Some(name) => item.renamed(name),
        None => item,
    };

    let file = state
        .uploads
        .upload_single(&identity, item, form.folder_id)
        .await?;
    Ok((StatusCode::CREATED, Json(file.into())))
}

#[utoipa::path(
    post,
    path = "/files/upload-multiple",
    request_body(content = String, content_type = "multipart/form-data", description = "Fields: files (repeated), folder_id"),
    responses(
        (status = 201, description = "All files uploaded", body = UploadResponse),
        (status = 400, description = "Invalid batch; nothing was stored"),
        (status = 404, description = "Folder not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn upload_multiple(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let form = read_upload_form(multipart, &["files", "file"]).await?;
    let files = state
        .uploads
        .upload_multiple(&identity, form.items, form.folder_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            files: files.into_iter().map(Into::into).collect(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/files/{id}",
    params(
        ("id" = i32, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileResponse),
        (status = 404, description = "File not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn get_file(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, AppError> {
    let file = state.hierarchy.get_file(&identity, parse_id(&id)?).await?;
    Ok(Json(file.into()))
}

#[utoipa::path(
    get,
    path = "/files/{id}/download",
    params(
        ("id" = i32, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let (file, data) = state.uploads.download(&identity, parse_id(&id)?).await?;
    let disposition = format!("attachment; filename=\"{}\"", sanitize_for_key(&file.name));

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from(data),
    )
        .into_response())
}

#[utoipa::path(
    delete,
    path = "/files/{id}",
    params(
        ("id" = i32, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 404, description = "File not found"),
        (status = 502, description = "Blob storage failure; file kept")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn delete_file(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state
        .deletions
        .delete_file(&identity, parse_id(&id)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/files/{id}/rename",
    params(
        ("id" = i32, Path, description = "File ID")
    ),
    request_body = RenameRequest,
    responses(
        (status = 200, description = "File renamed", body = FileResponse),
        (status = 400, description = "Invalid name"),
        (status = 404, description = "File not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn rename_file(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<FileResponse>, AppError> {
    let file = state
        .hierarchy
        .rename_file(&identity, parse_id(&id)?, &req.name)
        .await?;
    Ok(Json(file.into()))
}

#[utoipa::path(
    put,
    path = "/files/{id}/move",
    params(
        ("id" = i32, Path, description = "File ID")
    ),
    request_body = MoveFileRequest,
    responses(
        (status = 200, description = "File moved", body = FileResponse),
        (status = 404, description = "File or folder not found")
    ),
    security(
        ("jwt" = [])
    ),
    tag = "files"
)]
pub async fn move_file(
    State(state): State<crate::AppState>,
    Extension(identity): Extension<AuthenticatedIdentity>,
    Path(id): Path<String>,
    Json(req): Json<MoveFileRequest>,
) -> Result<Json<FileResponse>, AppError> {
    let file = state
        .hierarchy
        .move_file(&identity, parse_id(&id)?, req.folder_id)
        .await?;
    Ok(Json(file.into()))
}
