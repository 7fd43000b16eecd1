use crate::api::error::AppError;
use crate::entities::{files, folders, users};
use crate::models::{DeletionReport, FolderDetails};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Parses a path id; anything non-numeric is invalid input.
pub fn parse_id(raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Invalid id: {}", raw)))
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            display_name: user.display_name,
            created_at: user.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateFolderRequest {
    pub name: String,
    pub parent_id: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct RenameRequest {
    pub name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct MoveFolderRequest {
    /// New parent; null moves the folder to the root
    pub parent_id: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct MoveFileRequest {
    pub folder_id: i32,
}

#[derive(Serialize, ToSchema)]
pub struct FolderResponse {
    pub id: i32,
    pub name: String,
    pub parent_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<folders::Model> for FolderResponse {
    fn from(folder: folders::Model) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            parent_id: folder.parent_id,
            created_at: folder.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct FileResponse {
    pub id: i32,
    pub name: String,
    pub size: i64,
    pub extension: String,
    pub folder_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<files::Model> for FileResponse {
    fn from(file: files::Model) -> Self {
        Self {
            id: file.id,
            name: file.name,
            size: file.size,
            extension: file.extension,
            folder_id: file.folder_id,
            created_at: file.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct FolderDetailsResponse {
    pub folder: FolderResponse,
    pub folders: Vec<FolderResponse>,
    pub files: Vec<FileResponse>,
}

impl From<FolderDetails> for FolderDetailsResponse {
    fn from(details: FolderDetails) -> Self {
        Self {
            folder: details.folder.into(),
            folders: details.folders.into_iter().map(Into::into).collect(),
            files: details.files.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub files: Vec<FileResponse>,
}

#[derive(Serialize, ToSchema)]
pub struct DeletionResponse {
    pub folders_removed: usize,
    pub files_removed: usize,
    pub blobs_removed: usize,
}

impl From<DeletionReport> for DeletionResponse {
    fn from(report: DeletionReport) -> Self {
        Self {
            folders_removed: report.folders_removed,
            files_removed: report.files_removed,
            blobs_removed: report.blobs_removed,
        }
    }
}
