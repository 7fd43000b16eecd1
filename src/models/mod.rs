//! Value types shared between the HTTP layer and the core services.

use serde::Serialize;

use crate::entities::{files, folders};

/// The caller every core operation acts on behalf of.
///
/// Built by the auth middleware and passed explicitly into each service call;
/// all ownership checks trust it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub user_id: i32,
    pub email: String,
}

impl AuthenticatedIdentity {
    pub fn new(user_id: i32, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }
}

/// A folder together with its direct children.
#[derive(Debug, Clone, Serialize)]
pub struct FolderDetails {
    pub folder: folders::Model,
    pub folders: Vec<folders::Model>,
    pub files: Vec<files::Model>,
}

/// Metadata for a file about to be attached to a folder.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub folder_id: i32,
    pub size: i64,
    pub extension: String,
    pub blob_key: String,
}

/// One named payload of an upload request.
#[derive(Debug, Clone)]
pub struct UploadItem {
    /// Display name stored on the file record
    pub name: String,
    /// Name the client uploaded the bytes under; the extension comes from it
    pub original_name: String,
    pub data: bytes::Bytes,
}

impl UploadItem {
    pub fn new(name: impl Into<String>, data: impl Into<bytes::Bytes>) -> Self {
        let name = name.into();
        Self {
            original_name: name.clone(),
            name,
            data: data.into(),
        }
    }

    /// Stores the file under a different display name, keeping the uploaded
    /// name for the extension.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Outcome of a completed cascade delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub folders_removed: usize,
    pub files_removed: usize,
    pub blobs_removed: usize,
}
