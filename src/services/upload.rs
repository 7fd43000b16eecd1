//! Binds uploaded bytes to file records.
//!
//! Bytes go to the blob store first and metadata second; when the metadata
//! write fails the blob is deleted again before the error surfaces.

use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::entities::files;
use crate::models::{AuthenticatedIdentity, NewFile, UploadItem};
use crate::services::blob_store::{BlobStore, delete_if_present};
use crate::services::hierarchy::HierarchyStore;
use crate::services::reconciliation::ReconciliationService;
use crate::utils::validation::{extension_of, sanitize_for_key, validate_name};
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct UploadPipeline {
    hierarchy: Arc<HierarchyStore>,
    blobs: Arc<dyn BlobStore>,
    reconciler: Arc<ReconciliationService>,
    max_file_size: usize,
    max_batch_files: usize,
}

/// Blob key for a new upload. The millisecond prefix plus a random id keeps
/// concurrent uploads of the same name apart.
pub fn generate_blob_key(owner_id: i32, name: &str) -> String {
    format!(
        "uploads/{}/{}-{}-{}",
        owner_id,
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        sanitize_for_key(name)
    )
}

impl UploadPipeline {
    pub fn new(
        hierarchy: Arc<HierarchyStore>,
        blobs: Arc<dyn BlobStore>,
        reconciler: Arc<ReconciliationService>,
        config: &AppConfig,
    ) -> Self {
        Self {
            hierarchy,
            blobs,
            reconciler,
            max_file_size: config.max_file_size,
            max_batch_files: config.max_batch_files,
        }
    }

    pub async fn upload_single(
        &self,
        identity: &AuthenticatedIdentity,
        item: UploadItem,
        folder_id: Option<i32>,
    ) -> Result<files::Model, AppError> {
        let folder_id = require_folder(folder_id)?;
        self.validate_item(&item)?;
        self.store_one(identity, item, folder_id).await
    }

    /// All-or-nothing batch upload: on any failure every file already stored
    /// by this call is removed again, records and blobs alike.
    pub async fn upload_multiple(
        &self,
        identity: &AuthenticatedIdentity,
        items: Vec<UploadItem>,
        folder_id: Option<i32>,
    ) -> Result<Vec<files::Model>, AppError> {
        if items.is_empty() {
            return Err(AppError::InvalidInput("No files uploaded".to_string()));
        }
        if items.len() > self.max_batch_files {
            return Err(AppError::InvalidInput(format!(
                "At most {} files per upload",
                self.max_batch_files
            )));
        }
        let folder_id = require_folder(folder_id)?;
        for item in &items {
            self.validate_item(item)?;
        }

        let total = items.len();
        let mut stored: Vec<files::Model> = Vec::with_capacity(total);
        for item in items {
            let name = item.name.clone();
            match self.store_one(identity, item, folder_id).await {
                Ok(file) => stored.push(file),
                Err(e) => {
                    tracing::warn!(
                        "Batch upload failed at '{}' ({} of {} stored), rolling back: {}",
                        name,
                        stored.len(),
                        total,
                        e
                    );
                    self.roll_back(identity, &stored).await;
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "📤 Batch of {} files uploaded to folder {} (User: {})",
            stored.len(),
            folder_id,
            identity.user_id
        );
        Ok(stored)
    }

    /// Bytes of a file the caller owns.
    pub async fn download(
        &self,
        identity: &AuthenticatedIdentity,
        file_id: i32,
    ) -> Result<(files::Model, Bytes), AppError> {
        let file = self.hierarchy.get_file(identity, file_id).await?;
        let data = self.blobs.get(&file.blob_key).await.map_err(|e| {
            tracing::error!("File {} has no readable blob {}: {}", file.id, file.blob_key, e);
            AppError::Storage(e)
        })?;
        Ok((file, data))
    }

    fn validate_item(&self, item: &UploadItem) -> Result<(), AppError> {
        validate_name(&item.name)?;
        if item.data.is_empty() {
            return Err(AppError::InvalidInput(format!(
                "Upload '{}' is empty",
                item.name
            )));
        }
        if item.data.len() > self.max_file_size {
            return Err(AppError::PayloadTooLarge(format!(
                "'{}' exceeds the {} byte limit",
                item.name, self.max_file_size
            )));
        }
        Ok(())
    }

    async fn store_one(
        &self,
        identity: &AuthenticatedIdentity,
        item: UploadItem,
        folder_id: i32,
    ) -> Result<files::Model, AppError> {
        let size = item.data.len() as i64;
        let key = generate_blob_key(identity.user_id, &item.name);

        let blob_key = self.blobs.put(&key, item.data).await.map_err(|e| {
            tracing::error!("Blob write failed for {}: {}", key, e);
            AppError::Storage(e)
        })?;

        let new_file = NewFile {
            extension: extension_of(&item.original_name),
            name: item.name,
            folder_id,
            size,
            blob_key: blob_key.clone(),
        };

        match self.hierarchy.attach_file(identity, new_file).await {
            Ok(file) => Ok(file),
            Err(e) => {
                tracing::warn!("Metadata write failed for blob {}: {}", blob_key, e);
                self.discard_blob(&blob_key, "metadata write failed").await;
                Err(e)
            }
        }
    }

    async fn roll_back(&self, identity: &AuthenticatedIdentity, stored: &[files::Model]) {
        for file in stored {
            match self.hierarchy.detach_file(identity.user_id, file.id).await {
                Ok(_) => self.discard_blob(&file.blob_key, "batch rollback").await,
                Err(e) => {
                    // Record still references the blob, so the blob stays.
                    tracing::error!("❌ Rollback could not remove file {}: {}", file.id, e);
                }
            }
        }
    }

    /// Compensating delete; failures go to the reconciliation ledger.
    async fn discard_blob(&self, key: &str, reason: &str) {
        match delete_if_present(self.blobs.as_ref(), key).await {
            Ok(_) => tracing::info!("🗑️  Discarded blob {} ({})", key, reason),
            Err(e) => self.reconciler.record_orphan(key, reason, &e).await,
        }
    }
}

fn require_folder(folder_id: Option<i32>) -> Result<i32, AppError> {
    folder_id.ok_or_else(|| AppError::InvalidInput("Target folder is required".to_string()))
}
