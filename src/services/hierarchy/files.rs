use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::models::{AuthenticatedIdentity, NewFile};
use crate::utils::validation::validate_name;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, NotSet, QueryFilter, QueryOrder, QuerySelect,
    Set,
};

use super::{HierarchyStore, find_live_file, find_live_folder, folder_is_live};

impl HierarchyStore {
    /// Registers metadata for bytes already stored under `new_file.blob_key`.
    pub async fn attach_file(
        &self,
        identity: &AuthenticatedIdentity,
        new_file: NewFile,
    ) -> Result<files::Model, AppError> {
        let name = validate_name(&new_file.name)?;
        if new_file.size < 0 {
            return Err(AppError::InvalidInput(format!(
                "File size cannot be negative: {}",
                new_file.size
            )));
        }

        let _lock = self.lock_owner(identity.user_id).await;
        find_live_folder(&self.db, identity.user_id, new_file.folder_id).await?;

        let file = files::ActiveModel {
            id: NotSet,
            name: Set(name),
            size: Set(new_file.size),
            extension: Set(new_file.extension),
            owner_id: Set(identity.user_id),
            folder_id: Set(new_file.folder_id),
            blob_key: Set(new_file.blob_key),
            pending_delete: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| {
            tracing::error!("Failed to insert file record: {}", e);
            AppError::Database(e)
        })?;

        tracing::info!(
            "📄 File attached: {} '{}' ({} bytes) in folder {}",
            file.id,
            file.name,
            file.size,
            file.folder_id
        );
        Ok(file)
    }

    pub async fn get_file(
        &self,
        identity: &AuthenticatedIdentity,
        id: i32,
    ) -> Result<files::Model, AppError> {
        find_live_file(&self.db, identity.user_id, id).await
    }

    pub async fn list_files(
        &self,
        identity: &AuthenticatedIdentity,
        folder_id: i32,
    ) -> Result<Vec<files::Model>, AppError> {
        find_live_folder(&self.db, identity.user_id, folder_id).await?;
        self.list_files_in(identity.user_id, folder_id).await
    }

    pub(crate) async fn list_files_in(
        &self,
        owner_id: i32,
        folder_id: i32,
    ) -> Result<Vec<files::Model>, AppError> {
        let files = Files::find()
            .filter(files::Column::OwnerId.eq(owner_id))
            .filter(files::Column::FolderId.eq(folder_id))
            .filter(files::Column::PendingDelete.eq(false))
            .order_by_asc(files::Column::Name)
            .all(&self.db)
            .await?;
        Ok(files)
    }

    pub async fn rename_file(
        &self,
        identity: &AuthenticatedIdentity,
        id: i32,
        new_name: &str,
    ) -> Result<files::Model, AppError> {
        let new_name = validate_name(new_name)?;
        let _lock = self.lock_owner(identity.user_id).await;

        let file = find_live_file(&self.db, identity.user_id, id).await?;
        let mut active: files::ActiveModel = file.into();
        active.name = Set(new_name);
        let file = active.update(&self.db).await?;

        tracing::info!("✏️  File {} renamed to '{}'", file.id, file.name);
        Ok(file)
    }

    pub async fn move_file(
        &self,
        identity: &AuthenticatedIdentity,
        id: i32,
        folder_id: i32,
    ) -> Result<files::Model, AppError> {
        let _lock = self.lock_owner(identity.user_id).await;

        let file = find_live_file(&self.db, identity.user_id, id).await?;
        find_live_folder(&self.db, identity.user_id, folder_id).await?;

        let mut active: files::ActiveModel = file.into();
        active.folder_id = Set(folder_id);
        let file = active.update(&self.db).await?;

        tracing::info!("📦 File {} moved to folder {}", file.id, file.folder_id);
        Ok(file)
    }

    /// Claims a file for deletion, hiding it from every other operation.
    ///
    /// A file still claimed by an earlier `delete_file` that stopped part-way
    /// is handed back so the deletion can finish. A file claimed because its
    /// folder is being deleted belongs to that cascade and reads as missing.
    pub(crate) async fn mark_file_pending(
        &self,
        owner_id: i32,
        id: i32,
    ) -> Result<files::Model, AppError> {
        let _lock = self.lock_owner(owner_id).await;

        let file = Files::find_by_id(id)
            .filter(files::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::file_not_found(id))?;

        if file.pending_delete {
            if !folder_is_live(&self.db, owner_id, file.folder_id).await? {
                return Err(AppError::file_not_found(id));
            }
            tracing::info!("Resuming interrupted deletion of file {}", id);
            return Ok(file);
        }

        let mut active: files::ActiveModel = file.into();
        active.pending_delete = Set(true);
        Ok(active.update(&self.db).await?)
    }

    /// Returns a claimed file to the live set after its deletion failed.
    ///
    /// The claim stays when the containing folder has meanwhile been claimed
    /// by a cascade; that cascade then removes the file. Returns whether the
    /// file is live again.
    pub(crate) async fn clear_file_pending(&self, owner_id: i32, id: i32) -> Result<bool, AppError> {
        let _lock = self.lock_owner(owner_id).await;

        let Some(file) = Files::find_by_id(id)
            .filter(files::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
        else {
            return Ok(false);
        };

        if !folder_is_live(&self.db, owner_id, file.folder_id).await? {
            tracing::info!(
                "File {} stays claimed: folder {} is being deleted",
                id,
                file.folder_id
            );
            return Ok(false);
        }

        let mut active: files::ActiveModel = file.into();
        active.pending_delete = Set(false);
        active.update(&self.db).await?;
        Ok(true)
    }

    /// Claimed files whose folder is still live, oldest first. These are left
    /// behind when a file deletion stops between its blob and its record.
    pub(crate) async fn stranded_files(&self, limit: u64) -> Result<Vec<files::Model>, AppError> {
        let stranded = Files::find()
            .inner_join(Folders)
            .filter(files::Column::PendingDelete.eq(true))
            .filter(folders::Column::PendingDelete.eq(false))
            .order_by_asc(files::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(stranded)
    }

    /// Removes a file record. Returns whether a row was deleted.
    pub(crate) async fn detach_file(&self, owner_id: i32, id: i32) -> Result<bool, AppError> {
        let _lock = self.lock_owner(owner_id).await;

        let res = Files::delete_many()
            .filter(files::Column::Id.eq(id))
            .filter(files::Column::OwnerId.eq(owner_id))
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }
}
