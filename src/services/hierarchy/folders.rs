use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::models::{AuthenticatedIdentity, FolderDetails};
use crate::utils::validation::validate_name;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;

use super::{HierarchyStore, find_live_folder, policy};

impl HierarchyStore {
    pub async fn create_folder(
        &self,
        identity: &AuthenticatedIdentity,
        name: &str,
        parent_id: Option<i32>,
    ) -> Result<folders::Model, AppError> {
        let name = validate_name(name)?;
        let _lock = self.lock_owner(identity.user_id).await;

        let owned: Vec<i32> = Folders::find()
            .select_only()
            .column(folders::Column::Id)
            .filter(folders::Column::OwnerId.eq(identity.user_id))
            .filter(folders::Column::PendingDelete.eq(false))
            .into_tuple()
            .all(&self.db)
            .await?;

        let parent_id = policy::resolve_parent(parent_id, &owned);
        if let Some(pid) = parent_id {
            find_live_folder(&self.db, identity.user_id, pid).await?;
        }

        let folder = folders::ActiveModel {
            id: NotSet,
            name: Set(name),
            owner_id: Set(identity.user_id),
            parent_id: Set(parent_id),
            pending_delete: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            "📁 Folder created: {} '{}' (parent: {:?}, User: {})",
            folder.id,
            folder.name,
            folder.parent_id,
            identity.user_id
        );
        Ok(folder)
    }

    /// A folder with its direct child folders and files.
    pub async fn get_folder(
        &self,
        identity: &AuthenticatedIdentity,
        id: i32,
    ) -> Result<FolderDetails, AppError> {
        let folder = find_live_folder(&self.db, identity.user_id, id).await?;

        let child_folders = Folders::find()
            .filter(folders::Column::OwnerId.eq(identity.user_id))
            .filter(folders::Column::ParentId.eq(id))
            .filter(folders::Column::PendingDelete.eq(false))
            .order_by_asc(folders::Column::Name)
            .all(&self.db)
            .await?;

        let files = self.list_files_in(identity.user_id, id).await?;

        Ok(FolderDetails {
            folder,
            folders: child_folders,
            files,
        })
    }

    pub async fn list_folders(
        &self,
        identity: &AuthenticatedIdentity,
    ) -> Result<Vec<folders::Model>, AppError> {
        let folders = Folders::find()
            .filter(folders::Column::OwnerId.eq(identity.user_id))
            .filter(folders::Column::PendingDelete.eq(false))
            .order_by_asc(folders::Column::Name)
            .order_by_asc(folders::Column::Id)
            .all(&self.db)
            .await?;
        Ok(folders)
    }

    pub async fn rename_folder(
        &self,
        identity: &AuthenticatedIdentity,
        id: i32,
        new_name: &str,
    ) -> Result<folders::Model, AppError> {
        let new_name = validate_name(new_name)?;
        let _lock = self.lock_owner(identity.user_id).await;

        let folder = find_live_folder(&self.db, identity.user_id, id).await?;
        let mut active: folders::ActiveModel = folder.into();
        active.name = Set(new_name);
        let folder = active.update(&self.db).await?;

        tracing::info!("✏️  Folder {} renamed to '{}'", folder.id, folder.name);
        Ok(folder)
    }

    /// Re-parents a folder; `None` makes it a root.
    ///
    /// The new parent chain is checked against the folder before committing,
    /// so a folder can never become its own ancestor.
    pub async fn move_folder(
        &self,
        identity: &AuthenticatedIdentity,
        id: i32,
        new_parent_id: Option<i32>,
    ) -> Result<folders::Model, AppError> {
        let _lock = self.lock_owner(identity.user_id).await;

        let folder = find_live_folder(&self.db, identity.user_id, id).await?;
        if let Some(pid) = new_parent_id {
            find_live_folder(&self.db, identity.user_id, pid).await?;
        }

        let parents = parent_map(&self.db, identity.user_id).await?;
        if policy::creates_cycle(&parents, id, new_parent_id) {
            return Err(AppError::InvalidInput(format!(
                "Cannot move folder {} into itself or one of its descendants",
                id
            )));
        }

        let mut active: folders::ActiveModel = folder.into();
        active.parent_id = Set(new_parent_id);
        let folder = active.update(&self.db).await?;

        tracing::info!("📦 Folder {} moved under {:?}", folder.id, folder.parent_id);
        Ok(folder)
    }

    /// Breadcrumb from the root down to (and including) the folder.
    pub async fn folder_path(
        &self,
        identity: &AuthenticatedIdentity,
        id: i32,
    ) -> Result<Vec<folders::Model>, AppError> {
        let folder = find_live_folder(&self.db, identity.user_id, id).await?;

        let mut by_id: HashMap<i32, folders::Model> = Folders::find()
            .filter(folders::Column::OwnerId.eq(identity.user_id))
            .filter(folders::Column::PendingDelete.eq(false))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();

        let parents: HashMap<i32, Option<i32>> =
            by_id.values().map(|f| (f.id, f.parent_id)).collect();

        let mut path: Vec<folders::Model> = policy::ancestors(&parents, id)
            .into_iter()
            .rev()
            .filter_map(|ancestor| by_id.remove(&ancestor))
            .collect();
        path.push(folder);
        Ok(path)
    }
}

/// Folder id to parent id for every folder of an owner, pending ones included.
async fn parent_map(
    conn: &impl ConnectionTrait,
    owner_id: i32,
) -> Result<HashMap<i32, Option<i32>>, AppError> {
    let rows: Vec<(i32, Option<i32>)> = Folders::find()
        .select_only()
        .column(folders::Column::Id)
        .column(folders::Column::ParentId)
        .filter(folders::Column::OwnerId.eq(owner_id))
        .into_tuple()
        .all(conn)
        .await?;
    Ok(rows.into_iter().collect())
}
