//! Subtree collection and removal used by cascade deletion.

use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
    sea_query::Expr,
};
use std::collections::HashSet;

use super::HierarchyStore;

/// Every folder and file below (and including) a target folder.
#[derive(Debug, Clone, Default)]
pub struct Subtree {
    /// Target first; every folder appears after its parent.
    pub folder_ids: Vec<i32>,
    pub files: Vec<files::Model>,
}

/// Walks the subtree with an explicit worklist. Pending records are included
/// so an interrupted cascade can be resumed.
pub(crate) async fn collect_subtree(
    conn: &impl ConnectionTrait,
    owner_id: i32,
    root_id: i32,
) -> Result<Subtree, AppError> {
    let mut subtree = Subtree::default();
    let mut visited = HashSet::new();
    let mut pending = vec![root_id];

    while let Some(folder_id) = pending.pop() {
        if !visited.insert(folder_id) {
            tracing::error!("Folder {} reached twice while collecting subtree", folder_id);
            continue;
        }
        subtree.folder_ids.push(folder_id);

        let children: Vec<i32> = Folders::find()
            .select_only()
            .column(folders::Column::Id)
            .filter(folders::Column::OwnerId.eq(owner_id))
            .filter(folders::Column::ParentId.eq(folder_id))
            .into_tuple()
            .all(conn)
            .await?;
        pending.extend(children);

        let files = Files::find()
            .filter(files::Column::OwnerId.eq(owner_id))
            .filter(files::Column::FolderId.eq(folder_id))
            .all(conn)
            .await?;
        subtree.files.extend(files);
    }

    Ok(subtree)
}

impl HierarchyStore {
    /// Claims a folder and everything below it for deletion.
    ///
    /// The target may already be claimed by an earlier, interrupted attempt.
    pub(crate) async fn mark_subtree_pending(
        &self,
        owner_id: i32,
        root_id: i32,
    ) -> Result<Subtree, AppError> {
        let _lock = self.lock_owner(owner_id).await;

        Folders::find_by_id(root_id)
            .filter(folders::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::folder_not_found(root_id))?;

        let txn = self.db.begin().await?;
        let subtree = collect_subtree(&txn, owner_id, root_id).await?;

        Folders::update_many()
            .col_expr(folders::Column::PendingDelete, Expr::value(true))
            .filter(folders::Column::Id.is_in(subtree.folder_ids.clone()))
            .exec(&txn)
            .await?;
        Files::update_many()
            .col_expr(files::Column::PendingDelete, Expr::value(true))
            .filter(files::Column::FolderId.is_in(subtree.folder_ids.clone()))
            .filter(files::Column::OwnerId.eq(owner_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        tracing::info!(
            "🏷️  Claimed folder {} for deletion: {} folders, {} files",
            root_id,
            subtree.folder_ids.len(),
            subtree.files.len()
        );
        Ok(subtree)
    }

    /// Removes the metadata of a claimed subtree in one transaction: files
    /// first, then folders from the leaves up to the target.
    ///
    /// `blobs_cleared` holds the files whose bytes are already gone; finding
    /// any other file aborts without touching metadata.
    pub(crate) async fn purge_subtree(
        &self,
        owner_id: i32,
        root_id: i32,
        blobs_cleared: &HashSet<i32>,
    ) -> Result<(usize, usize), AppError> {
        let _lock = self.lock_owner(owner_id).await;
        let txn = self.db.begin().await?;

        let root_exists = Folders::find_by_id(root_id)
            .filter(folders::Column::OwnerId.eq(owner_id))
            .one(&txn)
            .await?
            .is_some();
        if !root_exists {
            return Err(AppError::folder_not_found(root_id));
        }

        let subtree = collect_subtree(&txn, owner_id, root_id).await?;
        if let Some(stray) = subtree.files.iter().find(|f| !blobs_cleared.contains(&f.id)) {
            return Err(AppError::Internal(format!(
                "File {} appeared in folder {} during deletion",
                stray.id, stray.folder_id
            )));
        }

        let files_removed = Files::delete_many()
            .filter(files::Column::FolderId.is_in(subtree.folder_ids.clone()))
            .filter(files::Column::OwnerId.eq(owner_id))
            .exec(&txn)
            .await?
            .rows_affected as usize;

        let mut folders_removed = 0;
        for folder_id in subtree.folder_ids.iter().rev() {
            folders_removed += Folders::delete_by_id(*folder_id)
                .exec(&txn)
                .await?
                .rows_affected as usize;
        }

        txn.commit().await?;
        Ok((folders_removed, files_removed))
    }
}
