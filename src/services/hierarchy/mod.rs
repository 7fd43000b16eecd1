//! Folder and file records plus the tree invariants that bind them.
//!
//! Every mutation runs under the owner's lock and re-reads the records it
//! touches, so a concurrent cascade delete is observed as `NotFound` rather
//! than overwritten.

use crate::api::error::AppError;
use crate::entities::{files as file_entity, folders as folder_entity, prelude::*};
use crate::utils::keyed_mutex::KeyedMutex;
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tokio::sync::OwnedMutexGuard;

pub mod files;
pub mod folders;
pub mod policy;
pub mod subtree;

pub use subtree::Subtree;

pub struct HierarchyStore {
    db: DatabaseConnection,
    owner_locks: KeyedMutex<i32>,
}

impl HierarchyStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            owner_locks: KeyedMutex::new(),
        }
    }

    /// Serializes hierarchy mutations of one owner.
    pub(crate) async fn lock_owner(&self, owner_id: i32) -> OwnedMutexGuard<()> {
        let guard = self.owner_locks.lock(&owner_id).await;
        tracing::trace!("🔒 Owner lock acquired (User: {})", owner_id);
        guard
    }

    /// Drops lock entries of owners with no in-flight mutation.
    pub fn prune_locks(&self) {
        self.owner_locks.cleanup();
    }
}

/// Looks up a folder owned by `owner_id` that no deletion has claimed.
pub(crate) async fn find_live_folder(
    conn: &impl ConnectionTrait,
    owner_id: i32,
    id: i32,
) -> Result<folder_entity::Model, AppError> {
    Folders::find_by_id(id)
        .filter(folder_entity::Column::OwnerId.eq(owner_id))
        .filter(folder_entity::Column::PendingDelete.eq(false))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::folder_not_found(id))
}

pub(crate) async fn folder_is_live(
    conn: &impl ConnectionTrait,
    owner_id: i32,
    id: i32,
) -> Result<bool, AppError> {
    match find_live_folder(conn, owner_id, id).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

/// Looks up a file owned by `owner_id` that no deletion has claimed.
pub(crate) async fn find_live_file(
    conn: &impl ConnectionTrait,
    owner_id: i32,
    id: i32,
) -> Result<file_entity::Model, AppError> {
    Files::find_by_id(id)
        .filter(file_entity::Column::OwnerId.eq(owner_id))
        .filter(file_entity::Column::PendingDelete.eq(false))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::file_not_found(id))
}
