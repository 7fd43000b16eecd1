//! Deletion of files and cascading deletion of folders.
//!
//! The owner lock is held only while claiming records and while removing
//! them; blob I/O happens in between without it. Claimed records stay hidden
//! if a run stops part-way, and repeating the call finishes the job.

use crate::api::error::AppError;
use crate::models::{AuthenticatedIdentity, DeletionReport};
use crate::services::blob_store::{BlobStore, delete_if_present};
use crate::services::hierarchy::HierarchyStore;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionPhase {
    Requested,
    Validating,
    CascadingChildren,
    DeletingBlobs,
    DeletingMetadata,
    Done,
    Failed,
}

impl DeletionPhase {
    pub fn can_advance_to(self, next: DeletionPhase) -> bool {
        use DeletionPhase::*;
        matches!(
            (self, next),
            (Requested, Validating)
                | (Requested, Failed)
                | (Validating, CascadingChildren)
                | (Validating, DeletingBlobs)
                | (Validating, Failed)
                | (CascadingChildren, DeletingBlobs)
                | (CascadingChildren, Failed)
                | (DeletingBlobs, DeletingMetadata)
                | (DeletingBlobs, Failed)
                | (DeletingMetadata, Done)
                | (DeletingMetadata, Failed)
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Target {
    File(i32),
    Folder(i32),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::File(id) => write!(f, "file {}", id),
            Target::Folder(id) => write!(f, "folder {}", id),
        }
    }
}

/// Tracks one deletion request through its phases.
struct DeletionRun {
    target: Target,
    phase: DeletionPhase,
}

impl DeletionRun {
    fn new(target: Target) -> Self {
        tracing::debug!("Deletion of {} requested", target);
        Self {
            target,
            phase: DeletionPhase::Requested,
        }
    }

    fn advance(&mut self, next: DeletionPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal deletion transition {:?} -> {:?}",
            self.phase,
            next
        );
        tracing::debug!("Deleting {}: {:?} -> {:?}", self.target, self.phase, next);
        self.phase = next;
    }

    fn fail(&mut self, err: AppError) -> AppError {
        if err.is_not_found() {
            tracing::debug!("Deletion of {} failed in {:?}: {}", self.target, self.phase, err);
        } else {
            tracing::error!("❌ Deletion of {} failed in {:?}: {}", self.target, self.phase, err);
        }
        self.advance(DeletionPhase::Failed);
        err
    }
}

pub struct DeletionOrchestrator {
    hierarchy: Arc<HierarchyStore>,
    blobs: Arc<dyn BlobStore>,
}

impl DeletionOrchestrator {
    pub fn new(hierarchy: Arc<HierarchyStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { hierarchy, blobs }
    }

    /// Deletes the blob, then the record. A failed blob delete leaves the
    /// file untouched and visible, unless a folder deletion claimed it in
    /// the meantime. Repeating the call finishes a deletion that stopped
    /// after the blob was gone.
    pub async fn delete_file(
        &self,
        identity: &AuthenticatedIdentity,
        id: i32,
    ) -> Result<(), AppError> {
        let owner_id = identity.user_id;
        let mut run = DeletionRun::new(Target::File(id));

        run.advance(DeletionPhase::Validating);
        let file = self
            .hierarchy
            .mark_file_pending(owner_id, id)
            .await
            .map_err(|e| run.fail(e))?;

        run.advance(DeletionPhase::DeletingBlobs);
        if let Err(e) = delete_if_present(self.blobs.as_ref(), &file.blob_key).await {
            match self.hierarchy.clear_file_pending(owner_id, id).await {
                Ok(true) => {}
                Ok(false) => tracing::info!("File {} left to the folder deletion that claimed it", id),
                Err(restore) => {
                    tracing::error!("❌ Could not release claim on file {}: {}", id, restore)
                }
            }
            return Err(run.fail(AppError::Storage(e)));
        }

        run.advance(DeletionPhase::DeletingMetadata);
        self.hierarchy
            .detach_file(owner_id, id)
            .await
            .map_err(|e| run.fail(e))?;

        run.advance(DeletionPhase::Done);
        tracing::info!("🗑️  File {} deleted (User: {})", id, owner_id);
        Ok(())
    }

    /// Deletes a folder with every folder and file below it.
    pub async fn delete_folder(
        &self,
        identity: &AuthenticatedIdentity,
        id: i32,
    ) -> Result<DeletionReport, AppError> {
        let owner_id = identity.user_id;
        let mut run = DeletionRun::new(Target::Folder(id));

        run.advance(DeletionPhase::Validating);
        let subtree = self
            .hierarchy
            .mark_subtree_pending(owner_id, id)
            .await
            .map_err(|e| run.fail(e))?;

        run.advance(DeletionPhase::CascadingChildren);
        tracing::info!(
            "Cascading delete of folder {}: {} folders, {} files",
            id,
            subtree.folder_ids.len(),
            subtree.files.len()
        );

        run.advance(DeletionPhase::DeletingBlobs);
        let mut cleared = HashSet::with_capacity(subtree.files.len());
        let mut blobs_removed = 0;
        for file in &subtree.files {
            match delete_if_present(self.blobs.as_ref(), &file.blob_key).await {
                Ok(removed) => {
                    if removed {
                        blobs_removed += 1;
                    }
                    cleared.insert(file.id);
                }
                Err(e) => {
                    tracing::warn!(
                        "Folder {} delete stopped at blob {} ({} of {} cleared); retry to resume",
                        id,
                        file.blob_key,
                        cleared.len(),
                        subtree.files.len()
                    );
                    return Err(run.fail(AppError::Storage(e)));
                }
            }
        }

        run.advance(DeletionPhase::DeletingMetadata);
        let (folders_removed, files_removed) = self
            .hierarchy
            .purge_subtree(owner_id, id, &cleared)
            .await
            .map_err(|e| run.fail(e))?;

        run.advance(DeletionPhase::Done);
        tracing::info!(
            "🗑️  Folder {} deleted: {} folders, {} files, {} blobs (User: {})",
            id,
            folders_removed,
            files_removed,
            blobs_removed,
            owner_id
        );

        Ok(DeletionReport {
            folders_removed,
            files_removed,
            blobs_removed,
        })
    }
}
