//! Ledger of blobs that lost their metadata but could not be deleted at the
//! time, and the sweep that retries them. The sweep also finishes file
//! deletions that stopped after the blob was already gone.

use crate::entities::{prelude::*, *};
use crate::services::blob_store::{BlobError, BlobStore, delete_if_present};
use crate::services::hierarchy::HierarchyStore;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, NotSet,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::sync::Arc;

/// Rows handled per sweep pass.
pub const SWEEP_BATCH: u64 = 100;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub examined: usize,
    pub resolved: usize,
    pub still_failing: usize,
    /// Claimed file records removed because their blob was gone
    pub files_purged: usize,
}

pub struct ReconciliationService {
    db: DatabaseConnection,
    blobs: Arc<dyn BlobStore>,
    hierarchy: Arc<HierarchyStore>,
}

impl ReconciliationService {
    pub fn new(
        db: DatabaseConnection,
        blobs: Arc<dyn BlobStore>,
        hierarchy: Arc<HierarchyStore>,
    ) -> Self {
        Self {
            db,
            blobs,
            hierarchy,
        }
    }

    /// Flags `blob_key` for a later delete. Never fails the caller: the
    /// original error is what the caller reports.
    pub async fn record_orphan(&self, blob_key: &str, reason: &str, error: &BlobError) {
        tracing::warn!(
            "🧟 Orphaned blob {} flagged for reconciliation ({}): {}",
            blob_key,
            reason,
            error
        );

        let existing = OrphanBlobs::find()
            .filter(orphan_blobs::Column::BlobKey.eq(blob_key))
            .one(&self.db)
            .await;

        let res = match existing {
            Ok(Some(row)) => {
                let attempts = row.attempts;
                let mut active: orphan_blobs::ActiveModel = row.into();
                active.attempts = Set(attempts + 1);
                active.last_error = Set(Some(error.to_string()));
                active.update(&self.db).await.map(|_| ())
            }
            Ok(None) => orphan_blobs::ActiveModel {
                id: NotSet,
                blob_key: Set(blob_key.to_string()),
                reason: Set(reason.to_string()),
                attempts: Set(1),
                last_error: Set(Some(error.to_string())),
                created_at: Set(Utc::now()),
            }
            .insert(&self.db)
            .await
            .map(|_| ()),
            Err(e) => Err(e),
        };

        if let Err(e) = res {
            tracing::error!(
                "❌ Could not record orphaned blob {} for reconciliation: {}",
                blob_key,
                e
            );
        }
    }

    /// Retries up to [`SWEEP_BATCH`] flagged blobs, oldest first.
    pub async fn sweep(&self) -> anyhow::Result<SweepReport> {
        let rows = OrphanBlobs::find()
            .order_by_asc(orphan_blobs::Column::Id)
            .limit(SWEEP_BATCH)
            .all(&self.db)
            .await?;

        let mut report = SweepReport {
            examined: rows.len(),
            ..Default::default()
        };

        for row in rows {
            match delete_if_present(self.blobs.as_ref(), &row.blob_key).await {
                Ok(_) => {
                    tracing::info!("✅ Reconciled orphaned blob {}", row.blob_key);
                    row.delete(&self.db).await?;
                    report.resolved += 1;
                }
                Err(e) => {
                    tracing::warn!("Orphaned blob {} still failing: {}", row.blob_key, e);
                    let attempts = row.attempts;
                    let mut active: orphan_blobs::ActiveModel = row.into();
                    active.attempts = Set(attempts + 1);
                    active.last_error = Set(Some(e.to_string()));
                    active.update(&self.db).await?;
                    report.still_failing += 1;
                }
            }
        }

        report.files_purged = self.purge_stranded_files().await?;
        Ok(report)
    }

    /// Removes claimed file records whose blob is gone. A claimed file that
    /// still has its blob is mid-deletion and left alone.
    async fn purge_stranded_files(&self) -> anyhow::Result<usize> {
        let mut purged = 0;
        for file in self.hierarchy.stranded_files(SWEEP_BATCH).await? {
            match self.blobs.exists(&file.blob_key).await {
                Ok(false) => {
                    if self.hierarchy.detach_file(file.owner_id, file.id).await? {
                        tracing::info!(
                            "✅ Purged file {} left claimed without its blob {}",
                            file.id,
                            file.blob_key
                        );
                        purged += 1;
                    }
                }
                Ok(true) => {}
                Err(e) => tracing::warn!("Cannot check blob {}: {}", file.blob_key, e),
            }
        }
        Ok(purged)
    }

    pub async fn pending(&self) -> anyhow::Result<Vec<orphan_blobs::Model>> {
        Ok(OrphanBlobs::find()
            .order_by_asc(orphan_blobs::Column::Id)
            .all(&self.db)
            .await?)
    }
}
