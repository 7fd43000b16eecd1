use crate::services::hierarchy::HierarchyStore;
use crate::services::reconciliation::ReconciliationService;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

pub struct BackgroundWorker {
    reconciler: Arc<ReconciliationService>,
    hierarchy: Arc<HierarchyStore>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl BackgroundWorker {
    pub fn new(
        reconciler: Arc<ReconciliationService>,
        hierarchy: Arc<HierarchyStore>,
        interval: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            reconciler,
            hierarchy,
            interval,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("🚀 Background worker started (every {:?})", self.interval);

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Background worker shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.perform_cleanup().await;
                }
            }
        }
    }

    pub async fn perform_cleanup(&self) {
        tracing::debug!("🧹 Running background cleanup tasks...");

        match self.reconciler.sweep().await {
            Ok(report) if report.examined > 0 || report.files_purged > 0 => tracing::info!(
                "🧹 Reconciliation: {} examined, {} resolved, {} still failing, {} files purged",
                report.examined,
                report.resolved,
                report.still_failing,
                report.files_purged
            ),
            Ok(_) => {}
            Err(e) => tracing::error!("❌ Reconciliation sweep failed: {}", e),
        }

        self.hierarchy.prune_locks();
    }
}
