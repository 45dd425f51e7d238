use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, interval};

use crate::{error::Result, services::reputation_service, store::QaStore};

#[derive(Clone)]
pub struct BackgroundJobsService {
    store: Arc<dyn QaStore>,
}

impl BackgroundJobsService {
    pub fn new(store: Arc<dyn QaStore>) -> Self {
        Self { store }
    }

    /// Start all background jobs. A zero interval disables reconciliation.
    pub fn start_all_jobs(&self, reconcile_every: Duration) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        if reconcile_every.is_zero() {
            tracing::info!("Tally reconciliation job disabled");
            return handles;
        }

        let jobs_service = self.clone();

        // Re-derive tallies and reputation from the ledger
        handles.push(tokio::spawn(async move {
            let mut interval = interval(reconcile_every);
            // The first tick completes immediately; skip it so startup isn't a full scan.
            interval.tick().await;
            loop {
                interval.tick().await;
                if let Err(e) = jobs_service.reconcile_tallies().await {
                    tracing::error!("Failed to reconcile vote tallies: {}", e);
                }
            }
        }));

        tracing::info!("Background jobs started successfully");
        handles
    }

    async fn reconcile_tallies(&self) -> Result<()> {
        reputation_service::reconcile(self.store.as_ref()).await?;
        Ok(())
    }
}
