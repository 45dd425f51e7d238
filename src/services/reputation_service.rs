use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    store::{QaStore, ReconcileReport},
};

/// Recomputes the author's reputation after one of their tallies moved.
/// Failures are logged only; the vote that triggered this has already committed.
pub async fn on_tally_changed(store: &dyn QaStore, author_id: Uuid) {
    match store.recompute_reputation(author_id).await {
        Ok(reputation) => {
            tracing::debug!("Reputation of {} is now {}", author_id, reputation);
        }
        Err(e) => {
            tracing::warn!("Failed to recompute reputation for {}: {}", author_id, e);
        }
    }
}

pub async fn get_reputation(store: &dyn QaStore, user_id: Uuid) -> Result<i32> {
    store
        .get_user(user_id)
        .await?
        .map(|user| user.reputation)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Repair pass: re-derives tallies from the ledger, then every reputation.
pub async fn reconcile(store: &dyn QaStore) -> Result<ReconcileReport> {
    let report = store.reconcile().await?;

    if report.tallies_repaired > 0 {
        tracing::warn!(
            "Reconciliation repaired {} drifted tallies",
            report.tallies_repaired
        );
    }
    tracing::info!(
        "Reconciliation finished: {} tallies repaired, {} reputations recomputed",
        report.tallies_repaired,
        report.reputations_recomputed
    );

    Ok(report)
}
