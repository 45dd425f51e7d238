use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{Votable, VotableKind, VoteOutcome, VoteValue},
    services::reputation_service,
    store::QaStore,
};

/// Attempts before a lost first-vote race is surfaced to the caller.
pub const MAX_VOTE_ATTEMPTS: usize = 3;

pub async fn cast_vote(
    store: &dyn QaStore,
    voter_id: Uuid,
    kind: VotableKind,
    item_id: Uuid,
    value: i16,
) -> Result<VoteOutcome> {
    let value = VoteValue::try_from(value)?;

    let item = store
        .get_votable(kind, item_id)
        .await?
        .filter(|item| item.is_active())
        .ok_or_else(|| AppError::NotFound(format!("{} not found", kind.label())))?;

    if item.author_id() == voter_id {
        return Err(AppError::InvalidOperation(format!(
            "Cannot vote on your own {}",
            kind
        )));
    }

    let mut attempt = 1;
    let outcome = loop {
        match store.apply_vote(kind, item_id, voter_id, value).await {
            Err(AppError::ConflictRetryable(reason)) if attempt < MAX_VOTE_ATTEMPTS => {
                tracing::debug!(
                    "Retrying vote on {} {} by {} after conflict: {}",
                    kind,
                    item_id,
                    voter_id,
                    reason
                );
                attempt += 1;
            }
            result => break result?,
        }
    };

    reputation_service::on_tally_changed(store, item.author_id()).await;

    Ok(outcome)
}

pub async fn current_vote(
    store: &dyn QaStore,
    voter_id: Uuid,
    kind: VotableKind,
    item_id: Uuid,
) -> Result<Option<VoteValue>> {
    store.current_vote(kind, item_id, voter_id).await
}
