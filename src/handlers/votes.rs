use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::Result,
    models::{VotableKind, VoteValue},
    services::vote_service,
};

pub async fn get_current_vote(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((item_type, item_id)): Path<(String, Uuid)>,
) -> Result<Json<Value>> {
    let kind: VotableKind = item_type.parse()?;

    let vote =
        vote_service::current_vote(state.store.as_ref(), auth_user.user_id, kind, item_id).await?;

    Ok(Json(json!({
        "item_type": kind,
        "item_id": item_id,
        "voted": vote.is_some(),
        "value": vote.map(VoteValue::as_i16).unwrap_or(0)
    })))
}
