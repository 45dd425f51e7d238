use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    error::Result,
    handlers::tags::LimitQuery,
    models::{ReputationResponse, UserStats},
    services::{reputation_service, user_service},
};

pub async fn get_reputation(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ReputationResponse>> {
    let reputation = reputation_service::get_reputation(state.store.as_ref(), user_id).await?;

    Ok(Json(ReputationResponse {
        user_id,
        reputation,
    }))
}

pub async fn get_user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserStats>> {
    let stats = user_service::get_user_stats(state.store.as_ref(), user_id).await?;

    Ok(Json(stats))
}

pub async fn top_users(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Value>> {
    let users = user_service::top_by_reputation(state.store.as_ref(), params.limit).await?;

    Ok(Json(json!({ "users": users })))
}
