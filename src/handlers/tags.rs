use axum::{
    extract::{Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, error::Result, services::question_service};

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u32>,
}

pub async fn popular_tags(
    State(state): State<AppState>,
    Query(params): Query<LimitQuery>,
) -> Result<Json<Value>> {
    let tags = question_service::popular_tags(state.store.as_ref(), params.limit).await?;

    Ok(Json(json!({ "tags": tags })))
}
