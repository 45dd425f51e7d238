use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    auth::{AuthUser, OptionalAuthUser},
    error::Result,
    handlers::enforce_vote_rate_limit,
    models::{
        CreateQuestionRequest, Question, ViewResponse, VotableKind, VoteOutcome, VoteRequest,
    },
    services::{question_service, vote_service},
};

pub async fn create_question(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<Question>)> {
    let question =
        question_service::create_question(state.store.as_ref(), auth_user.user_id, &payload)
            .await?;

    Ok((StatusCode::CREATED, Json(question)))
}

pub async fn vote_question(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(question_id): Path<Uuid>,
    payload: std::result::Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteOutcome>> {
    let Json(payload) = payload?;
    enforce_vote_rate_limit(&state, &auth_user).await?;

    let outcome = vote_service::cast_vote(
        state.store.as_ref(),
        auth_user.user_id,
        VotableKind::Question,
        question_id,
        payload.value,
    )
    .await?;

    Ok(Json(outcome))
}

pub async fn delete_question(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(question_id): Path<Uuid>,
) -> Result<Json<Value>> {
    question_service::deactivate_question(state.store.as_ref(), question_id, auth_user.user_id)
        .await?;

    Ok(Json(json!({
        "message": "Question deleted successfully"
    })))
}

pub async fn record_view(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    auth_user: OptionalAuthUser,
) -> Result<Json<ViewResponse>> {
    let viewer_id = auth_user.0.as_ref().map(|user| user.user_id);

    let views = question_service::record_view(
        state.store.as_ref(),
        question_id,
        viewer_id,
        state.config.anonymous_views,
    )
    .await?;

    Ok(Json(ViewResponse { question_id, views }))
}
