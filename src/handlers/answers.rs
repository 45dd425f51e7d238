use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::Result,
    handlers::enforce_vote_rate_limit,
    models::{
        Answer, CorrectAnswerChange, CreateAnswerRequest, VotableKind, VoteOutcome, VoteRequest,
    },
    services::{answer_service, vote_service},
};

pub async fn create_answer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(question_id): Path<Uuid>,
    Json(payload): Json<CreateAnswerRequest>,
) -> Result<(StatusCode, Json<Answer>)> {
    let answer = answer_service::create_answer(
        state.store.as_ref(),
        auth_user.user_id,
        question_id,
        &payload,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(answer)))
}

pub async fn get_question_answers(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> Result<Json<Value>> {
    let answers = answer_service::answers_for_question(state.store.as_ref(), question_id).await?;
    let correct_answer_id = answers.iter().find(|a| a.is_correct).map(|a| a.id);

    Ok(Json(json!({
        "question_id": question_id,
        "correct_answer_id": correct_answer_id,
        "answers": answers
    })))
}

pub async fn vote_answer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(answer_id): Path<Uuid>,
    payload: std::result::Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteOutcome>> {
    let Json(payload) = payload?;
    enforce_vote_rate_limit(&state, &auth_user).await?;

    let outcome = vote_service::cast_vote(
        state.store.as_ref(),
        auth_user.user_id,
        VotableKind::Answer,
        answer_id,
        payload.value,
    )
    .await?;

    Ok(Json(outcome))
}

pub async fn mark_correct(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(answer_id): Path<Uuid>,
) -> Result<Json<CorrectAnswerChange>> {
    let change = answer_service::mark_correct(
        state.store.as_ref(),
        answer_id,
        auth_user.user_id,
        state.config.resurrect_on_mark_correct,
    )
    .await?;

    Ok(Json(change))
}

pub async fn delete_answer(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(answer_id): Path<Uuid>,
) -> Result<Json<Value>> {
    answer_service::deactivate_answer(state.store.as_ref(), answer_id, auth_user.user_id).await?;

    Ok(Json(json!({
        "message": "Answer deleted successfully"
    })))
}
