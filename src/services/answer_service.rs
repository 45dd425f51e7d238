use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::{Answer, CorrectAnswerChange, CreateAnswerRequest},
    store::QaStore,
};

pub async fn create_answer(
    store: &dyn QaStore,
    author_id: Uuid,
    question_id: Uuid,
    request: &CreateAnswerRequest,
) -> Result<Answer> {
    request.validate()?;

    store
        .create_answer(author_id, question_id, request.content.trim())
        .await
}

pub async fn answers_for_question(store: &dyn QaStore, question_id: Uuid) -> Result<Vec<Answer>> {
    store
        .get_question(question_id)
        .await?
        .filter(|question| question.is_active)
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    store.answers_for_question(question_id, false).await
}

/// Only the question's author may choose its correct answer.
///
/// With `resurrect` set, a soft-deleted answer is re-activated when marked;
/// otherwise it is treated as missing.
pub async fn mark_correct(
    store: &dyn QaStore,
    answer_id: Uuid,
    requester_id: Uuid,
    resurrect: bool,
) -> Result<CorrectAnswerChange> {
    let answer = store
        .get_answer(answer_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Answer not found".to_string()))?;

    if !answer.is_active && !resurrect {
        return Err(AppError::NotFound("Answer not found".to_string()));
    }

    let question = store
        .get_question(answer.question_id)
        .await?
        .filter(|question| question.is_active)
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    if question.author_id != requester_id {
        return Err(AppError::PermissionDenied(
            "Only the question author can mark the correct answer".to_string(),
        ));
    }

    let change = store.mark_correct(answer_id, resurrect).await?;

    if !answer.is_active {
        tracing::info!("Answer {} re-activated by being marked correct", answer_id);
    }
    tracing::info!(
        "Question {} correct answer: {:?} -> {}",
        question.id,
        change.previous_correct_answer_id,
        change.answer_id
    );

    Ok(change)
}

pub async fn deactivate_answer(
    store: &dyn QaStore,
    answer_id: Uuid,
    requester_id: Uuid,
) -> Result<()> {
    let answer = store
        .get_answer(answer_id)
        .await?
        .filter(|answer| answer.is_active)
        .ok_or_else(|| AppError::NotFound("Answer not found".to_string()))?;

    if answer.author_id != requester_id {
        return Err(AppError::PermissionDenied(
            "Can only delete your own answers".to_string(),
        ));
    }

    store.deactivate_answer(answer_id).await?;

    tracing::info!(
        "Answer {} deactivated{}",
        answer_id,
        if answer.is_correct {
            " (correct flag cleared)"
        } else {
            ""
        }
    );

    Ok(())
}
