use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, Result},
    models::{AnonymousViewPolicy, CreateQuestionRequest, Question, Tag},
    store::{NewQuestion, QaStore},
};

pub const DEFAULT_POPULAR_TAGS: u32 = 12;

pub async fn create_question(
    store: &dyn QaStore,
    author_id: Uuid,
    request: &CreateQuestionRequest,
) -> Result<Question> {
    request.validate()?;

    let question = store
        .create_question(NewQuestion {
            author_id,
            title: request.title.trim().to_string(),
            content: request.content.clone(),
            tags: request.normalized_tags(),
        })
        .await?;

    tracing::debug!("Question {} created by {}", question.id, author_id);

    Ok(question)
}

/// Soft-deletes a question and every answer under it. Votes stay in the ledger.
pub async fn deactivate_question(
    store: &dyn QaStore,
    question_id: Uuid,
    requester_id: Uuid,
) -> Result<()> {
    let question = store
        .get_question(question_id)
        .await?
        .filter(|question| question.is_active)
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    if question.author_id != requester_id {
        return Err(AppError::PermissionDenied(
            "Can only delete your own questions".to_string(),
        ));
    }

    let answers = store.deactivate_question(question_id).await?;

    tracing::info!(
        "Question {} deactivated along with {} answers",
        question_id,
        answers
    );

    Ok(())
}

/// Counts a view at most once per authenticated user; anonymous views follow `policy`.
pub async fn record_view(
    store: &dyn QaStore,
    question_id: Uuid,
    viewer_id: Option<Uuid>,
    policy: AnonymousViewPolicy,
) -> Result<i32> {
    store.record_view(question_id, viewer_id, policy).await
}

pub async fn popular_tags(store: &dyn QaStore, limit: Option<u32>) -> Result<Vec<Tag>> {
    store
        .popular_tags(limit.unwrap_or(DEFAULT_POPULAR_TAGS).min(100))
        .await
}
