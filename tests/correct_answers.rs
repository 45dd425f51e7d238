mod common;

use answerhub::error::AppError;
use answerhub::models::VotableKind;
use answerhub::services::{answer_service, question_service, vote_service};
use answerhub::store::{MemoryStore, QaStore};
use common::{answer, ask, seeded};
use uuid::Uuid;

async fn correct_count(store: &MemoryStore, question_id: Uuid) -> usize {
    store
        .answers_for_question(question_id, true)
        .await
        .unwrap()
        .iter()
        .filter(|a| a.is_correct)
        .count()
}

#[tokio::test]
async fn marking_a_second_answer_moves_the_flag() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;
    let first = answer(&fx.store, fx.bob.id, question.id).await;
    let second = answer(&fx.store, fx.carol.id, question.id).await;

    let change = answer_service::mark_correct(&fx.store, first.id, fx.alice.id, true)
        .await
        .unwrap();
    assert_eq!(change.answer_id, first.id);
    assert_eq!(change.previous_correct_answer_id, None);

    let change = answer_service::mark_correct(&fx.store, second.id, fx.alice.id, true)
        .await
        .unwrap();
    assert_eq!(change.previous_correct_answer_id, Some(first.id));

    assert_eq!(correct_count(&fx.store, question.id).await, 1);
    let first = fx.store.get_answer(first.id).await.unwrap().unwrap();
    assert!(!first.is_correct);

    // Correct answer sorts first.
    let listed = answer_service::answers_for_question(&fx.store, question.id)
        .await
        .unwrap();
    assert_eq!(listed[0].id, second.id);
}

#[tokio::test]
async fn re_marking_the_current_answer_reports_no_previous() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;
    let reply = answer(&fx.store, fx.bob.id, question.id).await;

    answer_service::mark_correct(&fx.store, reply.id, fx.alice.id, true)
        .await
        .unwrap();
    let again = answer_service::mark_correct(&fx.store, reply.id, fx.alice.id, true)
        .await
        .unwrap();
    assert_eq!(again.previous_correct_answer_id, None);
    assert_eq!(correct_count(&fx.store, question.id).await, 1);
}

#[tokio::test]
async fn only_the_question_author_may_mark() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;
    let reply = answer(&fx.store, fx.bob.id, question.id).await;

    let err = answer_service::mark_correct(&fx.store, reply.id, fx.bob.id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));
    assert_eq!(correct_count(&fx.store, question.id).await, 0);
}

#[tokio::test]
async fn marking_a_deactivated_answer_follows_the_resurrect_flag() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;
    let reply = answer(&fx.store, fx.bob.id, question.id).await;
    answer_service::deactivate_answer(&fx.store, reply.id, fx.bob.id)
        .await
        .unwrap();

    let err = answer_service::mark_correct(&fx.store, reply.id, fx.alice.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(!fx.store.get_answer(reply.id).await.unwrap().unwrap().is_active);

    answer_service::mark_correct(&fx.store, reply.id, fx.alice.id, true)
        .await
        .unwrap();
    let revived = fx.store.get_answer(reply.id).await.unwrap().unwrap();
    assert!(revived.is_active);
    assert!(revived.is_correct);
}

#[tokio::test]
async fn deactivating_a_question_cascades_to_answers() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;
    let first = answer(&fx.store, fx.bob.id, question.id).await;
    let second = answer(&fx.store, fx.carol.id, question.id).await;
    answer_service::mark_correct(&fx.store, first.id, fx.alice.id, true)
        .await
        .unwrap();
    vote_service::cast_vote(&fx.store, fx.carol.id, VotableKind::Answer, first.id, 1)
        .await
        .unwrap();

    let err = question_service::deactivate_question(&fx.store, question.id, fx.bob.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    question_service::deactivate_question(&fx.store, question.id, fx.alice.id)
        .await
        .unwrap();

    for id in [first.id, second.id] {
        let stored = fx.store.get_answer(id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert!(!stored.is_correct);
    }
    // Tallies survive soft deletion.
    assert_eq!(fx.store.get_answer(first.id).await.unwrap().unwrap().votes, 1);

    let again = question_service::deactivate_question(&fx.store, question.id, fx.alice.id)
        .await
        .unwrap_err();
    assert!(matches!(again, AppError::NotFound(_)));

    let listing = answer_service::answers_for_question(&fx.store, question.id)
        .await
        .unwrap_err();
    assert!(matches!(listing, AppError::NotFound(_)));
}

#[tokio::test]
async fn deactivating_the_correct_answer_clears_it() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;
    let reply = answer(&fx.store, fx.bob.id, question.id).await;
    answer_service::mark_correct(&fx.store, reply.id, fx.alice.id, true)
        .await
        .unwrap();

    let err = answer_service::deactivate_answer(&fx.store, reply.id, fx.alice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::PermissionDenied(_)));

    answer_service::deactivate_answer(&fx.store, reply.id, fx.bob.id)
        .await
        .unwrap();
    let stored = fx.store.get_answer(reply.id).await.unwrap().unwrap();
    assert!(!stored.is_active);
    assert!(!stored.is_correct);
    assert!(
        answer_service::answers_for_question(&fx.store, question.id)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn answers_under_an_inactive_question_cannot_be_marked() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;
    let reply = answer(&fx.store, fx.bob.id, question.id).await;
    question_service::deactivate_question(&fx.store, question.id, fx.alice.id)
        .await
        .unwrap();

    let err = answer_service::mark_correct(&fx.store, reply.id, fx.alice.id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(correct_count(&fx.store, question.id).await, 0);
}

#[tokio::test]
async fn store_refuses_to_mark_under_a_deactivated_question() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;
    let reply = answer(&fx.store, fx.bob.id, question.id).await;
    fx.store.deactivate_question(question.id).await.unwrap();

    // Bypasses the service checks, as a deactivation racing the service read would.
    let err = fx.store.mark_correct(reply.id, true).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let stored = fx.store.get_answer(reply.id).await.unwrap().unwrap();
    assert!(!stored.is_active);
    assert!(!stored.is_correct);
}

#[tokio::test]
async fn concurrent_marks_leave_one_correct_answer() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;

    let mut answer_ids = Vec::new();
    for author in [fx.bob.id, fx.carol.id, fx.bob.id, fx.carol.id, fx.bob.id] {
        answer_ids.push(answer(&fx.store, author, question.id).await.id);
    }

    let mut handles = Vec::new();
    for answer_id in answer_ids {
        let store = fx.store.clone();
        let requester = fx.alice.id;
        handles.push(tokio::spawn(async move {
            answer_service::mark_correct(&store, answer_id, requester, true).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(correct_count(&fx.store, question.id).await, 1);
}

#[tokio::test]
async fn whitespace_only_answer_is_rejected() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;

    let request = answerhub::models::CreateAnswerRequest {
        content: "   ".to_string(),
    };
    let err = answer_service::create_answer(&fx.store, fx.bob.id, question.id, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(
        fx.store
            .answers_for_question(question.id, true)
            .await
            .unwrap()
            .is_empty()
    );
}
