mod common;

use answerhub::error::AppError;
use answerhub::models::{AnonymousViewPolicy, CreateQuestionRequest, VotableKind};
use answerhub::services::{question_service, reputation_service, user_service, vote_service};
use answerhub::store::QaStore;
use common::{answer, ask, seeded};

#[tokio::test]
async fn authenticated_views_count_once_per_user() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;
    let policy = AnonymousViewPolicy::Count;

    let views = question_service::record_view(&fx.store, question.id, Some(fx.bob.id), policy)
        .await
        .unwrap();
    assert_eq!(views, 1);
    let views = question_service::record_view(&fx.store, question.id, Some(fx.bob.id), policy)
        .await
        .unwrap();
    assert_eq!(views, 1);
    let views = question_service::record_view(&fx.store, question.id, Some(fx.carol.id), policy)
        .await
        .unwrap();
    assert_eq!(views, 2);
}

#[tokio::test]
async fn anonymous_views_follow_policy() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;

    for _ in 0..3 {
        question_service::record_view(&fx.store, question.id, None, AnonymousViewPolicy::Count)
            .await
            .unwrap();
    }
    let views =
        question_service::record_view(&fx.store, question.id, None, AnonymousViewPolicy::Ignore)
            .await
            .unwrap();
    assert_eq!(views, 3);
}

#[tokio::test]
async fn views_on_inactive_questions_are_not_found() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;
    question_service::deactivate_question(&fx.store, question.id, fx.alice.id)
        .await
        .unwrap();

    let err = question_service::record_view(
        &fx.store,
        question.id,
        Some(fx.bob.id),
        AnonymousViewPolicy::Count,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn popular_tags_rank_by_usage() {
    let fx = seeded().await;
    ask(&fx.store, fx.alice.id, &["Rust", "async"]).await;
    ask(&fx.store, fx.bob.id, &["rust", "tokio"]).await;
    ask(&fx.store, fx.carol.id, &[" RUST ", "async", "rust"]).await;

    let tags = question_service::popular_tags(&fx.store, None).await.unwrap();
    let ranked: Vec<(&str, i32)> = tags
        .iter()
        .map(|t| (t.name.as_str(), t.usage_count))
        .collect();
    assert_eq!(ranked, vec![("rust", 3), ("async", 2), ("tokio", 1)]);

    let top = question_service::popular_tags(&fx.store, Some(1)).await.unwrap();
    assert_eq!(top.len(), 1);
}

#[tokio::test]
async fn invalid_question_input_is_rejected() {
    let fx = seeded().await;
    let request = CreateQuestionRequest {
        title: "t".repeat(51),
        content: "body".to_string(),
        tags: vec![],
    };
    let err = question_service::create_question(&fx.store, fx.alice.id, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn whitespace_only_title_is_rejected() {
    let fx = seeded().await;
    let request = CreateQuestionRequest {
        title: "    ".to_string(),
        content: "body".to_string(),
        tags: vec![],
    };
    let err = question_service::create_question(&fx.store, fx.alice.id, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(
        fx.store.user_stats(fx.alice.id).await.unwrap().unwrap().questions_count,
        0
    );
}

#[tokio::test]
async fn top_users_and_stats_reflect_votes() {
    let fx = seeded().await;
    let question = ask(&fx.store, fx.alice.id, &[]).await;
    let reply = answer(&fx.store, fx.bob.id, question.id).await;

    vote_service::cast_vote(&fx.store, fx.carol.id, VotableKind::Answer, reply.id, 1)
        .await
        .unwrap();
    vote_service::cast_vote(&fx.store, fx.carol.id, VotableKind::Question, question.id, 1)
        .await
        .unwrap();

    let top = user_service::top_by_reputation(&fx.store, Some(2)).await.unwrap();
    let names: Vec<&str> = top.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["bob", "alice"]);

    let stats = user_service::get_user_stats(&fx.store, fx.bob.id).await.unwrap();
    assert_eq!(stats.reputation, 10);
    assert_eq!(stats.questions_count, 0);
    assert_eq!(stats.answers_count, 1);
    assert_eq!(stats.total_votes, 1);

    let missing = user_service::get_user_stats(&fx.store, uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));
    assert!(
        reputation_service::get_reputation(&fx.store, uuid::Uuid::new_v4())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn usernames_are_unique() {
    let fx = seeded().await;
    let err = fx.store.create_user("alice").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidArgument(_)));
}
