#![allow(dead_code)]

use answerhub::models::{Answer, CreateAnswerRequest, CreateQuestionRequest, Question, User};
use answerhub::services::{answer_service, question_service};
use answerhub::store::{MemoryStore, QaStore};
use uuid::Uuid;

pub struct Fixture {
    pub store: MemoryStore,
    pub alice: User,
    pub bob: User,
    pub carol: User,
}

pub async fn seeded() -> Fixture {
    let store = MemoryStore::new();
    let alice = store.create_user("alice").await.unwrap();
    let bob = store.create_user("bob").await.unwrap();
    let carol = store.create_user("carol").await.unwrap();

    Fixture {
        store,
        alice,
        bob,
        carol,
    }
}

pub async fn ask(store: &MemoryStore, author_id: Uuid, tags: &[&str]) -> Question {
    let request = CreateQuestionRequest {
        title: "Why does the borrow checker reject this?".to_string(),
        content: "Minimal example attached.".to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    };
    question_service::create_question(store, author_id, &request)
        .await
        .unwrap()
}

pub async fn answer(store: &MemoryStore, author_id: Uuid, question_id: Uuid) -> Answer {
    let request = CreateAnswerRequest {
        content: "Move the borrow into its own scope.".to_string(),
    };
    answer_service::create_answer(store, author_id, question_id, &request)
        .await
        .unwrap()
}
