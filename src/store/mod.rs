//! Persistence seam for the voting and reputation engine.
//!
//! Every method that mutates more than one row is a single atomic unit: the
//! Postgres store wraps it in a transaction, the in-process store runs it under
//! one write lock. Callers never write tallies, correctness flags or reputation
//! directly.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        AnonymousViewPolicy, Answer, CorrectAnswerChange, Question, Tag, User, UserStats,
        VotableItem, VotableKind, VoteOutcome, VoteValue,
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub tallies_repaired: u64,
    pub reputations_recomputed: u64,
}

#[async_trait]
pub trait QaStore: Send + Sync {
    async fn create_user(&self, username: &str) -> Result<User>;
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>>;
    async fn top_users(&self, limit: u32) -> Result<Vec<User>>;
    async fn user_stats(&self, user_id: Uuid) -> Result<Option<UserStats>>;

    async fn create_question(&self, question: NewQuestion) -> Result<Question>;
    async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>>;
    async fn create_answer(&self, author_id: Uuid, question_id: Uuid, content: &str)
    -> Result<Answer>;
    async fn get_answer(&self, answer_id: Uuid) -> Result<Option<Answer>>;
    async fn answers_for_question(
        &self,
        question_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Answer>>;
    async fn popular_tags(&self, limit: u32) -> Result<Vec<Tag>>;

    async fn get_votable(&self, kind: VotableKind, item_id: Uuid) -> Result<Option<VotableItem>>;
    async fn current_vote(
        &self,
        kind: VotableKind,
        item_id: Uuid,
        voter_id: Uuid,
    ) -> Result<Option<VoteValue>>;

    /// Ledger change and tally delta for one vote, applied together or not at all.
    /// A lost race on the (voter, item) unique key yields `ConflictRetryable`.
    async fn apply_vote(
        &self,
        kind: VotableKind,
        item_id: Uuid,
        voter_id: Uuid,
        value: VoteValue,
    ) -> Result<VoteOutcome>;

    /// Clears every other correct flag under the question and sets this one.
    async fn mark_correct(&self, answer_id: Uuid, resurrect: bool) -> Result<CorrectAnswerChange>;

    async fn deactivate_question(&self, question_id: Uuid) -> Result<u64>;
    async fn deactivate_answer(&self, answer_id: Uuid) -> Result<()>;

    async fn record_view(
        &self,
        question_id: Uuid,
        viewer_id: Option<Uuid>,
        policy: AnonymousViewPolicy,
    ) -> Result<i32>;

    /// Recomputes from current aggregates and returns the new reputation.
    async fn recompute_reputation(&self, user_id: Uuid) -> Result<i32>;

    async fn reconcile(&self) -> Result<ReconcileReport>;
}
