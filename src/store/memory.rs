//! In-process store. Each operation runs under a single write lock, which
//! serializes mutations per store the way a transaction would per row.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        AnonymousViewPolicy, Answer, CorrectAnswerChange, LedgerChange, Question, Tag, User,
        UserStats, Votable, VotableItem, VotableKind, VoteOutcome, VoteTransition, VoteValue,
        reputation_from_totals,
    },
    store::{NewQuestion, QaStore, ReconcileReport},
};

type LedgerKey = (VotableKind, Uuid, Uuid); // (kind, item, voter)

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    questions: HashMap<Uuid, Question>,
    answers: HashMap<Uuid, Answer>,
    votes: HashMap<LedgerKey, VoteValue>,
    tags: HashMap<String, Tag>,
    question_tags: HashSet<(Uuid, Uuid)>,
    question_viewers: HashSet<(Uuid, Uuid)>,
}

impl MemoryState {
    fn votable_mut(&mut self, kind: VotableKind, item_id: Uuid) -> Option<&mut dyn Votable> {
        match kind {
            VotableKind::Question => self
                .questions
                .get_mut(&item_id)
                .map(|question| question as &mut dyn Votable),
            VotableKind::Answer => self
                .answers
                .get_mut(&item_id)
                .map(|answer| answer as &mut dyn Votable),
        }
    }

    fn ledger_total(&self, kind: VotableKind, item_id: Uuid) -> i32 {
        self.votes
            .iter()
            .filter(|((k, item, _), _)| *k == kind && *item == item_id)
            .map(|(_, value)| value.as_delta())
            .sum()
    }

    fn vote_totals_for(&self, user_id: Uuid) -> (i64, i64) {
        let question_votes: i64 = self
            .questions
            .values()
            .filter(|q| q.author_id == user_id)
            .map(|q| i64::from(q.votes))
            .sum();
        let answer_votes: i64 = self
            .answers
            .values()
            .filter(|a| a.author_id == user_id)
            .map(|a| i64::from(a.votes))
            .sum();
        (question_votes, answer_votes)
    }

    fn recompute(&mut self, user_id: Uuid) -> Option<i32> {
        let (question_votes, answer_votes) = self.vote_totals_for(user_id);
        let user = self.users.get_mut(&user_id)?;
        user.reputation = reputation_from_totals(question_votes, answer_votes);
        Some(user.reputation)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger sum for an item, for repair scans and tests.
    pub async fn ledger_total(&self, kind: VotableKind, item_id: Uuid) -> i32 {
        self.state.read().await.ledger_total(kind, item_id)
    }

    /// Overwrites a tally without touching the ledger, simulating drift.
    pub async fn corrupt_tally(&self, kind: VotableKind, item_id: Uuid, votes: i32) {
        let mut state = self.state.write().await;
        if let Some(item) = state.votable_mut(kind, item_id) {
            let delta = votes - item.votes();
            item.apply_vote_delta(delta);
        }
    }
}

#[async_trait]
impl QaStore for MemoryStore {
    async fn create_user(&self, username: &str) -> Result<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == username) {
            return Err(AppError::InvalidArgument(format!(
                "Username {} is taken",
                username
            )));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            reputation: 0,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn top_users(&self, limit: u32) -> Result<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| {
            b.reputation
                .cmp(&a.reputation)
                .then(a.created_at.cmp(&b.created_at))
        });
        users.truncate(limit as usize);
        Ok(users)
    }

    async fn user_stats(&self, user_id: Uuid) -> Result<Option<UserStats>> {
        let state = self.state.read().await;
        let Some(user) = state.users.get(&user_id) else {
            return Ok(None);
        };

        let (question_votes, answer_votes) = state.vote_totals_for(user_id);
        Ok(Some(UserStats {
            reputation: user.reputation,
            questions_count: state
                .questions
                .values()
                .filter(|q| q.author_id == user_id && q.is_active)
                .count() as i64,
            answers_count: state
                .answers
                .values()
                .filter(|a| a.author_id == user_id && a.is_active)
                .count() as i64,
            total_votes: question_votes + answer_votes,
        }))
    }

    async fn create_question(&self, question: NewQuestion) -> Result<Question> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        let now = Utc::now();

        let created = Question {
            id: Uuid::new_v4(),
            title: question.title,
            content: question.content,
            author_id: question.author_id,
            votes: 0,
            views: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.questions.insert(created.id, created.clone());

        for name in question.tags {
            let tag = state.tags.entry(name.clone()).or_insert_with(|| Tag {
                id: Uuid::new_v4(),
                name,
                usage_count: 0,
                created_at: now,
            });

            if state.question_tags.insert((created.id, tag.id)) {
                tag.usage_count += 1;
            }
        }

        Ok(created)
    }

    async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>> {
        Ok(self.state.read().await.questions.get(&question_id).cloned())
    }

    async fn create_answer(
        &self,
        author_id: Uuid,
        question_id: Uuid,
        content: &str,
    ) -> Result<Answer> {
        let mut state = self.state.write().await;

        if !state
            .questions
            .get(&question_id)
            .is_some_and(|q| q.is_active)
        {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        let now = Utc::now();
        let answer = Answer {
            id: Uuid::new_v4(),
            question_id,
            author_id,
            content: content.to_string(),
            votes: 0,
            is_correct: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.answers.insert(answer.id, answer.clone());

        Ok(answer)
    }

    async fn get_answer(&self, answer_id: Uuid) -> Result<Option<Answer>> {
        Ok(self.state.read().await.answers.get(&answer_id).cloned())
    }

    async fn answers_for_question(
        &self,
        question_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Answer>> {
        let state = self.state.read().await;
        let mut answers: Vec<Answer> = state
            .answers
            .values()
            .filter(|a| a.question_id == question_id && (include_inactive || a.is_active))
            .cloned()
            .collect();
        answers.sort_by(|a, b| {
            b.is_correct
                .cmp(&a.is_correct)
                .then(b.votes.cmp(&a.votes))
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(answers)
    }

    async fn popular_tags(&self, limit: u32) -> Result<Vec<Tag>> {
        let state = self.state.read().await;
        let mut tags: Vec<Tag> = state.tags.values().cloned().collect();
        tags.sort_by(|a, b| b.usage_count.cmp(&a.usage_count).then(a.name.cmp(&b.name)));
        tags.truncate(limit as usize);
        Ok(tags)
    }

    async fn get_votable(&self, kind: VotableKind, item_id: Uuid) -> Result<Option<VotableItem>> {
        let state = self.state.read().await;
        let item = match kind {
            VotableKind::Question => state
                .questions
                .get(&item_id)
                .cloned()
                .map(VotableItem::Question),
            VotableKind::Answer => state.answers.get(&item_id).cloned().map(VotableItem::Answer),
        };
        Ok(item)
    }

    async fn current_vote(
        &self,
        kind: VotableKind,
        item_id: Uuid,
        voter_id: Uuid,
    ) -> Result<Option<VoteValue>> {
        let state = self.state.read().await;
        Ok(state.votes.get(&(kind, item_id, voter_id)).copied())
    }

    async fn apply_vote(
        &self,
        kind: VotableKind,
        item_id: Uuid,
        voter_id: Uuid,
        value: VoteValue,
    ) -> Result<VoteOutcome> {
        let mut state = self.state.write().await;

        if state.votable_mut(kind, item_id).is_none() {
            return Err(AppError::NotFound(format!("{} not found", kind.label())));
        }

        let key = (kind, item_id, voter_id);
        let transition = VoteTransition::resolve(state.votes.get(&key).copied(), value);

        match transition.change {
            LedgerChange::Insert(value) | LedgerChange::Update(value) => {
                state.votes.insert(key, value);
            }
            LedgerChange::Delete => {
                state.votes.remove(&key);
            }
        }

        let tally = state
            .votable_mut(kind, item_id)
            .map(|item| item.apply_vote_delta(transition.delta))
            .ok_or_else(|| AppError::NotFound(format!("{} not found", kind.label())))?;

        Ok(VoteOutcome::new(tally, transition.resulting))
    }

    async fn mark_correct(&self, answer_id: Uuid, resurrect: bool) -> Result<CorrectAnswerChange> {
        let mut state = self.state.write().await;

        let Some(target) = state.answers.get(&answer_id) else {
            return Err(AppError::NotFound("Answer not found".to_string()));
        };
        if !target.is_active && !resurrect {
            return Err(AppError::NotFound("Answer not found".to_string()));
        }
        let question_id = target.question_id;
        if !state
            .questions
            .get(&question_id)
            .is_some_and(|q| q.is_active)
        {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
        let now = Utc::now();

        let mut previous_correct_answer_id = None;
        for answer in state.answers.values_mut() {
            if answer.question_id == question_id && answer.is_correct && answer.id != answer_id {
                answer.is_correct = false;
                answer.updated_at = now;
                previous_correct_answer_id = Some(answer.id);
            }
        }

        if let Some(answer) = state.answers.get_mut(&answer_id) {
            answer.is_correct = true;
            answer.is_active = true;
            answer.updated_at = now;
        }

        Ok(CorrectAnswerChange {
            answer_id,
            previous_correct_answer_id,
        })
    }

    async fn deactivate_question(&self, question_id: Uuid) -> Result<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();

        match state.questions.get_mut(&question_id) {
            Some(question) if question.is_active => {
                question.is_active = false;
                question.updated_at = now;
            }
            _ => return Err(AppError::NotFound("Question not found".to_string())),
        }

        let mut deactivated = 0;
        for answer in state
            .answers
            .values_mut()
            .filter(|a| a.question_id == question_id && (a.is_active || a.is_correct))
        {
            answer.is_active = false;
            answer.is_correct = false;
            answer.updated_at = now;
            deactivated += 1;
        }

        Ok(deactivated)
    }

    async fn deactivate_answer(&self, answer_id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;

        match state.answers.get_mut(&answer_id) {
            Some(answer) if answer.is_active => {
                answer.is_active = false;
                answer.is_correct = false;
                answer.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(AppError::NotFound("Answer not found".to_string())),
        }
    }

    async fn record_view(
        &self,
        question_id: Uuid,
        viewer_id: Option<Uuid>,
        policy: AnonymousViewPolicy,
    ) -> Result<i32> {
        let mut state = self.state.write().await;

        if !state
            .questions
            .get(&question_id)
            .is_some_and(|q| q.is_active)
        {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        let counts = match viewer_id {
            Some(user_id) => state.question_viewers.insert((question_id, user_id)),
            None => policy == AnonymousViewPolicy::Count,
        };

        let question = state
            .questions
            .get_mut(&question_id)
            .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;
        if counts {
            question.views += 1;
        }

        Ok(question.views)
    }

    async fn recompute_reputation(&self, user_id: Uuid) -> Result<i32> {
        self.state
            .write()
            .await
            .recompute(user_id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut state = self.state.write().await;
        let mut report = ReconcileReport::default();

        let items: Vec<(VotableKind, Uuid)> = state
            .questions
            .keys()
            .map(|id| (VotableKind::Question, *id))
            .chain(state.answers.keys().map(|id| (VotableKind::Answer, *id)))
            .collect();

        for (kind, item_id) in items {
            let total = state.ledger_total(kind, item_id);
            if let Some(item) = state.votable_mut(kind, item_id) {
                if item.votes() != total {
                    let drift = total - item.votes();
                    item.apply_vote_delta(drift);
                    report.tallies_repaired += 1;
                }
            }
        }

        let user_ids: Vec<Uuid> = state.users.keys().copied().collect();
        for user_id in user_ids {
            if state.recompute(user_id).is_some() {
                report.reputations_recomputed += 1;
            }
        }

        Ok(report)
    }
}
