//! Postgres-backed store. All SQL is runtime-checked (`sqlx::query`, not
//! `sqlx::query!`) so the crate builds without a live database.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        ANSWER_VOTE_WEIGHT, AnonymousViewPolicy, Answer, CorrectAnswerChange, LedgerChange,
        QUESTION_VOTE_WEIGHT, Question, Tag, User, UserStats, VotableItem, VotableKind,
        VoteOutcome, VoteTransition, VoteValue,
    },
    store::{NewQuestion, QaStore, ReconcileReport},
};

const USER_COLUMNS: &str = "id, username, reputation, created_at";
const QUESTION_COLUMNS: &str =
    "id, title, content, author_id, votes, views, is_active, created_at, updated_at";
const ANSWER_COLUMNS: &str =
    "id, question_id, author_id, content, votes, is_correct, is_active, created_at, updated_at";

fn item_table(kind: VotableKind) -> &'static str {
    match kind {
        VotableKind::Question => "questions",
        VotableKind::Answer => "answers",
    }
}

fn vote_table(kind: VotableKind) -> &'static str {
    match kind {
        VotableKind::Question => "question_votes",
        VotableKind::Answer => "answer_votes",
    }
}

fn vote_item_column(kind: VotableKind) -> &'static str {
    match kind {
        VotableKind::Question => "question_id",
        VotableKind::Answer => "answer_id",
    }
}

fn conflict_or_database(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::ConflictRetryable(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn record_ledger_change(
    conn: &mut PgConnection,
    kind: VotableKind,
    item_id: Uuid,
    voter_id: Uuid,
    change: LedgerChange,
) -> Result<()> {
    match change {
        LedgerChange::Insert(value) => {
            sqlx::query(&format!(
                "INSERT INTO {} (id, user_id, {}, value, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, NOW(), NOW())",
                vote_table(kind),
                vote_item_column(kind)
            ))
            .bind(Uuid::new_v4())
            .bind(voter_id)
            .bind(item_id)
            .bind(value.as_i16())
            .execute(&mut *conn)
            .await
            .map_err(|e| conflict_or_database(e, "Concurrent first vote on the same item"))?;
        }
        LedgerChange::Delete => {
            sqlx::query(&format!(
                "DELETE FROM {} WHERE user_id = $1 AND {} = $2",
                vote_table(kind),
                vote_item_column(kind)
            ))
            .bind(voter_id)
            .bind(item_id)
            .execute(&mut *conn)
            .await?;
        }
        LedgerChange::Update(value) => {
            sqlx::query(&format!(
                "UPDATE {} SET value = $1, updated_at = NOW() WHERE user_id = $2 AND {} = $3",
                vote_table(kind),
                vote_item_column(kind)
            ))
            .bind(value.as_i16())
            .bind(voter_id)
            .bind(item_id)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}

// Single increment expression; never read-modify-write.
async fn apply_tally_delta(
    conn: &mut PgConnection,
    kind: VotableKind,
    item_id: Uuid,
    delta: i32,
) -> Result<i32> {
    let tally: Option<i32> = sqlx::query_scalar(&format!(
        "UPDATE {} SET votes = votes + $1 WHERE id = $2 RETURNING votes",
        item_table(kind)
    ))
    .bind(delta)
    .bind(item_id)
    .fetch_optional(&mut *conn)
    .await?;

    tally.ok_or_else(|| AppError::NotFound(format!("{} not found", kind.label())))
}

#[async_trait]
impl QaStore for PgStore {
    async fn create_user(&self, username: &str) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, reputation, created_at) \
             VALUES ($1, $2, 0, NOW()) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match conflict_or_database(e, "") {
            AppError::ConflictRetryable(_) => {
                AppError::InvalidArgument(format!("Username {} is taken", username))
            }
            other => other,
        })
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn top_users(&self, limit: u32) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY reputation DESC, created_at ASC LIMIT $1",
            USER_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn user_stats(&self, user_id: Uuid) -> Result<Option<UserStats>> {
        let stats = sqlx::query_as::<_, UserStats>(
            r#"
            SELECT
                u.reputation,
                (SELECT COUNT(*) FROM questions WHERE author_id = u.id AND is_active) AS questions_count,
                (SELECT COUNT(*) FROM answers WHERE author_id = u.id AND is_active) AS answers_count,
                (COALESCE((SELECT SUM(votes) FROM questions WHERE author_id = u.id), 0)
                 + COALESCE((SELECT SUM(votes) FROM answers WHERE author_id = u.id), 0))::BIGINT AS total_votes
            FROM users u
            WHERE u.id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stats)
    }

    async fn create_question(&self, question: NewQuestion) -> Result<Question> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Question>(&format!(
            "INSERT INTO questions (id, title, content, author_id, votes, views, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 0, 0, TRUE, NOW(), NOW()) RETURNING {}",
            QUESTION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&question.title)
        .bind(&question.content)
        .bind(question.author_id)
        .fetch_one(&mut *tx)
        .await?;

        for name in &question.tags {
            let tag_id: Uuid = sqlx::query_scalar(
                r#"
                INSERT INTO tags (id, name, usage_count, created_at)
                VALUES ($1, $2, 0, NOW())
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;

            let linked = sqlx::query(
                "INSERT INTO question_tags (question_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(created.id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;

            if linked.rows_affected() == 1 {
                sqlx::query("UPDATE tags SET usage_count = usage_count + 1 WHERE id = $1")
                    .bind(tag_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>> {
        let question = sqlx::query_as::<_, Question>(&format!(
            "SELECT {} FROM questions WHERE id = $1",
            QUESTION_COLUMNS
        ))
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(question)
    }

    async fn create_answer(
        &self,
        author_id: Uuid,
        question_id: Uuid,
        content: &str,
    ) -> Result<Answer> {
        let mut tx = self.pool.begin().await?;

        let question_active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM questions WHERE id = $1 FOR SHARE")
                .bind(question_id)
                .fetch_optional(&mut *tx)
                .await?;

        if question_active != Some(true) {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        let answer = sqlx::query_as::<_, Answer>(&format!(
            "INSERT INTO answers (id, question_id, author_id, content, votes, is_correct, is_active, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, 0, FALSE, TRUE, NOW(), NOW()) RETURNING {}",
            ANSWER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(question_id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(answer)
    }

    async fn get_answer(&self, answer_id: Uuid) -> Result<Option<Answer>> {
        let answer = sqlx::query_as::<_, Answer>(&format!(
            "SELECT {} FROM answers WHERE id = $1",
            ANSWER_COLUMNS
        ))
        .bind(answer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(answer)
    }

    async fn answers_for_question(
        &self,
        question_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Answer>> {
        let answers = sqlx::query_as::<_, Answer>(&format!(
            "SELECT {} FROM answers \
             WHERE question_id = $1 AND ($2 OR is_active) \
             ORDER BY is_correct DESC, votes DESC, created_at ASC",
            ANSWER_COLUMNS
        ))
        .bind(question_id)
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(answers)
    }

    async fn popular_tags(&self, limit: u32) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            "SELECT id, name, usage_count, created_at FROM tags \
             ORDER BY usage_count DESC, name ASC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    async fn get_votable(&self, kind: VotableKind, item_id: Uuid) -> Result<Option<VotableItem>> {
        let item = match kind {
            VotableKind::Question => self
                .get_question(item_id)
                .await?
                .map(VotableItem::Question),
            VotableKind::Answer => self.get_answer(item_id).await?.map(VotableItem::Answer),
        };

        Ok(item)
    }

    async fn current_vote(
        &self,
        kind: VotableKind,
        item_id: Uuid,
        voter_id: Uuid,
    ) -> Result<Option<VoteValue>> {
        let value: Option<i16> = sqlx::query_scalar(&format!(
            "SELECT value FROM {} WHERE user_id = $1 AND {} = $2",
            vote_table(kind),
            vote_item_column(kind)
        ))
        .bind(voter_id)
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?;

        value.map(VoteValue::try_from).transpose()
    }

    async fn apply_vote(
        &self,
        kind: VotableKind,
        item_id: Uuid,
        voter_id: Uuid,
        value: VoteValue,
    ) -> Result<VoteOutcome> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<i16> = sqlx::query_scalar(&format!(
            "SELECT value FROM {} WHERE user_id = $1 AND {} = $2 FOR UPDATE",
            vote_table(kind),
            vote_item_column(kind)
        ))
        .bind(voter_id)
        .bind(item_id)
        .fetch_optional(&mut *tx)
        .await?;

        let existing = existing.map(VoteValue::try_from).transpose()?;
        let transition = VoteTransition::resolve(existing, value);

        record_ledger_change(&mut tx, kind, item_id, voter_id, transition.change).await?;
        let tally = apply_tally_delta(&mut tx, kind, item_id, transition.delta).await?;

        tx.commit().await?;

        tracing::debug!(
            "{} {} vote by {}: {:?} (delta {}, tally {})",
            kind,
            item_id,
            voter_id,
            transition.change,
            transition.delta,
            tally
        );

        Ok(VoteOutcome::new(tally, transition.resulting))
    }

    async fn mark_correct(&self, answer_id: Uuid, resurrect: bool) -> Result<CorrectAnswerChange> {
        let mut tx = self.pool.begin().await?;

        let question_id: Uuid = sqlx::query_scalar("SELECT question_id FROM answers WHERE id = $1")
            .bind(answer_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Answer not found".to_string()))?;

        // Serializes concurrent selections and deactivation for the same question.
        let question_active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM questions WHERE id = $1 FOR UPDATE")
                .bind(question_id)
                .fetch_optional(&mut *tx)
                .await?;

        if question_active != Some(true) {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        let is_active: bool =
            sqlx::query_scalar("SELECT is_active FROM answers WHERE id = $1 FOR UPDATE")
                .bind(answer_id)
                .fetch_one(&mut *tx)
                .await?;

        if !is_active && !resurrect {
            return Err(AppError::NotFound("Answer not found".to_string()));
        }

        let previous_correct_answer_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE answers
            SET is_correct = FALSE, updated_at = NOW()
            WHERE question_id = $1 AND is_correct AND id <> $2
            RETURNING id
            "#,
        )
        .bind(question_id)
        .bind(answer_id)
        .fetch_optional(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE answers SET is_correct = TRUE, is_active = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(answer_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(CorrectAnswerChange {
            answer_id,
            previous_correct_answer_id,
        })
    }

    async fn deactivate_question(&self, question_id: Uuid) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE questions SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active",
        )
        .bind(question_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Question not found".to_string()));
        }

        let answers = sqlx::query(
            r#"
            UPDATE answers
            SET is_active = FALSE, is_correct = FALSE, updated_at = NOW()
            WHERE question_id = $1 AND (is_active OR is_correct)
            "#,
        )
        .bind(question_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(answers.rows_affected())
    }

    async fn deactivate_answer(&self, answer_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE answers
            SET is_active = FALSE, is_correct = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(answer_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Answer not found".to_string()));
        }

        Ok(())
    }

    async fn record_view(
        &self,
        question_id: Uuid,
        viewer_id: Option<Uuid>,
        policy: AnonymousViewPolicy,
    ) -> Result<i32> {
        let mut tx = self.pool.begin().await?;

        let views: Option<i32> =
            sqlx::query_scalar("SELECT views FROM questions WHERE id = $1 AND is_active")
                .bind(question_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(views) = views else {
            return Err(AppError::NotFound("Question not found".to_string()));
        };

        let counts = match viewer_id {
            Some(user_id) => {
                let inserted = sqlx::query(
                    r#"
                    INSERT INTO question_viewers (question_id, user_id, viewed_at)
                    VALUES ($1, $2, NOW())
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(question_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
                inserted.rows_affected() == 1
            }
            None => policy == AnonymousViewPolicy::Count,
        };

        let views = if counts {
            sqlx::query_scalar::<_, i32>(
                "UPDATE questions SET views = views + 1 WHERE id = $1 RETURNING views",
            )
            .bind(question_id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            views
        };

        tx.commit().await?;

        Ok(views)
    }

    async fn recompute_reputation(&self, user_id: Uuid) -> Result<i32> {
        let reputation: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET reputation = (
                $2 * COALESCE((SELECT SUM(votes) FROM questions WHERE author_id = $1), 0)
                + $3 * COALESCE((SELECT SUM(votes) FROM answers WHERE author_id = $1), 0)
            )::INTEGER
            WHERE id = $1
            RETURNING reputation
            "#,
        )
        .bind(user_id)
        .bind(QUESTION_VOTE_WEIGHT)
        .bind(ANSWER_VOTE_WEIGHT)
        .fetch_optional(&self.pool)
        .await?;

        reputation.ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn reconcile(&self) -> Result<ReconcileReport> {
        let mut tx = self.pool.begin().await?;
        let mut report = ReconcileReport::default();

        for kind in [VotableKind::Question, VotableKind::Answer] {
            let repaired = sqlx::query(&format!(
                r#"
                UPDATE {items} AS item
                SET votes = ledger.total
                FROM (
                    SELECT i.id, COALESCE(SUM(v.value), 0)::INTEGER AS total
                    FROM {items} i
                    LEFT JOIN {votes} v ON v.{column} = i.id
                    GROUP BY i.id
                ) AS ledger
                WHERE item.id = ledger.id AND item.votes <> ledger.total
                "#,
                items = item_table(kind),
                votes = vote_table(kind),
                column = vote_item_column(kind)
            ))
            .execute(&mut *tx)
            .await?;
            report.tallies_repaired += repaired.rows_affected();
        }

        let recomputed = sqlx::query(
            r#"
            UPDATE users u
            SET reputation = (
                $1 * COALESCE((SELECT SUM(votes) FROM questions WHERE author_id = u.id), 0)
                + $2 * COALESCE((SELECT SUM(votes) FROM answers WHERE author_id = u.id), 0)
            )::INTEGER
            "#,
        )
        .bind(QUESTION_VOTE_WEIGHT)
        .bind(ANSWER_VOTE_WEIGHT)
        .execute(&mut *tx)
        .await?;
        report.reputations_recomputed = recomputed.rows_affected();

        tx.commit().await?;

        Ok(report)
    }
}
