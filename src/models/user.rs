use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub reputation: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct UserStats {
    pub reputation: i32,
    pub questions_count: i64,
    pub answers_count: i64,
    pub total_votes: i64,
}

#[derive(Debug, Serialize)]
pub struct ReputationResponse {
    pub user_id: Uuid,
    pub reputation: i32,
}

pub const QUESTION_VOTE_WEIGHT: i64 = 5;
pub const ANSWER_VOTE_WEIGHT: i64 = 10;

/// Reputation derived from the vote totals of a user's questions and answers.
pub fn reputation_from_totals(question_votes: i64, answer_votes: i64) -> i32 {
    let score = QUESTION_VOTE_WEIGHT * question_votes + ANSWER_VOTE_WEIGHT * answer_votes;
    score.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_weigh_double_questions() {
        assert_eq!(reputation_from_totals(0, 0), 0);
        assert_eq!(reputation_from_totals(3, 0), 15);
        assert_eq!(reputation_from_totals(0, 3), 30);
        assert_eq!(reputation_from_totals(2, -1), 0);
        assert_eq!(reputation_from_totals(-4, 1), -10);
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        assert_eq!(reputation_from_totals(i64::from(i32::MAX), 0), i32::MAX);
    }
}
