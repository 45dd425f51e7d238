use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Votable, question::validate_not_blank};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Answer {
    pub id: Uuid,
    pub question_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub votes: i32,
    pub is_correct: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Votable for Answer {
    fn author_id(&self) -> Uuid {
        self.author_id
    }

    fn votes(&self) -> i32 {
        self.votes
    }

    fn is_active(&self) -> bool {
        self.is_active
    }

    fn apply_vote_delta(&mut self, delta: i32) -> i32 {
        self.votes += delta;
        self.votes
    }
}

// Create answer request
#[derive(Debug, Validate, Deserialize)]
pub struct CreateAnswerRequest {
    #[validate(length(min = 1, max = 10000), custom(function = "validate_not_blank"))]
    pub content: String,
}

/// Result of marking an answer correct; the previous id lets the UI un-highlight it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorrectAnswerChange {
    pub answer_id: Uuid,
    pub previous_correct_answer_id: Option<Uuid>,
}
