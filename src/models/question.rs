use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::Votable;

pub const MAX_TAGS_PER_QUESTION: usize = 5;
pub const MAX_TAG_LENGTH: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author_id: Uuid,
    pub votes: i32,
    pub views: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Votable for Question {
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

/// How views from unauthenticated visitors are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnonymousViewPolicy {
    #[default]
    Count,
    Ignore,
}

impl FromStr for AnonymousViewPolicy {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "count" | "Count" => Ok(AnonymousViewPolicy::Count),
            "ignore" | "Ignore" => Ok(AnonymousViewPolicy::Ignore),
            other => Err(format!("Unknown anonymous view policy: {}", other)),
        }
    }
}

// Create question request
#[derive(Debug, Validate, Deserialize)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub title: String,
    #[validate(length(min = 1), custom(function = "validate_not_blank"))]
    pub content: String,
    #[serde(default)]
    #[validate(custom(function = "validate_tags"))]
    pub tags: Vec<String>,
}

impl CreateQuestionRequest {
    /// Trimmed, lowercased and deduplicated tag names, in first-seen order.
    pub fn normalized_tags(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            let name = tag.trim().to_lowercase();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}

/// Rejects text that is empty once surrounding whitespace is trimmed.
pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Must not be blank".into()));
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS_PER_QUESTION {
        return Err(ValidationError::new("too_many_tags")
            .with_message(format!("At most {} tags allowed", MAX_TAGS_PER_QUESTION).into()));
    }
    if tags
        .iter()
        .any(|tag| tag.trim().is_empty() || tag.trim().chars().count() > MAX_TAG_LENGTH)
    {
        return Err(ValidationError::new("tag_length").with_message(
            format!("Tags must be 1 to {} characters", MAX_TAG_LENGTH).into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub question_id: Uuid,
    pub views: i32,
}
