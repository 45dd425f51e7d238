use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Answer, Question};

/// Which aggregate a vote targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotableKind {
    Question,
    Answer,
}

impl VotableKind {
    pub fn label(self) -> &'static str {
        match self {
            VotableKind::Question => "Question",
            VotableKind::Answer => "Answer",
        }
    }
}

impl fmt::Display for VotableKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VotableKind::Question => write!(f, "question"),
            VotableKind::Answer => write!(f, "answer"),
        }
    }
}

impl FromStr for VotableKind {
    type Err = AppError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "question" | "Question" => Ok(VotableKind::Question),
            "answer" | "Answer" => Ok(VotableKind::Answer),
            _ => Err(AppError::InvalidArgument(format!(
                "Unknown votable item type: {}",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn as_i16(self) -> i16 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }

    pub fn as_delta(self) -> i32 {
        i32::from(self.as_i16())
    }
}

impl TryFrom<i16> for VoteValue {
    type Error = AppError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteValue::Up),
            -1 => Ok(VoteValue::Down),
            other => Err(AppError::InvalidArgument(format!(
                "Vote value must be 1 or -1, got {}",
                other
            ))),
        }
    }
}

/// Row-level effect a vote has on the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerChange {
    Insert(VoteValue),
    Delete,
    Update(VoteValue),
}

/// Outcome of applying a requested vote on top of the voter's existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    pub change: LedgerChange,
    pub delta: i32,
    pub resulting: Option<VoteValue>,
}

impl VoteTransition {
    /// Repeating the same value toggles the vote off; the opposite value flips it.
    pub fn resolve(existing: Option<VoteValue>, requested: VoteValue) -> Self {
        match existing {
            None => Self {
                change: LedgerChange::Insert(requested),
                delta: requested.as_delta(),
                resulting: Some(requested),
            },
            Some(current) if current == requested => Self {
                change: LedgerChange::Delete,
                delta: -requested.as_delta(),
                resulting: None,
            },
            Some(current) => Self {
                change: LedgerChange::Update(requested),
                delta: requested.as_delta() - current.as_delta(),
                resulting: Some(requested),
            },
        }
    }
}

// Vote request
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub value: i16, // 1 for upvote, -1 for downvote
}

// Vote response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteOutcome {
    pub tally: i32,
    pub voted: bool,
    pub value: i16,
}

impl VoteOutcome {
    pub fn new(tally: i32, resulting: Option<VoteValue>) -> Self {
        Self {
            tally,
            voted: resulting.is_some(),
            value: resulting.map(VoteValue::as_i16).unwrap_or(0),
        }
    }
}

/// Shared capability of everything that carries a vote tally.
pub trait Votable {
    fn author_id(&self) -> Uuid;
    fn votes(&self) -> i32;
    fn is_active(&self) -> bool;
    fn apply_vote_delta(&mut self, delta: i32) -> i32;
}

#[derive(Debug, Clone)]
pub enum VotableItem {
    Question(Question),
    Answer(Answer),
}

impl VotableItem {
    fn inner(&self) -> &dyn Votable {
        match self {
            VotableItem::Question(question) => question,
            VotableItem::Answer(answer) => answer,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Votable {
        match self {
            VotableItem::Question(question) => question,
            VotableItem::Answer(answer) => answer,
        }
    }
}

impl Votable for VotableItem {
    fn author_id(&self) -> Uuid {
        self.inner().author_id()
    }

    fn votes(&self) -> i32 {
        self.inner().votes()
    }

    fn is_active(&self) -> bool {
        self.inner().is_active()
    }

    fn apply_vote_delta(&mut self, delta: i32) -> i32 {
        self.inner_mut().apply_vote_delta(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_plus_and_minus_one_are_legal() {
        assert_eq!(VoteValue::try_from(1).unwrap(), VoteValue::Up);
        assert_eq!(VoteValue::try_from(-1).unwrap(), VoteValue::Down);
        for bad in [0, 2, -2, i16::MAX] {
            assert!(matches!(
                VoteValue::try_from(bad),
                Err(AppError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn first_vote_inserts() {
        let t = VoteTransition::resolve(None, VoteValue::Down);
        assert_eq!(t.change, LedgerChange::Insert(VoteValue::Down));
        assert_eq!(t.delta, -1);
        assert_eq!(t.resulting, Some(VoteValue::Down));
    }

    #[test]
    fn same_value_toggles_off() {
        let t = VoteTransition::resolve(Some(VoteValue::Up), VoteValue::Up);
        assert_eq!(t.change, LedgerChange::Delete);
        assert_eq!(t.delta, -1);
        assert_eq!(t.resulting, None);
    }

    #[test]
    fn opposite_value_moves_tally_by_two() {
        let up_to_down = VoteTransition::resolve(Some(VoteValue::Up), VoteValue::Down);
        assert_eq!(up_to_down.change, LedgerChange::Update(VoteValue::Down));
        assert_eq!(up_to_down.delta, -2);

        let down_to_up = VoteTransition::resolve(Some(VoteValue::Down), VoteValue::Up);
        assert_eq!(down_to_up.delta, 2);
        assert_eq!(down_to_up.resulting, Some(VoteValue::Up));
    }

    #[test]
    fn outcome_reports_zero_when_unvoted() {
        let outcome = VoteOutcome::new(4, None);
        assert!(!outcome.voted);
        assert_eq!(outcome.value, 0);
        assert_eq!(outcome.tally, 4);
    }

    #[test]
    fn kind_parses_from_path_segment() {
        assert_eq!(
            "answer".parse::<VotableKind>().unwrap(),
            VotableKind::Answer
        );
        assert!("comment".parse::<VotableKind>().is_err());
    }
}
