// Voting - signed units cast by users on questions and answers.
//
// Entities only keep the running total. Making sure a user holds at most one
// vote per entity is the job of the store's vote ledger, which hands back the
// vote being replaced so the entity can apply the difference.

use crate::core::users::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    /// Signed weight of a single vote.
    pub fn value(&self) -> i64 {
        match self {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteType::Up => write!(f, "up"),
            VoteType::Down => write!(f, "down"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub voter: UserId,
    pub vote_type: VoteType,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(voter: UserId, vote_type: VoteType) -> Self {
        Self {
            voter,
            vote_type,
            cast_at: Utc::now(),
        }
    }

    pub fn value(&self) -> i64 {
        self.vote_type.value()
    }
}

/// Running signed total of the active votes on one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VoteCount(i64);

impl VoteCount {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Replace `previous` (if any) with `next`.
    pub fn substitute(&mut self, previous: Option<&Vote>, next: &Vote) {
        if let Some(previous) = previous {
            self.0 -= previous.value();
        }
        self.0 += next.value();
    }
}

/// Anything users can vote on.
pub trait Votable {
    fn substitute(&mut self, previous: Option<&Vote>, next: &Vote);

    fn vote_count(&self) -> i64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_vote_adds_its_value() {
        let mut count = VoteCount::default();
        count.substitute(None, &Vote::new(UserId(1), VoteType::Up));
        assert_eq!(count.value(), 1);
    }

    #[test]
    fn test_replacing_a_vote_applies_the_difference() {
        let mut count = VoteCount::default();
        let up = Vote::new(UserId(1), VoteType::Up);
        count.substitute(None, &up);
        count.substitute(Some(&up), &Vote::new(UserId(1), VoteType::Down));
        assert_eq!(count.value(), -1);
    }

    #[test]
    fn test_recasting_the_same_vote_changes_nothing() {
        let mut count = VoteCount::default();
        let up = Vote::new(UserId(1), VoteType::Up);
        count.substitute(None, &up);
        count.substitute(Some(&up), &Vote::new(UserId(1), VoteType::Up));
        assert_eq!(count.value(), 1);
    }
}
