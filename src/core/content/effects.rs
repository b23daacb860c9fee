// Changes an entity transition makes outside the entity itself.
//
// Approving an edit moves system-wide tag counters and casting a vote writes
// the per-user vote ledger. Entities only record these here; the store
// commits them in the same step that saves the entity, so a save that fails
// or loses a race leaves the counters and the ledger untouched.

use crate::core::tags::{reconcile_usage, Tag};
use crate::core::voting::Vote;

#[derive(Debug, Clone)]
struct TagUsageChange {
    released: Vec<Tag>,
    acquired: Vec<Tag>,
}

#[derive(Debug, Clone, Default)]
pub struct Effects {
    tag_usage: Vec<TagUsageChange>,
    votes: Vec<Vote>,
}

impl Effects {
    /// The approved content stopped carrying `released` and now carries `acquired`.
    pub fn record_tag_usage(&mut self, released: &[Tag], acquired: &[Tag]) {
        self.tag_usage.push(TagUsageChange {
            released: released.to_vec(),
            acquired: acquired.to_vec(),
        });
    }

    pub fn record_vote(&mut self, vote: Vote) {
        self.votes.push(vote);
    }

    pub fn is_empty(&self) -> bool {
        self.tag_usage.is_empty() && self.votes.is_empty()
    }

    /// Apply the recorded tag moves to the shared counters, oldest first.
    pub fn commit_tag_usage(&self) {
        for change in &self.tag_usage {
            reconcile_usage(&change.released, &change.acquired);
        }
    }

    /// Votes to write to the ledger, oldest first.
    pub fn votes(&self) -> &[Vote] {
        &self.votes
    }
}
