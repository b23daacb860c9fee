use super::ids::{AnswerId, QuestionId};
use super::question::Question;
use super::question_content::{AnswerContent, AnswerInformation};
use crate::core::content::{visible, DomainError, Edit, Effects, Sequence, UpdateStatus, Versioned};
use crate::core::flags::{Flag, FlagSet};
use crate::core::users::User;
use crate::core::voting::{Votable, Vote, VoteCount};
use chrono::{DateTime, Utc};

/// An answer always belongs to the question it was posted on; it keeps the
/// question's id rather than a reference to it.
#[derive(Debug, Clone)]
pub struct Answer {
    id: AnswerId,
    question_id: QuestionId,
    author: User,
    versions: Versioned<AnswerContent>,
    last_touched_by: User,
    created_at: DateTime<Utc>,
    votes: VoteCount,
    flags: FlagSet,
    removed: bool,
    effects: Effects,
    store_version: u64,
}

impl Answer {
    /// Use `Question::add_answer`, which also records who answered.
    pub(super) fn new(question_id: QuestionId, initial: Edit<AnswerContent>) -> Self {
        let author = initial.edited_by.clone();
        Self {
            id: AnswerId::new(),
            question_id,
            last_touched_by: author.clone(),
            author,
            versions: Versioned::new(initial),
            created_at: Utc::now(),
            votes: VoteCount::default(),
            flags: FlagSet::default(),
            removed: false,
            effects: Effects::default(),
            store_version: 0,
        }
    }

    pub fn id(&self) -> AnswerId {
        self.id
    }

    pub fn question_id(&self) -> QuestionId {
        self.question_id
    }

    pub fn belongs_to(&self, question: &Question) -> bool {
        self.question_id == question.id()
    }

    pub fn is_solution_of(&self, question: &Question) -> bool {
        question.solution() == Some(self.id)
    }

    pub fn author(&self) -> &User {
        &self.author
    }

    pub fn is_author(&self, user: &User) -> bool {
        self.author.id == user.id
    }

    pub fn information(&self) -> &AnswerInformation {
        self.versions.current()
    }

    pub fn description(&self) -> &str {
        &self.information().content().description
    }

    pub fn last_touched_by(&self) -> &User {
        &self.last_touched_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn take_effects(&mut self) -> Effects {
        std::mem::take(&mut self.effects)
    }

    pub fn store_version(&self) -> u64 {
        self.store_version
    }

    pub fn set_store_version(&mut self, version: u64) {
        self.store_version = version;
    }

    pub fn enqueue_change(&mut self, edit: Edit<AnswerContent>, status: UpdateStatus) -> Sequence {
        let before = self.versions.current().sequence();
        let sequence = self.versions.enqueue(edit, status);
        self.touch_if_changed(before);
        sequence
    }

    pub fn update_with(&mut self, edit: Edit<AnswerContent>) -> Sequence {
        self.enqueue_change(edit, UpdateStatus::Pending)
    }

    pub fn approve(&mut self, sequence: Sequence, moderator: &User) -> Result<(), DomainError> {
        let before = self.versions.current().sequence();
        self.versions.approve(sequence, moderator)?;
        self.touch_if_changed(before);
        Ok(())
    }

    pub fn update_approved(&mut self, edit: Edit<AnswerContent>, moderator: &User) -> Sequence {
        let before = self.versions.current().sequence();
        let sequence = self.versions.apply_approved(edit, moderator);
        self.touch_if_changed(before);
        sequence
    }

    pub fn reject(&mut self, sequence: Sequence, moderator: &User) -> Result<(), DomainError> {
        self.versions.reject(sequence, moderator)
    }

    pub fn has_pending_edits(&self) -> bool {
        self.versions.has_pending()
    }

    pub fn pending_edits(&self) -> &[AnswerInformation] {
        self.versions.pending()
    }

    pub fn is_before_current(&self, revision: &AnswerInformation) -> bool {
        self.versions.is_before_current(revision)
    }

    fn touch_if_changed(&mut self, before: Sequence) {
        if self.versions.current().sequence() != before {
            self.last_touched_by = self.versions.current().edited_by().clone();
        }
    }

    pub fn add_flag(&mut self, flag: Flag) -> bool {
        self.flags.add(flag)
    }

    pub fn already_flagged_by(&self, user: &User) -> bool {
        self.flags.already_flagged_by(user.id)
    }

    pub fn remove(&mut self) {
        self.removed = true;
    }

    pub fn is_visible_for(&self, viewer: Option<&User>) -> bool {
        visible(
            self.removed,
            viewer.map(|v| v.role),
            viewer.is_some_and(|v| self.is_author(v)),
        )
    }
}

impl Answer {
    /// Count `vote` in place of `previous` and record it for the vote ledger.
    pub fn cast_vote(&mut self, previous: Option<&Vote>, vote: Vote) {
        self.substitute(previous, &vote);
        self.effects.record_vote(vote);
    }
}

impl Votable for Answer {
    fn substitute(&mut self, previous: Option<&Vote>, next: &Vote) {
        self.votes.substitute(previous, next);
    }

    fn vote_count(&self) -> i64 {
        self.votes.value()
    }
}
