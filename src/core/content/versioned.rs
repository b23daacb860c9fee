// The moderation state machine.
//
// State: the current (approved) revision plus an insertion-ordered queue of
// pending revisions. Every revision is stamped from a counter owned by this
// struct, so comparing sequence numbers is enough to tell whether a pending
// edit was written before the content that is visible now.
//
//   enqueue(Pending)  -> queued, nothing visible changes
//   approve(pending)  -> becomes current, old current goes to history
//   reject(pending)   -> goes to history
//   apply_approved    -> stamped and made current in one step

use super::domain_error::DomainError;
use super::revision::{Edit, Revision, Sequence, UpdateStatus};
use crate::core::users::User;

#[derive(Debug, Clone)]
pub struct Versioned<C> {
    current: Revision<C>,
    pending: Vec<Revision<C>>,
    history: Vec<Revision<C>>,
    next_sequence: Sequence,
}

impl<C> Versioned<C> {
    /// Start with `initial` as the approved content.
    pub fn new(initial: Edit<C>) -> Self {
        Self {
            current: Revision::stamp(initial, UpdateStatus::Approved, 1),
            pending: Vec::new(),
            history: Vec::new(),
            next_sequence: 2,
        }
    }

    pub fn current(&self) -> &Revision<C> {
        &self.current
    }

    /// Pending revisions in submission order.
    pub fn pending(&self) -> &[Revision<C>] {
        &self.pending
    }

    /// Superseded and rejected revisions in the order they were resolved.
    pub fn history(&self) -> &[Revision<C>] {
        &self.history
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_revision(&self, sequence: Sequence) -> Option<&Revision<C>> {
        self.pending.iter().find(|r| r.sequence() == sequence)
    }

    /// Looks everywhere: current, pending queue and history.
    pub fn revision(&self, sequence: Sequence) -> Option<&Revision<C>> {
        if self.current.sequence() == sequence {
            return Some(&self.current);
        }
        self.pending_revision(sequence)
            .or_else(|| self.history.iter().find(|r| r.sequence() == sequence))
    }

    pub fn is_before_current(&self, revision: &Revision<C>) -> bool {
        revision.is_before(&self.current)
    }

    /// Pending revisions that a newer approved revision has overtaken.
    pub fn stale_pending(&self) -> impl Iterator<Item = &Revision<C>> {
        self.pending.iter().filter(|r| r.is_before(&self.current))
    }

    fn next_sequence(&mut self) -> Sequence {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    /// Stamp `edit` and file it according to `status`.
    ///
    /// Pending edits join the queue. An approved edit replaces the current
    /// content right away (without a moderation stamp); a rejected one is only
    /// recorded in history.
    pub fn enqueue(&mut self, edit: Edit<C>, status: UpdateStatus) -> Sequence {
        let sequence = self.next_sequence();
        let revision = Revision::stamp(edit, status, sequence);
        match status {
            UpdateStatus::Pending => self.pending.push(revision),
            UpdateStatus::Approved => self.promote(revision),
            UpdateStatus::Rejected => self.history.push(revision),
        }
        sequence
    }

    /// Stamp `edit` and make it current, on behalf of `moderator`.
    pub fn apply_approved(&mut self, edit: Edit<C>, moderator: &User) -> Sequence {
        let sequence = self.next_sequence();
        let mut revision = Revision::stamp(edit, UpdateStatus::Pending, sequence);
        revision.resolve(UpdateStatus::Approved, Some(moderator));
        self.promote(revision);
        sequence
    }

    /// Approve a queued revision.
    ///
    /// Returns whether the current content changed: approving the revision
    /// that is already current is accepted and changes nothing.
    pub fn approve(&mut self, sequence: Sequence, moderator: &User) -> Result<bool, DomainError> {
        if self.current.sequence() == sequence {
            return Ok(false);
        }

        let index = self.pending_index(sequence, "approved")?;
        let mut revision = self.pending.remove(index);
        revision.resolve(UpdateStatus::Approved, Some(moderator));
        self.promote(revision);
        Ok(true)
    }

    pub fn reject(&mut self, sequence: Sequence, moderator: &User) -> Result<(), DomainError> {
        let index = self.pending_index(sequence, "rejected")?;
        let mut revision = self.pending.remove(index);
        revision.resolve(UpdateStatus::Rejected, Some(moderator));
        self.history.push(revision);
        Ok(())
    }

    fn pending_index(&self, sequence: Sequence, action: &'static str) -> Result<usize, DomainError> {
        if let Some(index) = self.pending.iter().position(|r| r.sequence() == sequence) {
            return Ok(index);
        }

        let reason = if sequence == self.current.sequence()
            || self.history.iter().any(|r| r.sequence() == sequence)
        {
            "it has already been resolved"
        } else {
            "it was never submitted"
        };
        Err(DomainError::InvalidTransition {
            sequence,
            action,
            reason,
        })
    }

    fn promote(&mut self, mut revision: Revision<C>) {
        if revision.status() != UpdateStatus::Approved {
            revision.resolve(UpdateStatus::Approved, None);
        }
        let previous = std::mem::replace(&mut self.current, revision);
        self.history.push(previous);
    }
}
