use crate::core::users::{User, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a revision in its entity's edit history.
pub type Sequence = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateStatus::Pending => write!(f, "pending"),
            UpdateStatus::Approved => write!(f, "approved"),
            UpdateStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// An edit as submitted, before the entity has stamped it.
#[derive(Debug, Clone)]
pub struct Edit<C> {
    pub content: C,
    pub edited_by: User,
    /// Edit summary written by the editor.
    pub comment: String,
}

impl<C> Edit<C> {
    pub fn new(content: C, edited_by: User) -> Self {
        Self {
            content,
            edited_by,
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// An immutable snapshot of editable content.
///
/// Only the owning entity creates revisions, so the sequence number is always
/// drawn from that entity's counter. The status and moderation stamp are the
/// only fields that change afterwards.
#[derive(Debug, Clone)]
pub struct Revision<C> {
    content: C,
    edited_by: User,
    comment: String,
    status: UpdateStatus,
    sequence: Sequence,
    created_at: DateTime<Utc>,
    moderated_by: Option<UserId>,
    moderated_at: Option<DateTime<Utc>>,
}

impl<C> Revision<C> {
    pub(super) fn stamp(edit: Edit<C>, status: UpdateStatus, sequence: Sequence) -> Self {
        Self {
            content: edit.content,
            edited_by: edit.edited_by,
            comment: edit.comment,
            status,
            sequence,
            created_at: Utc::now(),
            moderated_by: None,
            moderated_at: None,
        }
    }

    pub(super) fn resolve(&mut self, status: UpdateStatus, moderator: Option<&User>) {
        self.status = status;
        if let Some(moderator) = moderator {
            self.moderated_by = Some(moderator.id);
            self.moderated_at = Some(Utc::now());
        }
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn edited_by(&self) -> &User {
        &self.edited_by
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn status(&self) -> UpdateStatus {
        self.status
    }

    pub fn sequence(&self) -> Sequence {
        self.sequence
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn moderated_by(&self) -> Option<UserId> {
        self.moderated_by
    }

    pub fn moderated_at(&self) -> Option<DateTime<Utc>> {
        self.moderated_at
    }

    pub fn is_pending(&self) -> bool {
        self.status == UpdateStatus::Pending
    }

    /// True when `current` was stamped after this revision, i.e. a newer edit
    /// has already been approved and this one was written against stale content.
    pub fn is_before(&self, current: &Revision<C>) -> bool {
        self.sequence < current.sequence
    }
}
