// Moderation domain models - inputs and outputs of the forum service.
//
// These are plain data types; the service turns them into entity calls.

use crate::core::content::{Sequence, UpdateStatus, DEFAULT_META_DESCRIPTION_LIMIT};
use crate::core::questions::QuestionInformation;
use crate::core::users::UserId;
use serde::{Deserialize, Serialize};

/// Configuration for moderation and content rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    /// Maximum characters in a page meta description
    pub meta_description_limit: usize,
    /// Shortest accepted question title
    pub min_title_length: usize,
    /// Longest accepted question title
    pub max_title_length: usize,
    /// Shortest accepted question or answer body
    pub min_description_length: usize,
    /// Flags needed before a question shows up in the review list
    pub flag_review_threshold: usize,
    /// Whether edits made by moderators skip the queue
    pub auto_approve_moderator_edits: bool,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            meta_description_limit: DEFAULT_META_DESCRIPTION_LIMIT,
            min_title_length: 15,
            max_title_length: 150,
            min_description_length: 30,
            flag_review_threshold: 3,
            auto_approve_moderator_edits: true,
        }
    }
}

/// What a user submits when asking or editing a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Edit summary
    #[serde(default)]
    pub comment: Option<String>,
}

impl QuestionDraft {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        tags: &[&str],
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Where a submitted edit ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EditOutcome {
    pub sequence: Sequence,
    pub status: UpdateStatus,
}

/// A queued question edit as the moderator review screen shows it.
#[derive(Debug, Clone, Serialize)]
pub struct PendingEdit {
    pub sequence: Sequence,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub edited_by: UserId,
    pub comment: String,
    /// A newer edit was approved after this one was written.
    pub stale: bool,
}

impl PendingEdit {
    pub fn from_revision(revision: &QuestionInformation, stale: bool) -> Self {
        let content = revision.content();
        Self {
            sequence: revision.sequence(),
            title: content.title.clone(),
            description: content.description.clone(),
            tags: content.tags().iter().map(|t| t.name().to_string()).collect(),
            edited_by: revision.edited_by().id,
            comment: revision.comment().to_string(),
            stale,
        }
    }
}
