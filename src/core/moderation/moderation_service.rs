// Forum service - core business logic around the moderated entities.
//
// This service handles:
// - Asking questions and posting answers
// - Suggesting edits and moderating them (approve / reject)
// - Votes, with one active vote per user and entity
// - Flags, solution marking and soft removal
//
// Entities carry the state machine; the service loads them, checks who is
// acting, applies one transition and saves them back. Each call is one unit
// of work against the store.

use super::moderation_models::{EditOutcome, ModerationConfig, PendingEdit, QuestionDraft};
use crate::core::content::{DomainError, Edit, Sequence, UpdateStatus};
use crate::core::flags::{Flag, FlagType};
use crate::core::questions::{
    Answer, AnswerContent, AnswerId, ContentRef, Question, QuestionContent, QuestionId,
};
use crate::core::tags::Tag;
use crate::core::users::{User, UserId};
use crate::core::voting::{Votable, Vote, VoteType};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ForumError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("User {0} is not a moderator")]
    NotModerator(UserId),

    #[error("Only the author can {0}")]
    NotAuthor(&'static str),

    #[error("Users cannot vote on their own content")]
    OwnContent,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("{entity} {id} was changed by someone else, reload and retry")]
    Conflict { entity: &'static str, id: String },

    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for loading and saving forum entities.
///
/// A save is one unit of work. It must:
/// - refuse with `Conflict` when the stored copy's version differs from the
///   entity's `store_version()` (someone saved in between),
/// - commit the entity's recorded effects (tag usage, votes) together with it,
///   and never when the save fails,
/// - bump the entity's `store_version()`.
///
/// Implementations keep a single vote per (content, voter); that ledger is what
/// makes `cast_vote` replace instead of add.
#[async_trait]
pub trait ForumStore: Send + Sync {
    async fn save_question(&self, question: &mut Question) -> Result<(), ForumError>;

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, ForumError>;

    async fn all_questions(&self) -> Result<Vec<Question>, ForumError>;

    async fn save_answer(&self, answer: &mut Answer) -> Result<(), ForumError>;

    async fn get_answer(&self, id: AnswerId) -> Result<Option<Answer>, ForumError>;

    /// Answers of a question in posting order.
    async fn answers_for(&self, question: QuestionId) -> Result<Vec<Answer>, ForumError>;

    /// Get the catalog tag with this name, creating it on first use.
    /// Every caller must receive a handle to the same counter.
    async fn find_or_create_tag(&self, name: &str) -> Result<Tag, ForumError>;

    async fn all_tags(&self) -> Result<Vec<Tag>, ForumError>;

    /// The voter's active vote on `target`, if any.
    async fn get_vote(&self, target: ContentRef, voter: UserId)
        -> Result<Option<Vote>, ForumError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ForumService<S: ForumStore> {
    store: S,
    config: ModerationConfig,
}

impl<S: ForumStore> ForumService<S> {
    pub fn new(store: S, config: ModerationConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn require_moderator(user: &User) -> Result<(), ForumError> {
        if user.is_moderator() {
            Ok(())
        } else {
            Err(ForumError::NotModerator(user.id))
        }
    }

    fn validate_question(&self, draft: &QuestionDraft) -> Result<(), ForumError> {
        let title_len = draft.title.trim().chars().count();
        if title_len < self.config.min_title_length {
            return Err(ForumError::Validation(format!(
                "Title must have at least {} characters",
                self.config.min_title_length
            )));
        }
        if title_len > self.config.max_title_length {
            return Err(ForumError::Validation(format!(
                "Title must have at most {} characters",
                self.config.max_title_length
            )));
        }
        self.validate_description(&draft.description)
    }

    fn validate_description(&self, description: &str) -> Result<(), ForumError> {
        if description.trim().chars().count() < self.config.min_description_length {
            return Err(ForumError::Validation(format!(
                "Description must have at least {} characters",
                self.config.min_description_length
            )));
        }
        Ok(())
    }

    async fn build_edit(
        &self,
        editor: &User,
        draft: QuestionDraft,
    ) -> Result<Edit<QuestionContent>, ForumError> {
        self.validate_question(&draft)?;

        let mut tags = Vec::with_capacity(draft.tags.len());
        for name in draft.tags.iter().filter(|n| !n.trim().is_empty()) {
            tags.push(self.store.find_or_create_tag(name).await?);
        }

        let content = QuestionContent::new(draft.title.trim(), draft.description, tags);
        let edit = Edit::new(content, editor.clone());
        Ok(match draft.comment {
            Some(comment) => edit.with_comment(comment),
            None => edit,
        })
    }

    async fn load_question(&self, id: QuestionId) -> Result<Question, ForumError> {
        self.store
            .get_question(id)
            .await?
            .ok_or_else(|| ForumError::NotFound {
                entity: "Question",
                id: id.to_string(),
            })
    }

    async fn load_answer(&self, id: AnswerId) -> Result<Answer, ForumError> {
        self.store
            .get_answer(id)
            .await?
            .ok_or_else(|| ForumError::NotFound {
                entity: "Answer",
                id: id.to_string(),
            })
    }

    // ------------------------------------------------------------------
    // Questions
    // ------------------------------------------------------------------

    /// Publish a new question. Its first revision is approved right away.
    pub async fn ask(&self, author: &User, draft: QuestionDraft) -> Result<Question, ForumError> {
        let edit = self.build_edit(author, draft).await?;
        let mut question = Question::new(edit).with_author(author.clone());
        self.store.save_question(&mut question).await?;

        info!(
            question_id = %question.id(),
            author = %author.id,
            tags = question.tags().len(),
            "Question asked"
        );
        Ok(question)
    }

    /// Submit an edit. Moderator edits are applied directly when configured so,
    /// everybody else's edits wait in the queue.
    pub async fn suggest_edit(
        &self,
        question_id: QuestionId,
        editor: &User,
        draft: QuestionDraft,
    ) -> Result<EditOutcome, ForumError> {
        let mut question = self.load_question(question_id).await?;
        let edit = self.build_edit(editor, draft).await?;

        let outcome = if editor.is_moderator() && self.config.auto_approve_moderator_edits {
            let sequence = question.update_approved(edit, editor);
            EditOutcome {
                sequence,
                status: UpdateStatus::Approved,
            }
        } else {
            let sequence = question.update_with(edit);
            EditOutcome {
                sequence,
                status: UpdateStatus::Pending,
            }
        };

        info!(
            question_id = %question_id,
            editor = %editor.id,
            sequence = outcome.sequence,
            status = %outcome.status,
            "Question edit submitted"
        );
        self.store.save_question(&mut question).await?;
        Ok(outcome)
    }

    pub async fn approve_edit(
        &self,
        question_id: QuestionId,
        sequence: Sequence,
        moderator: &User,
    ) -> Result<(), ForumError> {
        Self::require_moderator(moderator)?;
        let mut question = self.load_question(question_id).await?;

        let stale = question
            .pending_edit(sequence)
            .is_some_and(|edit| edit.is_before_current(&question));
        if stale {
            warn!(
                question_id = %question_id,
                sequence,
                "Approving an edit written against outdated content"
            );
        }

        question.approve(sequence, moderator)?;
        info!(
            question_id = %question_id,
            sequence,
            moderator = %moderator.id,
            "Question edit approved"
        );
        self.store.save_question(&mut question).await
    }

    pub async fn reject_edit(
        &self,
        question_id: QuestionId,
        sequence: Sequence,
        moderator: &User,
    ) -> Result<(), ForumError> {
        Self::require_moderator(moderator)?;
        let mut question = self.load_question(question_id).await?;
        question.reject(sequence, moderator)?;
        info!(
            question_id = %question_id,
            sequence,
            moderator = %moderator.id,
            "Question edit rejected"
        );
        self.store.save_question(&mut question).await
    }

    /// The moderation queue of one question, oldest first.
    pub async fn pending_edits(&self, question_id: QuestionId) -> Result<Vec<PendingEdit>, ForumError> {
        let question = self.load_question(question_id).await?;
        Ok(question
            .pending_edits()
            .iter()
            .map(|edit| PendingEdit::from_revision(edit, edit.is_before_current(&question)))
            .collect())
    }

    /// Load a question for `viewer`. Removed questions are reported as missing
    /// to anyone who may not see them.
    pub async fn view_question(
        &self,
        question_id: QuestionId,
        viewer: Option<&User>,
    ) -> Result<Question, ForumError> {
        let question = self.load_question(question_id).await?;
        if !question.is_visible_for(viewer) {
            debug!(question_id = %question_id, "Hidden question requested");
            return Err(ForumError::NotFound {
                entity: "Question",
                id: question_id.to_string(),
            });
        }
        Ok(question)
    }

    /// Questions with enough flags to need a moderator's attention.
    pub async fn flagged_questions(&self) -> Result<Vec<Question>, ForumError> {
        let threshold = self.config.flag_review_threshold;
        Ok(self
            .store
            .all_questions()
            .await?
            .into_iter()
            .filter(|q| q.flags().len() >= threshold)
            .collect())
    }

    // ------------------------------------------------------------------
    // Answers
    // ------------------------------------------------------------------

    pub async fn answer(
        &self,
        question_id: QuestionId,
        author: &User,
        text: &str,
    ) -> Result<Answer, ForumError> {
        self.validate_description(text)?;
        let mut question = self.load_question(question_id).await?;

        let mut answer = question.add_answer(Edit::new(AnswerContent::new(text), author.clone()));

        // The question is saved first so a concurrent change to it refuses the
        // answer before anything is written.
        self.store.save_question(&mut question).await?;
        self.store.save_answer(&mut answer).await?;

        info!(
            question_id = %question_id,
            answer_id = %answer.id(),
            author = %author.id,
            "Question answered"
        );
        Ok(answer)
    }

    pub async fn suggest_answer_edit(
        &self,
        answer_id: AnswerId,
        editor: &User,
        text: &str,
        comment: Option<&str>,
    ) -> Result<EditOutcome, ForumError> {
        self.validate_description(text)?;
        let mut answer = self.load_answer(answer_id).await?;

        let mut edit = Edit::new(AnswerContent::new(text), editor.clone());
        if let Some(comment) = comment {
            edit = edit.with_comment(comment);
        }

        let outcome = if editor.is_moderator() && self.config.auto_approve_moderator_edits {
            EditOutcome {
                sequence: answer.update_approved(edit, editor),
                status: UpdateStatus::Approved,
            }
        } else {
            EditOutcome {
                sequence: answer.update_with(edit),
                status: UpdateStatus::Pending,
            }
        };

        info!(
            answer_id = %answer_id,
            editor = %editor.id,
            sequence = outcome.sequence,
            status = %outcome.status,
            "Answer edit submitted"
        );
        self.store.save_answer(&mut answer).await?;
        Ok(outcome)
    }

    pub async fn approve_answer_edit(
        &self,
        answer_id: AnswerId,
        sequence: Sequence,
        moderator: &User,
    ) -> Result<(), ForumError> {
        Self::require_moderator(moderator)?;
        let mut answer = self.load_answer(answer_id).await?;
        answer.approve(sequence, moderator)?;
        info!(
            answer_id = %answer_id,
            sequence,
            moderator = %moderator.id,
            "Answer edit approved"
        );
        self.store.save_answer(&mut answer).await
    }

    pub async fn reject_answer_edit(
        &self,
        answer_id: AnswerId,
        sequence: Sequence,
        moderator: &User,
    ) -> Result<(), ForumError> {
        Self::require_moderator(moderator)?;
        let mut answer = self.load_answer(answer_id).await?;
        answer.reject(sequence, moderator)?;
        info!(
            answer_id = %answer_id,
            sequence,
            moderator = %moderator.id,
            "Answer edit rejected"
        );
        self.store.save_answer(&mut answer).await
    }

    /// Answers of a question that `viewer` may see, in posting order.
    pub async fn answers_of(
        &self,
        question_id: QuestionId,
        viewer: Option<&User>,
    ) -> Result<Vec<Answer>, ForumError> {
        let question = self.view_question(question_id, viewer).await?;
        Ok(self
            .store
            .answers_for(question.id())
            .await?
            .into_iter()
            .filter(|answer| answer.is_visible_for(viewer))
            .collect())
    }

    /// Accept an answer as the solution. Only the question's author may do this.
    pub async fn mark_solution(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        actor: &User,
    ) -> Result<(), ForumError> {
        let mut question = self.load_question(question_id).await?;
        if !question.is_author(actor) {
            warn!(question_id = %question_id, actor = %actor.id, "Solution refused");
            return Err(ForumError::NotAuthor("mark a solution"));
        }

        let answer = self.load_answer(answer_id).await?;
        question.mark_as_solved_by(&answer)?;

        info!(question_id = %question_id, answer_id = %answer_id, "Question solved");
        self.store.save_question(&mut question).await
    }

    // ------------------------------------------------------------------
    // Votes, flags, removal
    // ------------------------------------------------------------------

    /// Cast or change a vote. Returns the entity's new vote count.
    pub async fn vote(
        &self,
        target: ContentRef,
        voter: &User,
        vote_type: VoteType,
    ) -> Result<i64, ForumError> {
        let vote = Vote::new(voter.id, vote_type);

        let count = match target {
            ContentRef::Question(id) => {
                let mut question = self.load_question(id).await?;
                if question.is_author(voter) {
                    return Err(ForumError::OwnContent);
                }
                let previous = self.store.get_vote(target, voter.id).await?;
                question.cast_vote(previous.as_ref(), vote);
                self.store.save_question(&mut question).await?;
                question.vote_count()
            }
            ContentRef::Answer(id) => {
                let mut answer = self.load_answer(id).await?;
                if answer.is_author(voter) {
                    return Err(ForumError::OwnContent);
                }
                let previous = self.store.get_vote(target, voter.id).await?;
                answer.cast_vote(previous.as_ref(), vote);
                self.store.save_answer(&mut answer).await?;
                answer.vote_count()
            }
        };

        debug!(content = %target, voter = %voter.id, vote = %vote_type, count, "Vote cast");
        Ok(count)
    }

    /// Report content. Returns false if this user had already flagged it.
    pub async fn flag(
        &self,
        target: ContentRef,
        flagger: &User,
        flag_type: FlagType,
        reason: Option<String>,
    ) -> Result<bool, ForumError> {
        let mut flag = Flag::new(flag_type, flagger.clone());
        if let Some(reason) = reason {
            flag = flag.with_reason(reason);
        }

        let added = match target {
            ContentRef::Question(id) => {
                let mut question = self.load_question(id).await?;
                let added = question.add_flag(flag);
                if added {
                    self.store.save_question(&mut question).await?;
                }
                added
            }
            ContentRef::Answer(id) => {
                let mut answer = self.load_answer(id).await?;
                let added = answer.add_flag(flag);
                if added {
                    self.store.save_answer(&mut answer).await?;
                }
                added
            }
        };

        if added {
            debug!(content = %target, flagger = %flagger.id, flag = %flag_type, "Content flagged");
        } else {
            debug!(content = %target, flagger = %flagger.id, "Duplicate flag ignored");
        }
        Ok(added)
    }

    /// Soft-remove content. Allowed for its author and for moderators.
    pub async fn remove(&self, target: ContentRef, actor: &User) -> Result<(), ForumError> {
        match target {
            ContentRef::Question(id) => {
                let mut question = self.load_question(id).await?;
                if !actor.is_moderator() && !question.is_author(actor) {
                    return Err(ForumError::NotAuthor("remove this question"));
                }
                question.remove();
                self.store.save_question(&mut question).await?;
            }
            ContentRef::Answer(id) => {
                let mut answer = self.load_answer(id).await?;
                if !actor.is_moderator() && !answer.is_author(actor) {
                    return Err(ForumError::NotAuthor("remove this answer"));
                }
                answer.remove();
                self.store.save_answer(&mut answer).await?;
            }
        }

        info!(content = %target, actor = %actor.id, "Content removed");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
