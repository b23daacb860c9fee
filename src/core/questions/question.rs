use super::answer::Answer;
use super::ids::{AnswerId, QuestionId};
use super::question_content::{AnswerContent, QuestionContent, QuestionInformation};
use crate::core::content::{
    meta_description, visible, DomainError, Edit, Effects, Sequence, UpdateStatus, Versioned,
    DEFAULT_META_DESCRIPTION_LIMIT,
};
use crate::core::flags::{Flag, FlagSet};
use crate::core::tags::Tag;
use crate::core::users::{User, UserId};
use crate::core::voting::{Votable, Vote, VoteCount};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Question {
    id: QuestionId,
    versions: Versioned<QuestionContent>,
    /// Set once; later calls to `set_author` are ignored.
    author: Option<User>,
    last_touched_by: User,
    last_touched_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    votes: VoteCount,
    flags: FlagSet,
    solution: Option<AnswerId>,
    /// Author of every answer posted, in posting order.
    answered_by: Vec<UserId>,
    removed: bool,
    /// Tag moves and votes not yet committed by the store.
    effects: Effects,
    /// Bumped by the store on every save; 0 until first saved.
    store_version: u64,
}

impl Question {
    /// Create a question whose first revision is already the approved content.
    pub fn new(initial: Edit<QuestionContent>) -> Self {
        let versions = Versioned::new(initial);
        let mut effects = Effects::default();
        effects.record_tag_usage(&[], versions.current().content().tags());

        let now = Utc::now();
        Self {
            id: QuestionId::new(),
            versions,
            author: None,
            last_touched_by: User::ghost(),
            last_touched_at: now,
            created_at: now,
            votes: VoteCount::default(),
            flags: FlagSet::default(),
            solution: None,
            answered_by: Vec::new(),
            removed: false,
            effects,
            store_version: 0,
        }
    }

    pub fn with_author(mut self, author: User) -> Self {
        self.set_author(author);
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> QuestionId {
        self.id
    }

    /// The approved revision currently shown to readers.
    pub fn information(&self) -> &QuestionInformation {
        self.versions.current()
    }

    pub fn title(&self) -> &str {
        &self.information().content().title
    }

    pub fn description(&self) -> &str {
        &self.information().content().description
    }

    pub fn tags(&self) -> &[Tag] {
        self.information().content().tags()
    }

    pub fn author(&self) -> Option<&User> {
        self.author.as_ref()
    }

    pub fn last_touched_by(&self) -> &User {
        &self.last_touched_by
    }

    pub fn last_touched_at(&self) -> DateTime<Utc> {
        self.last_touched_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn solution(&self) -> Option<AnswerId> {
        self.solution
    }

    pub fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn is_author(&self, user: &User) -> bool {
        self.author.as_ref().is_some_and(|a| a.id == user.id)
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Side effects recorded since the last save.
    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    /// Hand the recorded side effects over for committing.
    pub fn take_effects(&mut self) -> Effects {
        std::mem::take(&mut self.effects)
    }

    /// Version of the stored copy this question was loaded from.
    pub fn store_version(&self) -> u64 {
        self.store_version
    }

    pub fn set_store_version(&mut self, version: u64) {
        self.store_version = version;
    }

    // ------------------------------------------------------------------
    // Authorship
    // ------------------------------------------------------------------

    /// First write wins. Setting the author counts as touching the question.
    pub fn set_author(&mut self, author: User) {
        if self.author.is_some() {
            return;
        }
        self.touched_by(&author);
        self.author = Some(author);
    }

    fn touched_by(&mut self, user: &User) {
        self.last_touched_by = user.clone();
        self.last_touched_at = Utc::now();
    }

    // ------------------------------------------------------------------
    // Moderated edits
    // ------------------------------------------------------------------

    /// Stamp an edit and file it under `status`. See `Versioned::enqueue`.
    pub fn enqueue_change(
        &mut self,
        edit: Edit<QuestionContent>,
        status: UpdateStatus,
    ) -> Sequence {
        self.track_current(|versions| versions.enqueue(edit, status))
    }

    /// Submit an edit for moderation.
    pub fn update_with(&mut self, edit: Edit<QuestionContent>) -> Sequence {
        self.enqueue_change(edit, UpdateStatus::Pending)
    }

    /// Approve a pending edit, making it the visible content.
    pub fn approve(&mut self, sequence: Sequence, moderator: &User) -> Result<(), DomainError> {
        self.track_current(|versions| versions.approve(sequence, moderator))
            .map(|_| ())
    }

    /// Apply an edit directly, skipping the queue.
    pub fn update_approved(&mut self, edit: Edit<QuestionContent>, moderator: &User) -> Sequence {
        self.track_current(|versions| versions.apply_approved(edit, moderator))
    }

    pub fn reject(&mut self, sequence: Sequence, moderator: &User) -> Result<(), DomainError> {
        self.versions.reject(sequence, moderator)
    }

    pub fn has_pending_edits(&self) -> bool {
        self.versions.has_pending()
    }

    pub fn pending_edits(&self) -> &[QuestionInformation] {
        self.versions.pending()
    }

    pub fn pending_edit(&self, sequence: Sequence) -> Option<&QuestionInformation> {
        self.versions.pending_revision(sequence)
    }

    pub fn revision(&self, sequence: Sequence) -> Option<&QuestionInformation> {
        self.versions.revision(sequence)
    }

    pub fn history(&self) -> &[QuestionInformation] {
        self.versions.history()
    }

    /// Pending edits written against content that has since been replaced.
    pub fn stale_edits(&self) -> impl Iterator<Item = &QuestionInformation> {
        self.versions.stale_pending()
    }

    // Runs a transition and, if the approved revision changed, records the tag
    // usage move from the old tags to the new ones and credits the new
    // revision's editor.
    fn track_current<T>(
        &mut self,
        transition: impl FnOnce(&mut Versioned<QuestionContent>) -> T,
    ) -> T {
        let before = self.versions.current().sequence();
        let previous_tags = self.versions.current().content().tags().to_vec();

        let outcome = transition(&mut self.versions);

        if self.versions.current().sequence() != before {
            let current = self.versions.current();
            self.effects
                .record_tag_usage(&previous_tags, current.content().tags());
            let editor = current.edited_by().clone();
            self.touched_by(&editor);
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Answers and solution
    // ------------------------------------------------------------------

    /// Post an answer to this question. The editor of `initial` is its author.
    pub fn add_answer(&mut self, initial: Edit<AnswerContent>) -> Answer {
        let answer = Answer::new(self.id, initial);
        self.answered_by.push(answer.author().id);
        answer
    }

    pub fn already_answered_by(&self, user: &User) -> bool {
        self.answered_by.contains(&user.id)
    }

    pub fn answer_count(&self) -> usize {
        self.answered_by.len()
    }

    /// Accept `answer` as the solution. Does not count as touching the question.
    pub fn mark_as_solved_by(&mut self, answer: &Answer) -> Result<(), DomainError> {
        if answer.question_id() != self.id {
            return Err(DomainError::NotOwner {
                answer: answer.id().to_string(),
                question: self.id.to_string(),
            });
        }
        self.solution = Some(answer.id());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Flags, removal, visibility
    // ------------------------------------------------------------------

    /// Returns false when the flag's author had already flagged this question.
    pub fn add_flag(&mut self, flag: Flag) -> bool {
        self.flags.add(flag)
    }

    pub fn already_flagged_by(&self, user: &User) -> bool {
        self.flags.already_flagged_by(user.id)
    }

    /// Soft removal; the question stays readable for its author and moderators.
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

    pub fn meta_description(&self) -> String {
        self.meta_description_with_limit(DEFAULT_META_DESCRIPTION_LIMIT)
    }

    pub fn meta_description_with_limit(&self, limit: usize) -> String {
        meta_description(self.title(), self.description(), limit)
    }
}

impl Question {
    /// Count `vote` in place of `previous` and record it for the vote ledger.
    pub fn cast_vote(&mut self, previous: Option<&Vote>, vote: Vote) {
        self.substitute(previous, &vote);
        self.effects.record_vote(vote);
    }
}

impl Votable for Question {
    fn substitute(&mut self, previous: Option<&Vote>, next: &Vote) {
        self.votes.substitute(previous, next);
    }

    fn vote_count(&self) -> i64 {
        self.votes.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flags::FlagType;
    use crate::core::voting::VoteType;

    fn user(id: u64, name: &str) -> User {
        User::new(id, name, format!("{name}@brutal.com"))
    }

    fn content(title: &str, description: &str, tags: Vec<Tag>) -> QuestionContent {
        QuestionContent::new(title, description, tags)
    }

    fn question() -> Question {
        Question::new(Edit::new(
            content("how do i program using ruby?", "some description", vec![]),
            User::ghost(),
        ))
    }

    fn commit(question: &mut Question) {
        question.take_effects().commit_tag_usage();
    }

    fn edit_by(editor: &User) -> Edit<QuestionContent> {
        Edit::new(content("new title", "new description", vec![]), editor.clone())
    }

    #[test]
    fn test_edit_is_before_current_after_newer_approval() {
        let mut ruby = question();
        let moderator = user(9, "moderator").as_moderator();

        let version = ruby.enqueue_change(edit_by(&user(1, "leo")), UpdateStatus::Pending);
        let by_moderator = ruby.enqueue_change(edit_by(&moderator), UpdateStatus::Pending);
        ruby.approve(by_moderator, &moderator).unwrap();

        let version = ruby.pending_edit(version).unwrap();
        assert!(version.is_before_current(&ruby));
    }

    #[test]
    fn test_edit_is_not_before_current_when_enqueued_after_approval() {
        let mut ruby = question();
        let moderator = user(9, "moderator").as_moderator();

        let by_moderator = ruby.enqueue_change(edit_by(&moderator), UpdateStatus::Pending);
        ruby.approve(by_moderator, &moderator).unwrap();
        let version = ruby.enqueue_change(edit_by(&user(1, "leo")), UpdateStatus::Pending);

        let version = ruby.pending_edit(version).unwrap();
        assert!(!version.is_before_current(&ruby));
        assert_eq!(ruby.stale_edits().count(), 0);
    }

    #[test]
    fn test_cannot_be_solved_by_an_answer_of_another_question() {
        let mut should_i_live_forever = question();
        let mut other = question();
        let yes = other.add_answer(Edit::new(AnswerContent::new("yes"), user(1, "leo")));

        let result = should_i_live_forever.mark_as_solved_by(&yes);

        assert!(matches!(result, Err(DomainError::NotOwner { .. })));
        assert_eq!(should_i_live_forever.solution(), None);
    }

    #[test]
    fn test_can_be_solved_by_own_answer() {
        let mut should_i_live_forever = question();
        let yes = should_i_live_forever
            .add_answer(Edit::new(AnswerContent::new("my answer"), user(1, "leo")));

        should_i_live_forever.mark_as_solved_by(&yes).unwrap();

        assert_eq!(should_i_live_forever.solution(), Some(yes.id()));
    }

    #[test]
    fn test_not_touched_when_marked_as_solved() {
        let mut should_i_live_forever = question();
        let touched_by = should_i_live_forever.last_touched_by().clone();
        let yes = should_i_live_forever
            .add_answer(Edit::new(AnswerContent::new("my answer"), user(1, "leo")));

        assert_eq!(should_i_live_forever.last_touched_by(), &User::ghost());

        should_i_live_forever.mark_as_solved_by(&yes).unwrap();

        assert_eq!(should_i_live_forever.last_touched_by(), &touched_by);
    }

    #[test]
    fn test_substitute_updates_vote_count() {
        let mut my_question = question();
        assert_eq!(my_question.vote_count(), 0);

        let first_vote = Vote::new(UserId(1), VoteType::Up);
        my_question.substitute(None, &first_vote);
        assert_eq!(my_question.vote_count(), 1);

        my_question.substitute(Some(&first_vote), &Vote::new(UserId(1), VoteType::Down));
        assert_eq!(my_question.vote_count(), -1);

        my_question.substitute(None, &Vote::new(UserId(2), VoteType::Down));
        assert_eq!(my_question.vote_count(), -2);
    }

    #[test]
    fn test_touched_by_original_author_after_edit() {
        let artur = user(1, "artur");
        let leo = user(2, "leo");
        let mut como_faz = Question::new(Edit::new(
            content("titulo", "descricao", vec![]),
            artur.clone(),
        ))
        .with_author(artur.clone());

        como_faz.update_with(edit_by(&leo));

        assert_eq!(como_faz.last_touched_by().id, artur.id);
    }

    #[test]
    fn test_approval_updates_status_and_last_touched_by() {
        let artur = user(1, "artur");
        let leo = user(2, "leo");
        let moderator = user(3, "mod").as_moderator();
        let mut como_faz = Question::new(Edit::new(
            content("titulo", "descricao", vec![]),
            artur.clone(),
        ))
        .with_author(artur);

        let edited = como_faz.update_with(edit_by(&leo));
        como_faz.approve(edited, &moderator).unwrap();

        assert_eq!(como_faz.last_touched_by().id, leo.id);
        assert_eq!(como_faz.information().status(), UpdateStatus::Approved);
        assert_eq!(como_faz.information().sequence(), edited);
        assert_eq!(como_faz.title(), "new title");
    }

    #[test]
    fn test_author_is_set_only_once() {
        let mut q = question();
        let original = user(1, "original");
        q.set_author(original.clone());
        q.set_author(user(2, "other"));

        assert_eq!(q.author(), Some(&original));
    }

    #[test]
    fn test_already_flagged_by() {
        let mut q = question();
        let author = user(1, "author");
        let other = user(2, "other");

        q.add_flag(Flag::new(FlagType::Other, author.clone()));
        q.add_flag(Flag::new(FlagType::Spam, author.clone()));

        assert!(q.already_flagged_by(&author));
        assert!(!q.already_flagged_by(&other));
        assert_eq!(q.flags().len(), 1);
    }

    #[test]
    fn test_already_answered_by() {
        let mut q = question();
        let author = user(1, "author");
        let other = user(2, "other");

        q.add_answer(Edit::new(AnswerContent::new("my answer"), author.clone()));

        assert!(q.already_answered_by(&author));
        assert!(!q.already_answered_by(&other));
        assert_eq!(q.answer_count(), 1);
    }

    #[test]
    fn test_update_approved_moves_tag_usage() {
        let ruby = Tag::new("ruby");
        let java = Tag::new("java");
        let mut q = Question::new(Edit::new(
            content("title", "description", vec![ruby.clone()]),
            User::ghost(),
        ));
        commit(&mut q);
        assert_eq!(ruby.usage_count(), 1);

        let moderator = user(3, "mod").as_moderator();
        q.update_approved(
            Edit::new(content("title", "description", vec![java.clone()]), moderator.clone()),
            &moderator,
        );
        commit(&mut q);

        assert_eq!(ruby.usage_count(), 0);
        assert_eq!(java.usage_count(), 1);
    }

    #[test]
    fn test_pending_edit_does_not_count_tags_until_approved() {
        let ruby = Tag::new("ruby");
        let java = Tag::new("java");
        let mut q = Question::new(Edit::new(
            content("title", "description", vec![ruby.clone()]),
            User::ghost(),
        ));
        let leo = user(2, "leo");
        let moderator = user(3, "mod").as_moderator();

        let edit = q.update_with(Edit::new(
            content("title", "description", vec![ruby.clone(), java.clone()]),
            leo,
        ));
        commit(&mut q);
        assert_eq!(java.usage_count(), 0);

        q.approve(edit, &moderator).unwrap();
        commit(&mut q);
        assert_eq!(ruby.usage_count(), 1);
        assert_eq!(java.usage_count(), 1);
    }

    #[test]
    fn test_rejected_edit_has_no_effect() {
        let ruby = Tag::new("ruby");
        let java = Tag::new("java");
        let mut q = Question::new(Edit::new(
            content("title", "description", vec![ruby.clone()]),
            User::ghost(),
        ));
        let moderator = user(3, "mod").as_moderator();

        let edit = q.update_with(Edit::new(
            content("spam", "spam", vec![java.clone()]),
            user(2, "spammer"),
        ));
        q.reject(edit, &moderator).unwrap();
        commit(&mut q);

        assert_eq!(q.title(), "title");
        assert_eq!(ruby.usage_count(), 1);
        assert_eq!(java.usage_count(), 0);
        assert!(q.last_touched_by().is_ghost());
        assert!(!q.has_pending_edits());
    }

    #[test]
    fn test_tag_usage_waits_for_commit() {
        let ruby = Tag::new("ruby");
        let java = Tag::new("java");
        let mut q = Question::new(Edit::new(
            content("title", "description", vec![ruby.clone()]),
            User::ghost(),
        ));
        assert_eq!(ruby.usage_count(), 0);
        commit(&mut q);

        let moderator = user(3, "mod").as_moderator();
        let edit = q.update_with(Edit::new(
            content("title", "description", vec![java.clone()]),
            user(2, "leo"),
        ));
        q.approve(edit, &moderator).unwrap();

        // Dropping the copy without committing leaves the counters alone
        let uncommitted = q.take_effects();
        assert!(!uncommitted.is_empty());
        assert_eq!(ruby.usage_count(), 1);
        assert_eq!(java.usage_count(), 0);
        assert!(q.effects().is_empty());
    }

    #[test]
    fn test_approving_a_stale_edit_brings_it_back() {
        let ruby = Tag::new("ruby");
        let java = Tag::new("java");
        let rails = Tag::new("rails");
        let artur = user(1, "artur");
        let leo = user(2, "leo");
        let moderator = user(3, "mod").as_moderator();
        let mut q = Question::new(Edit::new(
            content("title", "description", vec![ruby.clone()]),
            artur.clone(),
        ))
        .with_author(artur);

        let older = q.update_with(Edit::new(
            content("older title", "description", vec![java.clone()]),
            leo.clone(),
        ));
        let newer = q.update_approved(
            Edit::new(content("newer title", "description", vec![rails.clone()]), moderator.clone()),
            &moderator,
        );
        assert_eq!(q.stale_edits().count(), 1);

        q.approve(older, &moderator).unwrap();
        commit(&mut q);

        assert_eq!(q.title(), "older title");
        assert_eq!(q.information().sequence(), older);
        assert_eq!(q.last_touched_by(), &leo);
        assert_eq!(q.stale_edits().count(), 0);
        assert!(!q.has_pending_edits());
        assert!(q.history().iter().any(|r| r.sequence() == newer));
        assert_eq!(ruby.usage_count(), 0);
        assert_eq!(rails.usage_count(), 0);
        assert_eq!(java.usage_count(), 1);
    }

    #[test]
    fn test_cast_vote_is_recorded_for_the_ledger() {
        let mut q = question();
        let vote = Vote::new(UserId(2), VoteType::Up);

        q.cast_vote(None, vote.clone());

        assert_eq!(q.vote_count(), 1);
        assert_eq!(q.effects().votes(), &[vote]);
    }

    #[test]
    fn test_approving_a_never_submitted_edit_is_invalid() {
        let mut q = question();
        let moderator = user(3, "mod").as_moderator();
        let result = q.approve(99, &moderator);
        assert!(matches!(result, Err(DomainError::InvalidTransition { .. })));
    }

    #[test]
    fn test_has_pending_edits() {
        let ruby = Tag::new("ruby");
        let java = Tag::new("java");
        let mut q = Question::new(Edit::new(
            content("title", "description", vec![ruby]),
            User::ghost(),
        ));
        assert!(!q.has_pending_edits());

        q.enqueue_change(
            Edit::new(content("title", "description", vec![java]), user(1, "leo")),
            UpdateStatus::Pending,
        );

        assert!(q.has_pending_edits());
    }

    #[test]
    fn test_removed_question_is_visible_for_author() {
        let author = user(1, "leo");
        let mut q = question().with_author(author.clone());
        q.remove();
        assert!(q.is_visible_for(Some(&author)));
    }

    #[test]
    fn test_removed_question_is_visible_for_moderator() {
        let mut q = question();
        q.remove();
        assert!(q.is_visible_for(Some(&user(1, "leo").as_moderator())));
    }

    #[test]
    fn test_removed_question_is_hidden_from_anonymous_and_strangers() {
        let mut q = question().with_author(user(1, "leo"));
        q.remove();
        assert!(!q.is_visible_for(None));
        assert!(!q.is_visible_for(Some(&user(2, "stranger"))));
    }

    #[test]
    fn test_live_question_is_visible_for_everyone() {
        let author = user(1, "leo");
        let q = question().with_author(author.clone());
        assert!(q.is_visible_for(None));
        assert!(q.is_visible_for(Some(&author)));
        assert!(q.is_visible_for(Some(&user(2, "mod").as_moderator())));
        assert!(q.is_visible_for(Some(&user(3, "stranger"))));
    }

    #[test]
    fn test_short_meta_is_not_trimmed() {
        let title = "0123456789";
        let description = "description";
        let q = Question::new(Edit::new(content(title, description, vec![]), User::ghost()));

        assert!(q.meta_description().contains(title));
        assert!(q.meta_description().contains(description));
    }

    #[test]
    fn test_big_meta_is_trimmed() {
        let title = "a".repeat(100);
        let description = "b".repeat(10_000);
        let q = Question::new(Edit::new(content(&title, &description, vec![]), User::ghost()));

        assert!(q.meta_description().contains(&title));
        assert!(!q.meta_description().contains(&description));
    }
}
