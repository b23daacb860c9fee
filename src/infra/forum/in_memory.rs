// In-memory implementation of ForumStore.
//
// Entities are kept by value; saving replaces the stored copy. Tags are the
// exception: the catalog hands out clones of one handle per name, so every
// question carrying a tag moves the same usage counter.
//
// A save runs under the entity's DashMap entry guard: the version check, the
// commit of the entity's recorded effects and the write happen together, so
// two saves of the same entity never interleave.

use crate::core::content::Effects;
use crate::core::moderation::{ForumError, ForumStore};
use crate::core::questions::{Answer, AnswerId, ContentRef, Question, QuestionId};
use crate::core::tags::{normalize_name, Tag};
use crate::core::users::UserId;
use crate::core::voting::Vote;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stored value plus the order it was first saved in, so listings stay stable.
#[derive(Clone, Debug)]
struct Stored<T> {
    order: u64,
    item: T,
}

pub struct InMemoryForumStore {
    questions: DashMap<QuestionId, Stored<Question>>,
    answers: DashMap<AnswerId, Stored<Answer>>,
    /// Tag catalog keyed by normalized name
    tags: DashMap<String, Tag>,
    /// One active vote per (content, voter)
    votes: DashMap<(ContentRef, UserId), Vote>,
    next_order: AtomicU64,
}

impl InMemoryForumStore {
    pub fn new() -> Self {
        Self {
            questions: DashMap::new(),
            answers: DashMap::new(),
            tags: DashMap::new(),
            votes: DashMap::new(),
            next_order: AtomicU64::new(0),
        }
    }

    fn order(&self) -> u64 {
        self.next_order.fetch_add(1, Ordering::Relaxed)
    }

    fn commit(&self, target: ContentRef, effects: Effects) {
        effects.commit_tag_usage();
        for vote in effects.votes() {
            self.votes.insert((target, vote.voter), vote.clone());
        }
    }
}

/// Version the stored copy must have for a save of `loaded` to go through.
fn check_version(
    entity: &'static str,
    id: String,
    stored: u64,
    loaded: u64,
) -> Result<(), ForumError> {
    if stored == loaded {
        Ok(())
    } else {
        Err(ForumError::Conflict { entity, id })
    }
}

impl Default for InMemoryForumStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForumStore for InMemoryForumStore {
    async fn save_question(&self, question: &mut Question) -> Result<(), ForumError> {
        let id = question.id();
        let target = ContentRef::Question(id);
        match self.questions.entry(id) {
            Entry::Occupied(mut entry) => {
                let stored = entry.get().item.store_version();
                check_version("Question", id.to_string(), stored, question.store_version())?;
                self.commit(target, question.take_effects());
                question.set_store_version(stored + 1);
                // Keeps the original order
                entry.get_mut().item = question.clone();
            }
            Entry::Vacant(entry) => {
                check_version("Question", id.to_string(), 0, question.store_version())?;
                self.commit(target, question.take_effects());
                question.set_store_version(1);
                entry.insert(Stored {
                    order: self.order(),
                    item: question.clone(),
                });
            }
        }
        Ok(())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Option<Question>, ForumError> {
        Ok(self.questions.get(&id).map(|entry| entry.item.clone()))
    }

    async fn all_questions(&self) -> Result<Vec<Question>, ForumError> {
        let mut stored: Vec<Stored<Question>> =
            self.questions.iter().map(|entry| entry.value().clone()).collect();
        stored.sort_by_key(|s| s.order);
        Ok(stored.into_iter().map(|s| s.item).collect())
    }

    async fn save_answer(&self, answer: &mut Answer) -> Result<(), ForumError> {
        let id = answer.id();
        let target = ContentRef::Answer(id);
        match self.answers.entry(id) {
            Entry::Occupied(mut entry) => {
                let stored = entry.get().item.store_version();
                check_version("Answer", id.to_string(), stored, answer.store_version())?;
                self.commit(target, answer.take_effects());
                answer.set_store_version(stored + 1);
                entry.get_mut().item = answer.clone();
            }
            Entry::Vacant(entry) => {
                check_version("Answer", id.to_string(), 0, answer.store_version())?;
                self.commit(target, answer.take_effects());
                answer.set_store_version(1);
                entry.insert(Stored {
                    order: self.order(),
                    item: answer.clone(),
                });
            }
        }
        Ok(())
    }

    async fn get_answer(&self, id: AnswerId) -> Result<Option<Answer>, ForumError> {
        Ok(self.answers.get(&id).map(|entry| entry.item.clone()))
    }

    async fn answers_for(&self, question: QuestionId) -> Result<Vec<Answer>, ForumError> {
        let mut stored: Vec<Stored<Answer>> = self
            .answers
            .iter()
            .filter(|entry| entry.item.question_id() == question)
            .map(|entry| entry.value().clone())
            .collect();
        stored.sort_by_key(|s| s.order);
        Ok(stored.into_iter().map(|s| s.item).collect())
    }

    async fn find_or_create_tag(&self, name: &str) -> Result<Tag, ForumError> {
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(ForumError::Validation("Tag name cannot be empty".to_string()));
        }
        Ok(self
            .tags
            .entry(key.clone())
            .or_insert_with(|| Tag::new(key))
            .clone())
    }

    async fn all_tags(&self) -> Result<Vec<Tag>, ForumError> {
        let mut tags: Vec<Tag> = self.tags.iter().map(|entry| entry.value().clone()).collect();
        tags.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(tags)
    }

    async fn get_vote(
        &self,
        target: ContentRef,
        voter: UserId,
    ) -> Result<Option<Vote>, ForumError> {
        Ok(self.votes.get(&(target, voter)).map(|entry| entry.value().clone()))
    }
}
