use super::question::Question;
use crate::core::content::Revision;
use crate::core::tags::{dedup_tags, Tag};

/// The editable part of a question.
#[derive(Debug, Clone)]
pub struct QuestionContent {
    pub title: String,
    pub description: String,
    tags: Vec<Tag>,
}

impl QuestionContent {
    pub fn new(title: impl Into<String>, description: impl Into<String>, tags: Vec<Tag>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            tags: dedup_tags(tags),
        }
    }

    /// Tags in the order they were given, without duplicates.
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name() == name)
    }
}

/// The editable part of an answer.
#[derive(Debug, Clone)]
pub struct AnswerContent {
    pub description: String,
}

impl AnswerContent {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

pub type QuestionInformation = Revision<QuestionContent>;

pub type AnswerInformation = Revision<AnswerContent>;

impl Revision<QuestionContent> {
    /// Whether `question` approved a newer revision than this one.
    pub fn is_before_current(&self, question: &Question) -> bool {
        self.is_before(question.information())
    }
}
