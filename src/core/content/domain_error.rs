use super::revision::Sequence;
use thiserror::Error;

/// Refused state transitions on questions and answers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The answer offered as a solution belongs to another question.
    #[error("Answer {answer} does not belong to question {question}")]
    NotOwner { answer: String, question: String },

    #[error("Revision {sequence} cannot be {action}: {reason}")]
    InvalidTransition {
        sequence: Sequence,
        action: &'static str,
        reason: &'static str,
    },
}
