// Questions module - the moderated entities of the forum.
//
// Question and Answer own their versioned content, vote tally, flags and
// soft-removal state. No storage dependencies here; the forum service loads
// and saves them through the ForumStore port.

pub mod answer;
pub mod ids;
pub mod question;
pub mod question_content;

pub use answer::Answer;
pub use ids::{AnswerId, ContentRef, QuestionId};
pub use question::Question;
pub use question_content::{AnswerContent, AnswerInformation, QuestionContent, QuestionInformation};
