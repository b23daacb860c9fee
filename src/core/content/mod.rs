// Content module - versioned, moderated content shared by questions and answers.
//
// Every edit becomes a Revision stamped with a per-entity sequence number.
// Versioned holds the approved revision plus the queue of pending ones.

pub mod domain_error;
pub mod effects;
pub mod meta;
pub mod revision;
pub mod versioned;
pub mod visibility;

pub use domain_error::DomainError;
pub use effects::Effects;
pub use meta::{meta_description, DEFAULT_META_DESCRIPTION_LIMIT};
pub use revision::{Edit, Revision, Sequence, UpdateStatus};
pub use versioned::Versioned;
pub use visibility::visible;
