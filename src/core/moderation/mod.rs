// Core moderation module - the forum service and the storage port it needs.
// Following the same pattern as the entity modules: models first, service next.

pub mod moderation_models;
pub mod moderation_service;

pub use moderation_models::*;
pub use moderation_service::*;
