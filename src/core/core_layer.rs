// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "users/user_models.rs"]
pub mod users;

#[path = "tags/tag_models.rs"]
pub mod tags;

#[path = "voting/voting_models.rs"]
pub mod voting;

#[path = "flags/flag_models.rs"]
pub mod flags;

#[path = "content/mod.rs"]
pub mod content;

#[path = "questions/mod.rs"]
pub mod questions;

#[path = "moderation/mod.rs"]
pub mod moderation;
