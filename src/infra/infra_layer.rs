// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "forum/in_memory.rs"]
pub mod forum;

#[path = "config/json_config_store.rs"]
pub mod config;
