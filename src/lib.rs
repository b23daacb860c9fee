// Q&A forum with moderated edits.
//
// **Architecture Overview:**
// - `core/` = Business logic (entities, moderation service, storage port)
// - `infra/` = Implementations of core traits (in-memory store, JSON config)
// - `cli/` = Script replay used by the binary

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
pub mod core;
#[path = "infra/infra_layer.rs"]
pub mod infra;
#[path = "cli/cli_layer.rs"]
pub mod cli;
