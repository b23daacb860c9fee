// CLI layer - drives the forum service from a JSON script.

#[path = "replay/replay_script.rs"]
pub mod script;

#[path = "replay/replay_runner.rs"]
pub mod runner;

pub use runner::{run_script, QuestionReport, ReplayReport, StepReport, TagReport};
pub use script::{ReplayScript, Step, TargetKey};
