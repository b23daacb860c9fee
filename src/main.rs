// Entry point of the forum replay tool.
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Replay the script given on the command line and print the report

use anyhow::{bail, Context, Result};
use qa_forum::cli::{run_script, ReplayScript};
use qa_forum::core::moderation::ForumService;
use qa_forum::infra::config::JsonConfigStore;
use qa_forum::infra::forum::InMemoryForumStore;

const DEFAULT_CONFIG_PATH: &str = "qa_forum.json";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so the report on stdout stays valid JSON
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let Some(script_path) = std::env::args().nth(1) else {
        bail!("Usage: qa_forum <script.json>");
    };

    let config_path =
        std::env::var("QA_FORUM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = JsonConfigStore::new(&config_path)
        .load()
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;

    let raw = tokio::fs::read_to_string(&script_path)
        .await
        .with_context(|| format!("Failed to read script {script_path}"))?;
    let script = ReplayScript::from_json(&raw).context("Invalid replay script")?;

    tracing::info!(script = %script_path, steps = script.steps.len(), "Replaying script");

    let service = ForumService::new(InMemoryForumStore::new(), config);
    let report = run_script(&service, script).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
