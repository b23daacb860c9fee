use crate::core::moderation::ModerationConfig;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Moderation settings persisted as a single pretty-printed JSON file.
/// Keys missing from the file fall back to their defaults.
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config. A missing file is not an error.
    pub async fn load(&self) -> Result<ModerationConfig, ConfigError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No config file, using defaults");
                return Ok(ModerationConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config = serde_json::from_str(&raw)?;
        info!(path = %self.path.display(), "Loaded moderation config");
        Ok(config)
    }

    pub async fn save(&self, config: &ModerationConfig) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}
