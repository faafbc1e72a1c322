//! JSON config file adapter.
//!
//! Implements [`ConfigPort`] over a file on disk.
//!
//! - A missing file is not an error: defaults are returned.
//! - Loaded and saved configs are both range-checked; an invalid file is
//!   rejected rather than clamped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::ConfigPort;
use crate::config::FdirConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct JsonConfigFile {
    path: PathBuf,
}

impl JsonConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigPort for JsonConfigFile {
    fn load(&self) -> Result<FdirConfig, ConfigError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("config: {} not found, using defaults", self.path.display());
                return Ok(FdirConfig::default());
            }
            Err(e) => return Err(ConfigError::Io(format!("{}: {}", self.path.display(), e))),
        };

        let cfg: FdirConfig = serde_json::from_str(&text)
            .map_err(|e| ConfigError::Corrupted(format!("{}: {}", self.path.display(), e)))?;
        cfg.validate()?;
        info!("config: loaded {}", self.path.display());
        Ok(cfg)
    }

    fn save(&self, config: &FdirConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = serde_json::to_string_pretty(config)
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        fs::write(&self.path, text + "\n")
            .map_err(|e| ConfigError::Io(format!("{}: {}", self.path.display(), e)))?;
        info!("config: saved {}", self.path.display());
        Ok(())
    }
}
