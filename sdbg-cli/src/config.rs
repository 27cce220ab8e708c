//! Layered configuration (§10.5): optional TOML file, overridden by
//! environment variables, overridden by explicit CLI flags — the same
//! discovery-and-override precedence this lineage's configuration crate
//! uses, scaled down to the handful of settings this engine needs.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_PORT: u16 = 8765;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub port: u16,
    pub log_level: Option<String>,
    pub breakpoints_file: Option<std::path::PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            log_level: None,
            breakpoints_file: None,
        }
    }
}

impl EngineConfig {
    /// Loads from `path` if given, then applies `SDBG_LOG_LEVEL` if set.
    ///
    /// # Errors
    /// Returns an error if `path` is given but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => Self::default(),
        };

        if let Ok(level) = std::env::var("SDBG_LOG_LEVEL") {
            config.log_level = Some(level);
        }

        Ok(config)
    }

    /// Applies an explicit `--port` override, which always wins over file
    /// and environment.
    #[must_use]
    pub fn with_port_override(mut self, port: Option<u16>) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}
