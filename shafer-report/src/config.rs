//! Report configuration loaded from a TOML file.
//!
//! ```toml
//! [engine]
//! tolerance = 1e-9
//! parallel_threshold = 4096
//!
//! [report]
//! precision = 3
//! top = 10
//! ```
//!
//! Every key is optional.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use shafer_core::{EngineConfig, ShaferError};
use thiserror::Error;

/// Largest number of decimals the report will print.
pub const MAX_PRECISION: usize = 12;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid engine settings: {0}")]
    Engine(#[from] ShaferError),

    #[error("Report precision must be at most {max}, got {found}")]
    Precision { max: usize, found: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub report: ReportSettings,
}

/// Presentation knobs for the console report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Decimals printed for masses and belief scores.
    #[serde(default = "default_precision")]
    pub precision: usize,

    /// Rows of the hypothesis ranking to print; `None` prints every atom.
    #[serde(default)]
    pub top: Option<usize>,
}

fn default_precision() -> usize {
    3
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            top: None,
        }
    }
}

impl ReportConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        log::debug!("Loaded report config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if self.report.precision > MAX_PRECISION {
            return Err(ConfigError::Precision {
                max: MAX_PRECISION,
                found: self.report.precision,
            });
        }
        Ok(())
    }
}
