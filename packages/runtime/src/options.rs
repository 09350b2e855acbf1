use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_OPTIONS_NAME: &str = "trellis.config.json";

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Failed to read options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid options file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeOptions {
    /// Run prop, context, and child-context type checkers.
    /// Defaults to on for debug builds only.
    pub validate_types: bool,

    /// Keep advisory warnings for later inspection (they are always logged)
    pub collect_warnings: bool,

    /// Flush passes allowed before a runaway update loop is reported
    pub max_flush_passes: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            validate_types: cfg!(debug_assertions),
            collect_warnings: true,
            max_flush_passes: 64,
        }
    }
}

impl RuntimeOptions {
    /// Type checking on, warnings retained
    pub fn development() -> Self {
        Self {
            validate_types: true,
            collect_warnings: true,
            ..Default::default()
        }
    }

    /// No type checking, no retained warnings
    pub fn production() -> Self {
        Self {
            validate_types: false,
            collect_warnings: false,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a directory, falling back to defaults when no
    /// options file exists
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let path = dir.as_ref().join(DEFAULT_OPTIONS_NAME);

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_json_str(&content)
        } else {
            Ok(Self::default())
        }
    }
}
