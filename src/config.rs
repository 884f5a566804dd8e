//! Configuration management for confdiff
//!
//! This module provides configuration structures and defaults for the diff
//! engine, preview output and snapshot normalisation. Values come from an
//! optional TOML file and can be overridden through environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::diff::{DiffConfig, DiffGenerator, DiffOptions, DEFAULT_CONTEXT_LINES};
use crate::error::{ConfdiffError, Result};

/// Global configuration for confdiff
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfdiffConfig {
    /// Diff engine configuration
    pub diff: EngineConfig,
    /// Preview output configuration
    pub output: OutputConfig,
    /// Snapshot normalisation configuration
    pub snapshot: SnapshotConfig,
}

/// Configuration for the diff engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Unchanged lines shown around each change
    pub context_lines: usize,
    /// Keep line terminators as separate tokens
    pub newline_is_token: bool,
    /// Stop searching for a minimal diff after this many edits
    pub max_edit_length: Option<usize>,
}

/// Configuration for printed previews
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Colour added and removed lines
    pub color: bool,
    /// Print a summary line after the preview
    pub show_stats: bool,
}

/// Configuration for JSON snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Sort object keys so that line diffs line up
    pub sort_keys: bool,
    /// Drop null members before diffing
    pub strip_nulls: bool,
    /// Key under which the snapshot is wrapped as a one-element array
    pub wrapper_key: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
            newline_is_token: true,
            max_edit_length: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            color: true,
            show_stats: true,
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            sort_keys: true,
            strip_nulls: true,
            wrapper_key: "containers".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            newline_is_token: self.newline_is_token,
            max_edit_length: self.max_edit_length,
        }
    }

    /// Build a generator from these settings
    pub fn generator(&self) -> DiffGenerator {
        DiffConfig::new()
            .newline_is_token(self.newline_is_token)
            .max_edit_length(self.max_edit_length)
            .context_lines(self.context_lines)
            .build()
    }
}

/// Configuration loading and management
impl ConfdiffConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load configuration from file if given, then apply environment
    /// overrides and validate
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override values with environment variables if present
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("CONFDIFF_CONTEXT_LINES") {
            if let Ok(lines) = val.parse::<usize>() {
                self.diff.context_lines = lines;
            }
        }

        if let Ok(val) = std::env::var("CONFDIFF_MAX_EDIT_LENGTH") {
            if let Ok(limit) = val.parse::<usize>() {
                self.diff.max_edit_length = Some(limit);
            }
        }

        if let Ok(val) = std::env::var("CONFDIFF_NEWLINE_IS_TOKEN") {
            if let Ok(enabled) = val.parse::<bool>() {
                self.diff.newline_is_token = enabled;
            }
        }

        // Presence alone disables colour, whatever the value
        if std::env::var_os("CONFDIFF_NO_COLOR").is_some() {
            self.output.color = false;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.diff.max_edit_length == Some(0) {
            return Err(ConfdiffError::InvalidConfig(
                "max_edit_length must be greater than 0".to_string(),
            ));
        }

        if self.snapshot.wrapper_key.trim().is_empty() {
            return Err(ConfdiffError::InvalidConfig(
                "wrapper_key must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
