//! Template engine configuration
//!
//! Delimiters wrapping variable names and the directory used for the
//! working copy of each opened template. Configuration is plain JSON and
//! every field is optional.

use crate::error::{OdfError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for opening templates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemplateConfig {
    /// Text placed before a variable name, `{` by default
    pub delimiter_left: String,
    /// Text placed after a variable name, `}` by default
    pub delimiter_right: String,
    /// Directory for working copies (system temp dir when unset)
    pub tmp_dir: Option<PathBuf>,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            delimiter_left: "{".to_string(),
            delimiter_right: "}".to_string(),
            tmp_dir: None,
        }
    }
}

impl TemplateConfig {
    /// Use other delimiters around variable names
    pub fn with_delimiters(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.delimiter_left = left.into();
        self.delimiter_right = right.into();
        self
    }

    /// Place working copies in `dir`
    pub fn with_tmp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = Some(dir.into());
        self
    }

    /// Load configuration from a JSON file.
    ///
    /// A missing file yields the defaults. A file that cannot be parsed is
    /// logged and also yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<TemplateConfig>(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse template config {}, using defaults: {}",
                    path.display(),
                    e
                );
                Ok(Self::default())
            }
        }
    }

    /// Full tag for a variable name
    pub fn tag(&self, key: &str) -> String {
        format!("{}{}{}", self.delimiter_left, key, self.delimiter_right)
    }

    /// Check the configuration and resolve the working directory.
    ///
    /// The directory must exist and accept new files.
    pub fn validate(&self) -> Result<PathBuf> {
        let dir = match &self.tmp_dir {
            Some(dir) => dir.clone(),
            None => std::env::temp_dir(),
        };
        if !dir.exists() {
            return Err(OdfError::invalid_config(format!(
                "temporary directory '{}' does not exist",
                dir.display()
            )));
        }
        if !dir.is_dir() {
            return Err(OdfError::invalid_config(format!(
                "temporary path '{}' is not a directory",
                dir.display()
            )));
        }
        if let Err(e) = tempfile::tempfile_in(&dir) {
            return Err(OdfError::invalid_config(format!(
                "temporary directory '{}' is not writable: {}",
                dir.display(),
                e
            )));
        }
        Ok(dir)
    }
}
