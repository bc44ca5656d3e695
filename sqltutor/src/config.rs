// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Engine configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tutor engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows kept in an execution outcome; `row_count` still reports all rows
    pub max_result_rows: usize,

    /// Run ADVISORY rules (style and learning hints)
    pub advisory_rules: bool,

    /// JSON knowledge document; the built-in graph is used when absent or
    /// when loading fails
    pub knowledge_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_result_rows: 10,
            advisory_rules: true,
            knowledge_path: None,
        }
    }
}

impl EngineConfig {
    /// Only warnings and blocking problems, no style hints
    pub fn strict() -> Self {
        Self {
            advisory_rules: false,
            ..Self::default()
        }
    }

    pub fn with_knowledge_path(mut self, path: impl AsRef<Path>) -> Self {
        self.knowledge_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_result_rows == 0 {
            return Err(ConfigError::Invalid(
                "max_result_rows must be greater than 0".to_string(),
            ));
        }
        if let Some(path) = &self.knowledge_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "knowledge_path must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
