// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

use crate::errors::InterpreterError;

/// Errors that can occur while loading configuration or building a runtime from it
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("Failed to read config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML document did not match the configuration schema
    #[error("Invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The TOML document did not match the configuration schema
    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file extension does not name a supported format
    #[error("Unsupported config format '{0}' (expected .yaml, .yml or .toml)")]
    UnsupportedFormat(String),

    /// A configuration value is out of range or inconsistent with others
    #[error("Invalid option '{option}': {reason}")]
    InvalidOption { option: &'static str, reason: String },

    /// A capability backend could not be constructed
    #[error("Failed to create '{backend}' capability backend: {reason}")]
    Backend { backend: &'static str, reason: String },

    /// The registry could not be built from the configured profile and capabilities
    #[error(transparent)]
    Registry(#[from] InterpreterError),
}
