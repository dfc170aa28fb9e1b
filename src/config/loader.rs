// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::consts::{DEFAULT_HTTP_TIMEOUT_SECONDS, MAX_HTTP_TIMEOUT_SECONDS};
use crate::config::Profile;
use crate::errors::ConfigError;
use crate::steps::HandlerOptions;
use crate::value::Rect;

/// Interpreter configuration.
///
/// Loaded from YAML (or TOML, by file extension) and turned into a registry and
/// executor by [`RuntimeBuilder`](crate::config::RuntimeBuilder).
///
/// # Fields
/// * `profile` - Which opcode set programs may use
/// * `trace` - Collect a trace fragment for every executed step
/// * `base_image` - Variable regions are cropped from when they do not record one
/// * `images` - Initial image bindings, loaded lazily on first use
/// * `loc` - Overrides for the profile's LOC thresholds
/// * `capabilities` - Where the model-backed operations are served from
///
/// # Example
/// ```yaml
/// profile: nlvr
/// trace: true
/// base_image: LEFT
/// images:
///   LEFT: images/left.png
///   RIGHT: images/right.png
/// capabilities:
///   backend: http
///   endpoint: http://localhost:8000
///   timeout_seconds: 120
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub profile: Profile,
    #[serde(default)]
    pub trace: bool,
    pub base_image: Option<String>,
    #[serde(default)]
    pub images: BTreeMap<String, PathBuf>,
    #[serde(default)]
    pub loc: LocOptions,
    #[serde(default)]
    pub capabilities: CapabilitiesConfig,
}

impl Config {
    /// Check ranges and cross-field requirements serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (option, value) in [
            ("loc.threshold", self.loc.threshold),
            ("loc.nms_threshold", self.loc.nms_threshold),
        ] {
            if let Some(v) = value {
                if !(0.0..=1.0).contains(&v) {
                    return Err(ConfigError::InvalidOption {
                        option,
                        reason: format!("{} is outside [0, 1]", v),
                    });
                }
            }
        }

        let caps = &self.capabilities;
        if caps.backend == BackendType::Http && caps.endpoint.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::InvalidOption {
                option: "capabilities.endpoint",
                reason: "the http backend needs an endpoint".to_string(),
            });
        }
        let timeout = caps.timeout_seconds();
        if timeout == 0 || timeout > MAX_HTTP_TIMEOUT_SECONDS {
            return Err(ConfigError::InvalidOption {
                option: "capabilities.timeout_seconds",
                reason: format!("{} is outside [1, {}]", timeout, MAX_HTTP_TIMEOUT_SECONDS),
            });
        }
        Ok(())
    }
}

/// LOC thresholds; unset values fall back to the profile's defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocOptions {
    pub threshold: Option<f32>,
    pub nms_threshold: Option<f32>,
}

impl LocOptions {
    pub fn handler_options(&self, profile: Profile) -> HandlerOptions {
        let defaults = HandlerOptions::for_profile(profile);
        HandlerOptions {
            loc_threshold: self.threshold.unwrap_or(defaults.loc_threshold),
            loc_nms_threshold: self.nms_threshold.unwrap_or(defaults.loc_nms_threshold),
            ..defaults
        }
    }
}

/// Which backend serves the model-backed capabilities.
///
/// # Variants
/// * `None` - No models; only the model-free opcodes can be registered
/// * `Http` - JSON over HTTP against a model server
/// * `Scripted` - Canned outputs from the `scripted` tables, for demos and replay
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackendType {
    #[default]
    None,
    Http,
    Scripted,
}

impl BackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::None => "none",
            BackendType::Http => "http",
            BackendType::Scripted => "scripted",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CapabilitiesConfig {
    #[serde(default)]
    pub backend: BackendType,
    /// Base URL of the model server (http backend).
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
    /// Directory holding `smileys/<name>.png` files for EMOJI.
    pub emoji_dir: Option<PathBuf>,
    #[serde(default)]
    pub scripted: ScriptedConfig,
}

impl CapabilitiesConfig {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS)
    }
}

/// Canned capability outputs.
///
/// # Example
/// ```yaml
/// scripted:
///   default_answer: "no"
///   answers:
///     "Is there a dog?": "yes"
///   detections:
///     dog:
///       - box: [10, 10, 50, 60]
///         score: 0.8
///   lists:
///     "US presidents": ["Lincoln", "Washington"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptedConfig {
    /// Answers keyed by the exact question text.
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
    /// Answer for questions without an entry in `answers`.
    pub default_answer: Option<String>,
    /// Detections keyed by object name, in the frame of whatever image is passed.
    #[serde(default)]
    pub detections: BTreeMap<String, Vec<ScriptedBox>>,
    #[serde(default)]
    pub segments: Vec<ScriptedBox>,
    #[serde(default)]
    pub faces: Vec<Rect>,
    /// Label picked for the n-th crop of a classify call (cycled). Empty picks the
    /// first label.
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub lists: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedBox {
    #[serde(rename = "box")]
    pub rect: Rect,
    #[serde(default = "default_score")]
    pub score: f32,
    pub label: Option<String>,
}

fn default_score() -> f32 {
    1.0
}

/// Load a config from a YAML (`.yaml`, `.yml`) or TOML (`.toml`) file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg = match extension.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };
    Ok(cfg)
}

/// Load a config and check it with [`Config::validate`].
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    cfg.validate()?;
    Ok(cfg)
}
