// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Capability backends.
//!
//! The interpreter core only sees the capability traits; this module turns the
//! `capabilities` section of a config into concrete implementations.
//!
//! # Available Backends
//!
//! * **http** - JSON over HTTP against a model server ([`http::HttpBackend`])
//! * **scripted** - canned outputs from configuration ([`scripted::ScriptedBackend`])
//! * **none** - no model-backed capabilities; only model-free opcodes register
//!
//! EMOJI artwork is read from disk ([`emoji::FileEmojiSource`]) whichever backend
//! is selected, as long as `emoji_dir` is set.
//!
//! ## Stub Backend (Test-Only)
//! [`stub`] holds deterministic capabilities that record their calls. It is not
//! available in production builds.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{BackendType, CapabilitiesConfig};
use crate::errors::ConfigError;
use crate::traits::Capabilities;

pub mod emoji;
pub mod http;
pub mod scripted;
#[cfg(test)]
pub mod stub;

use emoji::FileEmojiSource;
use http::HttpBackend;
use scripted::ScriptedBackend;

/// Factory for the capability set described by a config
pub struct CapabilityFactory;

impl CapabilityFactory {
    pub fn from_config(cfg: &CapabilitiesConfig) -> Result<Capabilities, ConfigError> {
        let caps = match cfg.backend {
            BackendType::None => Capabilities::new(),
            BackendType::Http => {
                let endpoint = cfg.endpoint.as_deref().ok_or_else(|| ConfigError::Backend {
                    backend: BackendType::Http.as_str(),
                    reason: "no endpoint configured".to_string(),
                })?;
                let backend = Arc::new(HttpBackend::new(endpoint, Duration::from_secs(cfg.timeout_seconds()))?);
                Capabilities::new()
                    .with_visual_qa(backend.clone())
                    .with_object_detector(backend.clone())
                    .with_segmenter(backend.clone())
                    .with_classifier(backend.clone())
                    .with_inpainter(backend.clone())
                    .with_face_detector(backend.clone())
                    .with_list_generator(backend)
            }
            BackendType::Scripted => {
                let backend = Arc::new(ScriptedBackend::new(cfg.scripted.clone()));
                Capabilities::new()
                    .with_visual_qa(backend.clone())
                    .with_object_detector(backend.clone())
                    .with_segmenter(backend.clone())
                    .with_classifier(backend.clone())
                    .with_inpainter(backend.clone())
                    .with_face_detector(backend.clone())
                    .with_list_generator(backend)
            }
        };

        Ok(match &cfg.emoji_dir {
            Some(dir) => caps.with_emoji_source(Arc::new(FileEmojiSource::new(dir))),
            None => caps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capabilities(yaml: &str) -> Capabilities {
        let cfg: CapabilitiesConfig = serde_yaml::from_str(yaml).unwrap();
        CapabilityFactory::from_config(&cfg).unwrap()
    }

    #[test]
    fn test_backend_selection_table_driven() {
        struct TestCase {
            name: &'static str,
            yaml: &'static str,
            expected: Vec<&'static str>,
        }

        let all_models = vec![
            "visual_qa",
            "object_detector",
            "segmenter",
            "classifier",
            "inpainter",
            "face_detector",
            "list_generator",
        ];
        let test_cases = vec![
            TestCase {
                name: "none",
                yaml: "backend: none\n",
                expected: vec![],
            },
            TestCase {
                name: "none with emoji",
                yaml: "emoji_dir: /opt/emoji\n",
                expected: vec!["emoji_source"],
            },
            TestCase {
                name: "http",
                yaml: "backend: http\nendpoint: http://localhost:8000\n",
                expected: all_models.clone(),
            },
            TestCase {
                name: "scripted",
                yaml: "backend: scripted\n",
                expected: all_models.clone(),
            },
        ];

        for case in test_cases {
            assert_eq!(capabilities(case.yaml).available(), case.expected, "case '{}'", case.name);
        }
    }

    #[test]
    fn test_http_without_endpoint() {
        let cfg: CapabilitiesConfig = serde_yaml::from_str("backend: http\n").unwrap();
        let err = CapabilityFactory::from_config(&cfg).err().unwrap();
        assert!(matches!(err, ConfigError::Backend { backend: "http", .. }));
    }
}
