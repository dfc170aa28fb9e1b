// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::backends::CapabilityFactory;
use crate::config::{build_registry, Config};
use crate::engine::SequentialExecutor;
use crate::errors::ConfigError;
use crate::state::StateEnv;
use crate::traits::ProgramExecutor;

/// Runtime builder - turns a configuration into an executor and an initial state.
///
/// The `RuntimeBuilder` creates the capability set for the configured backend,
/// builds the profile's handler registry on top of it and prepares a state
/// holding the configured image bindings. Images are bound by path and decoded
/// only when a step first reads them.
///
/// # Examples
///
/// ```
/// use visprog::config::RuntimeBuilder;
///
/// let config: visprog::config::Config = serde_yaml::from_str(
///     "profile: nlvr\nbase_image: LEFT\nimages:\n  LEFT: left.png\ncapabilities:\n  backend: scripted\n",
/// ).unwrap();
///
/// let (executor, state) = RuntimeBuilder::from_config(&config).unwrap();
/// assert_eq!(state.base_image(), Some("LEFT"));
/// assert!(state.contains("LEFT"));
/// # let _ = executor;
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build the executor and initial state for `cfg`.
    ///
    /// Fails when the backend cannot be created or when the profile needs a
    /// capability the backend does not provide.
    pub fn from_config(cfg: &Config) -> Result<(Box<dyn ProgramExecutor>, StateEnv), ConfigError> {
        let caps = CapabilityFactory::from_config(&cfg.capabilities)?;
        let options = cfg.loc.handler_options(cfg.profile);
        let registry = build_registry(cfg.profile.name(), &caps, Some(options))?;
        let executor: Box<dyn ProgramExecutor> = Box::new(SequentialExecutor::new(Arc::new(registry)));

        Ok((executor, Self::initial_state(cfg)))
    }

    /// State holding the configured image paths and base image.
    pub fn initial_state(cfg: &Config) -> StateEnv {
        let mut state = StateEnv::new();
        for (name, path) in &cfg.images {
            state.bind_path(name.clone(), path.clone());
        }
        state.set_base_image(cfg.base_image.clone());
        state
    }
}
