// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod consts;
mod loader;
mod profile;
mod registry;
mod runtime;

pub use loader::{
    load_and_validate_config, load_config, BackendType, CapabilitiesConfig, Config, LocOptions, ScriptedBox,
    ScriptedConfig,
};
pub use profile::{Opcode, Profile};
pub use registry::{build_registry, HandlerRegistry};
pub use runtime::RuntimeBuilder;
