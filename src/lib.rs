// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // capability backends
pub mod config;     // config, profiles + registry
pub mod dsl;        // program text parsing
pub mod engine;     // program executor + trace
pub mod errors;     // error handling
pub mod observability;
pub mod state;      // variable environment
pub mod steps;      // opcode handlers
pub mod traits;     // unified abstractions
pub mod utils;
pub mod value;      // runtime values
