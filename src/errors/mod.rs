// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod interpreter;

pub use config::ConfigError;
pub use interpreter::{InterpreterError, InterpreterResult};
