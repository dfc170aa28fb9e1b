// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout the interpreter. Message types follow a struct-based pattern
//! with a `Display` implementation so log text lives in one place instead of as
//! format strings scattered through the code.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::executor` - program and step lifecycle events
//! * `messages::registry` - handler registration and registry builds
//! * `messages::capability` - external model calls and image loading
//!
//! # Usage
//!
//! ```rust
//! use visprog::observability::messages::{executor::StepStarted, StructuredLog};
//!
//! let msg = StepStarted {
//!     index: 0,
//!     opcode: "FIND",
//!     output_var: "BOX0",
//! };
//!
//! msg.log();
//! ```
//!
//! Subscriber installation is left to the binary; the library only emits events.

pub mod messages;
