// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human-readable output and
//! [`StructuredLog`] to emit itself as a `tracing` event (or open a span) with
//! its fields attached as structured key/value pairs.
//!
//! # Organization
//!
//! * `executor` - program and step lifecycle events
//! * `registry` - handler registration and registry builds
//! * `capability` - external model calls and image loading

use tracing::Span;

pub mod capability;
pub mod executor;
pub mod registry;

/// A log message that knows its own level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a `tracing` event at the message's level.
    fn log(&self);

    /// Create a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
