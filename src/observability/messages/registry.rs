// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for handler registry construction.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A handler was constructed and registered for an opcode.
///
/// # Log Level
/// `debug!` - Construction detail
pub struct HandlerRegistered<'a> {
    pub profile: &'a str,
    pub opcode: &'a str,
}

impl Display for HandlerRegistered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Registered {} handler for profile {}", self.opcode, self.profile)
    }
}

impl StructuredLog for HandlerRegistered<'_> {
    fn log(&self) {
        tracing::debug!(profile = self.profile, opcode = self.opcode, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "handler_registered",
            span_name = name,
            profile = self.profile,
            opcode = self.opcode,
        )
    }
}

/// Registry build finished.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use visprog::observability::messages::registry::RegistryBuilt;
///
/// let msg = RegistryBuilt {
///     profile: "gqa",
///     handler_count: 15,
/// };
///
/// assert_eq!(msg.to_string(), "Built gqa registry with 15 handlers");
/// ```
pub struct RegistryBuilt<'a> {
    pub profile: &'a str,
    pub handler_count: usize,
}

impl Display for RegistryBuilt<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Built {} registry with {} handlers", self.profile, self.handler_count)
    }
}

impl StructuredLog for RegistryBuilt<'_> {
    fn log(&self) {
        tracing::info!(
            profile = self.profile,
            handler_count = self.handler_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "registry",
            span_name = name,
            profile = self.profile,
            handler_count = self.handler_count,
        )
    }
}
