// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for external capability calls and image I/O.
//!
//! This module contains message types for logging events related to:
//! * Requests to model backends and their failures
//! * Image files loaded into program state

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;
use tracing::Span;

/// A request to a capability backend completed.
///
/// # Log Level
/// `debug!` - Backend detail
pub struct CapabilityCallCompleted<'a> {
    pub capability: &'a str,
    pub backend: &'a str,
    pub duration: Duration,
}

impl Display for CapabilityCallCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} call to {} backend completed in {:?}",
            self.capability, self.backend, self.duration
        )
    }
}

impl StructuredLog for CapabilityCallCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            capability = self.capability,
            backend = self.backend,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "capability_call",
            span_name = name,
            capability = self.capability,
            backend = self.backend,
        )
    }
}

/// A request to a capability backend failed.
///
/// # Log Level
/// `warn!` - The step fails; the caller decides whether to continue
///
/// # Example
/// ```
/// use visprog::observability::messages::capability::CapabilityCallFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "connection refused");
/// let msg = CapabilityCallFailed {
///     capability: "visual_qa",
///     backend: "http",
///     error: &error,
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct CapabilityCallFailed<'a> {
    pub capability: &'a str,
    pub backend: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for CapabilityCallFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} call to {} backend failed: {}",
            self.capability, self.backend, self.error
        )
    }
}

impl StructuredLog for CapabilityCallFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            capability = self.capability,
            backend = self.backend,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "capability_call_failed",
            span_name = name,
            capability = self.capability,
            backend = self.backend,
            error = %self.error,
        )
    }
}

/// An image file was loaded (lazy load or literal path argument).
///
/// # Log Level
/// `debug!` - I/O detail
pub struct ImageLoaded<'a> {
    pub path: &'a Path,
    pub width: u32,
    pub height: u32,
}

impl Display for ImageLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded image '{}' ({}x{})",
            self.path.display(),
            self.width,
            self.height
        )
    }
}

impl StructuredLog for ImageLoaded<'_> {
    fn log(&self) {
        tracing::debug!(
            path = %self.path.display(),
            width = self.width,
            height = self.height,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "image_loaded",
            span_name = name,
            path = %self.path.display(),
        )
    }
}
