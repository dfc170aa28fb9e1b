// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for program execution events.
//!
//! This module contains message types for logging events related to:
//! * Program lifecycle (start, completion)
//! * Step lifecycle (start, completion, failure)

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Program execution started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use visprog::observability::messages::executor::ProgramStarted;
///
/// let msg = ProgramStarted {
///     profile: "nlvr",
///     step_count: 4,
///     inspect: false,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ProgramStarted<'a> {
    pub profile: &'a str,
    pub step_count: usize,
    pub inspect: bool,
}

impl Display for ProgramStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting program with {} profile: {} steps, inspect={}",
            self.profile, self.step_count, self.inspect
        )
    }
}

impl StructuredLog for ProgramStarted<'_> {
    fn log(&self) {
        tracing::info!(
            profile = self.profile,
            step_count = self.step_count,
            inspect = self.inspect,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "program",
            span_name = name,
            profile = self.profile,
            step_count = self.step_count,
        )
    }
}

/// Program execution completed successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ProgramCompleted<'a> {
    pub profile: &'a str,
    pub step_count: usize,
    pub result_kind: &'a str,
    pub duration: Duration,
}

impl Display for ProgramCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Program completed with {} profile: {} steps in {:?}, result is {}",
            self.profile, self.step_count, self.duration, self.result_kind
        )
    }
}

impl StructuredLog for ProgramCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            profile = self.profile,
            step_count = self.step_count,
            result_kind = self.result_kind,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "program_completed",
            span_name = name,
            profile = self.profile,
            step_count = self.step_count,
            duration = ?self.duration,
        )
    }
}

/// A step is about to run.
///
/// # Log Level
/// `debug!` - Per-step detail
pub struct StepStarted<'a> {
    pub index: usize,
    pub opcode: &'a str,
    pub output_var: &'a str,
}

impl Display for StepStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step {} started: {} = {}(...)", self.index, self.output_var, self.opcode)
    }
}

impl StructuredLog for StepStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            index = self.index,
            opcode = self.opcode,
            output_var = self.output_var,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "step",
            span_name = name,
            index = self.index,
            opcode = self.opcode,
            output_var = self.output_var,
        )
    }
}

/// A step finished and its output was bound.
///
/// # Log Level
/// `debug!` - Per-step detail
pub struct StepCompleted<'a> {
    pub index: usize,
    pub opcode: &'a str,
    pub output_var: &'a str,
    pub output_kind: &'a str,
    pub duration: Duration,
}

impl Display for StepCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step {} completed: {} bound to {} by {} in {:?}",
            self.index, self.output_var, self.output_kind, self.opcode, self.duration
        )
    }
}

impl StructuredLog for StepCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            index = self.index,
            opcode = self.opcode,
            output_var = self.output_var,
            output_kind = self.output_kind,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "step_completed",
            span_name = name,
            index = self.index,
            opcode = self.opcode,
            output_var = self.output_var,
        )
    }
}

/// A step failed; the program aborts.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct StepFailed<'a> {
    pub index: usize,
    pub line: &'a str,
    pub kind: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for StepFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step {} failed ({}): {}", self.index, self.kind, self.error)
    }
}

impl StructuredLog for StepFailed<'_> {
    fn log(&self) {
        tracing::error!(
            index = self.index,
            line = self.line,
            kind = self.kind,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "step_failed",
            span_name = name,
            index = self.index,
            kind = self.kind,
            error = %self.error,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_failed_display() {
        let error = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let msg = StepFailed {
            index: 2,
            line: "C=EXISTS(box=B)",
            kind: "undefined_variable",
            error: &error,
        };
        assert_eq!(msg.to_string(), "Step 2 failed (undefined_variable): boom");
    }
}
