// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for parsing and executing visual programs.
//!
//! Every failure inside the interpreter core surfaces as an [`InterpreterError`].
//! The core never retries: the first error aborts the whole program and is handed
//! back to the caller, who decides whether to continue with the next program.

use std::path::PathBuf;
use thiserror::Error;

/// Comprehensive error type for the interpreter core.
///
/// Variants map onto the failure classes of a program run:
/// - malformed program text (`Parse`, `MissingArgument`, `EmptyProgram`)
/// - registry problems (`UnknownOpcode`, `UnknownProfile`, `MissingCapability`)
/// - state problems (`UndefinedVariable`, `TypeMismatch`, `NoBaseImage`, `ImageLoad`)
/// - RESULT contract violations (`NotFound`, `EmptyResult`)
/// - EVAL expression failures (`Eval`)
/// - failures of an injected model or service (`Capability`)
#[derive(Error, Debug)]
pub enum InterpreterError {
    /// The line is not a single assignment of a call expression.
    #[error("Failed to parse step: {reason}\n\nLine: {line}")]
    Parse { line: String, reason: String },

    /// A handler required a keyword argument the step did not provide.
    #[error("[{opcode}] missing required argument '{name}'\n\nLine: {line}")]
    MissingArgument {
        opcode: String,
        name: String,
        line: String,
    },

    /// The program text contained no executable lines.
    #[error("Program contains no steps")]
    EmptyProgram,

    /// The opcode is not part of the active profile.
    #[error("Unknown opcode '{opcode}' for profile '{profile}'")]
    UnknownOpcode { opcode: String, profile: String },

    /// The requested profile name is not defined.
    #[error("Unknown profile '{0}'")]
    UnknownProfile(String),

    /// A handler in the profile needs a capability that was not supplied.
    #[error("[{opcode}] requires the '{capability}' capability, which was not provided")]
    MissingCapability {
        opcode: String,
        capability: &'static str,
    },

    /// A referenced variable is not bound in the state environment.
    #[error("Variable '{0}' is not defined in program state")]
    UndefinedVariable(String),

    /// A value's run-time shape does not satisfy the operation's contract.
    #[error("[{opcode}] expected {expected}, found {found}")]
    TypeMismatch {
        opcode: String,
        expected: &'static str,
        found: String,
    },

    /// No image is available to crop regions from.
    #[error("[{opcode}] no base image found in program state for region cropping")]
    NoBaseImage { opcode: String },

    /// An image path could not be opened or decoded.
    #[error("Could not load image from path '{}': {source}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// RESULT referenced a variable that is not bound.
    #[error("[RESULT] Variable '{0}' not found in state")]
    NotFound(String),

    /// RESULT referenced a variable bound to the null/empty sentinel.
    #[error("[RESULT] Variable '{0}' contains an empty value")]
    EmptyResult(String),

    /// An EVAL expression could not be parsed or evaluated.
    #[error("[EVAL] cannot evaluate '{expr}': {reason}")]
    Eval { expr: String, reason: String },

    /// The wrapped external model/service call failed.
    #[error("[{opcode}] {capability} capability failed: {source}")]
    Capability {
        opcode: String,
        capability: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl InterpreterError {
    pub fn parse(line: impl Into<String>, reason: impl Into<String>) -> Self {
        InterpreterError::Parse {
            line: line.into(),
            reason: reason.into(),
        }
    }

    pub fn type_mismatch(
        opcode: impl Into<String>,
        expected: &'static str,
        found: impl Into<String>,
    ) -> Self {
        InterpreterError::TypeMismatch {
            opcode: opcode.into(),
            expected,
            found: found.into(),
        }
    }

    pub fn capability(
        opcode: impl Into<String>,
        capability: &'static str,
        source: anyhow::Error,
    ) -> Self {
        InterpreterError::Capability {
            opcode: opcode.into(),
            capability,
            source,
        }
    }

    /// Short, stable name of the error class, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            InterpreterError::Parse { .. } | InterpreterError::MissingArgument { .. } => "parse",
            InterpreterError::EmptyProgram => "empty_program",
            InterpreterError::UnknownOpcode { .. } => "unknown_opcode",
            InterpreterError::UnknownProfile(_) => "unknown_profile",
            InterpreterError::MissingCapability { .. } => "missing_capability",
            InterpreterError::UndefinedVariable(_) => "undefined_variable",
            InterpreterError::TypeMismatch { .. }
            | InterpreterError::NoBaseImage { .. }
            | InterpreterError::ImageLoad { .. } => "type_mismatch",
            InterpreterError::NotFound(_) => "not_found",
            InterpreterError::EmptyResult(_) => "empty_result",
            InterpreterError::Eval { .. } => "eval",
            InterpreterError::Capability { .. } => "capability",
        }
    }
}

/// Result type alias for interpreter operations.
pub type InterpreterResult<T> = Result<T, InterpreterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_includes_line() {
        let err = InterpreterError::parse("v = 5", "right-hand side is not a call");
        let msg = err.to_string();
        assert!(msg.contains("v = 5"));
        assert!(msg.contains("not a call"));
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn test_unknown_opcode_names_profile() {
        let err = InterpreterError::UnknownOpcode {
            opcode: "LOC".to_string(),
            profile: "nlvr".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown opcode 'LOC' for profile 'nlvr'");
    }

    #[test]
    fn test_capability_error_keeps_cause() {
        let err = InterpreterError::capability("VQA", "visual_qa", anyhow::anyhow!("503 Service Unavailable"));
        assert!(err.to_string().contains("503 Service Unavailable"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
