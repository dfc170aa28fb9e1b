// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The visual-program language: lexer, step parser, and the EVAL expression language.
//!
//! A program is a list of lines, each of the form
//!
//! ```text
//! BOX0=FIND(image=LEFT,object="dog")
//! ANSWER0=COUNT(box=BOX0)
//! FINAL_ANSWER=RESULT(var=ANSWER0)
//! ```
//!
//! There is no control flow; lines run strictly in order.

pub mod expr;
pub mod lexer;
pub mod parser;
pub mod step;

pub use expr::{evaluate, truthy};
pub use parser::{parse_step, parse_step_header};
pub use step::{ArgExpr, Literal, Step, StepHeader};

/// A program split into its executable lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    lines: Vec<String>,
}

impl Program {
    /// Split program text into non-empty, trimmed lines.
    ///
    /// A surrounding Markdown code fence (as language models like to emit) is
    /// stripped, including an optional language tag on the opening fence.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("```"))
            .map(str::to_string)
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&str> for Program {
    fn from(text: &str) -> Self {
        Program::from_text(text)
    }
}
