// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-step execution trace.
//!
//! When a program runs with `inspect` enabled, every executed step contributes one
//! [`TraceFragment`]. Fragments are plain data; rendering them as text or HTML is a
//! convenience, not a stable format.

use serde::Serialize;
use std::fmt;

use crate::dsl::Step;
use crate::value::Value;

/// Record of one executed step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceFragment {
    /// Zero-based position of the step in the program.
    pub index: usize,
    pub output_var: String,
    pub opcode: String,
    /// Argument names with their source text.
    pub inputs: Vec<(String, String)>,
    /// Rendered output value.
    pub output: String,
}

impl TraceFragment {
    /// Fragment built from the step's own argument text and its output.
    pub fn from_step(step: &Step, output: &Value) -> Self {
        Self {
            index: 0,
            output_var: step.output_var.clone(),
            opcode: step.opcode.clone(),
            inputs: step
                .args
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
            output: output.to_string(),
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Replace the rendered output, e.g. with a summary of an edited image.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    pub fn to_html(&self) -> String {
        let args: Vec<String> = self
            .inputs
            .iter()
            .map(|(k, v)| format!("{}={}", colored(k, "darkorange"), escape(v)))
            .collect();
        format!(
            "<div>{}={}({})={}</div>",
            colored(&self.output_var, "blue"),
            colored(&self.opcode, "red"),
            args.join(","),
            colored(&self.output, "green"),
        )
    }
}

impl fmt::Display for TraceFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.inputs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(
            f,
            "{}={}({})={}",
            self.output_var,
            self.opcode,
            args.join(","),
            self.output
        )
    }
}

/// Ordered fragments of one program run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trace {
    fragments: Vec<TraceFragment>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: TraceFragment) {
        self.fragments.push(fragment);
    }

    pub fn fragments(&self) -> &[TraceFragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn to_html(&self) -> String {
        self.fragments
            .iter()
            .map(TraceFragment::to_html)
            .collect::<Vec<_>>()
            .join("<hr>")
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.fragments {
            writeln!(f, "{}", fragment)?;
        }
        Ok(())
    }
}

fn colored(content: &str, color: &str) -> String {
    format!("<b><span style=\"color: {}\">{}</span></b>", color, escape(content))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
