// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;

use crate::errors::InterpreterError;
use crate::value::{Scalar, Value};

/// Literal argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    None,
}

impl Literal {
    pub fn to_scalar(&self) -> Option<Scalar> {
        match self {
            Literal::Str(s) => Some(Scalar::Str(s.clone())),
            Literal::Int(i) => Some(Scalar::Int(*i)),
            Literal::Float(f) => Some(Scalar::Float(*f)),
            Literal::Bool(b) => Some(Scalar::Bool(*b)),
            Literal::None => None,
        }
    }

    pub fn to_value(&self) -> Value {
        self.to_scalar().map(Value::Scalar).unwrap_or(Value::Null)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "{:?}", s),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{}", x),
            Literal::Bool(true) => write!(f, "True"),
            Literal::Bool(false) => write!(f, "False"),
            Literal::None => write!(f, "None"),
        }
    }
}

/// Argument expression of a step, as written in the program text.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgExpr {
    Literal(Literal),
    /// Bare identifier, resolved against the state at execution time.
    Var(String),
    List(Vec<Literal>),
    /// Unrecognised expression, kept verbatim.
    Raw(String),
}

impl ArgExpr {
    pub fn as_var(&self) -> Option<&str> {
        match self {
            ArgExpr::Var(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ArgExpr::Literal(Literal::None))
    }
}

impl fmt::Display for ArgExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgExpr::Literal(l) => write!(f, "{}", l),
            ArgExpr::Var(name) => write!(f, "{}", name),
            ArgExpr::List(items) => {
                let items: Vec<String> = items.iter().map(|l| l.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            ArgExpr::Raw(text) => write!(f, "{}", text),
        }
    }
}

/// Result of a partial parse: enough to pick a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepHeader {
    pub output_var: String,
    pub opcode: String,
}

/// One parsed program line: `output_var = OPCODE(key=expr, ...)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub output_var: String,
    pub opcode: String,
    /// Keyword arguments in source order.
    pub args: Vec<(String, ArgExpr)>,
    /// Original line text, kept for diagnostics.
    pub line: String,
}

impl Step {
    pub fn get(&self, name: &str) -> Option<&ArgExpr> {
        self.args.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Required keyword argument.
    pub fn arg(&self, name: &str) -> Result<&ArgExpr, InterpreterError> {
        self.get(name).ok_or_else(|| InterpreterError::MissingArgument {
            opcode: self.opcode.clone(),
            name: name.to_string(),
            line: self.line.clone(),
        })
    }

    /// First of several accepted spellings of a required argument.
    pub fn arg_any(&self, names: &[&str]) -> Result<&ArgExpr, InterpreterError> {
        names
            .iter()
            .find_map(|n| self.get(n))
            .ok_or_else(|| InterpreterError::MissingArgument {
                opcode: self.opcode.clone(),
                name: names.join("|"),
                line: self.line.clone(),
            })
    }

    /// Optional argument; an explicit `None` literal counts as absent.
    pub fn optional(&self, name: &str) -> Option<&ArgExpr> {
        self.get(name).filter(|a| !a.is_none())
    }

    pub fn header(&self) -> StepHeader {
        StepHeader {
            output_var: self.output_var.clone(),
            opcode: self.opcode.clone(),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self.args.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}={}({})", self.output_var, self.opcode, args.join(","))
    }
}
