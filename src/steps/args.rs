// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Argument shapes shared by the opcode handlers and the rules that resolve them
//! against the state environment.

use std::path::PathBuf;

use crate::dsl::{ArgExpr, Literal, Step};
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::{load_image, StateEnv};
use crate::value::{RasterImage, Region, Scalar, Value};

/// Reference to an image-valued argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageRef {
    /// A state variable; path values are loaded and rebound on first use.
    Var(String),
    /// A literal path; loaded on every use and never bound.
    Path(PathBuf),
}

impl ImageRef {
    pub fn from_step(step: &Step, names: &[&str]) -> InterpreterResult<Self> {
        match step.arg_any(names)? {
            ArgExpr::Var(name) => Ok(ImageRef::Var(name.clone())),
            ArgExpr::Literal(Literal::Str(path)) => Ok(ImageRef::Path(PathBuf::from(path))),
            other => Err(InterpreterError::type_mismatch(
                step.opcode.clone(),
                "an image variable or path",
                format!("'{}'", other),
            )),
        }
    }

    pub fn var(&self) -> Option<&str> {
        match self {
            ImageRef::Var(name) => Some(name),
            ImageRef::Path(_) => None,
        }
    }
}

/// An image-or-regions argument after resolution.
#[derive(Debug, Clone)]
pub enum Visual {
    Image {
        image: RasterImage,
        /// Variable the image is bound to, if any.
        var: Option<String>,
    },
    Regions(Vec<Region>),
}

/// Resolve an image-or-regions argument.
///
/// Images are used directly, paths and strings are loaded (and memoized when they
/// come from a variable), region lists and single regions are returned as regions.
/// Any other value is a type mismatch.
pub fn resolve_visual(state: &mut StateEnv, opcode: &str, image: &ImageRef) -> InterpreterResult<Visual> {
    let name = match image {
        ImageRef::Path(path) => {
            return Ok(Visual::Image {
                image: load_image(path)?,
                var: None,
            })
        }
        ImageRef::Var(name) => name,
    };
    match state.require(name)? {
        Value::Regions(regions) => return Ok(Visual::Regions(regions.clone())),
        Value::Region(region) => return Ok(Visual::Regions(vec![region.clone()])),
        Value::Image(_) | Value::Path(_) | Value::Scalar(Scalar::Str(_)) => {}
        other => return Err(InterpreterError::type_mismatch(opcode, "an image or region list", other.kind())),
    }
    Ok(Visual::Image {
        image: state.resolve_image(opcode, name)?,
        var: Some(name.clone()),
    })
}

/// Resolve an argument that must be an image.
pub fn resolve_image(state: &mut StateEnv, opcode: &str, image: &ImageRef) -> InterpreterResult<(RasterImage, Option<String>)> {
    match image {
        ImageRef::Path(path) => Ok((load_image(path)?, None)),
        ImageRef::Var(name) => Ok((state.resolve_image(opcode, name)?, Some(name.clone()))),
    }
}

/// Text argument such as an object name, a question, or a prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum TextArg {
    Literal(String),
    /// Bare identifier: the bound scalar's text if bound, else the identifier itself.
    Var(String),
}

impl TextArg {
    pub fn from_step(step: &Step, name: &str) -> InterpreterResult<Self> {
        Ok(Self::from_expr(step.arg(name)?))
    }

    pub fn from_expr(expr: &ArgExpr) -> Self {
        match expr {
            ArgExpr::Literal(Literal::Str(s)) => TextArg::Literal(s.clone()),
            ArgExpr::Var(name) => TextArg::Var(name.clone()),
            other => TextArg::Literal(other.to_string()),
        }
    }

    pub fn resolve(&self, state: &StateEnv) -> String {
        match self {
            TextArg::Literal(s) => s.clone(),
            TextArg::Var(name) => match state.get(name) {
                Some(Value::Scalar(s)) => s.to_string(),
                _ => name.clone(),
            },
        }
    }
}

/// Any argument value: literals evaluate to themselves, variables must be bound.
pub fn resolve_value(state: &StateEnv, expr: &ArgExpr) -> InterpreterResult<Value> {
    match expr {
        ArgExpr::Literal(lit) => Ok(lit.to_value()),
        ArgExpr::Var(name) => state.require(name).cloned(),
        ArgExpr::List(items) => Ok(Value::List(items.iter().filter_map(Literal::to_scalar).collect())),
        ArgExpr::Raw(text) => Ok(Value::from(text.as_str())),
    }
}

/// Resolve a region-list argument; a single region becomes a one-element list.
pub fn resolve_regions(state: &StateEnv, opcode: &str, name: &str) -> InterpreterResult<Vec<Region>> {
    match state.require(name)? {
        Value::Regions(regions) => Ok(regions.clone()),
        Value::Region(region) => Ok(vec![region.clone()]),
        other => Err(InterpreterError::type_mismatch(opcode, "a region list", other.kind())),
    }
}

/// Name of the variable a region-list argument refers to.
pub fn region_var(step: &Step, names: &[&str]) -> InterpreterResult<String> {
    match step.arg_any(names)? {
        ArgExpr::Var(name) => Ok(name.clone()),
        other => Err(InterpreterError::type_mismatch(
            step.opcode.clone(),
            "a region variable",
            format!("'{}'", other),
        )),
    }
}

/// Optional string-list argument such as `['cat','dog']`, `"cat,dog"`, or a
/// variable bound to a list.
#[derive(Debug, Clone, PartialEq)]
pub enum ListArg {
    Items(Vec<String>),
    Var(String),
}

impl ListArg {
    pub fn from_expr(expr: &ArgExpr) -> Self {
        match expr {
            ArgExpr::Var(name) => ListArg::Var(name.clone()),
            ArgExpr::List(items) => ListArg::Items(
                items
                    .iter()
                    .filter_map(Literal::to_scalar)
                    .map(|s| s.to_string())
                    .collect(),
            ),
            ArgExpr::Literal(Literal::Str(s)) => ListArg::Items(split_list(s)),
            other => ListArg::Items(vec![other.to_string()]),
        }
    }

    pub fn resolve(&self, state: &StateEnv, opcode: &str) -> InterpreterResult<Vec<String>> {
        match self {
            ListArg::Items(items) => Ok(items.clone()),
            ListArg::Var(name) => match state.require(name)? {
                Value::List(items) => Ok(items.iter().map(|s| s.to_string()).collect()),
                Value::Scalar(Scalar::Str(s)) => Ok(split_list(s)),
                other => Err(InterpreterError::type_mismatch(opcode, "a list of strings", other.kind())),
            },
        }
    }
}

/// Split a comma-separated string into trimmed, non-empty items.
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
