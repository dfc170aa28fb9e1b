// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The state environment shared by every step of a program run.
//!
//! `StateEnv` maps variable names to [`Value`]s. It is created by the caller
//! (usually pre-populated with named images or image paths), threaded through the
//! executor by `&mut` reference, and handed back afterwards. Any step may read any
//! bound variable and overwrite any binding.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use image::DynamicImage;

use crate::config::consts::BASE_IMAGE_CANDIDATES;
use crate::errors::{InterpreterError, InterpreterResult};
use crate::observability::messages::{capability::ImageLoaded, StructuredLog};
use crate::value::{RasterImage, Region, Scalar, Value};

/// Mutable variable space for one program execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateEnv {
    vars: BTreeMap<String, Value>,
    base_image: Option<String>,
}

impl StateEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the variable that holds the image regions are cropped from when a
    /// region does not record its own source.
    pub fn with_base_image(mut self, name: impl Into<String>) -> Self {
        self.base_image = Some(name.into());
        self
    }

    pub fn set_base_image(&mut self, name: Option<String>) {
        self.base_image = name;
    }

    pub fn base_image(&self) -> Option<&str> {
        self.base_image.as_deref()
    }

    /// Bind a value, replacing (and possibly re-typing) any previous binding.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Builder form of [`bind`](Self::bind).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bind(name, value);
        self
    }

    /// Bind an image path for lazy loading.
    pub fn bind_path(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.vars.insert(name.into(), Value::Path(path.into()));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Like [`get`](Self::get) but unbound names are an error.
    pub fn require(&self, name: &str) -> InterpreterResult<&Value> {
        self.vars
            .get(name)
            .ok_or_else(|| InterpreterError::UndefinedVariable(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Bindings in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    /// Resolve a variable to an image.
    ///
    /// A bound image is returned as is. A bound path (or string) is loaded and the
    /// loaded image is rebound under the same name, so later steps reuse it.
    pub fn resolve_image(&mut self, opcode: &str, name: &str) -> InterpreterResult<RasterImage> {
        let path = match self.require(name)? {
            Value::Image(image) => return Ok(image.clone()),
            Value::Path(path) => path.clone(),
            Value::Scalar(Scalar::Str(path)) => PathBuf::from(path),
            other => return Err(InterpreterError::type_mismatch(opcode, "an image", other.kind())),
        };
        let image = load_image(&path)?;
        self.vars.insert(name.to_string(), Value::Image(image.clone()));
        Ok(image)
    }

    /// Find the image a region's rectangle is expressed in.
    ///
    /// Tries the region's recorded source, then the explicit base image, then
    /// the conventional names in order. Returns the variable name alongside the image.
    pub fn frame_image(&mut self, opcode: &str, region: Option<&Region>) -> InterpreterResult<(String, RasterImage)> {
        let recorded = region
            .and_then(|r| r.source.clone())
            .filter(|name| self.contains(name));
        let name = recorded
            .or_else(|| self.base_image.clone().filter(|name| self.contains(name)))
            .or_else(|| {
                BASE_IMAGE_CANDIDATES
                    .iter()
                    .find(|name| self.contains(name))
                    .map(|name| name.to_string())
            })
            .ok_or_else(|| InterpreterError::NoBaseImage {
                opcode: opcode.to_string(),
            })?;
        let image = self.resolve_image(opcode, &name)?;
        Ok((name, image))
    }
}

/// Load an image file, converted to RGB.
pub fn load_image(path: &Path) -> InterpreterResult<RasterImage> {
    let image = image::open(path).map_err(|source| InterpreterError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    let image = DynamicImage::ImageRgb8(image.to_rgb8());
    ImageLoaded {
        path,
        width: image.width(),
        height: image.height(),
    }
    .log();
    Ok(RasterImage::new(image))
}
