// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Run-time values a program variable can hold.
//!
//! [`Value`] is the tagged union threaded through the state environment. The only
//! sanctioned re-typing of a variable is the lazy-load transition from a
//! [`Value::Path`] (or a string [`Scalar`]) to a [`Value::Image`], performed by
//! [`StateEnv::resolve_image`](crate::state::StateEnv::resolve_image).

mod region;

pub use region::{Mask, Rect, Region};

use image::DynamicImage;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// In-memory raster image, cheap to clone.
#[derive(Clone)]
pub struct RasterImage(pub Arc<DynamicImage>);

impl RasterImage {
    pub fn new(image: DynamicImage) -> Self {
        Self(Arc::new(image))
    }

    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_image(&self) -> &DynamicImage {
        &self.0
    }
}

impl From<DynamicImage> for RasterImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

impl fmt::Debug for RasterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RasterImage({}x{})", self.width(), self.height())
    }
}

impl PartialEq for RasterImage {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.width() == other.width()
                && self.height() == other.height()
                && self.0.color() == other.0.color()
                && self.0.as_bytes() == other.0.as_bytes())
    }
}

impl Serialize for RasterImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("RasterImage", 2)?;
        s.serialize_field("width", &self.width())?;
        s.serialize_field("height", &self.height())?;
        s.end()
    }
}

/// Scalar program value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    /// Numeric view of the scalar; booleans and strings are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Scalar::Int(i)
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Str(s)
    }
}

/// Tagged union of everything a program variable can hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Loaded raster image.
    Image(RasterImage),
    /// Image file not yet loaded.
    Path(PathBuf),
    /// Ordered list of regions, all in the frame of some base image.
    Regions(Vec<Region>),
    Region(Region),
    Scalar(Scalar),
    List(Vec<Scalar>),
    /// Null/empty sentinel.
    Null,
}

impl Value {
    /// Short name of the variant, used in type-mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Image(_) => "image",
            Value::Path(_) => "image path",
            Value::Regions(_) => "region list",
            Value::Region(_) => "region",
            Value::Scalar(Scalar::Bool(_)) => "boolean",
            Value::Scalar(Scalar::Int(_)) | Value::Scalar(Scalar::Float(_)) => "number",
            Value::Scalar(Scalar::Str(_)) => "string",
            Value::List(_) => "list",
            Value::Null => "null",
        }
    }

    pub fn image(image: DynamicImage) -> Self {
        Value::Image(RasterImage::new(image))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_regions(&self) -> Option<&[Region]> {
        match self {
            Value::Regions(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&RasterImage> {
        match self {
            Value::Image(img) => Some(img),
            _ => None,
        }
    }

    /// True for the values RESULT refuses to return: `Null` and blank strings.
    pub fn is_empty_sentinel(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Scalar(Scalar::Str(s)) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Int(i))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::Str(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::Str(s))
    }
}

impl From<Vec<Region>> for Value {
    fn from(regions: Vec<Region>) -> Self {
        Value::Regions(regions)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Image(img) => write!(f, "<image {}x{}>", img.width(), img.height()),
            Value::Path(p) => write!(f, "<path {}>", p.display()),
            Value::Regions(regions) => {
                write!(f, "[")?;
                for (i, r) in regions.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match &r.category {
                        Some(c) => write!(f, "{}:{}", c, r.rect)?,
                        None => write!(f, "{}", r.rect)?,
                    }
                }
                write!(f, "]")
            }
            Value::Region(r) => write!(f, "{}", r.rect),
            Value::Scalar(s) => write!(f, "{}", s),
            Value::List(items) => {
                let items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Null => write!(f, "None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(Value::from(3i64).kind(), "number");
        assert_eq!(Value::from("x").kind(), "string");
        assert_eq!(Value::Regions(vec![]).kind(), "region list");
        assert_eq!(Value::Null.kind(), "null");
    }

    #[test]
    fn test_empty_sentinel() {
        assert!(Value::Null.is_empty_sentinel());
        assert!(Value::from("  ").is_empty_sentinel());
        assert!(!Value::from("no").is_empty_sentinel());
        assert!(!Value::Regions(vec![]).is_empty_sentinel());
        assert!(!Value::from(false).is_empty_sentinel());
    }

    #[test]
    fn test_display_regions() {
        let v = Value::Regions(vec![
            Region::new(Rect::new(0, 0, 5, 5)).with_category("cat"),
            Region::new(Rect::new(1, 1, 2, 2)),
        ]);
        assert_eq!(v.to_string(), "[cat:[0, 0, 5, 5], [1, 1, 2, 2]]");
    }

    #[test]
    fn test_raster_image_equality_by_content() {
        let a = RasterImage::new(DynamicImage::new_rgb8(4, 4));
        let b = RasterImage::new(DynamicImage::new_rgb8(4, 4));
        let c = RasterImage::new(DynamicImage::new_rgb8(4, 5));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_scalar_serializes_untagged() {
        let json = serde_json::to_string(&Value::from(true)).unwrap();
        assert_eq!(json, r#"{"type":"scalar","value":true}"#);
    }
}
