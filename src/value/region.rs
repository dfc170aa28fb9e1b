// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use image::GrayImage;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Axis-aligned rectangle in pixel coordinates.
///
/// `x2`/`y2` are exclusive when cropping, so a rectangle of `(10,10,50,50)`
/// crops a 40x40 image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct Rect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Rect {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Shift the rectangle by an offset, e.g. from crop frame back into base frame.
    pub fn translate(&self, dx: u32, dy: u32) -> Self {
        Self {
            x1: self.x1 + dx,
            y1: self.y1 + dy,
            x2: self.x2 + dx,
            y2: self.y2 + dy,
        }
    }

    /// Clamp to an image of the given size.
    pub fn clamp_to(&self, width: u32, height: u32) -> Self {
        let x1 = self.x1.min(width);
        let y1 = self.y1.min(height);
        Self {
            x1,
            y1,
            x2: self.x2.clamp(x1, width),
            y2: self.y2.clamp(y1, height),
        }
    }

    pub fn center(&self) -> (u32, u32) {
        let mid = |a: u32, b: u32| ((a as u64 + b as u64) / 2) as u32;
        (mid(self.x1, self.x2), mid(self.y1, self.y2))
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);
        (x1 < x2 && y1 < y2).then_some(Rect { x1, y1, x2, y2 })
    }

    /// Intersection over union; zero for disjoint or degenerate rectangles.
    pub fn iou(&self, other: &Rect) -> f32 {
        let inter = self.intersection(other).map(|r| r.area()).unwrap_or(0);
        let union = self.area() + other.area() - inter;
        if union == 0 {
            0.0
        } else {
            inter as f32 / union as f32
        }
    }
}

impl From<[u32; 4]> for Rect {
    fn from(b: [u32; 4]) -> Self {
        Rect::new(b[0], b[1], b[2], b[3])
    }
}

impl From<Rect> for [u32; 4] {
    fn from(r: Rect) -> Self {
        [r.x1, r.y1, r.x2, r.y2]
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.x1, self.y1, self.x2, self.y2)
    }
}

/// Per-pixel mask (0 = outside, 255 = inside) in the base image's frame.
#[derive(Clone)]
pub struct Mask(pub Arc<GrayImage>);

impl Mask {
    pub fn new(mask: GrayImage) -> Self {
        Self(Arc::new(mask))
    }

    /// A mask covering exactly `rect` inside an image of the given size.
    pub fn from_rect(rect: &Rect, width: u32, height: u32) -> Self {
        let rect = rect.clamp_to(width, height);
        let mut mask = GrayImage::new(width, height);
        for y in rect.y1..rect.y2 {
            for x in rect.x1..rect.x2 {
                mask.put_pixel(x, y, image::Luma([255]));
            }
        }
        Self::new(mask)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.dimensions();
        write!(f, "Mask({}x{})", w, h)
    }
}

impl PartialEq for Mask {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.dimensions() == other.dimensions() && self.0.as_raw() == other.0.as_raw())
    }
}

impl Serialize for Mask {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (w, h) = self.dimensions();
        serializer.serialize_str(&format!("mask {}x{}", w, h))
    }
}

/// A detected or derived sub-area of an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Region {
    #[serde(rename = "box")]
    pub rect: Rect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<Mask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_score: Option<f32>,
    /// State variable holding the image this rectangle's frame belongs to.
    #[serde(skip)]
    pub source: Option<String>,
}

impl Region {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            category: None,
            score: None,
            mask: None,
            class: None,
            class_score: None,
            source: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }
}
