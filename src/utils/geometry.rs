//! Rectangle arithmetic shared by the localisation and cropping steps.
//!
//! All rectangles use exclusive `x2`/`y2`, so the half of a 100 px wide image
//! right of centre is `[50, 0, 100, h]`.

use crate::value::Rect;

/// Which half of an image (or which side of a box's centre line) to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    /// Spatial keyword used as a LOC object name.
    pub fn from_keyword(keyword: &str) -> Option<Side> {
        match keyword {
            "TOP" => Some(Side::Top),
            "BOTTOM" => Some(Side::Bottom),
            "LEFT" => Some(Side::Left),
            "RIGHT" => Some(Side::Right),
            _ => None,
        }
    }
}

/// The half of a `width x height` image on `side`.
pub fn half(side: Side, width: u32, height: u32) -> Rect {
    match side {
        Side::Top => Rect::new(0, 0, width, height / 2),
        Side::Bottom => Rect::new(0, height / 2, width, height),
        Side::Left => Rect::new(0, 0, width / 2, height),
        Side::Right => Rect::new(width / 2, 0, width, height),
    }
}

/// The part of the image on `side` of the box's centre line.
pub fn beside(rect: &Rect, side: Side, width: u32, height: u32) -> Rect {
    let (cx, cy) = rect.center();
    let r = match side {
        Side::Top => Rect::new(0, 0, width, cy),
        Side::Bottom => Rect::new(0, cy, width, height),
        Side::Left => Rect::new(0, 0, cx, height),
        Side::Right => Rect::new(cx, 0, width, height),
    };
    r.clamp_to(width, height)
}

/// Grow a box by `factor` around its centre, clamped to the image.
pub fn expand(rect: &Rect, factor: f32, width: u32, height: u32) -> Rect {
    let dw = (factor * rect.width() as f32 / 2.0) as i64;
    let dh = (factor * rect.height() as f32 / 2.0) as i64;
    let (cx, cy) = rect.center();
    let (cx, cy) = (cx as i64, cy as i64);
    let clamp = |v: i64, max: u32| v.clamp(0, max as i64) as u32;
    Rect::new(
        clamp(cx - dw, width),
        clamp(cy - dh, height),
        clamp(cx + dw, width),
        clamp(cy + dh, height),
    )
}

/// Greedy non-maximum suppression.
///
/// `boxes` must already be sorted by descending score. Returns the indices of the
/// kept boxes, in order; a box is dropped when its IoU with an already kept box
/// exceeds `iou_threshold`.
pub fn nms(boxes: &[Rect], iou_threshold: f32) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::new();
    for (i, candidate) in boxes.iter().enumerate() {
        if kept.iter().all(|&k| boxes[k].iou(candidate) <= iou_threshold) {
            kept.push(i);
        }
    }
    kept
}
