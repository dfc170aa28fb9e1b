// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pixel operations for the cropping and image-editing steps.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use std::io::Cursor;

use crate::value::{Mask, RasterImage, Rect, Region};

/// Crop `rect` (clamped to the image) out of `image`.
pub fn crop(image: &RasterImage, rect: &Rect) -> RasterImage {
    let r = rect.clamp_to(image.width(), image.height());
    RasterImage::new(image.as_image().crop_imm(r.x1, r.y1, r.width(), r.height()))
}

/// Union of the regions' masks, with each region's rectangle standing in for a
/// missing mask. Masks of a different size than the image are ignored.
pub fn mask_union(regions: &[Region], width: u32, height: u32) -> GrayImage {
    let mut union = GrayImage::new(width, height);
    for region in regions {
        let mask = match &region.mask {
            Some(mask) if mask.dimensions() == (width, height) => mask.clone(),
            _ => Mask::from_rect(&region.rect, width, height),
        };
        for (x, y, pixel) in mask.0.enumerate_pixels() {
            if pixel.0[0] > union.get_pixel(x, y).0[0] {
                union.put_pixel(x, y, *pixel);
            }
        }
    }
    union
}

/// Keep colour where the mask is set, grayscale elsewhere.
pub fn color_pop(image: &RasterImage, mask: &GrayImage) -> RasterImage {
    let color = image.as_image().to_rgb8();
    let gray = image.as_image().grayscale().to_rgb8();
    RasterImage::new(DynamicImage::ImageRgb8(blend(&color, &gray, mask)))
}

/// Keep the foreground sharp and blur the background.
///
/// The mask is softened with `mask_sigma` first so the transition is gradual.
pub fn background_blur(image: &RasterImage, mask: &GrayImage, blur_sigma: f32, mask_sigma: f32) -> RasterImage {
    let sharp = image.as_image().to_rgb8();
    let blurred = imageops::blur(&sharp, blur_sigma);
    let soft_mask = imageops::blur(mask, mask_sigma);
    RasterImage::new(DynamicImage::ImageRgb8(blend(&sharp, &blurred, &soft_mask)))
}

/// Per-pixel alpha blend: `mask` 255 takes `fg`, 0 takes `bg`.
fn blend(fg: &RgbImage, bg: &RgbImage, mask: &GrayImage) -> RgbImage {
    let mut out = RgbImage::new(fg.width(), fg.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let alpha = mask.get_pixel_checked(x, y).map(|p| p.0[0]).unwrap_or(0) as u32;
        let f = fg.get_pixel(x, y).0;
        let b = bg.get_pixel(x, y).0;
        let mix = |i: usize| ((f[i] as u32 * alpha + b[i] as u32 * (255 - alpha)) / 255) as u8;
        *pixel = Rgb([mix(0), mix(1), mix(2)]);
    }
    out
}

/// Paste `overlay` centred on each rectangle, scaled to the rectangle's height
/// divided by `scale_divisor`.
pub fn paste_centered(image: &RasterImage, overlay: &RasterImage, rects: &[Rect], scale_divisor: f32) -> RasterImage {
    let mut canvas = image.as_image().to_rgba8();
    for rect in rects {
        let size = (rect.height() as f32 / scale_divisor) as u32;
        if size == 0 {
            continue;
        }
        let scaled = overlay.as_image().resize(size, size, FilterType::Triangle).to_rgba8();
        let (cx, cy) = rect.center();
        let x = cx as i64 - scaled.width() as i64 / 2;
        let y = cy as i64 - scaled.height() as i64 / 2;
        imageops::overlay(&mut canvas, &scaled, x, y);
    }
    RasterImage::new(DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8()))
}

/// Draw rectangle outlines; the first one is highlighted.
pub fn draw_boxes(image: &RasterImage, rects: &[Rect], thickness: u32) -> RasterImage {
    let mut canvas = image.as_image().to_rgb8();
    let (w, h) = canvas.dimensions();
    for (i, rect) in rects.iter().enumerate() {
        let color = if i == 0 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) };
        let r = rect.clamp_to(w, h);
        for y in r.y1..r.y2 {
            for x in r.x1..r.x2 {
                let on_edge = x < r.x1 + thickness
                    || x + thickness >= r.x2
                    || y < r.y1 + thickness
                    || y + thickness >= r.y2;
                if on_edge {
                    canvas.put_pixel(x, y, color);
                }
            }
        }
    }
    RasterImage::new(DynamicImage::ImageRgb8(canvas))
}

/// True where the mask is set (non-zero).
pub fn is_set(mask: &GrayImage, x: u32, y: u32) -> bool {
    mask.get_pixel_checked(x, y).map(|p| p.0[0] > 0).unwrap_or(false)
}

/// Binary mask from any grayscale image: non-zero becomes 255.
pub fn binarize(mask: &GrayImage) -> GrayImage {
    let mut out = mask.clone();
    for pixel in out.pixels_mut() {
        if pixel.0[0] > 0 {
            *pixel = Luma([255]);
        }
    }
    out
}

/// Encode as PNG bytes.
pub fn encode_png(image: &RasterImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    image.as_image().write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
