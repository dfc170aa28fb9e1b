// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Capabilities answered from configuration tables instead of models.
//!
//! Useful for demos and for replaying a program whose model outputs are already
//! known. No output depends on image content: a detection table entry is returned
//! as-is for any image, clamped to that image's bounds.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::{ScriptedBox, ScriptedConfig};
use crate::traits::{
    Classification, Classifier, Detection, FaceDetector, Inpainter, ListGenerator, ObjectDetector, Segment, Segmenter,
    VisualQa,
};
use crate::utils::imaging::is_set;
use crate::value::{Mask, RasterImage, Rect};

pub struct ScriptedBackend {
    script: ScriptedConfig,
    classify_calls: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new(script: ScriptedConfig) -> Self {
        Self {
            script,
            classify_calls: AtomicUsize::new(0),
        }
    }
}

fn clamped(rect: &Rect, image: &RasterImage) -> Rect {
    rect.clamp_to(image.width(), image.height())
}

#[async_trait]
impl VisualQa for ScriptedBackend {
    async fn answer(&self, _image: &RasterImage, question: &str) -> anyhow::Result<String> {
        match self.script.answers.get(question.trim()) {
            Some(answer) => Ok(answer.clone()),
            None => self
                .script
                .default_answer
                .clone()
                .ok_or_else(|| anyhow::anyhow!("no scripted answer for '{}'", question)),
        }
    }
}

#[async_trait]
impl ObjectDetector for ScriptedBackend {
    async fn detect(&self, image: &RasterImage, object: &str) -> anyhow::Result<Vec<Detection>> {
        let boxes = self.script.detections.get(object.trim()).map(Vec::as_slice).unwrap_or_default();
        Ok(boxes
            .iter()
            .map(|b: &ScriptedBox| Detection {
                rect: clamped(&b.rect, image),
                label: b.label.clone().unwrap_or_else(|| object.to_string()),
                score: b.score,
            })
            .collect())
    }
}

#[async_trait]
impl Segmenter for ScriptedBackend {
    async fn segment(&self, image: &RasterImage) -> anyhow::Result<Vec<Segment>> {
        let (w, h) = (image.width(), image.height());
        Ok(self
            .script
            .segments
            .iter()
            .map(|b| {
                let rect = b.rect.clamp_to(w, h);
                Segment {
                    mask: Mask::from_rect(&rect, w, h),
                    label: b.label.clone().unwrap_or_default(),
                    rect,
                }
            })
            .collect())
    }
}

#[async_trait]
impl Classifier for ScriptedBackend {
    async fn classify(&self, crops: &[RasterImage], labels: &[String]) -> anyhow::Result<Vec<Classification>> {
        if labels.is_empty() {
            anyhow::bail!("classify called without labels");
        }
        let first = self.classify_calls.fetch_add(crops.len(), Ordering::SeqCst);
        Ok((0..crops.len())
            .map(|i| {
                let wanted = match self.script.classes.len() {
                    0 => None,
                    n => Some(&self.script.classes[(first + i) % n]),
                };
                let best = wanted
                    .and_then(|w| labels.iter().position(|l| l == w))
                    .unwrap_or(0);
                let scores = (0..labels.len()).map(|j| if j == best { 1.0 } else { 0.0 }).collect();
                Classification {
                    label: labels[best].clone(),
                    score: 1.0,
                    scores,
                }
            })
            .collect())
    }
}

/// Paints the masked pixels a flat grey; the prompt is ignored.
#[async_trait]
impl Inpainter for ScriptedBackend {
    async fn inpaint(&self, image: &RasterImage, mask: &Mask, _prompt: &str) -> anyhow::Result<RasterImage> {
        let mut out = image.as_image().to_rgb8();
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            if is_set(&mask.0, x, y) {
                *pixel = image::Rgb([128, 128, 128]);
            }
        }
        Ok(RasterImage::new(image::DynamicImage::ImageRgb8(out)))
    }
}

#[async_trait]
impl FaceDetector for ScriptedBackend {
    async fn detect_faces(&self, image: &RasterImage) -> anyhow::Result<Vec<Rect>> {
        Ok(self.script.faces.iter().map(|r| clamped(r, image)).collect())
    }
}

#[async_trait]
impl ListGenerator for ScriptedBackend {
    async fn generate(&self, query: &str, max: usize) -> anyhow::Result<Vec<String>> {
        let items = self
            .script
            .lists
            .get(query.trim())
            .ok_or_else(|| anyhow::anyhow!("no scripted list for '{}'", query))?;
        Ok(items.iter().take(max).cloned().collect())
    }
}
