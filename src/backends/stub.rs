// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Deterministic capabilities for tests.
//!
//! Every stub records what it was asked so tests can assert on the calls the
//! handlers made, not only on the values they produced.

use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::traits::{
    Capabilities, Classification, Classifier, Detection, EmojiSource, FaceDetector, Inpainter, ListGenerator,
    ObjectDetector, Segment, Segmenter, VisualQa,
};
use crate::value::{Mask, RasterImage, Rect};

/// Answers questions from a fixed script, cycling when it runs out.
pub struct StubVqa {
    answers: Vec<String>,
    questions: Mutex<Vec<String>>,
}

impl StubVqa {
    pub fn new<S: Into<String>>(answers: impl IntoIterator<Item = S>) -> Self {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisualQa for StubVqa {
    async fn answer(&self, _image: &RasterImage, question: &str) -> anyhow::Result<String> {
        let mut questions = self.questions.lock().unwrap();
        let answer = match self.answers.len() {
            0 => String::new(),
            n => self.answers[questions.len() % n].clone(),
        };
        questions.push(question.to_string());
        Ok(answer)
    }
}

/// Returns the same detections for every image.
pub struct StubDetector {
    detections: Vec<Detection>,
    seen: Mutex<Vec<(u32, u32)>>,
}

impl StubDetector {
    /// Unlabelled detections scoring 0.9.
    pub fn new(rects: Vec<Rect>) -> Self {
        Self::with_detections(
            rects
                .into_iter()
                .map(|rect| Detection {
                    rect,
                    label: String::new(),
                    score: 0.9,
                })
                .collect(),
        )
    }

    pub fn with_detections(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Sizes of the images the detector was called with, in call order.
    pub fn seen_sizes(&self) -> Vec<(u32, u32)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectDetector for StubDetector {
    async fn detect(&self, image: &RasterImage, _object: &str) -> anyhow::Result<Vec<Detection>> {
        self.seen.lock().unwrap().push((image.width(), image.height()));
        Ok(self.detections.clone())
    }
}

pub struct StubSegmenter {
    segments: Vec<Segment>,
}

impl StubSegmenter {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

#[async_trait]
impl Segmenter for StubSegmenter {
    async fn segment(&self, _image: &RasterImage) -> anyhow::Result<Vec<Segment>> {
        Ok(self.segments.clone())
    }
}

/// Scores crop `i` with row `i` of a score table (cycling), one column per label.
pub struct StubClassifier {
    rows: Vec<Vec<f32>>,
    calls: AtomicUsize,
    labels: Mutex<Vec<String>>,
}

impl StubClassifier {
    /// Every crop scores 0.5 for every label.
    pub fn new() -> Self {
        Self::with_scores(vec![])
    }

    pub fn with_scores(rows: Vec<Vec<f32>>) -> Self {
        Self {
            rows,
            calls: AtomicUsize::new(0),
            labels: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Labels passed to the most recent call.
    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }
}

impl Default for StubClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for StubClassifier {
    async fn classify(&self, crops: &[RasterImage], labels: &[String]) -> anyhow::Result<Vec<Classification>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.labels.lock().unwrap() = labels.to_vec();
        let classifications = (0..crops.len())
            .map(|i| {
                let scores = match self.rows.len() {
                    0 => vec![0.5; labels.len()],
                    n => self.rows[i % n].clone(),
                };
                let (best, score) = scores
                    .iter()
                    .copied()
                    .enumerate()
                    .fold((0, f32::MIN), |acc, (j, s)| if s > acc.1 { (j, s) } else { acc });
                Classification {
                    label: labels.get(best).cloned().unwrap_or_default(),
                    score,
                    scores,
                }
            })
            .collect();
        Ok(classifications)
    }
}

/// Returns the input image unchanged and records the mask and prompt.
pub struct StubInpainter {
    calls: Mutex<Vec<(Mask, String)>>,
}

impl StubInpainter {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn masks(&self) -> Vec<Mask> {
        self.calls.lock().unwrap().iter().map(|(m, _)| m.clone()).collect()
    }
}

impl Default for StubInpainter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Inpainter for StubInpainter {
    async fn inpaint(&self, image: &RasterImage, mask: &Mask, prompt: &str) -> anyhow::Result<RasterImage> {
        self.calls.lock().unwrap().push((mask.clone(), prompt.to_string()));
        Ok(image.clone())
    }
}

pub struct StubFaceDetector {
    faces: Vec<Rect>,
}

impl StubFaceDetector {
    pub fn new(faces: Vec<Rect>) -> Self {
        Self { faces }
    }
}

#[async_trait]
impl FaceDetector for StubFaceDetector {
    async fn detect_faces(&self, _image: &RasterImage) -> anyhow::Result<Vec<Rect>> {
        Ok(self.faces.clone())
    }
}

/// Returns a fixed list, ignoring `max` so callers' truncation is exercised.
pub struct StubListGenerator {
    items: Vec<String>,
    requests: Mutex<Vec<(String, usize)>>,
}

impl StubListGenerator {
    pub fn new<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListGenerator for StubListGenerator {
    async fn generate(&self, query: &str, max: usize) -> anyhow::Result<Vec<String>> {
        self.requests.lock().unwrap().push((query.to_string(), max));
        Ok(self.items.clone())
    }
}

/// Every emoji is an opaque square of one colour.
pub struct StubEmoji {
    color: [u8; 3],
}

impl StubEmoji {
    pub fn solid(color: [u8; 3]) -> Self {
        Self { color }
    }
}

#[async_trait]
impl EmojiSource for StubEmoji {
    async fn load(&self, _name: &str) -> anyhow::Result<RasterImage> {
        let image = RgbImage::from_pixel(32, 32, Rgb(self.color));
        Ok(RasterImage::new(DynamicImage::ImageRgb8(image)))
    }
}

/// A capability that always fails, for error-path tests.
pub struct FailingCapability {
    pub message: String,
}

impl FailingCapability {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl VisualQa for FailingCapability {
    async fn answer(&self, _image: &RasterImage, _question: &str) -> anyhow::Result<String> {
        anyhow::bail!("{}", self.message)
    }
}

#[async_trait]
impl ObjectDetector for FailingCapability {
    async fn detect(&self, _image: &RasterImage, _object: &str) -> anyhow::Result<Vec<Detection>> {
        anyhow::bail!("{}", self.message)
    }
}

/// Every capability, backed by stubs with small fixed outputs.
pub fn stub_capabilities() -> Capabilities {
    Capabilities::new()
        .with_visual_qa(Arc::new(StubVqa::new(["yes"])))
        .with_object_detector(Arc::new(StubDetector::new(vec![
            Rect::new(0, 0, 10, 10),
            Rect::new(20, 20, 40, 40),
        ])))
        .with_segmenter(Arc::new(StubSegmenter::new(vec![])))
        .with_classifier(Arc::new(StubClassifier::new()))
        .with_inpainter(Arc::new(StubInpainter::new()))
        .with_face_detector(Arc::new(StubFaceDetector::new(vec![Rect::new(10, 10, 20, 20)])))
        .with_list_generator(Arc::new(StubListGenerator::new(["a", "b"])))
        .with_emoji_source(Arc::new(StubEmoji::solid([255, 255, 0])))
}
