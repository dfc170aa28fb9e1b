// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Interfaces to the external models a program can call.
//!
//! The interpreter never implements a model itself. Each capability is an async
//! trait object injected at registry-build time through [`Capabilities`]; a
//! handler whose capability is missing fails the registry build, not the program.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::errors::{InterpreterError, InterpreterResult};
use crate::value::{Mask, RasterImage, Rect};

pub const VISUAL_QA: &str = "visual_qa";
pub const OBJECT_DETECTOR: &str = "object_detector";
pub const SEGMENTER: &str = "segmenter";
pub const CLASSIFIER: &str = "classifier";
pub const INPAINTER: &str = "inpainter";
pub const FACE_DETECTOR: &str = "face_detector";
pub const LIST_GENERATOR: &str = "list_generator";
pub const EMOJI_SOURCE: &str = "emoji_source";

/// One object detection, in the frame of the image passed to the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub rect: Rect,
    pub label: String,
    pub score: f32,
}

/// One segment produced by a panoptic segmenter.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub mask: Mask,
    pub label: String,
    pub rect: Rect,
}

/// Classification of one crop against a label set.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Best label for the crop.
    pub label: String,
    /// Similarity of the best label, in `[0, 1]`.
    pub score: f32,
    /// Similarity for every label, in the order the labels were given.
    pub scores: Vec<f32>,
}

#[async_trait]
pub trait VisualQa: Send + Sync {
    async fn answer(&self, image: &RasterImage, question: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait ObjectDetector: Send + Sync {
    async fn detect(&self, image: &RasterImage, object: &str) -> anyhow::Result<Vec<Detection>>;
}

#[async_trait]
pub trait Segmenter: Send + Sync {
    async fn segment(&self, image: &RasterImage) -> anyhow::Result<Vec<Segment>>;
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Returns one classification per crop, in crop order.
    async fn classify(&self, crops: &[RasterImage], labels: &[String]) -> anyhow::Result<Vec<Classification>>;
}

#[async_trait]
pub trait Inpainter: Send + Sync {
    async fn inpaint(&self, image: &RasterImage, mask: &Mask, prompt: &str) -> anyhow::Result<RasterImage>;
}

#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect_faces(&self, image: &RasterImage) -> anyhow::Result<Vec<Rect>>;
}

#[async_trait]
pub trait ListGenerator: Send + Sync {
    async fn generate(&self, query: &str, max: usize) -> anyhow::Result<Vec<String>>;
}

#[async_trait]
pub trait EmojiSource: Send + Sync {
    async fn load(&self, name: &str) -> anyhow::Result<RasterImage>;
}

/// The set of capability clients available to a registry build.
///
/// # Example
/// ```
/// use visprog::traits::Capabilities;
///
/// let caps = Capabilities::new();
/// assert!(caps.visual_qa("VQA").is_err());
/// ```
#[derive(Clone, Default)]
pub struct Capabilities {
    visual_qa: Option<Arc<dyn VisualQa>>,
    object_detector: Option<Arc<dyn ObjectDetector>>,
    segmenter: Option<Arc<dyn Segmenter>>,
    classifier: Option<Arc<dyn Classifier>>,
    inpainter: Option<Arc<dyn Inpainter>>,
    face_detector: Option<Arc<dyn FaceDetector>>,
    list_generator: Option<Arc<dyn ListGenerator>>,
    emoji_source: Option<Arc<dyn EmojiSource>>,
}

fn require<T: ?Sized>(slot: &Option<Arc<T>>, opcode: &str, capability: &'static str) -> InterpreterResult<Arc<T>> {
    slot.clone().ok_or_else(|| InterpreterError::MissingCapability {
        opcode: opcode.to_string(),
        capability,
    })
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_visual_qa(mut self, c: Arc<dyn VisualQa>) -> Self {
        self.visual_qa = Some(c);
        self
    }

    pub fn with_object_detector(mut self, c: Arc<dyn ObjectDetector>) -> Self {
        self.object_detector = Some(c);
        self
    }

    pub fn with_segmenter(mut self, c: Arc<dyn Segmenter>) -> Self {
        self.segmenter = Some(c);
        self
    }

    pub fn with_classifier(mut self, c: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(c);
        self
    }

    pub fn with_inpainter(mut self, c: Arc<dyn Inpainter>) -> Self {
        self.inpainter = Some(c);
        self
    }

    pub fn with_face_detector(mut self, c: Arc<dyn FaceDetector>) -> Self {
        self.face_detector = Some(c);
        self
    }

    pub fn with_list_generator(mut self, c: Arc<dyn ListGenerator>) -> Self {
        self.list_generator = Some(c);
        self
    }

    pub fn with_emoji_source(mut self, c: Arc<dyn EmojiSource>) -> Self {
        self.emoji_source = Some(c);
        self
    }

    pub fn visual_qa(&self, opcode: &str) -> InterpreterResult<Arc<dyn VisualQa>> {
        require(&self.visual_qa, opcode, VISUAL_QA)
    }

    pub fn object_detector(&self, opcode: &str) -> InterpreterResult<Arc<dyn ObjectDetector>> {
        require(&self.object_detector, opcode, OBJECT_DETECTOR)
    }

    pub fn segmenter(&self, opcode: &str) -> InterpreterResult<Arc<dyn Segmenter>> {
        require(&self.segmenter, opcode, SEGMENTER)
    }

    pub fn classifier(&self, opcode: &str) -> InterpreterResult<Arc<dyn Classifier>> {
        require(&self.classifier, opcode, CLASSIFIER)
    }

    pub fn inpainter(&self, opcode: &str) -> InterpreterResult<Arc<dyn Inpainter>> {
        require(&self.inpainter, opcode, INPAINTER)
    }

    pub fn face_detector(&self, opcode: &str) -> InterpreterResult<Arc<dyn FaceDetector>> {
        require(&self.face_detector, opcode, FACE_DETECTOR)
    }

    pub fn list_generator(&self, opcode: &str) -> InterpreterResult<Arc<dyn ListGenerator>> {
        require(&self.list_generator, opcode, LIST_GENERATOR)
    }

    pub fn emoji_source(&self, opcode: &str) -> InterpreterResult<Arc<dyn EmojiSource>> {
        require(&self.emoji_source, opcode, EMOJI_SOURCE)
    }

    /// Names of the capabilities that are present.
    pub fn available(&self) -> Vec<&'static str> {
        [
            (self.visual_qa.is_some(), VISUAL_QA),
            (self.object_detector.is_some(), OBJECT_DETECTOR),
            (self.segmenter.is_some(), SEGMENTER),
            (self.classifier.is_some(), CLASSIFIER),
            (self.inpainter.is_some(), INPAINTER),
            (self.face_detector.is_some(), FACE_DETECTOR),
            (self.list_generator.is_some(), LIST_GENERATOR),
            (self.emoji_source.is_some(), EMOJI_SOURCE),
        ]
        .into_iter()
        .filter_map(|(present, name)| present.then_some(name))
        .collect()
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("available", &self.available())
            .finish()
    }
}
