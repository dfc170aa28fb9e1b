// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::consts::BOX_OUTLINE_WIDTH;
use crate::config::Opcode;
use crate::dsl::Step;
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::StateEnv;
use crate::steps::args::{resolve_image, ImageRef, TextArg};
use crate::traits::capability::OBJECT_DETECTOR;
use crate::traits::{ObjectDetector, StepHandler};
use crate::utils::geometry::{self, Side};
use crate::utils::imaging;
use crate::value::{RasterImage, Rect, Region, Value};

/// How much LOC does beyond running the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocMode {
    /// Spatial keywords are honoured and the boxes drawn over the image are bound
    /// as `<output>_IMAGE`.
    Annotated,
    /// Every object name goes to the detector; only the regions are bound.
    Plain,
}

#[derive(Debug)]
pub struct LocArgs {
    pub image: ImageRef,
    pub object: TextArg,
    pub output_var: String,
}

/// LOC - localise an object in an image.
///
/// In [`LocMode::Annotated`] the spatial keywords `TOP`, `BOTTOM`, `LEFT` and
/// `RIGHT` name the matching half of the image and never reach the detector.
/// Otherwise detections scoring at or below `threshold` are dropped and the rest
/// are de-duplicated with NMS.
pub struct LocHandler {
    detector: Arc<dyn ObjectDetector>,
    threshold: f32,
    nms_threshold: f32,
    mode: LocMode,
}

impl LocHandler {
    pub fn new(detector: Arc<dyn ObjectDetector>, threshold: f32, nms_threshold: f32) -> Self {
        Self {
            detector,
            threshold,
            nms_threshold,
            mode: LocMode::Annotated,
        }
    }

    pub fn with_mode(mut self, mode: LocMode) -> Self {
        self.mode = mode;
        self
    }
}

#[async_trait]
impl StepHandler for LocHandler {
    type Args = LocArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Loc
    }

    fn parse(&self, step: &Step) -> InterpreterResult<LocArgs> {
        Ok(LocArgs {
            image: ImageRef::from_step(step, &["image"])?,
            object: TextArg::from_step(step, "object")?,
            output_var: step.output_var.clone(),
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &LocArgs) -> InterpreterResult<Value> {
        let opcode = Opcode::Loc.as_str();
        let (image, var) = resolve_image(state, opcode, &args.image)?;
        let object = args.object.resolve(state);
        let (w, h) = (image.width(), image.height());

        let keyword = match self.mode {
            LocMode::Annotated => Side::from_keyword(&object),
            LocMode::Plain => None,
        };
        let regions = match keyword {
            Some(side) => vec![Region::new(geometry::half(side, w, h))
                .with_category(object)
                .with_source(var)],
            None => self.detect(&image, &object, &var).await?,
        };

        if self.mode == LocMode::Annotated && !args.output_var.is_empty() {
            let rects = regions.iter().map(|r| r.rect).collect::<Vec<Rect>>();
            state.bind(
                format!("{}_IMAGE", args.output_var),
                Value::Image(imaging::draw_boxes(&image, &rects, BOX_OUTLINE_WIDTH)),
            );
        }
        Ok(Value::Regions(regions))
    }
}

impl LocHandler {
    async fn detect(&self, image: &RasterImage, object: &str, var: &Option<String>) -> InterpreterResult<Vec<Region>> {
        let opcode = Opcode::Loc.as_str();
        let (w, h) = (image.width(), image.height());

        let mut detections = self
            .detector
            .detect(image, object)
            .await
            .map_err(|e| InterpreterError::capability(opcode, OBJECT_DETECTOR, e))?
            .into_iter()
            .filter(|d| d.score > self.threshold)
            .map(|mut d| {
                d.rect = d.rect.clamp_to(w, h);
                d
            })
            .collect::<Vec<_>>();
        // stable, so equal scores keep detector order
        detections.sort_by(|a, b| b.score.total_cmp(&a.score));

        let rects = detections.iter().map(|d| d.rect).collect::<Vec<_>>();
        let regions = geometry::nms(&rects, self.nms_threshold)
            .into_iter()
            .map(|i| {
                Region::new(detections[i].rect)
                    .with_category(object)
                    .with_score(detections[i].score)
                    .with_source(var.clone())
            })
            .collect();
        Ok(regions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubDetector;
    use crate::config::consts::{LOC_NMS_THRESHOLD, LOC_THRESHOLD};
    use crate::dsl::parse_step;
    use crate::traits::Detection;
    use image::DynamicImage;

    fn detection(rect: Rect, score: f32) -> Detection {
        Detection {
            rect,
            label: String::new(),
            score,
        }
    }

    fn state() -> StateEnv {
        StateEnv::new().with("IMAGE", Value::image(DynamicImage::new_rgb8(100, 80)))
    }

    #[tokio::test]
    async fn test_spatial_keyword_skips_detector() {
        let detector = Arc::new(StubDetector::new(vec![]));
        let handler = LocHandler::new(detector.clone(), LOC_THRESHOLD, LOC_NMS_THRESHOLD);
        let args = handler.parse(&parse_step("BOX0=LOC(image=IMAGE,object='RIGHT')").unwrap()).unwrap();
        let value = handler.execute(&mut state(), &args).await.unwrap();
        assert_eq!(value.as_regions().unwrap()[0].rect, Rect::new(50, 0, 100, 80));
        assert!(detector.seen_sizes().is_empty());
    }

    #[tokio::test]
    async fn test_threshold_sort_and_nms() {
        let detector = Arc::new(StubDetector::with_detections(vec![
            detection(Rect::new(0, 0, 10, 10), 0.1),
            detection(Rect::new(0, 0, 20, 20), 0.6),
            detection(Rect::new(1, 1, 21, 21), 0.5),
            detection(Rect::new(50, 50, 120, 90), 0.9),
        ]));
        let handler = LocHandler::new(detector, LOC_THRESHOLD, LOC_NMS_THRESHOLD);
        let args = handler.parse(&parse_step("BOX0=LOC(image=IMAGE,object='dog')").unwrap()).unwrap();
        let value = handler.execute(&mut state(), &args).await.unwrap();

        let rects = value.as_regions().unwrap().iter().map(|r| r.rect).collect::<Vec<_>>();
        // 0.1 is not above the threshold, the 0.5 box overlaps the 0.6 box
        assert_eq!(rects, vec![Rect::new(50, 50, 100, 80), Rect::new(0, 0, 20, 20)]);
        assert!(value
            .as_regions()
            .unwrap()
            .iter()
            .all(|r| r.category.as_deref() == Some("dog")));
    }

    #[tokio::test]
    async fn test_annotated_mode_binds_box_image() {
        let detector = Arc::new(StubDetector::with_detections(vec![
            detection(Rect::new(10, 10, 40, 40), 0.9),
            detection(Rect::new(60, 20, 90, 60), 0.8),
        ]));
        let handler = LocHandler::new(detector, LOC_THRESHOLD, LOC_NMS_THRESHOLD);
        let args = handler.parse(&parse_step("BOX0=LOC(image=IMAGE,object='dog')").unwrap()).unwrap();
        let mut state = state();
        handler.execute(&mut state, &args).await.unwrap();

        let boxed = state.get("BOX0_IMAGE").and_then(Value::as_image).unwrap().as_image().to_rgb8();
        assert_eq!(boxed.dimensions(), (100, 80));
        assert_eq!(boxed.get_pixel(10, 20), &image::Rgb([255, 0, 0]));
        assert_eq!(boxed.get_pixel(60, 40), &image::Rgb([0, 0, 255]));
    }

    #[tokio::test]
    async fn test_keyword_region_is_drawn_too() {
        let handler = LocHandler::new(Arc::new(StubDetector::new(vec![])), LOC_THRESHOLD, LOC_NMS_THRESHOLD);
        let args = handler.parse(&parse_step("BOX0=LOC(image=IMAGE,object='TOP')").unwrap()).unwrap();
        let mut state = state();
        handler.execute(&mut state, &args).await.unwrap();
        assert!(state.get("BOX0_IMAGE").and_then(Value::as_image).is_some());
    }

    #[tokio::test]
    async fn test_plain_mode_sends_keywords_to_detector() {
        let detector = Arc::new(StubDetector::new(vec![Rect::new(5, 5, 30, 30)]));
        let handler =
            LocHandler::new(detector.clone(), LOC_THRESHOLD, LOC_NMS_THRESHOLD).with_mode(LocMode::Plain);
        let args = handler.parse(&parse_step("BOX0=LOC(image=IMAGE,object='RIGHT')").unwrap()).unwrap();
        let mut state = state();
        let value = handler.execute(&mut state, &args).await.unwrap();

        assert_eq!(detector.seen_sizes(), vec![(100, 80)]);
        assert_eq!(value.as_regions().unwrap()[0].category.as_deref(), Some("RIGHT"));
        assert!(state.get("BOX0_IMAGE").is_none());
    }
}
