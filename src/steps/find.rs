// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Opcode;
use crate::dsl::Step;
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::StateEnv;
use crate::steps::args::{resolve_visual, ImageRef, TextArg, Visual};
use crate::traits::capability::OBJECT_DETECTOR;
use crate::traits::{Detection, ObjectDetector, StepHandler};
use crate::utils::imaging;
use crate::value::{RasterImage, Region, Value};

#[derive(Debug)]
pub struct FindArgs {
    pub image: ImageRef,
    pub object: TextArg,
}

/// FIND - detect objects in an image, or inside each region of a region list.
///
/// Detections inside a region are translated back into the frame of the image
/// the region was cropped from, so nested FINDs compose.
pub struct FindHandler {
    detector: Arc<dyn ObjectDetector>,
}

impl FindHandler {
    pub fn new(detector: Arc<dyn ObjectDetector>) -> Self {
        Self { detector }
    }

    async fn detect(&self, image: &RasterImage, object: &str) -> InterpreterResult<Vec<Detection>> {
        self.detector
            .detect(image, object)
            .await
            .map_err(|e| InterpreterError::capability(Opcode::Find.as_str(), OBJECT_DETECTOR, e))
    }
}

fn to_region(detection: Detection, object: &str, source: Option<String>) -> Region {
    let category = if detection.label.is_empty() {
        object.to_string()
    } else {
        detection.label
    };
    Region::new(detection.rect)
        .with_category(category)
        .with_score(detection.score)
        .with_source(source)
}

#[async_trait]
impl StepHandler for FindHandler {
    type Args = FindArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Find
    }

    fn parse(&self, step: &Step) -> InterpreterResult<FindArgs> {
        Ok(FindArgs {
            image: ImageRef::from_step(step, &["image"])?,
            object: TextArg::from_step(step, "object")?,
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &FindArgs) -> InterpreterResult<Value> {
        let opcode = Opcode::Find.as_str();
        let object = args.object.resolve(state);

        match resolve_visual(state, opcode, &args.image)? {
            Visual::Image { image, var } => {
                let (w, h) = (image.width(), image.height());
                let found = self
                    .detect(&image, &object)
                    .await?
                    .into_iter()
                    .map(|mut d| {
                        d.rect = d.rect.clamp_to(w, h);
                        to_region(d, &object, var.clone())
                    })
                    .collect::<Vec<_>>();
                Ok(Value::Regions(found))
            }
            Visual::Regions(parents) => {
                let mut found = Vec::new();
                for parent in &parents {
                    let (frame_var, frame) = state.frame_image(opcode, Some(parent))?;
                    let bounds = parent.rect.clamp_to(frame.width(), frame.height());
                    let crop = imaging::crop(&frame, &bounds);
                    for mut detection in self.detect(&crop, &object).await? {
                        detection.rect = detection
                            .rect
                            .clamp_to(crop.width(), crop.height())
                            .translate(bounds.x1, bounds.y1);
                        found.push(to_region(detection, &object, Some(frame_var.clone())));
                    }
                }
                Ok(Value::Regions(found))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubDetector;
    use crate::dsl::parse_step;
    use crate::value::Rect;
    use image::DynamicImage;

    fn base_state() -> StateEnv {
        StateEnv::new().with("IMAGE", Value::image(DynamicImage::new_rgb8(100, 100)))
    }

    #[tokio::test]
    async fn test_nested_find_translates_into_base_frame() {
        let detector = Arc::new(StubDetector::new(vec![Rect::new(5, 5, 10, 10)]));
        let handler = FindHandler::new(detector.clone());
        let mut state = base_state().with(
            "BOX0",
            vec![Region::new(Rect::new(10, 10, 50, 50)).with_source(Some("IMAGE".to_string()))],
        );

        let args = handler.parse(&parse_step("BOX1=FIND(image=BOX0,object='eye')").unwrap()).unwrap();
        let value = handler.execute(&mut state, &args).await.unwrap();

        let regions = value.as_regions().unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].rect, Rect::new(15, 15, 20, 20));
        assert_eq!(regions[0].source.as_deref(), Some("IMAGE"));
        // the detector saw the 40x40 crop, not the base image
        assert_eq!(detector.seen_sizes(), vec![(40, 40)]);
    }

    #[tokio::test]
    async fn test_find_on_image_records_source() {
        let handler = FindHandler::new(Arc::new(StubDetector::new(vec![
            Rect::new(0, 0, 10, 10),
            Rect::new(20, 20, 30, 30),
        ])));
        let mut state = base_state();
        let args = handler.parse(&parse_step(r#"BOX0=FIND(image=IMAGE,object="cat")"#).unwrap()).unwrap();
        let value = handler.execute(&mut state, &args).await.unwrap();

        let regions = value.as_regions().unwrap();
        assert_eq!(regions.len(), 2);
        assert!(regions.iter().all(|r| r.category.as_deref() == Some("cat")));
        assert!(regions.iter().all(|r| r.source.as_deref() == Some("IMAGE")));
    }

    #[tokio::test]
    async fn test_empty_region_list_skips_detector() {
        let detector = Arc::new(StubDetector::new(vec![Rect::new(0, 0, 1, 1)]));
        let handler = FindHandler::new(detector.clone());
        let mut state = base_state().with("BOX0", Value::Regions(vec![]));
        let args = handler.parse(&parse_step("BOX1=FIND(image=BOX0,object='x')").unwrap()).unwrap();
        let value = handler.execute(&mut state, &args).await.unwrap();
        assert_eq!(value, Value::Regions(vec![]));
        assert!(detector.seen_sizes().is_empty());
    }
}
