// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Opcode;
use crate::dsl::Step;
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::StateEnv;
use crate::steps::args::{resolve_image, ImageRef};
use crate::traits::capability::SEGMENTER;
use crate::traits::{Segmenter, StepHandler};
use crate::utils::imaging;
use crate::value::{Mask, Region, Value};

#[derive(Debug)]
pub struct SegArgs {
    pub image: ImageRef,
}

/// SEG - panoptic segmentation into masked regions
pub struct SegHandler {
    segmenter: Arc<dyn Segmenter>,
}

impl SegHandler {
    pub fn new(segmenter: Arc<dyn Segmenter>) -> Self {
        Self { segmenter }
    }
}

#[async_trait]
impl StepHandler for SegHandler {
    type Args = SegArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Seg
    }

    fn parse(&self, step: &Step) -> InterpreterResult<SegArgs> {
        Ok(SegArgs {
            image: ImageRef::from_step(step, &["image"])?,
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &SegArgs) -> InterpreterResult<Value> {
        let opcode = Opcode::Seg.as_str();
        let (image, var) = resolve_image(state, opcode, &args.image)?;
        let (w, h) = (image.width(), image.height());
        let segments = self
            .segmenter
            .segment(&image)
            .await
            .map_err(|e| InterpreterError::capability(opcode, SEGMENTER, e))?;

        let regions = segments
            .into_iter()
            .map(|segment| {
                let rect = segment.rect.clamp_to(w, h);
                // masks must live in the image frame; anything else falls back to the box
                let mask = if segment.mask.dimensions() == (w, h) {
                    Mask::new(imaging::binarize(&segment.mask.0))
                } else {
                    Mask::from_rect(&rect, w, h)
                };
                Region::new(rect)
                    .with_category(segment.label)
                    .with_mask(mask)
                    .with_source(var.clone())
            })
            .collect::<Vec<_>>();
        Ok(Value::Regions(regions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubSegmenter;
    use crate::dsl::parse_step;
    use crate::traits::Segment;
    use crate::value::Rect;
    use image::{DynamicImage, GrayImage};

    #[tokio::test]
    async fn test_segments_become_masked_regions() {
        let handler = SegHandler::new(Arc::new(StubSegmenter::new(vec![
            Segment {
                mask: Mask::from_rect(&Rect::new(0, 0, 4, 4), 8, 8),
                label: "dog".to_string(),
                rect: Rect::new(0, 0, 4, 4),
            },
            Segment {
                mask: Mask::new(GrayImage::new(2, 2)),
                label: "sky".to_string(),
                rect: Rect::new(4, 4, 12, 12),
            },
        ])));
        let mut state = StateEnv::new().with("IMAGE", Value::image(DynamicImage::new_rgb8(8, 8)));
        let args = handler.parse(&parse_step("OBJ0=SEG(image=IMAGE)").unwrap()).unwrap();
        let value = handler.execute(&mut state, &args).await.unwrap();

        let regions = value.as_regions().unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].category.as_deref(), Some("dog"));
        assert_eq!(regions[1].rect, Rect::new(4, 4, 8, 8));
        // the mismatched mask is replaced by the clamped box
        assert_eq!(regions[1].mask, Some(Mask::from_rect(&Rect::new(4, 4, 8, 8), 8, 8)));
        assert!(regions.iter().all(|r| r.source.as_deref() == Some("IMAGE")));
    }
}
