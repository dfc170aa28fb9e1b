// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::consts::FACE_ENLARGE_FACTOR;
use crate::config::Opcode;
use crate::dsl::Step;
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::StateEnv;
use crate::steps::args::{resolve_image, ImageRef};
use crate::traits::capability::FACE_DETECTOR;
use crate::traits::{FaceDetector, StepHandler};
use crate::utils::geometry;
use crate::value::{Mask, Region, Value};

#[derive(Debug)]
pub struct FaceDetArgs {
    pub image: ImageRef,
}

/// FACEDET - faces as regions with rectangular masks, boxes enlarged to take in
/// hair and chin
pub struct FaceDetHandler {
    detector: Arc<dyn FaceDetector>,
}

impl FaceDetHandler {
    pub fn new(detector: Arc<dyn FaceDetector>) -> Self {
        Self { detector }
    }
}

#[async_trait]
impl StepHandler for FaceDetHandler {
    type Args = FaceDetArgs;

    fn opcode(&self) -> Opcode {
        Opcode::FaceDet
    }

    fn parse(&self, step: &Step) -> InterpreterResult<FaceDetArgs> {
        Ok(FaceDetArgs {
            image: ImageRef::from_step(step, &["image"])?,
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &FaceDetArgs) -> InterpreterResult<Value> {
        let opcode = Opcode::FaceDet.as_str();
        let (image, var) = resolve_image(state, opcode, &args.image)?;
        let (w, h) = (image.width(), image.height());
        let faces = self
            .detector
            .detect_faces(&image)
            .await
            .map_err(|e| InterpreterError::capability(opcode, FACE_DETECTOR, e))?;

        // detector boxes may reach past the frame
        let regions = faces
            .iter()
            .map(|face| face.clamp_to(w, h))
            .filter(|face| !face.is_empty())
            .map(|face| {
                let rect = geometry::expand(&face, FACE_ENLARGE_FACTOR, w, h);
                Region::new(rect)
                    .with_category("face")
                    .with_mask(Mask::from_rect(&rect, w, h))
                    .with_source(var.clone())
            })
            .collect::<Vec<_>>();
        Ok(Value::Regions(regions))
    }
}
