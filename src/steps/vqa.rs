// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Opcode;
use crate::dsl::Step;
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::StateEnv;
use crate::steps::args::{resolve_visual, ImageRef, TextArg, Visual};
use crate::traits::capability::VISUAL_QA;
use crate::traits::{StepHandler, VisualQa};
use crate::utils::imaging;
use crate::value::Value;

#[derive(Debug)]
pub struct VqaArgs {
    pub image: ImageRef,
    pub question: TextArg,
}

/// VQA - answer a question about an image, or about the first region of a region list
pub struct VqaHandler {
    vqa: Arc<dyn VisualQa>,
}

impl VqaHandler {
    pub fn new(vqa: Arc<dyn VisualQa>) -> Self {
        Self { vqa }
    }
}

#[async_trait]
impl StepHandler for VqaHandler {
    type Args = VqaArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Vqa
    }

    fn parse(&self, step: &Step) -> InterpreterResult<VqaArgs> {
        Ok(VqaArgs {
            image: ImageRef::from_step(step, &["image"])?,
            question: TextArg::from_step(step, "question")?,
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &VqaArgs) -> InterpreterResult<Value> {
        let opcode = Opcode::Vqa.as_str();
        let image = match resolve_visual(state, opcode, &args.image)? {
            Visual::Image { image, .. } => image,
            Visual::Regions(regions) => {
                let first = regions.first().ok_or_else(|| {
                    InterpreterError::type_mismatch(opcode, "an image or a non-empty region list", "empty region list")
                })?;
                let (_, frame) = state.frame_image(opcode, Some(first))?;
                imaging::crop(&frame, &first.rect)
            }
        };
        let question = args.question.resolve(state);
        let answer = self
            .vqa
            .answer(&image, &question)
            .await
            .map_err(|e| InterpreterError::capability(opcode, VISUAL_QA, e))?;
        Ok(Value::from(answer))
    }
}
