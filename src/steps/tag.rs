// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::config::consts::BOX_OUTLINE_WIDTH;
use crate::config::Opcode;
use crate::dsl::Step;
use crate::errors::InterpreterResult;
use crate::state::StateEnv;
use crate::steps::args::{region_var, resolve_image, resolve_regions, ImageRef};
use crate::traits::StepHandler;
use crate::utils::imaging;
use crate::value::Value;


#[derive(Debug)]
pub struct TagArgs {
    pub image: ImageRef,
    pub object: String,
}

/// TAG - outline every region on a copy of the image
pub struct TagHandler;

impl TagHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TagHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepHandler for TagHandler {
    type Args = TagArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Tag
    }

    fn parse(&self, step: &Step) -> InterpreterResult<TagArgs> {
        Ok(TagArgs {
            image: ImageRef::from_step(step, &["image"])?,
            object: region_var(step, &["object", "region"])?,
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &TagArgs) -> InterpreterResult<Value> {
        let opcode = Opcode::Tag.as_str();
        let (image, _) = resolve_image(state, opcode, &args.image)?;
        let rects = resolve_regions(state, opcode, &args.object)?
            .iter()
            .map(|r| r.rect)
            .collect::<Vec<_>>();
        Ok(Value::Image(imaging::draw_boxes(&image, &rects, BOX_OUTLINE_WIDTH)))
    }
}
