// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Opcode;
use crate::dsl::{ArgExpr, Step};
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::StateEnv;
use crate::steps::args::{resolve_image, resolve_value, ImageRef, TextArg};
use crate::traits::capability::VISUAL_QA;
use crate::traits::{StepHandler, VisualQa};
use crate::utils::imaging;
use crate::value::{Region, Value};

#[derive(Debug)]
pub struct FilterArgs {
    pub region: ArgExpr,
    pub attribute: TextArg,
    /// Overrides the frame each region is cropped from.
    pub image: Option<ImageRef>,
}

/// FILTER - keep the regions the VQA capability says have an attribute.
///
/// A region is kept when the answer merely contains the attribute, so "red"
/// also matches an answer of "not red".
pub struct FilterHandler {
    vqa: Arc<dyn VisualQa>,
}

impl FilterHandler {
    pub fn new(vqa: Arc<dyn VisualQa>) -> Self {
        Self { vqa }
    }
}

fn answer_matches(answer: &str, attribute: &str) -> bool {
    answer.to_lowercase().contains(&attribute.trim().to_lowercase())
}

#[async_trait]
impl StepHandler for FilterHandler {
    type Args = FilterArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Filter
    }

    fn parse(&self, step: &Step) -> InterpreterResult<FilterArgs> {
        let image = match step.optional("image") {
            Some(_) => Some(ImageRef::from_step(step, &["image"])?),
            None => None,
        };
        Ok(FilterArgs {
            region: step.arg_any(&["region", "box", "object"])?.clone(),
            attribute: TextArg::from_step(step, "attribute")?,
            image,
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &FilterArgs) -> InterpreterResult<Value> {
        let opcode = Opcode::Filter.as_str();
        let regions: Vec<Region> = match resolve_value(state, &args.region)? {
            Value::Regions(regions) => regions,
            Value::Region(region) => vec![region],
            _ => return Ok(Value::Regions(vec![])),
        };
        let attribute = args.attribute.resolve(state);
        let question = format!("Is this object {}?", attribute);
        let explicit = match &args.image {
            Some(image) => Some(resolve_image(state, opcode, image)?.0),
            None => None,
        };

        let mut kept = Vec::new();
        for region in regions {
            let frame = match &explicit {
                Some(image) => image.clone(),
                None => state.frame_image(opcode, Some(&region))?.1,
            };
            let crop = imaging::crop(&frame, &region.rect);
            let answer = self
                .vqa
                .answer(&crop, &question)
                .await
                .map_err(|e| InterpreterError::capability(opcode, VISUAL_QA, e))?;
            if answer_matches(&answer, &attribute) {
                kept.push(region);
            }
        }
        Ok(Value::Regions(kept))
    }
}
