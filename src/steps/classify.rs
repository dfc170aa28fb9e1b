// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::config::consts::OTHER_CATEGORY;
use crate::config::Opcode;
use crate::dsl::Step;
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::StateEnv;
use crate::steps::args::{region_var, resolve_image, resolve_regions, ImageRef, ListArg};
use crate::traits::capability::CLASSIFIER;
use crate::traits::{Classifier, StepHandler};
use crate::utils::imaging;
use crate::value::{Region, Value};

#[derive(Debug)]
pub struct ClassifyArgs {
    pub image: ImageRef,
    pub object: String,
    pub categories: ListArg,
}

/// CLASSIFY - label region crops with one of a set of categories.
///
/// Each region gets the best-scoring category as `class` and its similarity
/// (0-100, one decimal) as `class_score`. Only the highest-scoring region of each
/// class is kept, ordered by score. With a single category the crops are scored
/// against "other" too, and regions that look like "other" are dropped.
pub struct ClassifyHandler {
    classifier: Arc<dyn Classifier>,
}

impl ClassifyHandler {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }
}

fn class_score(score: f32) -> f32 {
    (score * 1000.0).round() / 10.0
}

/// Highest-scoring region per class, in descending score order.
fn best_per_class(mut regions: Vec<Region>) -> Vec<Region> {
    regions.sort_by(|a, b| {
        b.class_score
            .unwrap_or(0.0)
            .total_cmp(&a.class_score.unwrap_or(0.0))
    });
    let mut seen = HashSet::new();
    regions
        .into_iter()
        .filter(|r| r.class.as_ref().is_some_and(|c| seen.insert(c.clone())))
        .collect()
}

#[async_trait]
impl StepHandler for ClassifyHandler {
    type Args = ClassifyArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Classify
    }

    fn parse(&self, step: &Step) -> InterpreterResult<ClassifyArgs> {
        Ok(ClassifyArgs {
            image: ImageRef::from_step(step, &["image"])?,
            object: region_var(step, &["object", "region"])?,
            categories: ListArg::from_expr(step.arg_any(&["categories", "category"])?),
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &ClassifyArgs) -> InterpreterResult<Value> {
        let opcode = Opcode::Classify.as_str();
        let regions = resolve_regions(state, opcode, &args.object)?;
        let mut labels = args.categories.resolve(state, opcode)?;
        if regions.is_empty() || labels.is_empty() {
            return Ok(Value::Regions(vec![]));
        }
        if labels.len() == 1 {
            labels.push(OTHER_CATEGORY.to_string());
        }

        let (image, _) = resolve_image(state, opcode, &args.image)?;
        let crops = regions
            .iter()
            .map(|r| imaging::crop(&image, &r.rect))
            .collect::<Vec<_>>();
        let classifications = self
            .classifier
            .classify(&crops, &labels)
            .await
            .map_err(|e| InterpreterError::capability(opcode, CLASSIFIER, e))?;

        let classified = regions
            .into_iter()
            .zip(classifications)
            .filter(|(_, c)| c.label != OTHER_CATEGORY)
            .map(|(mut region, c)| {
                region.class = Some(c.label);
                region.class_score = Some(class_score(c.score));
                region
            })
            .collect::<Vec<_>>();
        Ok(Value::Regions(best_per_class(classified)))
    }
}
