// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Opcode;
use crate::dsl::Step;
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::StateEnv;
use crate::steps::args::{region_var, resolve_image, resolve_regions, ImageRef, ListArg};
use crate::traits::capability::CLASSIFIER;
use crate::traits::{Classification, Classifier, StepHandler};
use crate::utils::imaging;
use crate::value::{Region, Value};

#[derive(Debug)]
pub struct SelectArgs {
    pub image: ImageRef,
    pub object: String,
    pub query: ListArg,
    pub category: Option<ListArg>,
}

/// SELECT - pick the segmented regions a query refers to.
///
/// Without a category filter each query is first matched against the region
/// categories by name. When nothing matches by name, the classifier picks the best
/// crop for every query.
pub struct SelectHandler {
    classifier: Arc<dyn Classifier>,
}

impl SelectHandler {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }
}

/// Regions whose category is `q`, `q-merged` or `q-other-merged`, checked in that order.
fn string_match(regions: &[Region], query: &str) -> Vec<Region> {
    let q = query.to_lowercase();
    [q.clone(), format!("{}-merged", q), format!("{}-other-merged", q)]
        .iter()
        .find_map(|candidate| {
            let hits = regions
                .iter()
                .filter(|r| r.category.as_deref() == Some(candidate.as_str()))
                .cloned()
                .collect::<Vec<_>>();
            (!hits.is_empty()).then_some(hits)
        })
        .unwrap_or_default()
}

/// Index of the crop scoring highest for the query at `label_index`.
fn best_crop(classifications: &[Classification], label_index: usize, label: &str) -> Option<usize> {
    let score = |c: &Classification| match c.scores.get(label_index) {
        Some(score) => *score,
        None if c.label == label => c.score,
        None => 0.0,
    };
    classifications
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| score(a).total_cmp(&score(b)))
        .map(|(i, _)| i)
}

#[async_trait]
impl StepHandler for SelectHandler {
    type Args = SelectArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Select
    }

    fn parse(&self, step: &Step) -> InterpreterResult<SelectArgs> {
        Ok(SelectArgs {
            image: ImageRef::from_step(step, &["image"])?,
            object: region_var(step, &["object", "region"])?,
            query: ListArg::from_expr(step.arg("query")?),
            category: step.optional("category").map(ListArg::from_expr),
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &SelectArgs) -> InterpreterResult<Value> {
        let opcode = Opcode::Select.as_str();
        let mut regions = resolve_regions(state, opcode, &args.object)?;
        let queries = args.query.resolve(state, opcode)?;

        let mut selected = Vec::new();
        match &args.category {
            Some(category) => {
                let categories = category.resolve(state, opcode)?;
                let in_category = regions
                    .iter()
                    .filter(|r| r.category.as_ref().is_some_and(|c| categories.contains(c)))
                    .cloned()
                    .collect::<Vec<_>>();
                if !in_category.is_empty() {
                    regions = in_category;
                }
            }
            None => {
                for query in &queries {
                    selected.extend(string_match(&regions, query));
                }
            }
        }

        if selected.is_empty() && !queries.is_empty() && !regions.is_empty() {
            let (image, _) = resolve_image(state, opcode, &args.image)?;
            let crops = regions
                .iter()
                .map(|r| imaging::crop(&image, &r.rect))
                .collect::<Vec<_>>();
            let classifications = self
                .classifier
                .classify(&crops, &queries)
                .await
                .map_err(|e| InterpreterError::capability(opcode, CLASSIFIER, e))?;
            for (j, query) in queries.iter().enumerate() {
                if let Some(i) = best_crop(&classifications, j, query) {
                    if let Some(region) = regions.get(i) {
                        selected.push(region.clone());
                    }
                }
            }
        }
        Ok(Value::Regions(selected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubClassifier;
    use crate::dsl::parse_step;
    use crate::value::Rect;
    use image::DynamicImage;

    fn state() -> StateEnv {
        let regions = ["dog", "tree-merged", "sky-other-merged", "dog"]
            .iter()
            .enumerate()
            .map(|(i, c)| Region::new(Rect::new(i as u32 * 10, 0, i as u32 * 10 + 10, 10)).with_category(*c))
            .collect::<Vec<_>>();
        StateEnv::new()
            .with("IMAGE", Value::image(DynamicImage::new_rgb8(40, 10)))
            .with("OBJ0", regions)
    }

    fn categories(value: &Value) -> Vec<String> {
        value
            .as_regions()
            .unwrap()
            .iter()
            .filter_map(|r| r.category.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_string_match_variants() {
        let classifier = Arc::new(StubClassifier::new());
        let handler = SelectHandler::new(classifier.clone());
        let step = parse_step(r#"OBJ1=SELECT(image=IMAGE,object=OBJ0,query="Dog,tree,sky",category=None)"#).unwrap();
        let args = handler.parse(&step).unwrap();
        let value = handler.execute(&mut state(), &args).await.unwrap();
        assert_eq!(categories(&value), vec!["dog", "dog", "tree-merged", "sky-other-merged"]);
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_classifier_fallback_picks_best_crop_per_query() {
        // one row per crop, one column per query
        let classifier = Arc::new(StubClassifier::with_scores(vec![
            vec![0.1, 0.2],
            vec![0.3, 0.9],
            vec![0.8, 0.1],
            vec![0.2, 0.2],
        ]));
        let handler = SelectHandler::new(classifier.clone());
        let step = parse_step(r#"OBJ1=SELECT(image=IMAGE,object=OBJ0,query="cat,bird",category=None)"#).unwrap();
        let args = handler.parse(&step).unwrap();
        let value = handler.execute(&mut state(), &args).await.unwrap();
        assert_eq!(categories(&value), vec!["sky-other-merged", "tree-merged"]);
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_category_filter_narrows_classifier_input() {
        let classifier = Arc::new(StubClassifier::new());
        let handler = SelectHandler::new(classifier.clone());
        let step = parse_step(r#"OBJ1=SELECT(image=IMAGE,object=OBJ0,query="dog",category="tree-merged")"#).unwrap();
        let args = handler.parse(&step).unwrap();
        let value = handler.execute(&mut state(), &args).await.unwrap();
        // name matching is skipped with a category, so the classifier chooses
        assert_eq!(categories(&value), vec!["tree-merged"]);
        assert_eq!(classifier.calls(), 1);
    }
}
