// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! CROP and its spatial variants.
//!
//! All nine opcodes share one handler type; the opcode decides whether the first
//! box is grown around its centre or used as a dividing line.

use async_trait::async_trait;

use crate::config::consts::CROP_EXPAND_FACTOR;
use crate::config::Opcode;
use crate::dsl::{ArgExpr, Literal, Step};
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::StateEnv;
use crate::steps::args::{resolve_image, ImageRef};
use crate::traits::StepHandler;
use crate::utils::geometry::{self, Side};
use crate::utils::imaging;
use crate::value::{Rect, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropMode {
    /// Crop the first box grown 1.5x, or the whole image without a box.
    Expand,
    /// Crop the part of the image on one side of the first box's centre line,
    /// or that half of the image without a box.
    Beside(Side),
}

impl CropMode {
    fn target(&self, first: Option<&Rect>, width: u32, height: u32) -> Rect {
        match (self, first) {
            (CropMode::Expand, Some(rect)) => geometry::expand(rect, CROP_EXPAND_FACTOR, width, height),
            (CropMode::Expand, None) => Rect::new(0, 0, width, height),
            (CropMode::Beside(side), Some(rect)) => geometry::beside(rect, *side, width, height),
            (CropMode::Beside(side), None) => geometry::half(*side, width, height),
        }
    }
}

#[derive(Debug)]
pub struct CropArgs {
    pub image: ImageRef,
    /// `None` when the step passes `None` or an empty list.
    pub boxes: Option<String>,
}

pub struct CropHandler {
    opcode: Opcode,
    mode: CropMode,
}

impl CropHandler {
    pub fn new(opcode: Opcode, mode: CropMode) -> Self {
        Self { opcode, mode }
    }
}

#[async_trait]
impl StepHandler for CropHandler {
    type Args = CropArgs;

    fn opcode(&self) -> Opcode {
        self.opcode
    }

    fn parse(&self, step: &Step) -> InterpreterResult<CropArgs> {
        let boxes = match step.arg_any(&["box", "region"])? {
            ArgExpr::Var(name) => Some(name.clone()),
            ArgExpr::Literal(Literal::None) => None,
            ArgExpr::List(items) if items.is_empty() => None,
            other => {
                return Err(InterpreterError::type_mismatch(
                    step.opcode.clone(),
                    "a region variable",
                    format!("'{}'", other),
                ))
            }
        };
        Ok(CropArgs {
            image: ImageRef::from_step(step, &["image"])?,
            boxes,
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &CropArgs) -> InterpreterResult<Value> {
        let opcode = self.opcode.as_str();
        let (image, _) = resolve_image(state, opcode, &args.image)?;
        let first = match &args.boxes {
            Some(name) => match state.require(name)? {
                Value::Regions(regions) => regions.first().map(|r| r.rect),
                Value::Region(region) => Some(region.rect),
                Value::Null => None,
                other => return Err(InterpreterError::type_mismatch(opcode, "a region list", other.kind())),
            },
            None => None,
        };
        let target = self.mode.target(first.as_ref(), image.width(), image.height());
        Ok(Value::Image(imaging::crop(&image, &target)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse_step;
    use crate::value::Region;
    use image::DynamicImage;

    fn state_with_box(rect: Option<Rect>) -> StateEnv {
        let boxes = rect.map(Region::new).into_iter().collect::<Vec<_>>();
        StateEnv::new()
            .with("IMAGE", Value::image(DynamicImage::new_rgb8(100, 100)))
            .with("BOX0", boxes)
    }

    fn handler(opcode: Opcode) -> CropHandler {
        let mode = match opcode {
            Opcode::CropRightOf => CropMode::Beside(Side::Right),
            Opcode::CropLeftOf => CropMode::Beside(Side::Left),
            Opcode::CropAbove => CropMode::Beside(Side::Top),
            Opcode::CropBelow => CropMode::Beside(Side::Bottom),
            _ => CropMode::Expand,
        };
        CropHandler::new(opcode, mode)
    }

    async fn crop_size(opcode: Opcode, rect: Option<Rect>) -> (u32, u32) {
        let handler = handler(opcode);
        let line = format!("IMAGE0={}(image=IMAGE,box=BOX0)", opcode);
        let args = handler.parse(&parse_step(&line).unwrap()).unwrap();
        let value = handler.execute(&mut state_with_box(rect), &args).await.unwrap();
        let image = value.as_image().unwrap();
        (image.width(), image.height())
    }

    #[tokio::test]
    async fn test_crop_expands_first_box() {
        // 20x20 box centred at (50,50) grows to 30x30
        assert_eq!(crop_size(Opcode::Crop, Some(Rect::new(40, 40, 60, 60))).await, (30, 30));
        assert_eq!(crop_size(Opcode::CropBehind, Some(Rect::new(40, 40, 60, 60))).await, (30, 30));
        // clamped at the image border
        assert_eq!(crop_size(Opcode::Crop, Some(Rect::new(0, 0, 20, 20))).await, (25, 25));
    }

    #[tokio::test]
    async fn test_crop_without_box() {
        assert_eq!(crop_size(Opcode::Crop, None).await, (100, 100));
        assert_eq!(crop_size(Opcode::CropRightOf, None).await, (50, 100));
        assert_eq!(crop_size(Opcode::CropAbove, None).await, (100, 50));
    }

    #[tokio::test]
    async fn test_crop_beside_centre_line() {
        let rect = Some(Rect::new(20, 60, 40, 80));
        assert_eq!(crop_size(Opcode::CropRightOf, rect).await, (70, 100));
        assert_eq!(crop_size(Opcode::CropLeftOf, rect).await, (30, 100));
        assert_eq!(crop_size(Opcode::CropAbove, rect).await, (100, 70));
        assert_eq!(crop_size(Opcode::CropBelow, rect).await, (100, 30));
    }

    #[test]
    fn test_none_literal_box() {
        let handler = handler(Opcode::CropLeftOf);
        let args = handler.parse(&parse_step("X=CROP_LEFTOF(image=IMAGE,box=None)").unwrap()).unwrap();
        assert_eq!(args.boxes, None);
        let args = handler.parse(&parse_step("X=CROP_LEFTOF(image=IMAGE,box=[])").unwrap()).unwrap();
        assert_eq!(args.boxes, None);
    }
}
