// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Image-editing steps: COLORPOP, BGBLUR, REPLACE and EMOJI.
//!
//! Each takes an image and the region list (usually from SEG or SELECT) the edit
//! applies to, and produces a new image. The input image binding is left untouched.

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::consts::{BACKGROUND_BLUR_SIGMA, EMOJI_SCALE_DIVISOR, MASK_SMOOTHING_SIGMA};
use crate::config::Opcode;
use crate::dsl::Step;
use crate::errors::{InterpreterError, InterpreterResult};
use crate::state::StateEnv;
use crate::steps::args::{region_var, resolve_image, resolve_regions, ImageRef, TextArg};
use crate::traits::capability::{EMOJI_SOURCE, INPAINTER};
use crate::traits::{EmojiSource, Inpainter, StepHandler};
use crate::utils::imaging;
use crate::value::{Mask, RasterImage, Region, Value};

const OBJECT_ARG: [&str; 2] = ["object", "region"];

#[derive(Debug)]
pub struct MaskedImageArgs {
    pub image: ImageRef,
    pub object: String,
}

fn parse_masked(step: &Step) -> InterpreterResult<MaskedImageArgs> {
    Ok(MaskedImageArgs {
        image: ImageRef::from_step(step, &["image"])?,
        object: region_var(step, &OBJECT_ARG)?,
    })
}

fn load_masked(
    state: &mut StateEnv,
    opcode: &str,
    args: &MaskedImageArgs,
) -> InterpreterResult<(RasterImage, Vec<Region>)> {
    let (image, _) = resolve_image(state, opcode, &args.image)?;
    let regions = resolve_regions(state, opcode, &args.object)?;
    Ok((image, regions))
}

/// COLORPOP - keep colour inside the regions, grayscale elsewhere
pub struct ColorPopHandler;

impl ColorPopHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ColorPopHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepHandler for ColorPopHandler {
    type Args = MaskedImageArgs;

    fn opcode(&self) -> Opcode {
        Opcode::ColorPop
    }

    fn parse(&self, step: &Step) -> InterpreterResult<MaskedImageArgs> {
        parse_masked(step)
    }

    async fn execute(&self, state: &mut StateEnv, args: &MaskedImageArgs) -> InterpreterResult<Value> {
        let (image, regions) = load_masked(state, Opcode::ColorPop.as_str(), args)?;
        let mask = imaging::mask_union(&regions, image.width(), image.height());
        Ok(Value::Image(imaging::color_pop(&image, &mask)))
    }
}

/// BGBLUR - blur everything outside the regions
pub struct BgBlurHandler;

impl BgBlurHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BgBlurHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StepHandler for BgBlurHandler {
    type Args = MaskedImageArgs;

    fn opcode(&self) -> Opcode {
        Opcode::BgBlur
    }

    fn parse(&self, step: &Step) -> InterpreterResult<MaskedImageArgs> {
        parse_masked(step)
    }

    async fn execute(&self, state: &mut StateEnv, args: &MaskedImageArgs) -> InterpreterResult<Value> {
        let (image, regions) = load_masked(state, Opcode::BgBlur.as_str(), args)?;
        let mask = imaging::mask_union(&regions, image.width(), image.height());
        Ok(Value::Image(imaging::background_blur(
            &image,
            &mask,
            BACKGROUND_BLUR_SIGMA,
            MASK_SMOOTHING_SIGMA,
        )))
    }
}

#[derive(Debug)]
pub struct ReplaceArgs {
    pub target: MaskedImageArgs,
    pub prompt: TextArg,
}

/// REPLACE - inpaint the first region with whatever the prompt describes
pub struct ReplaceHandler {
    inpainter: Arc<dyn Inpainter>,
}

impl ReplaceHandler {
    pub fn new(inpainter: Arc<dyn Inpainter>) -> Self {
        Self { inpainter }
    }
}

#[async_trait]
impl StepHandler for ReplaceHandler {
    type Args = ReplaceArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Replace
    }

    fn parse(&self, step: &Step) -> InterpreterResult<ReplaceArgs> {
        Ok(ReplaceArgs {
            target: parse_masked(step)?,
            prompt: TextArg::from_step(step, "prompt")?,
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &ReplaceArgs) -> InterpreterResult<Value> {
        let opcode = Opcode::Replace.as_str();
        let (image, regions) = load_masked(state, opcode, &args.target)?;
        let (w, h) = (image.width(), image.height());
        let first = regions
            .first()
            .ok_or_else(|| InterpreterError::type_mismatch(opcode, "a non-empty region list", "empty region list"))?;
        let mask = match &first.mask {
            Some(mask) if mask.dimensions() == (w, h) => mask.clone(),
            _ => Mask::from_rect(&first.rect, w, h),
        };
        let prompt = args.prompt.resolve(state);
        let edited = self
            .inpainter
            .inpaint(&image, &mask, &prompt)
            .await
            .map_err(|e| InterpreterError::capability(opcode, INPAINTER, e))?;
        Ok(Value::Image(edited))
    }
}

#[derive(Debug)]
pub struct EmojiArgs {
    pub target: MaskedImageArgs,
    pub emoji: TextArg,
}

/// EMOJI - paste an emoji over every region
pub struct EmojiHandler {
    source: Arc<dyn EmojiSource>,
}

impl EmojiHandler {
    pub fn new(source: Arc<dyn EmojiSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl StepHandler for EmojiHandler {
    type Args = EmojiArgs;

    fn opcode(&self) -> Opcode {
        Opcode::Emoji
    }

    fn parse(&self, step: &Step) -> InterpreterResult<EmojiArgs> {
        Ok(EmojiArgs {
            target: parse_masked(step)?,
            emoji: TextArg::from_step(step, "emoji")?,
        })
    }

    async fn execute(&self, state: &mut StateEnv, args: &EmojiArgs) -> InterpreterResult<Value> {
        let opcode = Opcode::Emoji.as_str();
        let (image, regions) = load_masked(state, opcode, &args.target)?;
        let name = args.emoji.resolve(state);
        let emoji = self
            .source
            .load(&name)
            .await
            .map_err(|e| InterpreterError::capability(opcode, EMOJI_SOURCE, e))?;
        let rects = regions.iter().map(|r| r.rect).collect::<Vec<_>>();
        Ok(Value::Image(imaging::paste_centered(&image, &emoji, &rects, EMOJI_SCALE_DIVISOR)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::{StubEmoji, StubInpainter};
    use crate::dsl::parse_step;
    use crate::value::Rect;
    use image::{DynamicImage, Rgb, RgbImage};

    fn red_state() -> StateEnv {
        let image = RgbImage::from_pixel(20, 20, Rgb([200, 10, 10]));
        StateEnv::new()
            .with("IMAGE", Value::image(DynamicImage::ImageRgb8(image)))
            .with("OBJ0", vec![Region::new(Rect::new(0, 0, 10, 10))])
    }

    fn pixel(value: &Value, x: u32, y: u32) -> [u8; 3] {
        value.as_image().unwrap().as_image().to_rgb8().get_pixel(x, y).0
    }

    #[tokio::test]
    async fn test_colorpop_grays_outside_mask() {
        let handler = ColorPopHandler::new();
        let args = handler.parse(&parse_step("IMAGE0=COLORPOP(image=IMAGE,object=OBJ0)").unwrap()).unwrap();
        let mut state = red_state();
        let value = handler.execute(&mut state, &args).await.unwrap();

        assert_eq!(pixel(&value, 2, 2), [200, 10, 10]);
        let [r, g, b] = pixel(&value, 15, 15);
        assert!(r == g && g == b);
        // the input binding is not modified
        assert_eq!(pixel(state.get("IMAGE").unwrap(), 15, 15), [200, 10, 10]);
    }

    #[tokio::test]
    async fn test_replace_sends_first_mask() {
        let inpainter = Arc::new(StubInpainter::new());
        let handler = ReplaceHandler::new(inpainter.clone());
        let args = handler
            .parse(&parse_step("IMAGE0=REPLACE(image=IMAGE,object=OBJ0,prompt='a cat')").unwrap())
            .unwrap();
        let value = handler.execute(&mut red_state(), &args).await.unwrap();

        assert_eq!(value.as_image().unwrap().width(), 20);
        assert_eq!(inpainter.prompts(), vec!["a cat".to_string()]);
        assert_eq!(inpainter.masks(), vec![Mask::from_rect(&Rect::new(0, 0, 10, 10), 20, 20)]);
    }

    #[tokio::test]
    async fn test_replace_empty_regions_is_type_mismatch() {
        let handler = ReplaceHandler::new(Arc::new(StubInpainter::new()));
        let args = handler
            .parse(&parse_step("IMAGE0=REPLACE(image=IMAGE,object=OBJ0,prompt='a cat')").unwrap())
            .unwrap();
        let mut state = red_state().with("OBJ0", Vec::<Region>::new());
        let err = handler.execute(&mut state, &args).await.unwrap_err();
        assert!(matches!(err, InterpreterError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_emoji_pasted_over_region() {
        let handler = EmojiHandler::new(Arc::new(StubEmoji::solid([0, 255, 0])));
        let args = handler
            .parse(&parse_step("IMAGE0=EMOJI(image=IMAGE,object=OBJ0,emoji='smiling_face')").unwrap())
            .unwrap();
        let value = handler.execute(&mut red_state(), &args).await.unwrap();
        // centre of the region is covered, far corner is not
        assert_eq!(pixel(&value, 5, 5), [0, 255, 0]);
        assert_eq!(pixel(&value, 19, 19), [200, 10, 10]);
    }
}
