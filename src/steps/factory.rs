use std::sync::Arc;

use crate::config::{Opcode, Profile};
use crate::errors::InterpreterResult;
use crate::traits::{Capabilities, Interpret};
use crate::utils::geometry::Side;

use super::classify::ClassifyHandler;
use super::count::{CountHandler, ExistsHandler};
use super::crop::{CropHandler, CropMode};
use super::edit::{BgBlurHandler, ColorPopHandler, EmojiHandler, ReplaceHandler};
use super::eval::EvalHandler;
use super::facedet::FaceDetHandler;
use super::filter::FilterHandler;
use super::find::FindHandler;
use super::list::ListHandler;
use super::loc::{LocHandler, LocMode};
use super::result::ResultHandler;
use super::seg::SegHandler;
use super::select::SelectHandler;
use super::tag::TagHandler;
use super::vqa::VqaHandler;

/// Tunables handed to handlers at construction time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandlerOptions {
    /// LOC drops detections scoring at or below this.
    pub loc_threshold: f32,
    /// IoU above which LOC suppresses the lower-scoring box.
    pub loc_nms_threshold: f32,
    pub loc_mode: LocMode,
}

impl HandlerOptions {
    pub fn for_profile(profile: Profile) -> Self {
        let (loc_threshold, loc_nms_threshold) = profile.loc_thresholds();
        let loc_mode = match profile {
            Profile::OkDet => LocMode::Plain,
            _ => LocMode::Annotated,
        };
        Self {
            loc_threshold,
            loc_nms_threshold,
            loc_mode,
        }
    }
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self::for_profile(Profile::Gqa)
    }
}

/// Factory for creating step handlers from capabilities
pub struct HandlerFactory;

impl HandlerFactory {
    /// Create the handler for an opcode.
    ///
    /// Fails with `MissingCapability` when the opcode needs a model that
    /// `caps` does not provide.
    pub fn create_handler(
        opcode: Opcode,
        caps: &Capabilities,
        options: &HandlerOptions,
    ) -> InterpreterResult<Arc<dyn Interpret>> {
        let name = opcode.as_str();
        let handler: Arc<dyn Interpret> = match opcode {
            Opcode::Vqa => Arc::new(VqaHandler::new(caps.visual_qa(name)?)),
            Opcode::Eval => Arc::new(EvalHandler::new()),
            Opcode::Result => Arc::new(ResultHandler::new()),
            Opcode::Find => Arc::new(FindHandler::new(caps.object_detector(name)?)),
            Opcode::Count => Arc::new(CountHandler::new()),
            Opcode::Filter => Arc::new(FilterHandler::new(caps.visual_qa(name)?)),
            Opcode::Exists => Arc::new(ExistsHandler::new()),
            Opcode::Loc => Arc::new(
                LocHandler::new(caps.object_detector(name)?, options.loc_threshold, options.loc_nms_threshold)
                    .with_mode(options.loc_mode),
            ),
            Opcode::Crop
            | Opcode::CropFrontOf
            | Opcode::CropInFrontOf
            | Opcode::CropInFront
            | Opcode::CropBehind
            | Opcode::CropAhead => Arc::new(CropHandler::new(opcode, CropMode::Expand)),
            Opcode::CropRightOf => Arc::new(CropHandler::new(opcode, CropMode::Beside(Side::Right))),
            Opcode::CropLeftOf => Arc::new(CropHandler::new(opcode, CropMode::Beside(Side::Left))),
            Opcode::CropAbove => Arc::new(CropHandler::new(opcode, CropMode::Beside(Side::Top))),
            Opcode::CropBelow => Arc::new(CropHandler::new(opcode, CropMode::Beside(Side::Bottom))),
            Opcode::Seg => Arc::new(SegHandler::new(caps.segmenter(name)?)),
            Opcode::Select => Arc::new(SelectHandler::new(caps.classifier(name)?)),
            Opcode::ColorPop => Arc::new(ColorPopHandler::new()),
            Opcode::BgBlur => Arc::new(BgBlurHandler::new()),
            Opcode::Replace => Arc::new(ReplaceHandler::new(caps.inpainter(name)?)),
            Opcode::Emoji => Arc::new(EmojiHandler::new(caps.emoji_source(name)?)),
            Opcode::FaceDet => Arc::new(FaceDetHandler::new(caps.face_detector(name)?)),
            Opcode::List => Arc::new(ListHandler::new(caps.list_generator(name)?)),
            Opcode::Classify => Arc::new(ClassifyHandler::new(caps.classifier(name)?)),
            Opcode::Tag => Arc::new(TagHandler::new()),
        };
        Ok(handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::stub_capabilities;
    use crate::errors::InterpreterError;

    #[test]
    fn test_every_opcode_builds_with_full_capabilities() {
        let caps = stub_capabilities();
        for opcode in Opcode::ALL {
            let handler = HandlerFactory::create_handler(opcode, &caps, &HandlerOptions::default()).unwrap();
            assert_eq!(handler.opcode(), opcode);
        }
    }

    #[test]
    fn test_missing_capability_names_opcode() {
        let err = HandlerFactory::create_handler(Opcode::Find, &Capabilities::new(), &HandlerOptions::default())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            InterpreterError::MissingCapability { ref opcode, capability: "object_detector" } if opcode == "FIND"
        ));
    }

    #[test]
    fn test_model_free_opcodes_need_no_capabilities() {
        for opcode in [Opcode::Eval, Opcode::Result, Opcode::Count, Opcode::Exists, Opcode::Crop, Opcode::Tag] {
            assert!(HandlerFactory::create_handler(opcode, &Capabilities::new(), &HandlerOptions::default()).is_ok());
        }
    }

    #[test]
    fn test_okdet_loc_thresholds() {
        let options = HandlerOptions::for_profile(Profile::OkDet);
        assert_eq!(options.loc_threshold, 0.05);
        assert_eq!(options.loc_nms_threshold, 0.3);
        assert_eq!(options.loc_mode, LocMode::Plain);
        assert_eq!(HandlerOptions::for_profile(Profile::Gqa).loc_mode, LocMode::Annotated);
    }
}
