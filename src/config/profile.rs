// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::consts::{LOC_NMS_THRESHOLD, LOC_THRESHOLD, OKDET_LOC_NMS_THRESHOLD, OKDET_LOC_THRESHOLD};
use crate::errors::InterpreterError;

/// Every operation name the interpreter knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    Vqa,
    Eval,
    Result,
    Find,
    Count,
    Filter,
    Exists,
    Loc,
    Crop,
    CropRightOf,
    CropLeftOf,
    CropFrontOf,
    CropInFrontOf,
    CropInFront,
    CropBehind,
    CropAhead,
    CropBelow,
    CropAbove,
    Seg,
    Select,
    ColorPop,
    BgBlur,
    Replace,
    Emoji,
    FaceDet,
    List,
    Classify,
    Tag,
}

impl Opcode {
    pub const ALL: [Opcode; 28] = [
        Opcode::Vqa,
        Opcode::Eval,
        Opcode::Result,
        Opcode::Find,
        Opcode::Count,
        Opcode::Filter,
        Opcode::Exists,
        Opcode::Loc,
        Opcode::Crop,
        Opcode::CropRightOf,
        Opcode::CropLeftOf,
        Opcode::CropFrontOf,
        Opcode::CropInFrontOf,
        Opcode::CropInFront,
        Opcode::CropBehind,
        Opcode::CropAhead,
        Opcode::CropBelow,
        Opcode::CropAbove,
        Opcode::Seg,
        Opcode::Select,
        Opcode::ColorPop,
        Opcode::BgBlur,
        Opcode::Replace,
        Opcode::Emoji,
        Opcode::FaceDet,
        Opcode::List,
        Opcode::Classify,
        Opcode::Tag,
    ];

    /// The name as written in program text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Opcode::Vqa => "VQA",
            Opcode::Eval => "EVAL",
            Opcode::Result => "RESULT",
            Opcode::Find => "FIND",
            Opcode::Count => "COUNT",
            Opcode::Filter => "FILTER",
            Opcode::Exists => "EXISTS",
            Opcode::Loc => "LOC",
            Opcode::Crop => "CROP",
            Opcode::CropRightOf => "CROP_RIGHTOF",
            Opcode::CropLeftOf => "CROP_LEFTOF",
            Opcode::CropFrontOf => "CROP_FRONTOF",
            Opcode::CropInFrontOf => "CROP_INFRONTOF",
            Opcode::CropInFront => "CROP_INFRONT",
            Opcode::CropBehind => "CROP_BEHIND",
            Opcode::CropAhead => "CROP_AHEAD",
            Opcode::CropBelow => "CROP_BELOW",
            Opcode::CropAbove => "CROP_ABOVE",
            Opcode::Seg => "SEG",
            Opcode::Select => "SELECT",
            Opcode::ColorPop => "COLORPOP",
            Opcode::BgBlur => "BGBLUR",
            Opcode::Replace => "REPLACE",
            Opcode::Emoji => "EMOJI",
            Opcode::FaceDet => "FACEDET",
            Opcode::List => "LIST",
            Opcode::Classify => "CLASSIFY",
            Opcode::Tag => "TAG",
        }
    }
}

impl FromStr for Opcode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL.into_iter().find(|op| op.as_str() == s).ok_or(())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named opcode subset for one task family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Profile {
    /// Natural-language visual reasoning over an image pair.
    Nlvr,
    /// Compositional question answering on one image.
    Gqa,
    /// Natural-language image editing.
    ImageEdit,
    /// Knowledge-tagging of objects.
    OkDet,
}

impl Profile {
    pub const ALL: [Profile; 4] = [Profile::Nlvr, Profile::Gqa, Profile::ImageEdit, Profile::OkDet];

    pub fn name(&self) -> &'static str {
        match self {
            Profile::Nlvr => "nlvr",
            Profile::Gqa => "gqa",
            Profile::ImageEdit => "imageEdit",
            Profile::OkDet => "okDet",
        }
    }

    /// Opcodes enabled in this profile, in registration order.
    pub fn opcodes(&self) -> &'static [Opcode] {
        match self {
            Profile::Nlvr => &[
                Opcode::Vqa,
                Opcode::Eval,
                Opcode::Result,
                Opcode::Find,
                Opcode::Count,
                Opcode::Filter,
                Opcode::Exists,
            ],
            Profile::Gqa => &[
                Opcode::Loc,
                Opcode::Count,
                Opcode::Crop,
                Opcode::CropRightOf,
                Opcode::CropLeftOf,
                Opcode::CropFrontOf,
                Opcode::CropInFrontOf,
                Opcode::CropInFront,
                Opcode::CropBehind,
                Opcode::CropAhead,
                Opcode::CropBelow,
                Opcode::CropAbove,
                Opcode::Vqa,
                Opcode::Eval,
                Opcode::Result,
            ],
            Profile::ImageEdit => &[
                Opcode::FaceDet,
                Opcode::Seg,
                Opcode::Select,
                Opcode::ColorPop,
                Opcode::BgBlur,
                Opcode::Replace,
                Opcode::Emoji,
                Opcode::Result,
            ],
            Profile::OkDet => &[
                Opcode::FaceDet,
                Opcode::List,
                Opcode::Classify,
                Opcode::Result,
                Opcode::Tag,
                Opcode::Loc,
            ],
        }
    }

    pub fn contains(&self, opcode: Opcode) -> bool {
        self.opcodes().contains(&opcode)
    }

    /// Default LOC `(threshold, nms_threshold)` for this profile.
    pub fn loc_thresholds(&self) -> (f32, f32) {
        match self {
            Profile::OkDet => (OKDET_LOC_THRESHOLD, OKDET_LOC_NMS_THRESHOLD),
            _ => (LOC_THRESHOLD, LOC_NMS_THRESHOLD),
        }
    }
}

impl FromStr for Profile {
    type Err = InterpreterError;

    /// Case-insensitive; `image_edit` and `ok_det` are accepted as aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s.trim().chars().filter(|c| *c != '_' && *c != '-').collect();
        match key.to_ascii_lowercase().as_str() {
            "nlvr" => Ok(Profile::Nlvr),
            "gqa" => Ok(Profile::Gqa),
            "imageedit" => Ok(Profile::ImageEdit),
            "okdet" => Ok(Profile::OkDet),
            _ => Err(InterpreterError::UnknownProfile(s.to_string())),
        }
    }
}

impl TryFrom<String> for Profile {
    type Error = InterpreterError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Profile> for String {
    fn from(p: Profile) -> Self {
        p.name().to_string()
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
