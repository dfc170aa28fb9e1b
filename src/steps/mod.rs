// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Opcode handlers.
//!
//! One module per operation family. Every handler implements
//! [`StepHandler`](crate::traits::StepHandler) with its own typed argument struct
//! and is constructed by [`HandlerFactory`] from the injected capabilities.
//!
//! | Module | Opcodes | Capability |
//! |---|---|---|
//! | `vqa` | VQA | visual QA |
//! | `eval` | EVAL | none |
//! | `result` | RESULT | none |
//! | `find` | FIND | object detector |
//! | `count` | COUNT, EXISTS | none |
//! | `filter` | FILTER | visual QA |
//! | `loc` | LOC | object detector |
//! | `crop` | CROP and the CROP_* variants | none |
//! | `seg` | SEG | segmenter |
//! | `select` | SELECT | classifier |
//! | `edit` | COLORPOP, BGBLUR, REPLACE, EMOJI | inpainter, emoji source |
//! | `facedet` | FACEDET | face detector |
//! | `list` | LIST | list generator |
//! | `classify` | CLASSIFY | classifier |
//! | `tag` | TAG | none |

pub mod args;
pub mod classify;
pub mod count;
pub mod crop;
pub mod edit;
pub mod eval;
pub mod facedet;
pub mod factory;
pub mod filter;
pub mod find;
pub mod list;
pub mod loc;
pub mod result;
pub mod seg;
pub mod select;
pub mod tag;
pub mod vqa;

pub use factory::{HandlerFactory, HandlerOptions};
