pub mod capability;
pub mod executor;
pub mod handler;

pub use capability::{
    Capabilities, Classification, Classifier, Detection, EmojiSource, FaceDetector, Inpainter, ListGenerator,
    ObjectDetector, Segment, Segmenter, VisualQa,
};
pub use executor::{ProgramExecutor, ProgramOutput};
pub use handler::{Interpret, StepHandler};
