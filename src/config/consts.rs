/// Variable names tried, in order, for the image regions are cropped from
pub const BASE_IMAGE_CANDIDATES: [&str; 3] = ["LEFT", "RIGHT", "IMAGE"];

/// LOC drops detections scoring at or below this
pub const LOC_THRESHOLD: f32 = 0.1;
/// LOC non-maximum suppression IoU threshold
pub const LOC_NMS_THRESHOLD: f32 = 0.5;
/// LOC threshold for the okDet profile
pub const OKDET_LOC_THRESHOLD: f32 = 0.05;
/// LOC non-maximum suppression IoU threshold for the okDet profile
pub const OKDET_LOC_NMS_THRESHOLD: f32 = 0.3;

/// CROP grows the box by this factor around its centre
pub const CROP_EXPAND_FACTOR: f32 = 1.5;
/// FACEDET grows each face box by this factor around its centre
pub const FACE_ENLARGE_FACTOR: f32 = 1.5;
/// EMOJI is sized to the box height divided by this
pub const EMOJI_SCALE_DIVISOR: f32 = 1.5;

/// Gaussian sigma for the BGBLUR background
pub const BACKGROUND_BLUR_SIGMA: f32 = 2.0;
/// Gaussian sigma used to soften the BGBLUR mask edge
pub const MASK_SMOOTHING_SIGMA: f32 = 5.0;

/// Outline width for boxes drawn by TAG and LOC
pub const BOX_OUTLINE_WIDTH: u32 = 5;

/// Default upper bound on LIST results
pub const DEFAULT_LIST_MAX: usize = 20;

/// Label paired with a lone CLASSIFY category
pub const OTHER_CATEGORY: &str = "other";

/// Default request timeout for the HTTP capability backend
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 60;
/// Upper bound accepted for the HTTP request timeout
pub const MAX_HTTP_TIMEOUT_SECONDS: u64 = 3600;
