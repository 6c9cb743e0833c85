mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from donutseg for tests
pub use donutseg::detection::color::rgb_to_hsv;
pub use donutseg::detection::contours::{analyze, build_hierarchy, select_largest_and_child};
pub use donutseg::{
    BoundingBox, ColorRangeModel, Contour, DetectorConfig, FrameProcessor, Hsv, HsvBounds,
    HsvFrame, ReseedRequest, ShapeMatcher, TrackerState, Verdict,
};
