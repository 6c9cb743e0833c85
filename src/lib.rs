pub mod detection;
pub mod error;
pub mod frames;
pub mod models;
pub mod pipeline;

pub use detection::{ColorRangeModel, DetectorConfig, HsvFrame, PairClassifier, ShapeMatcher};
pub use error::DetectError;
pub use frames::{DisplaySink, FrameSource};
pub use models::{
    BoundingBox, ClassificationResult, Contour, HierarchyEntry, Hsv, HsvBounds, Verdict,
};
pub use pipeline::{
    FrameProcessor, FrameReport, ReseedRequest, ScheduledClick, Tracker, TrackerState,
};
