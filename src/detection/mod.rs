pub mod annotate;
pub mod color;
pub mod contours;
pub mod shapes;

pub use color::{ColorRangeModel, HsvFrame};
pub use contours::{analyze, select_largest_and_child, ContourSet};
pub use shapes::{PairClassifier, ShapeMatcher};

/// Tunable constants for adaptation and classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Side of the square sampled around each contour point
    pub neighborhood_size: u32,
    /// Per-channel HSV distance that admits a neighbor, and the margin it adds
    pub tolerance: i32,
    /// Both contours must enclose strictly more than this many pixels
    pub min_area: f64,
    pub max_aspect_delta: f64,
    /// Largest center distance, in pixels, still counted as concentric
    pub max_center_distance: f64,
}

impl DetectorConfig {
    pub fn new() -> Self {
        Self {
            neighborhood_size: 5,
            tolerance: 10,
            min_area: 100.0,
            max_aspect_delta: 10.0,
            max_center_distance: 20.0,
        }
    }

    pub fn with_neighborhood_size(mut self, size: u32) -> Self {
        self.neighborhood_size = size;
        self
    }

    pub fn with_tolerance(mut self, tolerance: i32) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::new()
    }
}
