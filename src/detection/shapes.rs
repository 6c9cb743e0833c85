use tracing::debug;

use crate::detection::DetectorConfig;
use crate::error::Result;
use crate::models::{BoundingBox, ClassificationResult, Contour, Verdict};

/// Decides what an outer contour and its selected child amount to
pub trait PairClassifier: Send {
    fn classify(&self, outer: &Contour, inner: Option<&Contour>) -> Result<ClassificationResult>;
}

/// Thresholds for deciding whether an outer/inner pair is one concentric shape
#[derive(Debug, Clone, Copy)]
pub struct ShapeMatcher {
    pub min_area: f64,
    pub max_aspect_delta: f64,
    pub max_center_distance: f64,
}

impl ShapeMatcher {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            min_area: config.min_area,
            max_aspect_delta: config.max_aspect_delta,
            max_center_distance: config.max_center_distance,
        }
    }

    /// Classify an outer contour against its selected child.
    ///
    /// Pairs where either area is at most `min_area` are a `Mismatch` without
    /// geometry. A zero-height box is reported as `DegenerateGeometry`.
    pub fn classify(&self, outer: &Contour, inner: Option<&Contour>) -> Result<ClassificationResult> {
        let Some(inner) = inner else {
            return Ok(ClassificationResult {
                verdict: Verdict::NoInnerContour,
                outer: outer.bounding_box(),
                inner: None,
            });
        };

        let (outer_area, inner_area) = (outer.area(), inner.area());
        if outer_area <= self.min_area || inner_area <= self.min_area {
            debug!(outer_area, inner_area, "pair too small to judge");
            return Ok(ClassificationResult::bare(Verdict::Mismatch));
        }

        let (Some(outer_box), Some(inner_box)) = (outer.bounding_box(), inner.bounding_box()) else {
            return Ok(ClassificationResult::bare(Verdict::Mismatch));
        };

        let verdict = self.judge(&outer_box, &inner_box)?;
        Ok(ClassificationResult::with_boxes(verdict, outer_box, Some(inner_box)))
    }

    /// Compare two boxes by aspect ratio and center distance
    pub fn judge(&self, outer: &BoundingBox, inner: &BoundingBox) -> Result<Verdict> {
        let outer_ratio = outer.aspect_ratio()?;
        let inner_ratio = inner.aspect_ratio()?;
        let distance = outer.center_distance(inner);

        let verdict = if (outer_ratio - inner_ratio).abs() < self.max_aspect_delta
            && distance < self.max_center_distance
        {
            Verdict::Match
        } else {
            Verdict::Mismatch
        };

        debug!(outer_ratio, inner_ratio, distance, ?verdict, "judged contour pair");
        Ok(verdict)
    }
}

impl PairClassifier for ShapeMatcher {
    fn classify(&self, outer: &Contour, inner: Option<&Contour>) -> Result<ClassificationResult> {
        ShapeMatcher::classify(self, outer, inner)
    }
}

impl Default for ShapeMatcher {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}
