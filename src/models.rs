use imageproc::point::Point;
use std::fmt;

use crate::error::{DetectError, Result};

/// Largest hue in the 8-bit convention (degrees halved)
pub const HUE_MAX: i32 = 179;
/// Largest saturation or value
pub const CHANNEL_MAX: i32 = 255;

/// A color in 8-bit HSV space.
///
/// Channels are kept as `i32` so tolerance arithmetic can step outside the
/// legal range before being clamped back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hsv {
    pub h: i32,
    pub s: i32,
    pub v: i32,
}

impl Hsv {
    pub const fn new(h: i32, s: i32, v: i32) -> Self {
        Self { h, s, v }
    }

    pub fn channels(&self) -> [i32; 3] {
        [self.h, self.s, self.v]
    }

    /// Add `delta` to every channel, saturating at the `i32` limits
    pub fn offset(self, delta: i32) -> Self {
        Self::new(
            self.h.saturating_add(delta),
            self.s.saturating_add(delta),
            self.v.saturating_add(delta),
        )
    }

    /// Channel-wise minimum
    pub fn min(self, other: Hsv) -> Self {
        Self::new(self.h.min(other.h), self.s.min(other.s), self.v.min(other.v))
    }

    /// Channel-wise maximum
    pub fn max(self, other: Hsv) -> Self {
        Self::new(self.h.max(other.h), self.s.max(other.s), self.v.max(other.v))
    }

    /// Clamp every channel into its legal range
    pub fn clamped(self) -> Self {
        Self::new(
            self.h.clamp(0, HUE_MAX),
            self.s.clamp(0, CHANNEL_MAX),
            self.v.clamp(0, CHANNEL_MAX),
        )
    }

    /// True when every channel differs from `other` by at most `tolerance`
    pub fn is_near(&self, other: &Hsv, tolerance: i32) -> bool {
        self.channels()
            .iter()
            .zip(other.channels().iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl fmt::Display for Hsv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.h, self.s, self.v)
    }
}

/// Axis-aligned acceptance box in HSV space, inclusive on both corners
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvBounds {
    pub lower: Hsv,
    pub upper: Hsv,
}

impl HsvBounds {
    /// Build a box from two corners, reordering channels that are inverted
    pub fn new(a: Hsv, b: Hsv) -> Self {
        Self {
            lower: a.min(b),
            upper: a.max(b),
        }
    }

    /// Degenerate single-point box, as produced by a seed click
    pub fn point(hsv: Hsv) -> Self {
        Self { lower: hsv, upper: hsv }
    }

    pub fn contains(&self, hsv: &Hsv) -> bool {
        let lo = self.lower.channels();
        let hi = self.upper.channels();
        hsv.channels()
            .iter()
            .enumerate()
            .all(|(c, value)| *value >= lo[c] && *value <= hi[c])
    }

    /// True when `other` lies entirely inside this box
    pub fn encloses(&self, other: &HsvBounds) -> bool {
        self.lower.min(other.lower) == self.lower && self.upper.max(other.upper) == self.upper
    }

    /// True when no channel of `lower` exceeds the matching channel of `upper`
    pub fn is_ordered(&self) -> bool {
        self.lower.min(self.upper) == self.lower
    }
}

impl fmt::Display for HsvBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.lower, self.upper)
    }
}

/// Closed boundary of a connected foreground region
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point<i32>>,
    /// Hole borders trace the inside edge of a region
    pub is_hole: bool,
}

impl Contour {
    pub fn new(points: Vec<Point<i32>>, is_hole: bool) -> Self {
        Self { points, is_hole }
    }

    /// Enclosed polygon area (shoelace formula over the border points)
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i64 = (0..n)
            .map(|i| {
                let p = self.points[i];
                let q = self.points[(i + 1) % n];
                p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64
            })
            .sum();
        (twice as f64 / 2.0).abs()
    }

    /// Tight pixel bounding box, `None` for an empty contour
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let first = self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(BoundingBox {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            width: (max_x - min_x + 1) as u32,
            height: (max_y - min_y + 1) as u32,
        })
    }
}

/// Links of one contour inside the per-frame hierarchy forest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HierarchyEntry {
    pub next: Option<usize>,
    pub previous: Option<usize>,
    pub first_child: Option<usize>,
    pub parent: Option<usize>,
}

/// Bounding box in frame coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn aspect_ratio(&self) -> Result<f64> {
        if self.height == 0 {
            return Err(DetectError::DegenerateGeometry {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self.width as f64 / self.height as f64)
    }

    /// Center truncated to whole pixels
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn center_distance(&self, other: &BoundingBox) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        let dx = ax as f64 - bx as f64;
        let dy = ay as f64 - by as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Outcome of one frame's shape check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Mismatch,
    NoInnerContour,
    NoContours,
    /// Geometry could not be evaluated this frame (zero-height box)
    Undetermined,
}

impl Verdict {
    /// Text shown next to the annotation
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Match => "probably a donut",
            Verdict::Mismatch => "shapes touching, separate them",
            Verdict::NoInnerContour => "no child contour",
            Verdict::NoContours => "no contours",
            Verdict::Undetermined => "undetermined geometry",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationResult {
    pub verdict: Verdict,
    pub outer: Option<BoundingBox>,
    pub inner: Option<BoundingBox>,
}

impl ClassificationResult {
    pub fn bare(verdict: Verdict) -> Self {
        Self {
            verdict,
            outer: None,
            inner: None,
        }
    }

    pub fn with_boxes(verdict: Verdict, outer: BoundingBox, inner: Option<BoundingBox>) -> Self {
        Self {
            verdict,
            outer: Some(outer),
            inner,
        }
    }
}
