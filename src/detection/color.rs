use image::{GrayImage, Luma, Rgb, RgbImage};
use tracing::debug;

use crate::detection::DetectorConfig;
use crate::models::{Contour, Hsv, HsvBounds};

/// Convert one RGB pixel to 8-bit HSV (hue halved to fit 0..=179)
pub fn rgb_to_hsv(rgb: Rgb<u8>) -> Hsv {
    let [r, g, b] = rgb.0.map(|c| c as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

    let mut h_deg = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h_deg < 0.0 {
        h_deg += 360.0;
    }
    let h = (h_deg / 2.0).round() as i32 % 180;

    Hsv::new(h, s.round() as i32, max as i32)
}

/// Frame converted to HSV once, shared by thresholding and expansion.
///
/// Channels are packed into an `RgbImage` as (H, S, V).
#[derive(Debug, Clone)]
pub struct HsvFrame {
    pixels: RgbImage,
}

impl HsvFrame {
    pub fn from_rgb(frame: &RgbImage) -> Self {
        let pixels = RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
            let hsv = rgb_to_hsv(*frame.get_pixel(x, y));
            Rgb([hsv.h as u8, hsv.s as u8, hsv.v as u8])
        });
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// HSV value at (x, y). Panics outside the frame, like `get_pixel`.
    pub fn hsv_at(&self, x: u32, y: u32) -> Hsv {
        let [h, s, v] = self.pixels.get_pixel(x, y).0;
        Hsv::new(h as i32, s as i32, v as i32)
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Hsv> {
        (x < self.width() && y < self.height()).then(|| self.hsv_at(x, y))
    }
}

/// Learned HSV acceptance box plus the parameters used to grow it
#[derive(Debug, Clone)]
pub struct ColorRangeModel {
    bounds: HsvBounds,
    neighborhood_size: u32,
    tolerance: i32,
}

impl ColorRangeModel {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            bounds: HsvBounds::point(Hsv::new(0, 0, 0)),
            neighborhood_size: config.neighborhood_size,
            tolerance: config.tolerance,
        }
    }

    pub fn bounds(&self) -> HsvBounds {
        self.bounds
    }

    /// Reset to a single-point box, discarding everything learned so far
    pub fn seed(&mut self, hsv: Hsv) {
        self.bounds = HsvBounds::point(hsv.clamped());
    }

    /// Binary mask: 255 where every channel lies inside the bounds, else 0
    pub fn mask(&self, frame: &HsvFrame) -> GrayImage {
        GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
            if self.bounds.contains(&frame.hsv_at(x, y)) {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    /// Grow the bounds from the neighborhood of every point on `contour`
    pub fn expand(&mut self, frame: &HsvFrame, contour: &Contour) -> HsvBounds {
        self.expand_with(frame, contour, self.neighborhood_size, self.tolerance)
    }

    /// Same as [`expand`](Self::expand) with explicit parameters.
    ///
    /// A neighbor qualifies when it is within `tolerance` of the lower or the
    /// upper corner as they stood when the call began. Qualifying neighbors
    /// widen a running copy of the box by `tolerance` on each side.
    pub fn expand_with(
        &mut self,
        frame: &HsvFrame,
        contour: &Contour,
        neighborhood_size: u32,
        tolerance: i32,
    ) -> HsvBounds {
        let entry = self.bounds;
        let mut lower = entry.lower;
        let mut upper = entry.upper;
        let mut admitted = 0usize;

        let half = (neighborhood_size / 2) as i64;
        let (width, height) = (frame.width() as i64, frame.height() as i64);

        for p in &contour.points {
            let (px, py) = (p.x as i64, p.y as i64);
            let x_range = (px - half).max(0)..(px + half + 1).min(width);
            for nx in x_range {
                let y_range = (py - half).max(0)..(py + half + 1).min(height);
                for ny in y_range {
                    let neighbor = frame.hsv_at(nx as u32, ny as u32);
                    if neighbor.is_near(&entry.lower, tolerance)
                        || neighbor.is_near(&entry.upper, tolerance)
                    {
                        lower = lower.min(neighbor.offset(tolerance.saturating_neg()));
                        upper = upper.max(neighbor.offset(tolerance));
                        admitted += 1;
                    }
                }
            }
        }

        // lower only falls and upper only rises, so clamping keeps the box ordered
        self.bounds = HsvBounds {
            lower: lower.clamped(),
            upper: upper.clamped(),
        };

        if self.bounds != entry {
            debug!(admitted, from = %entry, to = %self.bounds, "expanded color bounds");
        }
        self.bounds
    }
}
