use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::models::{BoundingBox, ClassificationResult};

const OUTER_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const INNER_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const OUTER_DOT: Rgb<u8> = Rgb([255, 255, 255]);
const INNER_DOT: Rgb<u8> = Rgb([0, 0, 0]);
const LINE_WIDTH: u32 = 5;

/// Copy of `frame` with the classified boxes and their centers drawn on it.
///
/// No text is rendered onto the image. The verdict label travels as
/// `FrameReport::result.verdict` (see `Verdict::label`) and is up to the
/// display sink; `DirectorySink` writes it to `verdicts.txt`.
pub fn annotate(frame: &RgbImage, result: &ClassificationResult) -> RgbImage {
    let mut canvas = frame.clone();

    if let Some(outer) = &result.outer {
        draw_box(&mut canvas, outer, OUTER_COLOR, OUTER_DOT, 10);
    }
    if let Some(inner) = &result.inner {
        draw_box(&mut canvas, inner, INNER_COLOR, INNER_DOT, 5);
    }

    canvas
}

fn draw_box(canvas: &mut RgbImage, bbox: &BoundingBox, line: Rgb<u8>, dot: Rgb<u8>, radius: i32) {
    // Thick outline as nested one-pixel rectangles, shrinking inward
    for inset in 0..LINE_WIDTH {
        let w = bbox.width.saturating_sub(2 * inset);
        let h = bbox.height.saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let rect = Rect::at((bbox.x + inset) as i32, (bbox.y + inset) as i32).of_size(w, h);
        draw_hollow_rect_mut(canvas, rect, line);
    }

    let (cx, cy) = bbox.center();
    draw_filled_circle_mut(canvas, (cx as i32, cy as i32), radius, dot);
}
