use donutseg::Contour;
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::point::Point;
use imageproc::rect::Rect;

/// Color painted on the donut body
pub const FOREGROUND: Rgb<u8> = Rgb([200, 40, 40]);
/// Color everywhere else, including the hole
pub const BACKGROUND: Rgb<u8> = Rgb([20, 120, 220]);

/// Axis-aligned square given by its top-left corner and side length
#[derive(Debug, Clone, Copy)]
pub struct Square {
    pub x: i32,
    pub y: i32,
    pub size: u32,
}

pub const fn square(x: i32, y: i32, size: u32) -> Square {
    Square { x, y, size }
}

impl Square {
    fn rect(&self) -> Rect {
        Rect::at(self.x, self.y).of_size(self.size, self.size)
    }
}

/// 200x200 background frame with a filled `outer` square and optional holes
pub fn donut_frame(outer: Square, holes: &[Square]) -> RgbImage {
    let mut img = RgbImage::from_pixel(200, 200, BACKGROUND);
    draw_filled_rect_mut(&mut img, outer.rect(), FOREGROUND);
    for hole in holes {
        draw_filled_rect_mut(&mut img, hole.rect(), BACKGROUND);
    }
    img
}

/// Concentric donut: 100px body at (40, 40) with a 40px hole at (70, 70)
pub fn concentric_donut() -> RgbImage {
    donut_frame(square(40, 40, 100), &[square(70, 70, 40)])
}

/// Binary mask with filled squares (255) on black, holes cut back to 0
pub fn mask_with(squares: &[Square], holes: &[Square]) -> GrayImage {
    let mut mask = GrayImage::new(200, 200);
    for s in squares {
        draw_filled_rect_mut(&mut mask, s.rect(), Luma([255u8]));
    }
    for h in holes {
        draw_filled_rect_mut(&mut mask, h.rect(), Luma([0u8]));
    }
    mask
}

/// Closed polygon through the given corners
pub fn polygon(corners: &[(i32, i32)]) -> Contour {
    Contour::new(corners.iter().map(|&(x, y)| Point::new(x, y)).collect(), false)
}

/// Rectangle contour spanning (x0, y0) to (x1, y1) inclusive
pub fn rect_contour(x0: i32, y0: i32, x1: i32, y1: i32) -> Contour {
    polygon(&[(x0, y0), (x1, y0), (x1, y1), (x0, y1)])
}

pub fn translated(contour: &Contour, dx: i32, dy: i32) -> Contour {
    Contour::new(
        contour.points.iter().map(|p| Point::new(p.x + dx, p.y + dy)).collect(),
        contour.is_hole,
    )
}
