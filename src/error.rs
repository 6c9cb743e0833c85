use thiserror::Error;

/// Errors raised by the detection core.
///
/// Only `InvalidInput` signals a broken caller contract. The per-frame
/// variants are contained by the frame processor and never stop the loop.
#[derive(Debug, Error)]
pub enum DetectError {
    /// Contour selection was asked to pick from an empty contour set
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),

    /// A bounding box with zero height has no aspect ratio
    #[error("degenerate geometry: bounding box {width}x{height} at ({x}, {y})")]
    DegenerateGeometry { x: u32, y: u32, width: u32, height: u32 },

    #[error("click at ({x}, {y}) lies outside the {width}x{height} frame")]
    ClickOutOfFrame { x: u32, y: u32, width: u32, height: u32 },
}

pub type Result<T> = std::result::Result<T, DetectError>;
