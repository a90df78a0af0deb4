//! Cover-fit transform resolution.
//!
//! [`resolve`] is the only place placement state is turned into geometry.
//! It is pure and synchronous; the editor preview and the flatten
//! rasterizer both call it with identical inputs.

use crate::geometry::{AffineTransform, FrameSize, NaturalSize};
use crate::record::PlacementRecord;

/// Structurally invalid geometry inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    #[error("Frame has zero size: {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },

    #[error("Image has zero natural size: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
}

/// Smallest scale at which `natural` fully covers `frame`.
pub fn base_scale(frame: FrameSize, natural: NaturalSize) -> f64 {
    let sx = frame.width as f64 / natural.width as f64;
    let sy = frame.height as f64 / natural.height as f64;
    sx.max(sy)
}

/// Map a placement record to a frame-local affine transform.
///
/// - total scale is the cover-fit base scale times `scale_percent / 100`
/// - translation is `frame * (offset - 100) / 100`, relative to the
///   frame's top-left corner
///
/// The record is used as given; clamping happens where records are edited.
pub fn resolve(
    record: &PlacementRecord,
    frame: FrameSize,
    natural: NaturalSize,
) -> Result<AffineTransform, GeometryError> {
    if frame.is_empty() {
        return Err(GeometryError::EmptyFrame {
            width: frame.width,
            height: frame.height,
        });
    }
    if natural.is_empty() {
        return Err(GeometryError::EmptyImage {
            width: natural.width,
            height: natural.height,
        });
    }

    let total_scale = base_scale(frame, natural) * (record.scale_percent / 100.0);
    let offset_fraction_x = (record.offset_x_percent - 100.0) / 100.0;
    let offset_fraction_y = (record.offset_y_percent - 100.0) / 100.0;

    Ok(AffineTransform {
        scale: total_scale,
        translate_x: frame.width as f64 * offset_fraction_x,
        translate_y: frame.height as f64 * offset_fraction_y,
    })
}
