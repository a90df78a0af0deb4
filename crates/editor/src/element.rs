//! On-screen element state derived from a resolved transform.

use serde::{Deserialize, Serialize};

use slotframe_placement_model::geometry::{AffineTransform, NaturalSize};

/// Transform applied to an image element inside its frame.
///
/// Translation happens before scaling and the origin is pinned to the
/// frame's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
    pub display_width: f64,
    pub display_height: f64,
}

impl ElementTransform {
    pub fn new(transform: &AffineTransform, natural: NaturalSize) -> Self {
        let (display_width, display_height) = transform.display_size(natural);
        Self {
            translate_x: transform.translate_x,
            translate_y: transform.translate_y,
            scale: transform.scale,
            display_width,
            display_height,
        }
    }

    /// The affine transform this element state was built from.
    pub fn affine(&self) -> AffineTransform {
        AffineTransform {
            scale: self.scale,
            translate_x: self.translate_x,
            translate_y: self.translate_y,
        }
    }

    /// CSS `transform` value.
    pub fn css_transform(&self) -> String {
        self.affine().css_transform()
    }

    /// CSS `transform-origin` value.
    pub fn transform_origin(&self) -> &'static str {
        "0 0"
    }
}
