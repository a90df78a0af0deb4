//! Frame, image, and transform geometry.
//!
//! Frame-local coordinates: `(0, 0)` is the frame's top-left corner,
//! units are output pixels. Image coordinates are natural pixels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Tolerance used when checking that a transform covers its frame.
pub const COVER_EPSILON: f64 = 1e-6;

/// The fixed-size viewing window an image slot is rendered into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

/// Intrinsic resolution of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaturalSize {
    pub width: u32,
    pub height: u32,
}

macro_rules! impl_pixel_size {
    ($ty:ident) => {
        impl $ty {
            pub fn new(width: u32, height: u32) -> Self {
                Self { width, height }
            }

            /// True when either dimension is zero.
            pub fn is_empty(&self) -> bool {
                self.width == 0 || self.height == 0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}x{}", self.width, self.height)
            }
        }

        impl FromStr for $ty {
            type Err = SizeParseError;

            /// Parse `WIDTHxHEIGHT`, e.g. `800x600`.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (w, h) = parse_dimensions(s)?;
                Ok(Self::new(w, h))
            }
        }
    };
}

impl_pixel_size!(FrameSize);
impl_pixel_size!(NaturalSize);

/// Error returned when a `WIDTHxHEIGHT` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid size '{input}': expected WIDTHxHEIGHT")]
pub struct SizeParseError {
    pub input: String,
}

fn parse_dimensions(s: &str) -> Result<(u32, u32), SizeParseError> {
    let err = || SizeParseError {
        input: s.to_string(),
    };
    let (w, h) = s
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(err)?;
    let w = w.trim().parse().map_err(|_| err())?;
    let h = h.trim().parse().map_err(|_| err())?;
    Ok((w, h))
}

/// A 2D point in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Uniform scale followed by translation, in frame-local pixels.
///
/// Maps an image point `p` to `p * scale + (translate_x, translate_y)`.
/// The origin is the frame's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl AffineTransform {
    /// On-screen size of the image under this transform.
    pub fn display_size(&self, natural: NaturalSize) -> (f64, f64) {
        (
            natural.width as f64 * self.scale,
            natural.height as f64 * self.scale,
        )
    }

    /// Image point to frame point.
    pub fn apply(&self, p: Point2D) -> Point2D {
        Point2D {
            x: p.x * self.scale + self.translate_x,
            y: p.y * self.scale + self.translate_y,
        }
    }

    /// Frame point to image point.
    pub fn invert(&self, p: Point2D) -> Point2D {
        Point2D {
            x: (p.x - self.translate_x) / self.scale,
            y: (p.y - self.translate_y) / self.scale,
        }
    }

    /// Whether the displayed image is at least as large as the frame.
    pub fn covers(&self, frame: FrameSize, natural: NaturalSize) -> bool {
        let (dw, dh) = self.display_size(natural);
        dw >= frame.width as f64 - COVER_EPSILON && dh >= frame.height as f64 - COVER_EPSILON
    }

    /// CSS-like transform string: translate first, then scale.
    ///
    /// Must be paired with a top-left transform origin.
    pub fn css_transform(&self) -> String {
        format!(
            "translate({:.3}px, {:.3}px) scale({:.6})",
            self.translate_x, self.translate_y, self.scale
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        let frame: FrameSize = "800x600".parse().unwrap();
        assert_eq!(frame, FrameSize::new(800, 600));
        let natural: NaturalSize = " 1600 X 800 ".parse().unwrap();
        assert_eq!(natural, NaturalSize::new(1600, 800));
        assert!("800".parse::<FrameSize>().is_err());
        assert!("ax600".parse::<FrameSize>().is_err());
    }

    #[test]
    fn test_empty_sizes() {
        assert!(FrameSize::new(0, 600).is_empty());
        assert!(NaturalSize::new(10, 0).is_empty());
        assert!(!FrameSize::new(1, 1).is_empty());
    }

    #[test]
    fn test_apply_and_invert_are_inverse() {
        let t = AffineTransform {
            scale: 0.9,
            translate_x: 400.0,
            translate_y: -300.0,
        };
        let p = Point2D::new(123.0, 456.0);
        let back = t.invert(t.apply(p));
        assert!(back.distance_to(&p) < 1e-9);
    }

    #[test]
    fn test_css_transform_string_is_stable() {
        let t = AffineTransform {
            scale: 0.75,
            translate_x: -12.5,
            translate_y: 4.0,
        };
        assert_eq!(
            t.css_transform(),
            "translate(-12.500px, 4.000px) scale(0.750000)"
        );
    }
}
