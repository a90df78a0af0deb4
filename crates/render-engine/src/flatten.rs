//! Bake a placement into a frame-sized raster.
//!
//! Every output pixel center is mapped back through the same transform the
//! editor previews with, then sampled bilinearly from the source.

use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use slotframe_common::error::{SlotframeError, SlotframeResult};
use slotframe_placement_model::geometry::{AffineTransform, FrameSize, Point2D};
use slotframe_placement_model::record::PlacementRecord;
use slotframe_placement_model::transform::{resolve, GeometryError};

use crate::decode::DecodedImage;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Resolve `record` for `frame` and rasterize `image` through it.
pub fn flatten(
    frame: FrameSize,
    image: &DecodedImage,
    record: &PlacementRecord,
) -> Result<RgbaImage, GeometryError> {
    let transform = resolve(record, frame, image.natural)?;
    Ok(rasterize(frame, image, &transform))
}

/// Inverse-map every frame pixel through `transform`.
///
/// Pixels whose center falls outside the source image come out fully
/// transparent. Offsets near the pan bounds can move the image edge inside
/// the frame, so those pixels do occur. JPEG output renders them black.
pub fn rasterize(frame: FrameSize, image: &DecodedImage, transform: &AffineTransform) -> RgbaImage {
    let source = &image.pixels;
    let (width, height) = source.dimensions();
    if width == 0 || height == 0 {
        return RgbaImage::from_pixel(frame.width, frame.height, TRANSPARENT);
    }
    let (w, h) = (width as f64, height as f64);

    RgbaImage::from_fn(frame.width, frame.height, |px, py| {
        let center = Point2D::new(px as f64 + 0.5, py as f64 + 0.5);
        let p = transform.invert(center);
        if !(0.0..=w).contains(&p.x) || !(0.0..=h).contains(&p.y) {
            return TRANSPARENT;
        }
        sample_bilinear(source, p.x - 0.5, p.y - 0.5)
    })
}

/// Bilinear sample at continuous pixel coordinates, clamping at the edges.
fn sample_bilinear(source: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let (width, height) = source.dimensions();
    let max_x = width as i64 - 1;
    let max_y = height as i64 - 1;

    let xf = x.floor();
    let yf = y.floor();
    let fx = x - xf;
    let fy = y - yf;

    let x0 = (xf as i64).clamp(0, max_x) as u32;
    let x1 = (xf as i64 + 1).clamp(0, max_x) as u32;
    let y0 = (yf as i64).clamp(0, max_y) as u32;
    let y1 = (yf as i64 + 1).clamp(0, max_y) as u32;

    let p00 = source.get_pixel(x0, y0).0;
    let p10 = source.get_pixel(x1, y0).0;
    let p01 = source.get_pixel(x0, y1).0;
    let p11 = source.get_pixel(x1, y1).0;

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

/// Encoding used for flattened output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    #[default]
    Png,
    Jpeg,
}

impl RasterFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            RasterFormat::Png => ImageFormat::Png,
            RasterFormat::Jpeg => ImageFormat::Jpeg,
        }
    }
}

impl fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterFormat::Png => write!(f, "png"),
            RasterFormat::Jpeg => write!(f, "jpeg"),
        }
    }
}

/// Unrecognized output format name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown raster format '{0}' (expected png or jpeg)")]
pub struct UnknownRasterFormat(pub String);

impl FromStr for RasterFormat {
    type Err = UnknownRasterFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(RasterFormat::Png),
            "jpeg" | "jpg" => Ok(RasterFormat::Jpeg),
            other => Err(UnknownRasterFormat(other.to_string())),
        }
    }
}

/// An encoded, frame-sized raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterBuffer {
    pub width: u32,
    pub height: u32,
    pub format: RasterFormat,
    pub bytes: Vec<u8>,
}

impl RasterBuffer {
    /// Encode RGBA pixels. JPEG drops the alpha channel.
    pub fn encode(pixels: &RgbaImage, format: RasterFormat) -> SlotframeResult<Self> {
        let mut bytes = Vec::new();
        let result = match format {
            RasterFormat::Png => {
                pixels.write_to(&mut Cursor::new(&mut bytes), format.image_format())
            }
            RasterFormat::Jpeg => DynamicImage::ImageRgba8(pixels.clone())
                .to_rgb8()
                .write_to(&mut Cursor::new(&mut bytes), format.image_format()),
        };
        result.map_err(|e| SlotframeError::render(format!("Failed to encode {format}: {e}")))?;

        Ok(Self {
            width: pixels.width(),
            height: pixels.height(),
            format,
            bytes,
        })
    }

    /// Decode the buffer back into pixels.
    pub fn to_rgba(&self) -> SlotframeResult<RgbaImage> {
        image::load_from_memory(&self.bytes)
            .map(|image| image.to_rgba8())
            .map_err(|e| SlotframeError::render(format!("Failed to read back raster: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use slotframe_placement_model::geometry::NaturalSize;

    use super::*;

    fn gradient(width: u32, height: u32) -> DecodedImage {
        DecodedImage::from_pixels(
            "gradient",
            RgbaImage::from_fn(width, height, |x, y| {
                Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
            }),
        )
    }

    #[test]
    fn test_output_matches_frame_size() {
        let image = gradient(1600, 800);
        let out = flatten(FrameSize::new(80, 60), &image, &PlacementRecord::IDENTITY).unwrap();
        assert_eq!(out.dimensions(), (80, 60));
    }

    #[test]
    fn test_identity_cover_fit_is_fully_opaque() {
        let image = gradient(160, 80);
        let out = flatten(FrameSize::new(80, 60), &image, &PlacementRecord::IDENTITY).unwrap();
        assert!(out.pixels().all(|p| p.0[3] == 255));
    }

    #[test]
    fn test_unit_scale_integer_shift_copies_source_pixels() {
        // 200x200 into 100x100 at 200% gives total scale 1.0; offset 90 shifts by -10px.
        let image = gradient(200, 200);
        let record = PlacementRecord::new(90.0, 80.0, 200.0);
        let out = flatten(FrameSize::new(100, 100), &image, &record).unwrap();
        for (x, y, pixel) in out.enumerate_pixels() {
            assert_eq!(pixel, image.pixels.get_pixel(x + 10, y + 20));
        }
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let image = gradient(10, 10);
        let err = flatten(FrameSize::new(0, 10), &image, &PlacementRecord::IDENTITY).unwrap_err();
        assert_eq!(err, GeometryError::EmptyFrame { width: 0, height: 10 });
    }

    #[test]
    fn test_pixels_outside_source_are_transparent() {
        let image = gradient(10, 10);
        let shifted = AffineTransform {
            scale: 1.0,
            translate_x: 5.0,
            translate_y: 0.0,
        };
        let out = rasterize(FrameSize::new(10, 10), &image, &shifted);
        assert_eq!(*out.get_pixel(0, 0), TRANSPARENT);
        assert_eq!(*out.get_pixel(5, 0), *image.pixels.get_pixel(0, 0));
    }

    #[test]
    fn test_pan_to_bound_leaves_transparent_edge() {
        let white = DecodedImage::from_pixels(
            "white",
            RgbaImage::from_pixel(16, 16, Rgba([255, 255, 255, 255])),
        );
        // Offset 50 at scale 100 shifts the image left by half the frame.
        let record = PlacementRecord::new(50.0, 100.0, 100.0);
        let out = flatten(FrameSize::new(16, 16), &white, &record).unwrap();
        assert_eq!(*out.get_pixel(7, 8), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(8, 8), TRANSPARENT);
        assert_eq!(*out.get_pixel(15, 0), TRANSPARENT);

        let jpeg = RasterBuffer::encode(&out, RasterFormat::Jpeg)
            .unwrap()
            .to_rgba()
            .unwrap();
        assert!(jpeg.get_pixel(2, 8).0[..3].iter().all(|&c| c > 223));
        assert!(jpeg.get_pixel(13, 8).0[..3].iter().all(|&c| c < 32));
    }

    #[test]
    fn test_empty_source_rasterizes_transparent() {
        let empty = DecodedImage::from_pixels("empty", RgbaImage::new(0, 0));
        let identity = AffineTransform {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        };
        let out = rasterize(FrameSize::new(4, 3), &empty, &identity);
        assert_eq!(out.dimensions(), (4, 3));
        assert!(out.pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn test_natural_size_is_unaffected_by_flatten() {
        let image = gradient(30, 20);
        flatten(FrameSize::new(10, 10), &image, &PlacementRecord::IDENTITY).unwrap();
        assert_eq!(image.natural, NaturalSize::new(30, 20));
    }

    #[test]
    fn test_raster_format_parse() {
        assert_eq!("PNG".parse::<RasterFormat>().unwrap(), RasterFormat::Png);
        assert_eq!("jpg".parse::<RasterFormat>().unwrap(), RasterFormat::Jpeg);
        assert!("webp".parse::<RasterFormat>().is_err());
        assert_eq!(RasterFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn test_png_encoding_is_lossless() {
        let image = gradient(12, 7);
        let buffer = RasterBuffer::encode(&image.pixels, RasterFormat::Png).unwrap();
        assert_eq!((buffer.width, buffer.height), (12, 7));
        assert_eq!(buffer.to_rgba().unwrap(), image.pixels);
    }

    #[test]
    fn test_jpeg_encoding_keeps_dimensions() {
        let image = gradient(16, 16);
        let buffer = RasterBuffer::encode(&image.pixels, RasterFormat::Jpeg).unwrap();
        assert_eq!(buffer.to_rgba().unwrap().dimensions(), (16, 16));
    }
}
