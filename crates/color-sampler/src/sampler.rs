//! Representative color extraction.

use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

use slotframe_common::config::SamplerDefaults;
use slotframe_common::error::{SlotframeError, SlotframeResult};

use crate::kmeans::{kmeans, KMeansParams, KMeansResult};

/// Swatch color used whenever extraction fails.
pub const FALLBACK_HEX: &str = "#cccccc";

/// Perceptual luminance weights (ITU-R BT.601).
const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Parameters for [`ColorSampler`].
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Fraction of width and height kept by the centered crop, in `(0, 1]`.
    pub crop_fraction: f64,
    /// Pixels with luminance at or above this are dropped as background.
    pub brightness_threshold: f64,
    /// Fewer survivors than this and the unfiltered crop is used instead.
    pub min_filtered_pixels: usize,
    pub clusters: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::from(&SamplerDefaults::default())
    }
}

impl From<&SamplerDefaults> for SamplerConfig {
    fn from(defaults: &SamplerDefaults) -> Self {
        Self {
            crop_fraction: defaults.crop_fraction,
            brightness_threshold: defaults.brightness_threshold,
            min_filtered_pixels: defaults.min_filtered_pixels,
            clusters: defaults.clusters,
            max_iterations: defaults.max_iterations,
            tolerance: defaults.tolerance,
            seed: defaults.seed,
        }
    }
}

impl SamplerConfig {
    fn kmeans_params(&self) -> KMeansParams {
        KMeansParams {
            k: self.clusters,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            seed: self.seed,
        }
    }
}

/// The sampler's output: a lowercase `#rrggbb` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorSample {
    pub hex: String,
}

impl ColorSample {
    pub fn fallback() -> Self {
        Self {
            hex: FALLBACK_HEX.to_string(),
        }
    }

    /// Round a floating-point RGB triple to a hex color.
    pub fn from_rgb(rgb: [f64; 3]) -> Self {
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Self {
            hex: format!(
                "#{:02x}{:02x}{:02x}",
                channel(rgb[0]),
                channel(rgb[1]),
                channel(rgb[2])
            ),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.hex == FALLBACK_HEX
    }

    /// Parse the hex string back into channels.
    pub fn rgb(&self) -> Option<[u8; 3]> {
        let digits = self.hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        Some([byte(0)?, byte(2)?, byte(4)?])
    }
}

/// Intermediate results, exposed for inspection and tests.
#[derive(Debug, Clone)]
pub struct SampleAnalysis {
    pub sample: ColorSample,
    /// Pixels inside the center crop.
    pub cropped_pixels: usize,
    /// Pixels handed to k-means.
    pub clustered_pixels: usize,
    /// False when too few pixels survived and the filter was bypassed.
    pub background_filtered: bool,
    pub clusters: KMeansResult,
}

/// Derives one representative color from a product photo.
#[derive(Debug, Clone, Default)]
pub struct ColorSampler {
    config: SamplerConfig,
}

impl ColorSampler {
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Representative color, or [`FALLBACK_HEX`] on any failure.
    pub fn sample(&self, image: &RgbImage) -> ColorSample {
        match self.analyze(image) {
            Ok(analysis) => analysis.sample,
            Err(e) => {
                tracing::warn!(error = %e, "Color extraction failed, using fallback swatch");
                ColorSample::fallback()
            }
        }
    }

    /// Same as [`ColorSampler::sample`] for any decoded image.
    pub fn sample_dynamic(&self, image: &DynamicImage) -> ColorSample {
        self.sample(&image.to_rgb8())
    }

    /// Decode encoded image bytes and sample them. Never fails.
    pub fn sample_bytes(&self, bytes: &[u8]) -> ColorSample {
        match image::load_from_memory(bytes) {
            Ok(image) => self.sample_dynamic(&image),
            Err(e) => {
                tracing::warn!(error = %e, "Could not decode image for color extraction");
                ColorSample::fallback()
            }
        }
    }

    /// Run the full pipeline, surfacing errors instead of falling back.
    pub fn analyze(&self, image: &RgbImage) -> SlotframeResult<SampleAnalysis> {
        let cropped = center_crop(image, self.config.crop_fraction)?;
        let cropped_pixels = cropped.len();

        let filtered: Vec<[f64; 3]> = cropped
            .iter()
            .copied()
            .filter(|p| luminance(p) < self.config.brightness_threshold)
            .collect();

        let background_filtered = filtered.len() >= self.config.min_filtered_pixels;
        let points = if background_filtered {
            filtered
        } else {
            tracing::debug!(
                survivors = filtered.len(),
                cropped = cropped_pixels,
                "Too few foreground pixels, clustering the whole crop"
            );
            cropped
        };

        let clusters = kmeans(&points, &self.config.kmeans_params());
        let dominant = clusters
            .dominant()
            .ok_or_else(|| SlotframeError::color_extraction("No clusters produced"))?;

        Ok(SampleAnalysis {
            sample: ColorSample::from_rgb(dominant.centroid),
            cropped_pixels,
            clustered_pixels: points.len(),
            background_filtered,
            clusters,
        })
    }
}

/// Pixels of the centered `fraction` of the image, row-major.
fn center_crop(image: &RgbImage, fraction: f64) -> SlotframeResult<Vec<[f64; 3]>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(SlotframeError::color_extraction(format!(
            "Empty pixel buffer ({width}x{height})"
        )));
    }
    if fraction.is_nan() || fraction <= 0.0 || fraction > 1.0 {
        return Err(SlotframeError::color_extraction(format!(
            "Crop fraction {fraction} outside (0, 1]"
        )));
    }

    let crop_w = ((width as f64 * fraction).round() as u32).clamp(1, width);
    let crop_h = ((height as f64 * fraction).round() as u32).clamp(1, height);
    let x0 = (width - crop_w) / 2;
    let y0 = (height - crop_h) / 2;

    let mut pixels = Vec::with_capacity(crop_w as usize * crop_h as usize);
    for y in y0..y0 + crop_h {
        for x in x0..x0 + crop_w {
            let [r, g, b] = image.get_pixel(x, y).0;
            pixels.push([r as f64, g as f64, b as f64]);
        }
    }
    Ok(pixels)
}

fn luminance(p: &[f64; 3]) -> f64 {
    LUMA_WEIGHTS[0] * p[0] + LUMA_WEIGHTS[1] * p[1] + LUMA_WEIGHTS[2] * p[2]
}
