//! The engine instance: caches, sampler and source loader in one place.

use std::sync::Arc;

use image::DynamicImage;

use slotframe_color_sampler::{ColorSample, ColorSampler, SamplerConfig};
use slotframe_common::config::AppConfig;
use slotframe_common::error::{SlotframeError, SlotframeResult};
use slotframe_placement_model::geometry::FrameSize;
use slotframe_placement_model::record::PlacementRecord;
use slotframe_placement_model::transform::GeometryError;

use crate::cache::{FlattenCache, FlattenKey};
use crate::decode::{DecodeCache, DecodedImage, SourceLoader};
use crate::flatten::{flatten, RasterBuffer, RasterFormat};

/// Engine settings.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub format: RasterFormat,
    pub sampler: SamplerConfig,
}

impl From<&AppConfig> for EngineConfig {
    fn from(config: &AppConfig) -> Self {
        let format = config.export.output_format.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to png output");
            RasterFormat::Png
        });
        Self {
            format,
            sampler: SamplerConfig::from(&config.sampler),
        }
    }
}

/// Result of [`Engine::flatten_slot`].
#[derive(Debug, Clone)]
pub struct FlattenOutcome {
    pub raster: Arc<RasterBuffer>,
    /// True when the raster came from the flatten cache.
    pub cache_hit: bool,
}

/// Owns the decode and flatten caches for one document or session.
///
/// Independent engines share nothing, so separate documents (and tests)
/// run in isolation.
pub struct Engine<L> {
    config: EngineConfig,
    loader: L,
    decoded: DecodeCache,
    flattened: FlattenCache,
    sampler: ColorSampler,
}

impl<L: SourceLoader> Engine<L> {
    pub fn new(loader: L, config: EngineConfig) -> Self {
        let sampler = ColorSampler::new(config.sampler.clone());
        Self {
            config,
            loader,
            decoded: DecodeCache::new(),
            flattened: FlattenCache::new(),
            sampler,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn decode_cache(&self) -> &DecodeCache {
        &self.decoded
    }

    pub fn flatten_cache(&self) -> &FlattenCache {
        &self.flattened
    }

    /// Await the decoded image for `source`.
    pub async fn decode(&self, source: &str) -> SlotframeResult<Arc<DecodedImage>> {
        self.decoded.get_or_decode(&self.loader, source).await
    }

    /// Representative swatch color for `source`; the fallback on any failure.
    pub async fn sample_color(&self, source: &str) -> ColorSample {
        match self.decode(source).await {
            Ok(image) => {
                let rgb = DynamicImage::ImageRgba8(image.pixels.clone()).to_rgb8();
                self.sampler.sample(&rgb)
            }
            Err(e) => {
                tracing::warn!(source, error = %e, "Could not decode image for swatch");
                ColorSample::fallback()
            }
        }
    }

    /// Flatten one slot, consulting the flatten cache first.
    ///
    /// A zero-size frame fails before anything is decoded. A cache hit
    /// neither decodes nor redraws.
    pub async fn flatten_slot(
        &self,
        slot_id: &str,
        source: &str,
        frame: FrameSize,
        record: &PlacementRecord,
    ) -> SlotframeResult<FlattenOutcome> {
        if frame.is_empty() {
            return Err(SlotframeError::empty_frame(slot_id, frame.width, frame.height));
        }

        let key = FlattenKey::new(source, frame, record, self.config.format);
        if let Some(raster) = self.flattened.get(&key) {
            tracing::debug!(slot_id, source, "Flatten cache hit");
            return Ok(FlattenOutcome {
                raster,
                cache_hit: true,
            });
        }

        let image = self.decode(source).await?;
        let format = self.config.format;
        let record = *record;
        let slot = slot_id.to_string();

        let raster = tokio::task::spawn_blocking(move || -> SlotframeResult<RasterBuffer> {
            let pixels = flatten(frame, &image, &record).map_err(|e| match e {
                GeometryError::EmptyFrame { width, height } => {
                    SlotframeError::empty_frame(slot, width, height)
                }
                GeometryError::EmptyImage { .. } => SlotframeError::MissingDimensions {
                    source_id: image.source_id.clone(),
                },
            })?;
            RasterBuffer::encode(&pixels, format)
        })
        .await
        .map_err(|e| SlotframeError::render(format!("Flatten task failed: {e}")))??;

        let raster = Arc::new(raster);
        self.flattened.insert(key, Arc::clone(&raster));
        tracing::debug!(slot_id, source, %frame, "Flattened slot");

        Ok(FlattenOutcome {
            raster,
            cache_hit: false,
        })
    }
}
