//! Memoization of flatten results.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use slotframe_placement_model::geometry::FrameSize;
use slotframe_placement_model::record::PlacementRecord;

use crate::flatten::{RasterBuffer, RasterFormat};

/// Exact identity of a flatten request.
///
/// Floats are compared by bit pattern so that any change to a placement
/// value produces a different key. `-0.0` is folded into `0.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlattenKey {
    source: String,
    frame: (u32, u32),
    record: [u64; 3],
    format: RasterFormat,
}

impl FlattenKey {
    pub fn new(
        source: impl Into<String>,
        frame: FrameSize,
        record: &PlacementRecord,
        format: RasterFormat,
    ) -> Self {
        Self {
            source: source.into(),
            frame: (frame.width, frame.height),
            record: [
                float_bits(record.offset_x_percent),
                float_bits(record.offset_y_percent),
                float_bits(record.scale_percent),
            ],
            format,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

fn float_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0_f64.to_bits()
    } else {
        value.to_bits()
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<FlattenKey, Arc<RasterBuffer>>,
    hits: u64,
    misses: u64,
}

/// Flattened rasters keyed by [`FlattenKey`].
#[derive(Debug, Default)]
pub struct FlattenCache {
    inner: Mutex<CacheInner>,
}

impl FlattenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a raster, counting the hit or miss.
    pub fn get(&self, key: &FlattenKey) -> Option<Arc<RasterBuffer>> {
        let mut inner = self.lock();
        match inner.entries.get(key).cloned() {
            Some(buffer) => {
                inner.hits += 1;
                Some(buffer)
            }
            None => {
                inner.misses += 1;
                None
            }
        }
    }

    pub fn insert(&self, key: FlattenKey, buffer: Arc<RasterBuffer>) {
        self.lock().entries.insert(key, buffer);
    }

    /// Drop every entry derived from `source`.
    pub fn invalidate_source(&self, source: &str) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| key.source != source);
        before - inner.entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.lock().hits
    }

    pub fn misses(&self) -> u64 {
        self.lock().misses
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
