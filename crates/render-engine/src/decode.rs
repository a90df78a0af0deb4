//! Awaitable image decoding with an in-flight-aware cache.
//!
//! No transform can be computed for an image until its natural size is
//! known, so every consumer goes through [`DecodeCache::get_or_decode`].
//! The cache stores one `OnceCell` per source: the first caller runs the
//! decode and every concurrent caller for the same source awaits it.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use image::RgbaImage;
use tokio::sync::OnceCell;

use slotframe_common::error::{SlotframeError, SlotframeResult};
use slotframe_placement_model::geometry::NaturalSize;

/// A decoded image: natural dimensions plus RGBA pixel access.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Source identifier the image was decoded from.
    pub source_id: String,
    pub natural: NaturalSize,
    pub pixels: RgbaImage,
}

impl DecodedImage {
    /// Wrap already-decoded pixels.
    pub fn from_pixels(source_id: impl Into<String>, pixels: RgbaImage) -> Self {
        let (width, height) = pixels.dimensions();
        Self {
            source_id: source_id.into(),
            natural: NaturalSize::new(width, height),
            pixels,
        }
    }

    /// Decode encoded bytes (PNG, JPEG).
    pub fn decode(source_id: &str, bytes: &[u8]) -> SlotframeResult<Self> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| SlotframeError::decode(source_id, e.to_string()))?;
        let decoded = Self::from_pixels(source_id, image.to_rgba8());
        if decoded.natural.is_empty() {
            return Err(SlotframeError::MissingDimensions {
                source_id: source_id.to_string(),
            });
        }
        Ok(decoded)
    }
}

/// Fetches the encoded bytes for a source identifier.
pub trait SourceLoader: Send + Sync {
    fn load(&self, source: &str) -> impl Future<Output = SlotframeResult<Vec<u8>>> + Send;
}

/// Reads sources from the filesystem. Relative sources resolve against `root`.
#[derive(Debug, Clone)]
pub struct FsSourceLoader {
    root: PathBuf,
}

impl FsSourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve_path(&self, source: &str) -> PathBuf {
        let path = Path::new(source);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl SourceLoader for FsSourceLoader {
    async fn load(&self, source: &str) -> SlotframeResult<Vec<u8>> {
        let path = self.resolve_path(source);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SlotframeError::FileNotFound { path })
            }
            Err(e) => Err(SlotframeError::Io(e)),
        }
    }
}

/// In-memory sources, counting how often each is fetched.
#[derive(Debug, Default)]
pub struct MemorySourceLoader {
    sources: HashMap<String, Vec<u8>>,
    loads: AtomicU64,
}

impl MemorySourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.sources.insert(source.into(), bytes);
        self
    }

    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::SeqCst)
    }
}

impl SourceLoader for MemorySourceLoader {
    async fn load(&self, source: &str) -> SlotframeResult<Vec<u8>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        // Give concurrent requesters a chance to pile up on the same cell.
        tokio::task::yield_now().await;
        self.sources
            .get(source)
            .cloned()
            .ok_or_else(|| SlotframeError::decode(source, "unknown source"))
    }
}

/// Source → decoded image, shared read-only across slots.
#[derive(Debug, Default)]
pub struct DecodeCache {
    cells: Mutex<HashMap<String, Arc<OnceCell<Arc<DecodedImage>>>>>,
    decodes: AtomicU64,
}

impl DecodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoded image for `source`, decoding at most once per source.
    ///
    /// Any failure to fetch or decode is reported as a decode failure for
    /// that source. A failed decode is not cached; a later call retries.
    pub async fn get_or_decode<L: SourceLoader>(
        &self,
        loader: &L,
        source: &str,
    ) -> SlotframeResult<Arc<DecodedImage>> {
        let cell = self.cell(source);
        let image = cell
            .get_or_try_init(|| async {
                self.decodes.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(source, "Decoding image");

                let bytes = loader.load(source).await.map_err(|e| match e {
                    SlotframeError::Decode { .. } => e,
                    other => SlotframeError::decode(source, other.to_string()),
                })?;

                let source_id = source.to_string();
                let decoded =
                    tokio::task::spawn_blocking(move || DecodedImage::decode(&source_id, &bytes))
                        .await
                        .map_err(|e| {
                            SlotframeError::decode(source, format!("decode task failed: {e}"))
                        })??;
                Ok::<_, SlotframeError>(Arc::new(decoded))
            })
            .await?;
        Ok(Arc::clone(image))
    }

    /// Already-decoded image, without triggering a decode.
    pub fn get(&self, source: &str) -> Option<Arc<DecodedImage>> {
        self.lock().get(source).and_then(|cell| cell.get().cloned())
    }

    /// Drop a source so the next request decodes it again.
    pub fn evict(&self, source: &str) {
        self.lock().remove(source);
    }

    /// Number of decode attempts started.
    pub fn decode_count(&self) -> u64 {
        self.decodes.load(Ordering::SeqCst)
    }

    /// Number of sources with a finished decode.
    pub fn len(&self) -> usize {
        self.lock().values().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, source: &str) -> Arc<OnceCell<Arc<DecodedImage>>> {
        Arc::clone(
            self.lock()
                .entry(source.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<OnceCell<Arc<DecodedImage>>>>> {
        self.cells.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
