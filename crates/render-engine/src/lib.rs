//! Slotframe Render Engine
//!
//! Offline pipeline that turns placement state into export rasters.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source bytes ──► DecodeCache ──► DecodedImage (natural size + RGBA)
//!                                        │
//! PlacementStore ──► PlacementRecord ────┤
//!                                        ├── resolve (shared with the editor)
//! layout ──────────► FrameSize ──────────┘         │
//!                                                  ▼
//!                                        flatten (frame-sized raster)
//!                                                  │
//!                                        FlattenCache (exact key)
//!                                                  │
//!                                                  ▼
//!                                      SlotArtifact per slot
//! ```
//!
//! The [`Engine`] owns both caches; nothing here is process-global.

pub mod cache;
pub mod decode;
pub mod engine;
pub mod export;
pub mod flatten;

pub use cache::{FlattenCache, FlattenKey};
pub use decode::{DecodeCache, DecodedImage, FsSourceLoader, MemorySourceLoader, SourceLoader};
pub use engine::{Engine, EngineConfig, FlattenOutcome};
pub use export::*;
pub use flatten::{flatten, rasterize, RasterBuffer, RasterFormat};
