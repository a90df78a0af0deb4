//! Slotframe Color Sampler
//!
//! Derives one representative color from a product photo:
//! - **Crop:** Keep a centered fraction of the frame, dropping margins
//! - **Filter:** Discard near-white background pixels by luminance
//! - **Cluster:** Seeded k-means over the survivors; the largest cluster wins
//!
//! Sampling never fails from the caller's point of view. Any error is
//! logged and mapped to the neutral [`FALLBACK_HEX`] swatch.
//!
//! This crate is pure computation. The same pixels and parameters always
//! produce the same hex string.

pub mod kmeans;
pub mod sampler;

pub use kmeans::{kmeans, Cluster, KMeansParams, KMeansResult};
pub use sampler::{ColorSample, ColorSampler, SampleAnalysis, SamplerConfig, FALLBACK_HEX};
