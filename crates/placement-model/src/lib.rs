//! Slotframe Placement Model
//!
//! Defines the core data contracts for image placement:
//! - **Geometry:** Frame and natural image sizes, affine transforms
//! - **Record:** The per-slot pan/zoom state and its pan bounds
//! - **Transform:** The cover-fit resolver shared by preview and export
//! - **Store:** The keyed map of placement records for one document
//! - **Persist:** Versioned on-disk placement documents
//!
//! The resolver is pure. Both the interactive editor and the flatten
//! rasterizer call [`resolve`] so the two paths cannot drift apart.

pub mod geometry;
pub mod persist;
pub mod record;
pub mod store;
pub mod transform;

pub use geometry::*;
pub use persist::*;
pub use record::*;
pub use store::*;
pub use transform::*;
