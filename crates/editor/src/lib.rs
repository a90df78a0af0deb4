//! Slotframe Editor
//!
//! Live pan/zoom placement editing. Every change is resolved through
//! [`slotframe_placement_model::resolve`] and pushed to a [`RenderSurface`]
//! as a top-left anchored element transform, so the preview is exactly
//! what the flatten rasterizer will bake.

pub mod element;
pub mod session;
pub mod surface;

pub use element::ElementTransform;
pub use session::{EditorConfig, EditorError, EditorSession, InteractionState};
pub use surface::{RecordingSurface, RenderSurface};
