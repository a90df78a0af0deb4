//! Error types shared across Slotframe crates.

use std::path::PathBuf;

/// Top-level error type for Slotframe operations.
#[derive(Debug, thiserror::Error)]
pub enum SlotframeError {
    /// The image could not be decoded. Recoverable: the slot is skipped.
    #[error("Decode failed for {source_id}: {message}")]
    Decode { source_id: String, message: String },

    /// A zero-size layout target. Fatal for the current export pass.
    #[error("Empty frame for slot {slot_id}: {width}x{height}")]
    EmptyFrame {
        slot_id: String,
        width: u32,
        height: u32,
    },

    /// Recoverable: callers fall back to the neutral swatch color.
    #[error("Color extraction error: {message}")]
    ColorExtraction { message: String },

    #[error("Decoded image {source_id} reported no natural dimensions")]
    MissingDimensions { source_id: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using SlotframeError.
pub type SlotframeResult<T> = Result<T, SlotframeError>;

impl SlotframeError {
    pub fn decode(source_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Decode {
            source_id: source_id.into(),
            message: msg.into(),
        }
    }

    pub fn empty_frame(slot_id: impl Into<String>, width: u32, height: u32) -> Self {
        Self::EmptyFrame {
            slot_id: slot_id.into(),
            width,
            height,
        }
    }

    pub fn color_extraction(msg: impl Into<String>) -> Self {
        Self::ColorExtraction {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    /// Whether this failure is contained to a single slot.
    ///
    /// Export keeps processing sibling slots after a recoverable error.
    pub fn is_slot_local(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::ColorExtraction { .. })
    }
}
