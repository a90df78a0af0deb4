//! Rendering surface abstraction.

use std::collections::HashMap;

use crate::element::ElementTransform;

/// Where element transforms are applied (a browser DOM, a canvas, a test double).
pub trait RenderSurface: Send {
    fn apply_transform(&mut self, slot_id: &str, transform: &ElementTransform);

    /// The slot's element went away.
    fn clear(&mut self, _slot_id: &str) {}
}

/// Keeps the last transform per slot and counts applications.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    applied: HashMap<String, ElementTransform>,
    applications: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self, slot_id: &str) -> Option<&ElementTransform> {
        self.applied.get(slot_id)
    }

    pub fn applications(&self) -> u64 {
        self.applications
    }
}

impl RenderSurface for RecordingSurface {
    fn apply_transform(&mut self, slot_id: &str, transform: &ElementTransform) {
        self.applications += 1;
        self.applied.insert(slot_id.to_string(), *transform);
    }

    fn clear(&mut self, slot_id: &str) {
        self.applied.remove(slot_id);
    }
}
