//! Per-slot placement records.
//!
//! All three fields are percentages centered at 100. A record with every
//! field at 100 shows the image exactly covering its frame, anchored at the
//! frame's top-left corner.

use serde::{Deserialize, Serialize};

/// Neutral value for every record field.
pub const DEFAULT_PERCENT: f64 = 100.0;

/// Scale floor: below 100% the image would no longer cover its frame.
pub const MIN_SCALE_PERCENT: f64 = 100.0;

/// User-adjustable pan/zoom state for one image slot.
///
/// Carries no derived geometry; together with the frame and natural sizes
/// it fully determines the rendered result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRecord {
    /// Horizontal pan. Values above 100 move the content right.
    pub offset_x_percent: f64,
    /// Vertical pan. Values above 100 move the content down.
    pub offset_y_percent: f64,
    /// Zoom on top of the cover-fit base scale, `>= 100`.
    pub scale_percent: f64,
}

impl PlacementRecord {
    /// The record every slot starts with.
    pub const IDENTITY: PlacementRecord = PlacementRecord {
        offset_x_percent: DEFAULT_PERCENT,
        offset_y_percent: DEFAULT_PERCENT,
        scale_percent: DEFAULT_PERCENT,
    };

    /// Create a record without validation.
    ///
    /// Use [`PlacementRecord::clamped`] (or store it through the
    /// [`PlacementStore`](crate::store::PlacementStore)) to apply bounds.
    pub fn new(offset_x_percent: f64, offset_y_percent: f64, scale_percent: f64) -> Self {
        Self {
            offset_x_percent,
            offset_y_percent,
            scale_percent,
        }
    }

    /// User zoom as a multiplier (1.0 = cover fit, no extra zoom).
    pub fn zoom_factor(&self) -> f64 {
        self.scale_percent / 100.0
    }

    /// Pan bounds permitted at this record's scale.
    pub fn pan_bounds(&self) -> PanBounds {
        PanBounds::for_scale_percent(self.scale_percent)
    }

    /// Apply the scale floor and the scale-dependent pan bounds.
    ///
    /// Non-finite fields are replaced with the default value.
    pub fn clamped(&self) -> Self {
        let scale_percent = finite_or_default(self.scale_percent).max(MIN_SCALE_PERCENT);
        let bounds = PanBounds::for_scale_percent(scale_percent);
        Self {
            offset_x_percent: bounds.clamp(finite_or_default(self.offset_x_percent)),
            offset_y_percent: bounds.clamp(finite_or_default(self.offset_y_percent)),
            scale_percent,
        }
    }

    /// Same record with a new scale, offsets re-clamped to the new bounds.
    pub fn with_scale_percent(&self, scale_percent: f64) -> Self {
        Self {
            scale_percent,
            ..*self
        }
        .clamped()
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for PlacementRecord {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Inclusive range of valid offset percentages for a given zoom.
///
/// With zoom factor `z`, the range is `[-(z-1)*50, 100 + (z-1)*50]`:
/// the further the image is zoomed in, the further it may be panned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanBounds {
    pub min: f64,
    pub max: f64,
}

impl PanBounds {
    pub fn for_scale_percent(scale_percent: f64) -> Self {
        let zoom = finite_or_default(scale_percent).max(MIN_SCALE_PERCENT) / 100.0;
        let extra = (zoom - 1.0) * 50.0;
        Self {
            min: -extra,
            max: 100.0 + extra,
        }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

fn finite_or_default(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        DEFAULT_PERCENT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity() {
        let record = PlacementRecord::default();
        assert!(record.is_identity());
        assert_eq!(record.clamped(), record);
    }

    #[test]
    fn test_pan_bounds_grow_with_zoom() {
        let unzoomed = PanBounds::for_scale_percent(100.0);
        assert_eq!(unzoomed, PanBounds { min: 0.0, max: 100.0 });

        let doubled = PanBounds::for_scale_percent(200.0);
        assert!((doubled.min + 50.0).abs() < 1e-9);
        assert!((doubled.max - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamped_applies_scale_floor_then_bounds() {
        let record = PlacementRecord::new(180.0, -40.0, 60.0).clamped();
        assert_eq!(record.scale_percent, 100.0);
        assert_eq!(record.offset_x_percent, 100.0);
        assert_eq!(record.offset_y_percent, 0.0);
    }

    #[test]
    fn test_clamped_replaces_non_finite_fields() {
        let record = PlacementRecord::new(f64::NAN, f64::INFINITY, f64::NAN).clamped();
        assert!(record.is_identity());
    }

    #[test]
    fn test_with_scale_percent_reclamps_offsets() {
        let zoomed = PlacementRecord::new(140.0, -20.0, 200.0).clamped();
        assert_eq!(zoomed.offset_x_percent, 140.0);
        let unzoomed = zoomed.with_scale_percent(100.0);
        assert_eq!(unzoomed.offset_x_percent, 100.0);
        assert_eq!(unzoomed.offset_y_percent, 0.0);
    }

    #[test]
    fn test_serializes_with_persisted_field_names() {
        let json = serde_json::to_value(PlacementRecord::new(110.0, 90.0, 150.0)).unwrap();
        assert_eq!(json["offsetXPercent"], 110.0);
        assert_eq!(json["offsetYPercent"], 90.0);
        assert_eq!(json["scalePercent"], 150.0);
    }
}
