//! Editing session: interaction state machine over one document's placements.

use std::collections::BTreeMap;

use slotframe_common::config::EditorDefaults;
use slotframe_placement_model::geometry::{FrameSize, NaturalSize, Point2D};
use slotframe_placement_model::persist::{LoadStatus, PersistError, PlacementRepository};
use slotframe_placement_model::record::{PlacementRecord, MIN_SCALE_PERCENT};
use slotframe_placement_model::store::PlacementStore;
use slotframe_placement_model::transform::{resolve, GeometryError};

use crate::element::ElementTransform;
use crate::surface::RenderSurface;

/// Interactive editing limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorConfig {
    /// Upper bound for `scale_percent` from wheel, slider and direct edits.
    pub max_scale_percent: f64,
    /// Scale change per wheel notch, in percent.
    pub wheel_step_percent: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::from(&EditorDefaults::default())
    }
}

impl From<&EditorDefaults> for EditorConfig {
    fn from(defaults: &EditorDefaults) -> Self {
        Self {
            max_scale_percent: defaults.max_scale_percent.max(MIN_SCALE_PERCENT),
            wheel_step_percent: defaults.wheel_step_percent,
        }
    }
}

/// Errors raised by editing operations.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    /// The slot's image has not finished decoding, so no transform exists yet.
    #[error("Slot {slot_id} has no decoded image attached")]
    SlotNotReady { slot_id: String },

    #[error("No slot is selected")]
    NothingSelected,

    #[error("Slot {slot_id} is not the selected slot")]
    NotSelected { slot_id: String },

    #[error("A drag is in progress on slot {slot_id}")]
    DragInProgress { slot_id: String },

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// State of the pointer interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionState {
    /// Nothing selected.
    Idle,
    /// A slot is selected; wheel and slider edits apply to it.
    Selected { slot_id: String },
    /// Pointer held down on the selected slot.
    Dragging {
        slot_id: String,
        /// Pointer position at pointer-down, frame pixels.
        origin: Point2D,
        /// Stored record at pointer-down.
        start: PlacementRecord,
        /// Live record shown on screen, not yet committed.
        draft: PlacementRecord,
    },
}

impl InteractionState {
    /// The slot the interaction refers to, if any.
    pub fn slot_id(&self) -> Option<&str> {
        match self {
            InteractionState::Idle => None,
            InteractionState::Selected { slot_id } | InteractionState::Dragging { slot_id, .. } => {
                Some(slot_id)
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SlotGeometry {
    frame: FrameSize,
    natural: NaturalSize,
}

/// Owns the placement store for one document while it is being edited.
///
/// Changes are written to the repository once per completed interaction:
/// pointer-up, wheel notch, slider or numeric edit, image replacement,
/// slot removal and reset. Pointer-move only updates the surface.
pub struct EditorSession<R: PlacementRepository, S: RenderSurface> {
    document_id: String,
    config: EditorConfig,
    store: PlacementStore,
    load_status: LoadStatus,
    repository: R,
    surface: S,
    geometry: BTreeMap<String, SlotGeometry>,
    state: InteractionState,
}

impl<R: PlacementRepository, S: RenderSurface> EditorSession<R, S> {
    /// Start a session, restoring whatever the repository holds for the document.
    pub fn open(
        document_id: impl Into<String>,
        repository: R,
        surface: S,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let document_id = document_id.into();
        let loaded = repository.load(&document_id)?;
        tracing::info!(
            document_id = %document_id,
            slots = loaded.store.len(),
            status = ?loaded.status,
            "Opened editor session"
        );
        Ok(Self {
            document_id,
            config,
            store: loaded.store,
            load_status: loaded.status,
            repository,
            surface,
            geometry: BTreeMap::new(),
            state: InteractionState::Idle,
        })
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &PlacementStore {
        &self.store
    }

    pub fn load_status(&self) -> LoadStatus {
        self.load_status
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Whether the slot's frame and natural size are known.
    pub fn is_ready(&self, slot_id: &str) -> bool {
        self.geometry.contains_key(slot_id)
    }

    /// Register a slot once its image has decoded and show its placement.
    ///
    /// A slot seen for the first time gets the default record.
    pub fn attach_slot(
        &mut self,
        slot_id: &str,
        frame: FrameSize,
        natural: NaturalSize,
    ) -> Result<ElementTransform, EditorError> {
        let record = self.store.ensure(slot_id);
        let element = Self::element_for(&record, frame, natural)?;
        self.geometry
            .insert(slot_id.to_string(), SlotGeometry { frame, natural });
        self.surface.apply_transform(slot_id, &element);
        tracing::debug!(slot_id, %frame, %natural, "Attached slot");
        Ok(element)
    }

    /// Current on-screen transform for a slot, including an uncommitted drag.
    pub fn element_transform(&self, slot_id: &str) -> Result<ElementTransform, EditorError> {
        let geometry = self.geometry_of(slot_id)?;
        let record = match &self.state {
            InteractionState::Dragging {
                slot_id: dragging,
                draft,
                ..
            } if dragging == slot_id => *draft,
            _ => self.store.get(slot_id),
        };
        Ok(Self::element_for(&record, geometry.frame, geometry.natural)?)
    }

    /// Idle/Selected → Selected. No data changes.
    pub fn select(&mut self, slot_id: &str) -> Result<(), EditorError> {
        self.geometry_of(slot_id)?;
        if let InteractionState::Dragging { slot_id: active, .. } = &self.state {
            return Err(EditorError::DragInProgress {
                slot_id: active.clone(),
            });
        }
        self.state = InteractionState::Selected {
            slot_id: slot_id.to_string(),
        };
        Ok(())
    }

    /// Back to idle. An uncommitted drag is abandoned and the stored placement shown again.
    pub fn deselect(&mut self) -> Result<(), EditorError> {
        let previous = std::mem::replace(&mut self.state, InteractionState::Idle);
        if let InteractionState::Dragging { slot_id, .. } = previous {
            tracing::debug!(slot_id = %slot_id, "Drag abandoned");
            self.refresh(&slot_id)?;
        }
        Ok(())
    }

    /// Selected → Dragging. Captures the pointer and the starting offsets.
    pub fn pointer_down(&mut self, slot_id: &str, pointer: Point2D) -> Result<(), EditorError> {
        match &self.state {
            InteractionState::Selected { slot_id: selected } if selected == slot_id => {}
            InteractionState::Dragging { slot_id: active, .. } => {
                return Err(EditorError::DragInProgress {
                    slot_id: active.clone(),
                })
            }
            _ => {
                return Err(EditorError::NotSelected {
                    slot_id: slot_id.to_string(),
                })
            }
        }

        let start = self.store.get(slot_id);
        self.state = InteractionState::Dragging {
            slot_id: slot_id.to_string(),
            origin: pointer,
            start,
            draft: start,
        };
        Ok(())
    }

    /// Update the live preview for a drag. Nothing is stored or persisted.
    ///
    /// Returns `None` when no drag is active.
    pub fn pointer_move(&mut self, pointer: Point2D) -> Result<Option<ElementTransform>, EditorError> {
        let InteractionState::Dragging {
            slot_id,
            origin,
            start,
            ..
        } = &self.state
        else {
            return Ok(None);
        };

        let slot_id = slot_id.clone();
        let geometry = self.geometry_of(&slot_id)?;
        let dx_percent = (pointer.x - origin.x) / geometry.frame.width as f64 * 100.0;
        let dy_percent = (pointer.y - origin.y) / geometry.frame.height as f64 * 100.0;
        let draft = PlacementRecord::new(
            start.offset_x_percent + dx_percent,
            start.offset_y_percent + dy_percent,
            start.scale_percent,
        )
        .clamped();

        let element = Self::element_for(&draft, geometry.frame, geometry.natural)?;
        if let InteractionState::Dragging { draft: live, .. } = &mut self.state {
            *live = draft;
        }
        self.surface.apply_transform(&slot_id, &element);
        Ok(Some(element))
    }

    /// Dragging → Selected. Stores and persists the final offsets.
    ///
    /// Returns `None` when no drag is active.
    pub fn pointer_up(&mut self) -> Result<Option<PlacementRecord>, EditorError> {
        let InteractionState::Dragging { slot_id, draft, .. } = &self.state else {
            return Ok(None);
        };
        let slot_id = slot_id.clone();
        let draft = *draft;

        self.state = InteractionState::Selected {
            slot_id: slot_id.clone(),
        };
        self.commit(&slot_id, draft).map(Some)
    }

    /// Zoom the selected slot by whole or fractional wheel notches.
    ///
    /// Offsets are re-clamped to the new scale's pan bounds.
    pub fn wheel(&mut self, delta_notches: f64) -> Result<PlacementRecord, EditorError> {
        let slot_id = self.editable_slot()?;
        let current = self.store.get(&slot_id);
        let scale = current.scale_percent + delta_notches * self.config.wheel_step_percent;
        self.commit(&slot_id, current.with_scale_percent(scale))
    }

    /// Slider edit of the selected slot's scale.
    pub fn set_scale(&mut self, scale_percent: f64) -> Result<PlacementRecord, EditorError> {
        let slot_id = self.editable_slot()?;
        let current = self.store.get(&slot_id);
        self.commit(&slot_id, current.with_scale_percent(scale_percent))
    }

    /// Numeric edit of the selected slot's offsets.
    pub fn set_offsets(
        &mut self,
        offset_x_percent: f64,
        offset_y_percent: f64,
    ) -> Result<PlacementRecord, EditorError> {
        let slot_id = self.editable_slot()?;
        let current = self.store.get(&slot_id);
        self.commit(
            &slot_id,
            PlacementRecord::new(offset_x_percent, offset_y_percent, current.scale_percent),
        )
    }

    /// A slot received a new image. Optionally resets its placement.
    pub fn replace_image(
        &mut self,
        slot_id: &str,
        natural: NaturalSize,
        reset: bool,
    ) -> Result<ElementTransform, EditorError> {
        let frame = self.geometry_of(slot_id)?.frame;
        let record = self.store.get(slot_id);
        // Validate before touching any state.
        Self::element_for(&record, frame, natural)?;

        if self.state.slot_id() == Some(slot_id) {
            self.state = InteractionState::Selected {
                slot_id: slot_id.to_string(),
            };
        }
        self.geometry
            .insert(slot_id.to_string(), SlotGeometry { frame, natural });
        self.store.replace_image(slot_id, reset);

        let element = self.refresh(slot_id)?;
        self.save()?;
        tracing::debug!(slot_id, %natural, reset, "Replaced slot image");
        Ok(element)
    }

    /// Forget a slot entirely.
    pub fn remove_slot(&mut self, slot_id: &str) -> Result<Option<PlacementRecord>, EditorError> {
        if self.state.slot_id() == Some(slot_id) {
            self.state = InteractionState::Idle;
        }
        self.geometry.remove(slot_id);
        self.surface.clear(slot_id);
        let removed = self.store.remove(slot_id);
        self.save()?;
        Ok(removed)
    }

    /// Reset every slot to the default placement.
    pub fn reset_all(&mut self) -> Result<(), EditorError> {
        if let InteractionState::Dragging { slot_id, .. } = &self.state {
            self.state = InteractionState::Selected {
                slot_id: slot_id.clone(),
            };
        }
        self.store.reset_all();
        let attached: Vec<String> = self.geometry.keys().cloned().collect();
        for slot_id in attached {
            self.refresh(&slot_id)?;
        }
        self.save()?;
        tracing::info!(document_id = %self.document_id, "Reset all placements");
        Ok(())
    }

    /// Store, show and persist a record for an attached slot.
    fn commit(
        &mut self,
        slot_id: &str,
        record: PlacementRecord,
    ) -> Result<PlacementRecord, EditorError> {
        let geometry = self.geometry_of(slot_id)?;
        let clamped = record.clamped();
        let capped =
            clamped.with_scale_percent(clamped.scale_percent.min(self.config.max_scale_percent));
        let element = Self::element_for(&capped, geometry.frame, geometry.natural)?;

        let stored = self.store.set(slot_id, capped);
        self.surface.apply_transform(slot_id, &element);
        self.save()?;
        Ok(stored)
    }

    /// Re-apply the stored placement of an attached slot.
    fn refresh(&mut self, slot_id: &str) -> Result<ElementTransform, EditorError> {
        let element = self.element_transform(slot_id)?;
        self.surface.apply_transform(slot_id, &element);
        Ok(element)
    }

    fn save(&mut self) -> Result<(), EditorError> {
        self.repository.save(&self.document_id, &self.store)?;
        tracing::debug!(document_id = %self.document_id, slots = self.store.len(), "Saved placements");
        Ok(())
    }

    /// The selected slot, when it may take a direct edit.
    fn editable_slot(&self) -> Result<String, EditorError> {
        match &self.state {
            InteractionState::Idle => Err(EditorError::NothingSelected),
            InteractionState::Selected { slot_id } => Ok(slot_id.clone()),
            InteractionState::Dragging { slot_id, .. } => Err(EditorError::DragInProgress {
                slot_id: slot_id.clone(),
            }),
        }
    }

    fn geometry_of(&self, slot_id: &str) -> Result<SlotGeometry, EditorError> {
        self.geometry
            .get(slot_id)
            .copied()
            .ok_or_else(|| EditorError::SlotNotReady {
                slot_id: slot_id.to_string(),
            })
    }

    fn element_for(
        record: &PlacementRecord,
        frame: FrameSize,
        natural: NaturalSize,
    ) -> Result<ElementTransform, GeometryError> {
        let transform = resolve(record, frame, natural)?;
        Ok(ElementTransform::new(&transform, natural))
    }
}

#[cfg(test)]
mod tests {
    use slotframe_placement_model::persist::MemoryPlacementRepository;

    use super::*;
    use crate::surface::RecordingSurface;

    type Session = EditorSession<MemoryPlacementRepository, RecordingSurface>;

    fn session() -> (Session, MemoryPlacementRepository) {
        let repository = MemoryPlacementRepository::new();
        let session = EditorSession::open(
            "doc-1",
            repository.clone(),
            RecordingSurface::new(),
            EditorConfig::default(),
        )
        .unwrap();
        (session, repository)
    }

    fn attached() -> (Session, MemoryPlacementRepository) {
        let (mut session, repository) = session();
        session
            .attach_slot("hero", FrameSize::new(800, 600), NaturalSize::new(1600, 800))
            .unwrap();
        (session, repository)
    }

    #[test]
    fn test_open_missing_document_starts_empty() {
        let (session, repository) = session();
        assert_eq!(session.load_status(), LoadStatus::Missing);
        assert!(session.store().is_empty());
        assert_eq!(repository.save_count(), 0);
    }

    #[test]
    fn test_attach_shows_identity_cover_fit() {
        let (session, _) = attached();
        let element = session.surface().last("hero").unwrap();
        assert_eq!(element.scale, 0.75);
        assert_eq!((element.translate_x, element.translate_y), (0.0, 0.0));
        assert_eq!((element.display_width, element.display_height), (1200.0, 600.0));
        assert!(session.store().contains("hero"));
    }

    #[test]
    fn test_operations_before_decode_are_rejected() {
        let (mut session, repository) = session();
        assert!(matches!(
            session.select("hero"),
            Err(EditorError::SlotNotReady { .. })
        ));
        assert!(matches!(
            session.element_transform("hero"),
            Err(EditorError::SlotNotReady { .. })
        ));
        assert!(matches!(
            session.replace_image("hero", NaturalSize::new(10, 10), true),
            Err(EditorError::SlotNotReady { .. })
        ));
        assert_eq!(repository.save_count(), 0);
    }

    #[test]
    fn test_drag_persists_once_on_pointer_up() {
        let (mut session, repository) = attached();
        session.select("hero").unwrap();
        session.set_scale(200.0).unwrap();
        let saves_before = repository.save_count();

        session.pointer_down("hero", Point2D::new(100.0, 100.0)).unwrap();
        for step in 1..=10 {
            let x = 100.0 + step as f64 * 8.0;
            session.pointer_move(Point2D::new(x, 100.0)).unwrap();
        }
        assert_eq!(repository.save_count(), saves_before);
        assert_eq!(session.store().get("hero").offset_x_percent, 100.0);

        let record = session.pointer_up().unwrap().unwrap();
        assert_eq!(repository.save_count(), saves_before + 1);
        // 80px on an 800px frame is 10%.
        assert!((record.offset_x_percent - 110.0).abs() < 1e-9);
        assert_eq!(record.offset_y_percent, 100.0);
        assert_eq!(session.state(), &InteractionState::Selected { slot_id: "hero".into() });
    }

    #[test]
    fn test_drag_moves_content_with_the_pointer() {
        let (mut session, _) = attached();
        session.select("hero").unwrap();
        session.set_scale(200.0).unwrap();
        session.pointer_down("hero", Point2D::new(0.0, 0.0)).unwrap();
        let element = session.pointer_move(Point2D::new(40.0, -30.0)).unwrap().unwrap();
        assert!((element.translate_x - 40.0).abs() < 1e-9);
        assert!((element.translate_y + 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_element_transform_follows_stored_record() {
        let (mut session, _) = attached();
        session.select("hero").unwrap();
        session.set_scale(200.0).unwrap();
        session.set_offsets(120.0, 90.0).unwrap();

        let element = session.element_transform("hero").unwrap();
        assert!((element.scale - 1.5).abs() < 1e-9);
        assert!((element.translate_x - 160.0).abs() < 1e-9);
        assert!((element.translate_y + 60.0).abs() < 1e-9);
        assert_eq!(Some(&element), session.surface().last("hero"));
    }

    #[test]
    fn test_drag_is_clamped_to_pan_bounds() {
        let (mut session, _) = attached();
        session.select("hero").unwrap();
        session.set_scale(120.0).unwrap();
        session.pointer_down("hero", Point2D::new(0.0, 0.0)).unwrap();
        session.pointer_move(Point2D::new(10_000.0, -10_000.0)).unwrap();
        let record = session.pointer_up().unwrap().unwrap();
        // z = 1.2 allows [-10, 110].
        assert!((record.offset_x_percent - 110.0).abs() < 1e-9);
        assert!((record.offset_y_percent + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_pointer_down_requires_selection() {
        let (mut session, _) = attached();
        assert!(matches!(
            session.pointer_down("hero", Point2D::new(0.0, 0.0)),
            Err(EditorError::NotSelected { .. })
        ));
        assert_eq!(session.pointer_move(Point2D::new(5.0, 5.0)).unwrap(), None);
        assert!(session.pointer_up().unwrap().is_none());
    }

    #[test]
    fn test_wheel_steps_and_persists_each_notch() {
        let (mut session, repository) = attached();
        session.select("hero").unwrap();
        session.wheel(1.0).unwrap();
        session.wheel(2.0).unwrap();
        assert_eq!(session.store().get("hero").scale_percent, 130.0);
        assert_eq!(repository.save_count(), 2);
    }

    #[test]
    fn test_wheel_respects_scale_limits() {
        let (mut session, _) = attached();
        session.select("hero").unwrap();
        assert_eq!(session.wheel(-5.0).unwrap().scale_percent, 100.0);
        assert_eq!(session.wheel(100.0).unwrap().scale_percent, 500.0);
    }

    #[test]
    fn test_zooming_out_reclamps_offsets() {
        let (mut session, _) = attached();
        session.select("hero").unwrap();
        session.set_scale(300.0).unwrap();
        session.set_offsets(190.0, 20.0).unwrap();
        let record = session.wheel(-10.0).unwrap();
        assert_eq!(record.scale_percent, 200.0);
        assert_eq!(record.offset_x_percent, 150.0);
        assert_eq!(record.offset_y_percent, 20.0);
    }

    #[test]
    fn test_zooming_out_reclamps_both_axes() {
        let (mut session, _) = attached();
        session.select("hero").unwrap();
        session.set_scale(300.0).unwrap();
        session.set_offsets(190.0, -80.0).unwrap();
        let record = session.set_scale(200.0).unwrap();
        assert_eq!(record.offset_x_percent, 150.0);
        assert_eq!(record.offset_y_percent, -50.0);
    }

    #[test]
    fn test_nan_scale_falls_back_to_default() {
        let (mut session, _) = attached();
        session.select("hero").unwrap();
        session.set_scale(250.0).unwrap();
        let record = session.set_scale(f64::NAN).unwrap();
        assert_eq!(record.scale_percent, 100.0);
    }

    #[test]
    fn test_direct_edits_require_selection() {
        let (mut session, _) = attached();
        assert!(matches!(session.wheel(1.0), Err(EditorError::NothingSelected)));
        assert!(matches!(session.set_scale(150.0), Err(EditorError::NothingSelected)));
    }

    #[test]
    fn test_deselect_abandons_drag() {
        let (mut session, repository) = attached();
        session.select("hero").unwrap();
        session.set_scale(200.0).unwrap();
        let saves = repository.save_count();
        session.pointer_down("hero", Point2D::new(0.0, 0.0)).unwrap();
        session.pointer_move(Point2D::new(50.0, 0.0)).unwrap();
        session.deselect().unwrap();

        assert_eq!(session.state(), &InteractionState::Idle);
        assert_eq!(session.surface().last("hero").unwrap().translate_x, 0.0);
        assert_eq!(repository.save_count(), saves);
    }

    #[test]
    fn test_replace_image_with_reset() {
        let (mut session, _) = attached();
        session.select("hero").unwrap();
        session.set_scale(250.0).unwrap();

        let kept = session
            .replace_image("hero", NaturalSize::new(800, 600), false)
            .unwrap();
        assert!((kept.scale - 2.5).abs() < 1e-9);

        let reset = session
            .replace_image("hero", NaturalSize::new(800, 600), true)
            .unwrap();
        assert_eq!(reset.scale, 1.0);
        assert!(session.store().get("hero").is_identity());
    }

    #[test]
    fn test_remove_slot_persists_and_forgets_geometry() {
        let (mut session, repository) = attached();
        session.select("hero").unwrap();
        let removed = session.remove_slot("hero").unwrap();
        assert!(removed.is_some());
        assert!(!session.is_ready("hero"));
        assert!(session.surface().last("hero").is_none());
        assert_eq!(session.state(), &InteractionState::Idle);
        assert_eq!(repository.save_count(), 1);
    }

    #[test]
    fn test_reset_all_restores_identity_view() {
        let (mut session, repository) = attached();
        session
            .attach_slot("thumb", FrameSize::new(100, 100), NaturalSize::new(300, 200))
            .unwrap();
        session.select("hero").unwrap();
        session.set_scale(200.0).unwrap();
        session.set_offsets(130.0, 70.0).unwrap();

        session.reset_all().unwrap();

        assert!(session.store().slots().all(|(_, r)| r.is_identity()));
        assert_eq!(session.surface().last("hero").unwrap().translate_x, 0.0);
        assert_eq!(repository.save_count(), 3);
    }

    #[test]
    fn test_reopen_restores_saved_placements() {
        let (mut session, repository) = attached();
        session.select("hero").unwrap();
        session.set_scale(180.0).unwrap();
        drop(session);

        let reopened = EditorSession::open(
            "doc-1",
            repository.clone(),
            RecordingSurface::new(),
            EditorConfig::default(),
        )
        .unwrap();
        assert_eq!(reopened.load_status(), LoadStatus::Loaded);
        assert_eq!(reopened.store().get("hero").scale_percent, 180.0);
    }
}
