use proptest::prelude::*;

use slotframe_editor::{EditorConfig, EditorSession, RecordingSurface};
use slotframe_placement_model::geometry::{FrameSize, NaturalSize, Point2D};
use slotframe_placement_model::persist::MemoryPlacementRepository;

#[derive(Debug, Clone)]
enum Step {
    Drag { dx: f64, dy: f64 },
    Wheel(f64),
    Slider(f64),
    Offsets(f64, f64),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (-2000.0f64..2000.0, -2000.0f64..2000.0).prop_map(|(dx, dy)| Step::Drag { dx, dy }),
        (-20.0f64..20.0).prop_map(Step::Wheel),
        (0.0f64..800.0).prop_map(Step::Slider),
        (-500.0f64..500.0, -500.0f64..500.0).prop_map(|(x, y)| Step::Offsets(x, y)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn preview_display_size_covers_the_frame(
        fw in 1u32..1200,
        fh in 1u32..1200,
        iw in 1u32..3000,
        ih in 1u32..3000,
        steps in proptest::collection::vec(step_strategy(), 1..12),
    ) {
        let frame = FrameSize::new(fw, fh);
        let natural = NaturalSize::new(iw, ih);
        let repository = MemoryPlacementRepository::new();
        let mut session = EditorSession::open(
            "prop",
            repository.clone(),
            RecordingSurface::new(),
            EditorConfig::default(),
        )
        .unwrap();
        session.attach_slot("slot", frame, natural).unwrap();
        session.select("slot").unwrap();

        let mut expected_saves = 0;
        for step in steps {
            match step {
                Step::Drag { dx, dy } => {
                    session.pointer_down("slot", Point2D::new(0.0, 0.0)).unwrap();
                    session.pointer_move(Point2D::new(dx / 2.0, dy / 2.0)).unwrap();
                    session.pointer_move(Point2D::new(dx, dy)).unwrap();
                    session.pointer_up().unwrap();
                }
                Step::Wheel(n) => { session.wheel(n).unwrap(); }
                Step::Slider(s) => { session.set_scale(s).unwrap(); }
                Step::Offsets(x, y) => { session.set_offsets(x, y).unwrap(); }
            }
            expected_saves += 1;

            let record = session.store().get("slot");
            prop_assert!(record.scale_percent >= 100.0);
            prop_assert!(record.scale_percent <= 500.0);
            prop_assert!(record.pan_bounds().contains(record.offset_x_percent));
            prop_assert!(record.pan_bounds().contains(record.offset_y_percent));

            let element = session.element_transform("slot").unwrap();
            prop_assert!(element.affine().covers(frame, natural));
        }
        prop_assert_eq!(repository.save_count(), expected_saves);
    }
}
