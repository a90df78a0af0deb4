//! The editor preview and the flatten output must agree pixel for pixel.

use image::{Rgba, RgbaImage};

use slotframe_editor::{EditorConfig, EditorSession, ElementTransform, RecordingSurface};
use slotframe_placement_model::geometry::{FrameSize, NaturalSize, Point2D};
use slotframe_placement_model::persist::MemoryPlacementRepository;
use slotframe_placement_model::record::PlacementRecord;
use slotframe_render_engine::{flatten, DecodedImage};

/// Red encodes the column and green the row, so every pixel is addressable.
fn coordinate_image(width: u32, height: u32) -> DecodedImage {
    DecodedImage::from_pixels(
        "coords",
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255])),
    )
}

/// Drive an editor session to a placement and return what it shows.
fn preview(
    frame: FrameSize,
    natural: NaturalSize,
    scale_percent: f64,
    drag: (f64, f64),
) -> (PlacementRecord, ElementTransform) {
    let mut session = EditorSession::open(
        "parity",
        MemoryPlacementRepository::new(),
        RecordingSurface::new(),
        EditorConfig::default(),
    )
    .unwrap();
    session.attach_slot("slot", frame, natural).unwrap();
    session.select("slot").unwrap();
    session.set_scale(scale_percent).unwrap();
    session.pointer_down("slot", Point2D::new(0.0, 0.0)).unwrap();
    session.pointer_move(Point2D::new(drag.0, drag.1)).unwrap();
    let record = session.pointer_up().unwrap().unwrap();

    let element = *session.surface().last("slot").unwrap();
    assert_eq!(element, session.element_transform("slot").unwrap());
    (record, element)
}

#[test]
fn unit_scale_preview_and_flatten_show_the_same_pixels() {
    let frame = FrameSize::new(100, 100);
    let natural = NaturalSize::new(200, 200);
    let image = coordinate_image(200, 200);

    // Cover fit is 0.5, so 200% zoom displays source pixels 1:1.
    let (record, element) = preview(frame, natural, 200.0, (-10.0, -20.0));
    assert_eq!(element.scale, 1.0);
    assert!((element.translate_x + 10.0).abs() < 1e-9);
    assert!((element.translate_y + 20.0).abs() < 1e-9);

    let out = flatten(frame, &image, &record).unwrap();
    for (x, y, pixel) in out.enumerate_pixels() {
        let sx = (x as f64 - element.translate_x).round() as u32;
        let sy = (y as f64 - element.translate_y).round() as u32;
        assert_eq!(pixel, image.pixels.get_pixel(sx, sy), "pixel ({x}, {y})");
    }
}

#[test]
fn zoomed_preview_and_flatten_sample_the_same_source_points() {
    let frame = FrameSize::new(90, 70);
    let natural = NaturalSize::new(256, 256);
    let image = coordinate_image(256, 256);

    for (scale, drag) in [(100.0, (0.0, 0.0)), (135.0, (12.0, -9.0)), (260.0, (-37.0, 41.0))] {
        let (record, element) = preview(frame, natural, scale, drag);
        let out = flatten(frame, &image, &record).unwrap();

        let affine = element.affine();
        for (x, y, pixel) in out.enumerate_pixels() {
            let source = affine.invert(Point2D::new(x as f64 + 0.5, y as f64 + 0.5));
            // Pixel i carries value i at its center i + 0.5.
            let (ex, ey) = (source.x - 0.5, source.y - 0.5);
            if !(0.0..=255.0).contains(&ex) || !(0.0..=255.0).contains(&ey) {
                continue;
            }
            assert!(
                (pixel.0[0] as f64 - ex).abs() <= 1.0 && (pixel.0[1] as f64 - ey).abs() <= 1.0,
                "scale {scale}: pixel ({x}, {y}) = {:?}, preview expects ({ex:.2}, {ey:.2})",
                pixel.0
            );
        }
    }
}

#[test]
fn identity_preview_matches_resolver_scenario() {
    let (record, element) = preview(FrameSize::new(800, 600), NaturalSize::new(1600, 800), 100.0, (0.0, 0.0));
    assert!(record.is_identity());
    assert_eq!(element.scale, 0.75);
    assert_eq!((element.display_width, element.display_height), (1200.0, 600.0));
    assert_eq!(element.css_transform(), "translate(0.000px, 0.000px) scale(0.750000)");
}
