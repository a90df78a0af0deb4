//! Show the transform a placement resolves to.

use slotframe_placement_model::geometry::{FrameSize, NaturalSize};
use slotframe_placement_model::record::PlacementRecord;
use slotframe_placement_model::transform::{base_scale, resolve};

pub fn run(
    frame: FrameSize,
    natural: NaturalSize,
    record: PlacementRecord,
    json: bool,
) -> anyhow::Result<()> {
    let clamped = record.clamped();
    if clamped != record {
        tracing::warn!(?record, ?clamped, "Placement is outside the editable range");
    }

    let transform = resolve(&record, frame, natural)?;
    let (display_width, display_height) = transform.display_size(natural);
    let bounds = record.pan_bounds();

    if json {
        let value = serde_json::json!({
            "frame": frame,
            "natural": natural,
            "record": record,
            "base_scale": base_scale(frame, natural),
            "transform": transform,
            "display": { "width": display_width, "height": display_height },
            "css_transform": transform.css_transform(),
            "transform_origin": "0 0",
            "covers": transform.covers(frame, natural),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Frame: {frame}  Natural: {natural}");
    println!(
        "Placement: offset ({}, {})  scale {}%",
        record.offset_x_percent, record.offset_y_percent, record.scale_percent
    );
    println!();
    println!("  Base scale:  {:.6}", base_scale(frame, natural));
    println!("  Total scale: {:.6}", transform.scale);
    println!(
        "  Translate:   ({:.3}, {:.3})",
        transform.translate_x, transform.translate_y
    );
    println!("  Display:     {display_width:.3}x{display_height:.3}");
    println!("  Pan bounds:  [{:.3}, {:.3}]", bounds.min, bounds.max);
    println!("  Covers:      {}", transform.covers(frame, natural));
    println!();
    println!("  transform: {};", transform.css_transform());
    println!("  transform-origin: 0 0;");

    Ok(())
}
