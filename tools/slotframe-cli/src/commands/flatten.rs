//! Flatten a single image into a frame-sized raster.

use std::path::PathBuf;

use slotframe_common::config::AppConfig;
use slotframe_placement_model::geometry::FrameSize;
use slotframe_placement_model::record::PlacementRecord;
use slotframe_render_engine::{Engine, EngineConfig, FsSourceLoader, RasterFormat};

pub async fn run(
    config: &AppConfig,
    image: PathBuf,
    frame: FrameSize,
    record: PlacementRecord,
    output: PathBuf,
    format: Option<String>,
) -> anyhow::Result<()> {
    let mut engine_config = EngineConfig::from(config);
    if let Some(format) = format {
        engine_config.format = format.parse::<RasterFormat>()?;
    }

    let record = record.clamped();
    println!("Flattening {} into {frame}", image.display());
    println!(
        "  Placement: offset ({}, {})  scale {}%",
        record.offset_x_percent, record.offset_y_percent, record.scale_percent
    );

    let engine = Engine::new(FsSourceLoader::new("."), engine_config);
    let source = image.to_string_lossy();
    let outcome = engine.flatten_slot("cli", &source, frame, &record).await?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&output, &outcome.raster.bytes)?;

    println!(
        "Wrote {} ({}x{}, {})",
        output.display(),
        outcome.raster.width,
        outcome.raster.height,
        outcome.raster.format
    );
    Ok(())
}
