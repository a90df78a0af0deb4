//! Flatten every slot of a layout and write the artifacts.

use std::io::Write;
use std::path::PathBuf;

use slotframe_common::config::AppConfig;
use slotframe_placement_model::persist::{FsPlacementRepository, LoadStatus, PlacementRepository};
use slotframe_render_engine::{
    write_artifacts, Engine, EngineConfig, ExportLayout, ExportProgress, ExportStage,
    FsSourceLoader, ProgressCallback, SlotArtifact,
};

pub async fn run(
    config: &AppConfig,
    layout_path: PathBuf,
    output: Option<PathBuf>,
    document: Option<String>,
) -> anyhow::Result<()> {
    println!("Exporting layout: {}", layout_path.display());

    let layout = ExportLayout::load(&layout_path)
        .map_err(|e| anyhow::anyhow!("Failed to load layout: {e}"))?;
    let document_id = document.unwrap_or_else(|| layout.document_id.clone());
    let layout_dir = layout_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    let output_dir = output.unwrap_or_else(|| layout_dir.join("export").join(&document_id));

    let repository = FsPlacementRepository::new(config.placements_dir.clone());
    let loaded = repository
        .load(&document_id)
        .map_err(|e| anyhow::anyhow!("Failed to load placements: {e}"))?;
    if let LoadStatus::Discarded { found_version } = loaded.status {
        println!("  Stored placements had schema version {found_version:?}; using defaults");
    }

    println!("  Document: {document_id}");
    println!("  Slots: {}", layout.slots.len());
    println!("  Output: {}", output_dir.display());

    let engine = Engine::new(FsSourceLoader::new(layout_dir), EngineConfig::from(config));

    let progress_cb: ProgressCallback = Box::new(|p: ExportProgress| {
        if p.stage == ExportStage::Flattening {
            print!(
                "\r  Progress: {:.1}% ({}/{} slots)  ",
                p.progress * 100.0,
                p.slots_done,
                p.total_slots
            );
            let _ = std::io::stdout().flush();
        }
    });

    let report = match engine
        .export_with_progress(&layout.slots, &loaded.store, Some(progress_cb))
        .await
    {
        Ok(report) => report,
        Err(e) => {
            println!("\nExport failed: {e}");
            return Err(e.into());
        }
    };
    let manifest = write_artifacts(&report, &output_dir)?;

    println!();
    for artifact in &report.artifacts {
        match artifact {
            SlotArtifact::Flattened {
                slot_id,
                raster,
                cache_hit,
            } => println!(
                "  {slot_id}: flattened {}x{}{}",
                raster.width,
                raster.height,
                if *cache_hit { " (cached)" } else { "" }
            ),
            SlotArtifact::Unflattened { slot_id, source, .. } => {
                println!("  {slot_id}: kept unflattened source {source}")
            }
        }
    }
    println!(
        "Export complete: {} flattened, {} fallback(s), manifest {}",
        report.flattened(),
        report.fallbacks(),
        manifest.display()
    );

    Ok(())
}
