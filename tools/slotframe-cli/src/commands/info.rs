//! Show stored placements for a document.

use slotframe_common::config::AppConfig;
use slotframe_placement_model::persist::{FsPlacementRepository, LoadStatus, PlacementRepository};

pub fn run(config: &AppConfig, document_id: &str) -> anyhow::Result<()> {
    let repository = FsPlacementRepository::new(config.placements_dir.clone());
    let loaded = repository
        .load(document_id)
        .map_err(|e| anyhow::anyhow!("Failed to load placements: {e}"))?;

    println!("Document: {document_id}");
    println!("  File: {}", repository.path_for(document_id).display());
    match loaded.status {
        LoadStatus::Missing => println!("  Status: nothing stored yet"),
        LoadStatus::Discarded { found_version } => println!(
            "  Status: discarded (schema version {})",
            found_version.map_or_else(|| "missing".to_string(), |v| v.to_string())
        ),
        LoadStatus::Loaded => println!("  Status: loaded"),
    }
    println!();

    if loaded.store.is_empty() {
        println!("No placements.");
        return Ok(());
    }

    println!("Placements:");
    for (slot_id, record) in loaded.store.slots() {
        println!(
            "  {slot_id}: offset ({:.2}, {:.2})  scale {:.2}%{}",
            record.offset_x_percent,
            record.offset_y_percent,
            record.scale_percent,
            if record.is_identity() { "  (default)" } else { "" }
        );
    }

    Ok(())
}
