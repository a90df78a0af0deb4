//! Reset every placement of a document.

use slotframe_common::config::AppConfig;
use slotframe_editor::{EditorConfig, EditorSession, RecordingSurface};
use slotframe_placement_model::persist::FsPlacementRepository;

pub fn run(config: &AppConfig, document_id: &str) -> anyhow::Result<()> {
    let repository = FsPlacementRepository::new(config.placements_dir.clone());
    let path = repository.path_for(document_id);

    let mut session = EditorSession::open(
        document_id,
        repository,
        RecordingSurface::new(),
        EditorConfig::from(&config.editor),
    )?;
    let slots = session.store().len();
    session.reset_all()?;

    println!("Reset {slots} placement(s) in {}", path.display());
    Ok(())
}
