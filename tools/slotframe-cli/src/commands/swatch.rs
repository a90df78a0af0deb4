//! Print the representative swatch color of an image.

use std::path::PathBuf;

use slotframe_common::config::AppConfig;
use slotframe_render_engine::{Engine, EngineConfig, FsSourceLoader};

pub async fn run(config: &AppConfig, image: PathBuf) -> anyhow::Result<()> {
    let engine = Engine::new(FsSourceLoader::new("."), EngineConfig::from(config));
    let sample = engine.sample_color(&image.to_string_lossy()).await;

    if sample.is_fallback() {
        println!("{} (fallback)", sample.hex);
    } else {
        println!("{}", sample.hex);
    }
    Ok(())
}
