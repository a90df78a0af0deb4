//! Export pass and artifact writing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use slotframe_common::error::{SlotframeError, SlotframeResult};
use slotframe_placement_model::geometry::FrameSize;
use slotframe_placement_model::store::PlacementStore;

use crate::decode::SourceLoader;
use crate::engine::Engine;
use crate::flatten::RasterBuffer;

/// Manifest file written next to exported rasters.
pub const MANIFEST_FILE: &str = "manifest.json";

/// One slot to export: where its image comes from and the frame it fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSlot {
    pub slot_id: String,
    pub source: String,
    pub frame: FrameSize,
}

/// Document layout handed to the export pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportLayout {
    pub document_id: String,
    pub slots: Vec<ExportSlot>,
}

impl ExportLayout {
    /// Load a layout manifest from a JSON file.
    pub fn load(path: &Path) -> SlotframeResult<Self> {
        if !path.exists() {
            return Err(SlotframeError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Per-slot export result.
#[derive(Debug, Clone)]
pub enum SlotArtifact {
    /// The slot was baked into a frame-sized raster.
    Flattened {
        slot_id: String,
        raster: Arc<RasterBuffer>,
        cache_hit: bool,
    },
    /// Decode failed; the original source is exported as-is.
    Unflattened {
        slot_id: String,
        source: String,
        reason: String,
    },
}

impl SlotArtifact {
    pub fn slot_id(&self) -> &str {
        match self {
            SlotArtifact::Flattened { slot_id, .. } | SlotArtifact::Unflattened { slot_id, .. } => {
                slot_id
            }
        }
    }

    pub fn is_flattened(&self) -> bool {
        matches!(self, SlotArtifact::Flattened { .. })
    }
}

/// Summary of one export pass, in slot order.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub artifacts: Vec<SlotArtifact>,
}

impl ExportReport {
    pub fn flattened(&self) -> usize {
        self.artifacts.iter().filter(|a| a.is_flattened()).count()
    }

    pub fn fallbacks(&self) -> usize {
        self.artifacts.len() - self.flattened()
    }

    pub fn cache_hits(&self) -> usize {
        self.artifacts
            .iter()
            .filter(|a| matches!(a, SlotArtifact::Flattened { cache_hit: true, .. }))
            .count()
    }

    pub fn get(&self, slot_id: &str) -> Option<&SlotArtifact> {
        self.artifacts.iter().find(|a| a.slot_id() == slot_id)
    }
}

/// Progress callback for export passes.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Slots processed so far.
    pub slots_done: usize,

    /// Total slots in the pass.
    pub total_slots: usize,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Flattening,
    Complete,
    Failed,
}

impl<L: SourceLoader> Engine<L> {
    /// Flatten every slot in order, one raster at a time.
    pub async fn export(
        &self,
        slots: &[ExportSlot],
        store: &PlacementStore,
    ) -> SlotframeResult<ExportReport> {
        self.export_with_progress(slots, store, None).await
    }

    /// [`Engine::export`] with progress reporting.
    ///
    /// Decode failures are contained to their slot. Anything else, such as
    /// a zero-size frame, aborts the pass.
    pub async fn export_with_progress(
        &self,
        slots: &[ExportSlot],
        store: &PlacementStore,
        progress: Option<ProgressCallback>,
    ) -> SlotframeResult<ExportReport> {
        tracing::info!(slots = slots.len(), format = %self.config().format, "Starting export");

        let total = slots.len();
        let report_progress = |done: usize, stage: ExportStage| {
            if let Some(cb) = &progress {
                cb(ExportProgress {
                    progress: if total == 0 { 1.0 } else { done as f64 / total as f64 },
                    slots_done: done,
                    total_slots: total,
                    stage,
                });
            }
        };

        report_progress(0, ExportStage::Preparing);

        let mut report = ExportReport::default();
        for (index, slot) in slots.iter().enumerate() {
            let record = store.get(&slot.slot_id);
            let artifact = match self
                .flatten_slot(&slot.slot_id, &slot.source, slot.frame, &record)
                .await
            {
                Ok(outcome) => SlotArtifact::Flattened {
                    slot_id: slot.slot_id.clone(),
                    raster: outcome.raster,
                    cache_hit: outcome.cache_hit,
                },
                Err(e) if e.is_slot_local() => {
                    tracing::warn!(
                        slot_id = %slot.slot_id,
                        source = %slot.source,
                        error = %e,
                        "Flatten skipped, exporting unflattened source"
                    );
                    SlotArtifact::Unflattened {
                        slot_id: slot.slot_id.clone(),
                        source: slot.source.clone(),
                        reason: e.to_string(),
                    }
                }
                Err(e) => {
                    tracing::error!(slot_id = %slot.slot_id, error = %e, "Export aborted");
                    report_progress(index, ExportStage::Failed);
                    return Err(e);
                }
            };
            report.artifacts.push(artifact);
            report_progress(index + 1, ExportStage::Flattening);
        }

        report_progress(total, ExportStage::Complete);
        tracing::info!(
            flattened = report.flattened(),
            fallbacks = report.fallbacks(),
            cache_hits = report.cache_hits(),
            "Export complete"
        );
        Ok(report)
    }
}

/// Manifest describing what [`write_artifacts`] produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub flattened: usize,
    pub fallbacks: usize,
    pub slots: Vec<ManifestEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ManifestEntry {
    Flattened {
        slot_id: String,
        file: String,
        width: u32,
        height: u32,
    },
    Unflattened {
        slot_id: String,
        source: String,
        reason: String,
    },
}

/// Write one image per flattened slot plus a manifest into `out_dir`.
///
/// Unflattened slots get no file; the manifest points at their source.
/// Slot ids that sanitize to the same stem get a numeric suffix.
pub fn write_artifacts(report: &ExportReport, out_dir: &Path) -> SlotframeResult<PathBuf> {
    std::fs::create_dir_all(out_dir)?;

    let mut taken = HashSet::new();
    let mut entries = Vec::with_capacity(report.artifacts.len());
    for artifact in &report.artifacts {
        match artifact {
            SlotArtifact::Flattened {
                slot_id, raster, ..
            } => {
                let file = unique_file_name(&mut taken, slot_id, raster.format.extension());
                std::fs::write(out_dir.join(&file), &raster.bytes)?;
                entries.push(ManifestEntry::Flattened {
                    slot_id: slot_id.clone(),
                    file,
                    width: raster.width,
                    height: raster.height,
                });
            }
            SlotArtifact::Unflattened {
                slot_id,
                source,
                reason,
            } => entries.push(ManifestEntry::Unflattened {
                slot_id: slot_id.clone(),
                source: source.clone(),
                reason: reason.clone(),
            }),
        }
    }

    let manifest = ExportManifest {
        flattened: report.flattened(),
        fallbacks: report.fallbacks(),
        slots: entries,
    };
    let path = out_dir.join(MANIFEST_FILE);
    std::fs::write(&path, serde_json::to_string_pretty(&manifest)?)?;

    tracing::info!(path = %path.display(), "Wrote export manifest");
    Ok(path)
}

fn unique_file_name(taken: &mut HashSet<String>, slot_id: &str, extension: &str) -> String {
    let stem = file_stem(slot_id);
    let mut file = format!("{stem}.{extension}");
    let mut n = 2;
    while !taken.insert(file.clone()) {
        file = format!("{stem}-{n}.{extension}");
        n += 1;
    }
    file
}

fn file_stem(slot_id: &str) -> String {
    let stem: String = slot_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "slot".to_string()
    } else {
        stem
    }
}
