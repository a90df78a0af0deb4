//! Versioned placement documents.
//!
//! One JSON file per document holds the records for all of its slots:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "document_id": "sku-1042",
//!   "modified_at": "2026-10-14T09:12:00+00:00",
//!   "slots": { "hero": { "offsetXPercent": 100.0, "offsetYPercent": 100.0, "scalePercent": 100.0 } }
//! }
//! ```
//!
//! A document whose `schema_version` is missing or differs from
//! [`SCHEMA_VERSION`] is discarded and every slot starts from defaults.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::record::PlacementRecord;
use crate::store::PlacementStore;

/// Current placement document schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// File suffix for placement documents.
pub const DOCUMENT_SUFFIX: &str = ".placements.json";

/// On-disk form of a document's placement state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementDocument {
    /// Schema version.
    pub schema_version: u32,

    /// Document the slots belong to.
    pub document_id: String,

    /// Last modified timestamp (RFC 3339).
    pub modified_at: String,

    /// Records keyed by slot identifier.
    #[serde(default)]
    pub slots: BTreeMap<String, PlacementRecord>,
}

impl PlacementDocument {
    /// Snapshot a store for persistence.
    pub fn from_store(document_id: impl Into<String>, store: &PlacementStore) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            document_id: document_id.into(),
            modified_at: chrono::Utc::now().to_rfc3339(),
            slots: store
                .slots()
                .map(|(slot, record)| (slot.to_string(), *record))
                .collect(),
        }
    }

    /// Rebuild a store. Records pass through the store's clamping.
    pub fn into_store(self) -> PlacementStore {
        let mut store = PlacementStore::new();
        for (slot, record) in self.slots {
            store.set(slot, record);
        }
        store
    }
}

/// How a load request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing persisted yet for this document.
    Missing,
    /// A document of another schema version was found and ignored.
    Discarded { found_version: Option<u64> },
    /// Records were restored.
    Loaded,
}

/// Result of loading a document's placements.
#[derive(Debug, Clone)]
pub struct LoadedPlacements {
    pub store: PlacementStore,
    pub status: LoadStatus,
}

impl LoadedPlacements {
    fn empty(status: LoadStatus) -> Self {
        Self {
            store: PlacementStore::new(),
            status,
        }
    }
}

/// Errors that can occur when reading or writing placement documents.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Parse a persisted document, applying the version policy.
pub fn decode_document(json: &str, origin: &Path) -> Result<LoadedPlacements, PersistError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| PersistError::ParseError {
            path: origin.to_path_buf(),
            source: e,
        })?;

    let found_version = value.get("schema_version").and_then(serde_json::Value::as_u64);
    if found_version != Some(SCHEMA_VERSION as u64) {
        tracing::warn!(
            path = %origin.display(),
            ?found_version,
            expected = SCHEMA_VERSION,
            "Discarding placement document with unsupported schema version"
        );
        return Ok(LoadedPlacements::empty(LoadStatus::Discarded { found_version }));
    }

    let document: PlacementDocument =
        serde_json::from_value(value).map_err(|e| PersistError::ParseError {
            path: origin.to_path_buf(),
            source: e,
        })?;

    Ok(LoadedPlacements {
        store: document.into_store(),
        status: LoadStatus::Loaded,
    })
}

/// Serialize a store as a current-version document.
pub fn encode_document(
    document_id: &str,
    store: &PlacementStore,
    origin: &Path,
) -> Result<String, PersistError> {
    let document = PlacementDocument::from_store(document_id, store);
    serde_json::to_string_pretty(&document).map_err(|e| PersistError::ParseError {
        path: origin.to_path_buf(),
        source: e,
    })
}

/// Storage for placement documents keyed by document id.
pub trait PlacementRepository: Send {
    /// Load a document's placements. Unknown documents yield an empty store.
    fn load(&self, document_id: &str) -> Result<LoadedPlacements, PersistError>;

    /// Persist the full store for a document.
    fn save(&mut self, document_id: &str, store: &PlacementStore) -> Result<(), PersistError>;
}

/// One JSON file per document under a root directory.
#[derive(Debug, Clone)]
pub struct FsPlacementRepository {
    root: PathBuf,
}

impl FsPlacementRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds `document_id`'s placements.
    pub fn path_for(&self, document_id: &str) -> PathBuf {
        self.root
            .join(format!("{}{DOCUMENT_SUFFIX}", sanitize_document_id(document_id)))
    }
}

impl PlacementRepository for FsPlacementRepository {
    fn load(&self, document_id: &str) -> Result<LoadedPlacements, PersistError> {
        let path = self.path_for(document_id);
        if !path.exists() {
            return Ok(LoadedPlacements::empty(LoadStatus::Missing));
        }

        let json = std::fs::read_to_string(&path).map_err(|e| PersistError::IoError {
            path: path.clone(),
            source: e,
        })?;
        decode_document(&json, &path)
    }

    fn save(&mut self, document_id: &str, store: &PlacementStore) -> Result<(), PersistError> {
        std::fs::create_dir_all(&self.root).map_err(|e| PersistError::IoError {
            path: self.root.clone(),
            source: e,
        })?;

        let path = self.path_for(document_id);
        let json = encode_document(document_id, store, &path)?;

        // Write a sibling file, then rename over the old document.
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(|e| PersistError::IoError {
            path: tmp_path.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|e| PersistError::IoError {
            path: path.clone(),
            source: e,
        })?;

        tracing::debug!(document = document_id, slots = store.len(), "Saved placements");
        Ok(())
    }
}

/// In-memory repository. Clones share the same backing map.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlacementRepository {
    inner: Arc<Mutex<MemoryDocuments>>,
}

#[derive(Debug, Default)]
struct MemoryDocuments {
    documents: HashMap<String, String>,
    saves: u64,
}

impl MemoryPlacementRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls across all clones.
    pub fn save_count(&self) -> u64 {
        self.lock().saves
    }

    /// Raw JSON stored for a document.
    pub fn raw(&self, document_id: &str) -> Option<String> {
        self.lock().documents.get(document_id).cloned()
    }

    /// Replace the raw JSON for a document (for seeding legacy data).
    pub fn insert_raw(&self, document_id: impl Into<String>, json: impl Into<String>) {
        self.lock().documents.insert(document_id.into(), json.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryDocuments> {
        // Poisoning cannot leave the map half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn origin(document_id: &str) -> PathBuf {
        PathBuf::from(format!("memory:{document_id}"))
    }
}

impl PlacementRepository for MemoryPlacementRepository {
    fn load(&self, document_id: &str) -> Result<LoadedPlacements, PersistError> {
        match self.raw(document_id) {
            Some(json) => decode_document(&json, &Self::origin(document_id)),
            None => Ok(LoadedPlacements::empty(LoadStatus::Missing)),
        }
    }

    fn save(&mut self, document_id: &str, store: &PlacementStore) -> Result<(), PersistError> {
        let json = encode_document(document_id, store, &Self::origin(document_id))?;
        let mut docs = self.lock();
        docs.documents.insert(document_id.to_string(), json);
        docs.saves += 1;
        Ok(())
    }
}

/// Percent-escape document ids into file names, one name per id.
///
/// `_` never appears in an escaped id, so it stands for the empty id.
fn sanitize_document_id(document_id: &str) -> String {
    if document_id.is_empty() {
        return "_".to_string();
    }
    let mut escaped = String::with_capacity(document_id.len());
    for byte in document_id.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.') {
            escaped.push(char::from(byte));
        } else {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }
    escaped
}
