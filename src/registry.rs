//! Schema registry: a catalogue of identifier to key set, captured from
//! live containers, persisted as a flat JSON snapshot and diffed against it.
//!
//! The snapshot is the interface to static tooling (e.g. a linter that
//! wants the valid keys per identifier): a JSON object whose values are
//! sorted key lists.
//!
//! ```json
//! { "ns/user": ["id", "name"] }
//! ```
//!
//! The registry is an explicit, cloneable handle rather than a process
//! global; clones share the same store. Registration, clearing and
//! snapshotting each take the lock once, so `export` and `diff` see a
//! consistent view.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::error::SnapshotError;
use crate::schema::Schema;
use crate::validated_map::ValidatedMap;
use crate::value::Key;

/// Conventional snapshot location, relative to the working directory.
pub const DEFAULT_SNAPSHOT_PATH: &str = ".validated-map/schemas.json";

/// Identifier to sorted key set.
pub type Snapshot = BTreeMap<String, BTreeSet<Key>>;

/// Shared, thread-safe catalogue of schemas.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    schemas: Arc<RwLock<Snapshot>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the schema of `map` under `id`, replacing any earlier entry.
    pub fn register(&self, id: impl Into<String>, map: &ValidatedMap) {
        self.register_schema(id, map.schema());
    }

    pub fn register_schema(&self, id: impl Into<String>, schema: &Schema) {
        let keys: BTreeSet<Key> = schema.iter().cloned().collect();
        self.schemas.write().insert(id.into(), keys);
    }

    pub fn clear(&self) {
        self.schemas.write().clear();
    }

    pub fn get(&self, id: &str) -> Option<BTreeSet<Key>> {
        self.schemas.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }

    /// Copy of the current catalogue.
    pub fn snapshot(&self) -> Snapshot {
        self.schemas.read().clone()
    }

    /// Write the whole catalogue to `path`, replacing the file.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let snapshot = self.snapshot();
        save_snapshot(path.as_ref(), &snapshot)?;
        tracing::debug!(path = %path.as_ref().display(), schemas = snapshot.len(), "exported schema snapshot");
        Ok(())
    }

    pub fn export_default(&self) -> Result<(), SnapshotError> {
        self.export(DEFAULT_SNAPSHOT_PATH)
    }

    /// Compare the catalogue with the snapshot at `path`. Neither side is
    /// modified.
    pub fn diff(&self, path: impl AsRef<Path>) -> Result<SchemaDiff, SnapshotError> {
        let persisted = load_snapshot(path.as_ref())?;
        let diff = SchemaDiff::between(&self.snapshot(), &persisted);
        tracing::debug!(
            path = %path.as_ref().display(),
            only_in_memory = diff.only_in_memory.len(),
            only_in_persisted = diff.only_in_persisted.len(),
            changed = diff.changed.len(),
            "diffed schema registry against snapshot"
        );
        Ok(diff)
    }

    pub fn diff_default(&self) -> Result<SchemaDiff, SnapshotError> {
        self.diff(DEFAULT_SNAPSHOT_PATH)
    }
}

/// Keys that differ for one identifier present on both sides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KeyDiff {
    pub memory_only_keys: BTreeSet<Key>,
    pub persisted_only_keys: BTreeSet<Key>,
}

/// Three-way comparison of a live registry and a persisted snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SchemaDiff {
    pub only_in_memory: BTreeSet<String>,
    pub only_in_persisted: BTreeSet<String>,
    pub changed: BTreeMap<String, KeyDiff>,
}

impl SchemaDiff {
    pub fn between(memory: &Snapshot, persisted: &Snapshot) -> Self {
        let mut diff = SchemaDiff::default();
        for (id, keys) in memory {
            match persisted.get(id) {
                None => {
                    diff.only_in_memory.insert(id.clone());
                }
                Some(stored) if stored != keys => {
                    diff.changed.insert(
                        id.clone(),
                        KeyDiff {
                            memory_only_keys: keys.difference(stored).cloned().collect(),
                            persisted_only_keys: stored.difference(keys).cloned().collect(),
                        },
                    );
                }
                Some(_) => {}
            }
        }
        diff.only_in_persisted = persisted
            .keys()
            .filter(|id| !memory.contains_key(*id))
            .cloned()
            .collect();
        diff
    }

    /// No drift in either direction.
    pub fn is_empty(&self) -> bool {
        self.only_in_memory.is_empty() && self.only_in_persisted.is_empty() && self.changed.is_empty()
    }
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
    let text = std::fs::read_to_string(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SnapshotError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `snapshot` as pretty JSON, creating missing parent directories.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let write_err = |source| SnapshotError::Write {
        path: PathBuf::from(path),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut text = serde_json::to_string_pretty(snapshot)?;
    text.push('\n');
    std::fs::write(path, text).map_err(write_err)
}
