//! Persistence contract for brackets, with in-memory and JSON-file implementations.
//!
//! Saves are versioned compare-and-swap writes: a save names the version it was computed from
//! (`None` for "must not exist yet") and fails with `OptimisticConcurrency` when that is stale.

use crate::models::{Bracket, BracketError, TournamentId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// A bracket together with the store version it was read at.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StoredBracket {
    pub version: u64,
    #[serde(flatten)]
    pub bracket: Bracket,
}

pub trait BracketStore: Send + Sync {
    fn load_bracket(&self, tournament_id: TournamentId) -> Result<Option<StoredBracket>, BracketError>;

    /// Atomically replace the bracket if the stored version equals `expected_version`.
    /// Returns the new version.
    fn save_bracket(
        &self,
        tournament_id: TournamentId,
        bracket: &Bracket,
        expected_version: Option<u64>,
    ) -> Result<u64, BracketError>;
}

fn check_version(expected: Option<u64>, actual: Option<u64>) -> Result<u64, BracketError> {
    if expected != actual {
        return Err(BracketError::OptimisticConcurrency { expected, actual });
    }
    Ok(actual.map_or(1, |v| v + 1))
}

/// Brackets kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    brackets: RwLock<HashMap<TournamentId, StoredBracket>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BracketStore for MemoryStore {
    fn load_bracket(&self, tournament_id: TournamentId) -> Result<Option<StoredBracket>, BracketError> {
        let g = self
            .brackets
            .read()
            .map_err(|_| BracketError::Storage("lock error".to_string()))?;
        Ok(g.get(&tournament_id).cloned())
    }

    fn save_bracket(
        &self,
        tournament_id: TournamentId,
        bracket: &Bracket,
        expected_version: Option<u64>,
    ) -> Result<u64, BracketError> {
        let mut g = self
            .brackets
            .write()
            .map_err(|_| BracketError::Storage("lock error".to_string()))?;
        let version = check_version(expected_version, g.get(&tournament_id).map(|s| s.version))?;
        g.insert(
            tournament_id,
            StoredBracket {
                version,
                bracket: bracket.clone(),
            },
        );
        Ok(version)
    }
}

/// One JSON document per tournament under a directory (`<dir>/<tournament_id>.json`).
/// Writes go to a temp file that is renamed over the document.
pub struct JsonFileStore {
    dir: PathBuf,
    /// Serializes compare-and-swap within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, BracketError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| BracketError::Storage(format!("{}: {}", dir.display(), e)))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn path(&self, tournament_id: TournamentId) -> PathBuf {
        self.dir.join(format!("{}.json", tournament_id))
    }

    fn read(&self, tournament_id: TournamentId) -> Result<Option<StoredBracket>, BracketError> {
        let path = self.path(tournament_id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BracketError::Storage(format!("{}: {}", path.display(), e))),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| BracketError::Storage(format!("{}: {}", path.display(), e)))
    }
}

impl BracketStore for JsonFileStore {
    fn load_bracket(&self, tournament_id: TournamentId) -> Result<Option<StoredBracket>, BracketError> {
        self.read(tournament_id)
    }

    fn save_bracket(
        &self,
        tournament_id: TournamentId,
        bracket: &Bracket,
        expected_version: Option<u64>,
    ) -> Result<u64, BracketError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| BracketError::Storage("lock error".to_string()))?;
        let current = self.read(tournament_id)?.map(|s| s.version);
        let version = check_version(expected_version, current)?;

        let stored = StoredBracket {
            version,
            bracket: bracket.clone(),
        };
        let json = serde_json::to_vec_pretty(&stored)
            .map_err(|e| BracketError::Storage(e.to_string()))?;
        let path = self.path(tournament_id);
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = write_synced(&tmp, &json).and_then(|_| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(BracketError::Storage(format!("{}: {}", path.display(), e)));
        }
        Ok(version)
    }
}

/// Write and fsync, so the rename never publishes a half-written document.
fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
