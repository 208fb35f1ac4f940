//! Session persistence
//!
//! The coordinator saves a whole `SessionRecord` after every committed
//! change. Stores only need load-by-id and save.

use cardchess_core::{ByColor, Color, Hand, Shield, TurnPhase};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Everything needed to describe a session at rest
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub fen: String,
    pub hands: ByColor<Hand>,
    pub turn: Option<Color>,
    pub phase: TurnPhase,
    pub shield: Option<Shield>,
    pub card_played: bool,
    /// Which colors currently have a connection
    pub seats: ByColor<bool>,
}

impl SessionRecord {
    pub fn players(&self) -> usize {
        Color::ALL.iter().filter(|&&c| self.seats[c]).count()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait SessionStore: Send + Sync {
    fn load(&self, id: &str) -> Result<Option<SessionRecord>, StoreError>;
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;
}

/// Records kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(id).cloned())
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }
}

/// One `<id>.json` file per session
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Use `dir`, creating it if needed
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// None for ids that could escape the directory
    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        valid.then(|| self.dir.join(format!("{id}.json")))
    }
}

impl SessionStore for JsonFileStore {
    fn load(&self, id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let Some(path) = self.path_for(id) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let Some(path) = self.path_for(&record.id) else {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid session id {:?}", record.id),
            )));
        };
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(record)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardchess_core::STARTING_RECORD;

    fn record(id: &str) -> SessionRecord {
        SessionRecord {
            id: id.to_string(),
            fen: STARTING_RECORD.to_string(),
            hands: ByColor::default(),
            turn: Some(Color::White),
            phase: TurnPhase::AwaitingMove { color: Color::White },
            shield: None,
            card_played: false,
            seats: ByColor::new(true, false),
        }
    }

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("cardchess-store-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.load("abc").unwrap(), None);
        store.save(&record("abc")).unwrap();
        assert_eq!(store.load("abc").unwrap(), Some(record("abc")));
    }

    #[test]
    fn test_json_file_store() {
        let dir = temp_dir();
        let store = JsonFileStore::open(&dir).unwrap();
        let rec = record("1f0c-42");
        store.save(&rec).unwrap();
        assert!(dir.join("1f0c-42.json").exists());
        assert_eq!(store.load("1f0c-42").unwrap(), Some(rec.clone()));

        // A reopened store sees the same file
        let reopened = JsonFileStore::open(&dir).unwrap();
        assert_eq!(reopened.load("1f0c-42").unwrap().map(|r| r.players()), Some(1));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_json_file_store_rejects_path_ids() {
        let dir = temp_dir();
        let store = JsonFileStore::open(&dir).unwrap();
        assert_eq!(store.load("../etc/passwd").unwrap(), None);
        assert!(store.save(&record("a/b")).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
