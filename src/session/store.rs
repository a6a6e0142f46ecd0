//! Session collection and durable state mirroring.
//!
//! The collection is an order-preserving list of sessions plus a separate
//! active-session reference. A `StateStore` mirrors both to durable storage
//! after every mutation and is read back once at startup; absent or
//! malformed stored state loads as empty state, never an error.

use super::types::{Session, SessionId};
use crate::{ParleyError, Result};
use std::path::PathBuf;
use tracing::warn;

/// Storage key for the serialized session collection.
pub const SESSIONS_KEY: &str = "chat_history.json";

/// Storage key for the stringified active session identifier.
pub const ACTIVE_KEY: &str = "current_chat";

/// Order-preserving session collection with an active-session reference.
///
/// Invariant: the active id, if set, always references an existing entry.
#[derive(Debug, Clone, Default)]
pub struct SessionCollection {
    sessions: Vec<Session>,
    active_id: Option<SessionId>,
}

impl SessionCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(sessions: Vec<Session>, active_id: Option<SessionId>) -> Self {
        let mut collection = Self {
            sessions,
            active_id: None,
        };
        // Drop a stale reference rather than violate the invariant.
        if let Some(id) = active_id {
            if collection.contains(id) {
                collection.active_id = Some(id);
            } else {
                warn!(id, "Stored active session not found, clearing reference");
            }
        }
        collection
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.iter().any(|s| s.id == id)
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    pub fn insert(&mut self, session: Session) {
        self.sessions.push(session);
    }

    /// Remove a session. Returns false if the id was absent (second removal
    /// of the same id is a no-op). Clears the active reference if it pointed
    /// at the removed session.
    pub fn remove(&mut self, id: SessionId) -> bool {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.id != id);
        let removed = self.sessions.len() != before;
        if removed && self.active_id == Some(id) {
            self.active_id = None;
        }
        removed
    }

    /// Set the active session. No-op if the id is absent.
    pub fn select(&mut self, id: SessionId) -> bool {
        if self.contains(id) {
            self.active_id = Some(id);
            true
        } else {
            false
        }
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.active_id
    }

    pub fn active(&self) -> Option<&Session> {
        self.active_id.and_then(|id| self.get(id))
    }

    pub fn active_mut(&mut self) -> Option<&mut Session> {
        let id = self.active_id?;
        self.get_mut(id)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Allocate a creation-time-derived id, bumped past any existing id so
    /// two sessions created in the same millisecond stay distinguishable.
    pub fn allocate_id(&self) -> SessionId {
        let mut id = chrono::Utc::now().timestamp_millis();
        while self.contains(id) {
            id += 1;
        }
        id
    }
}

/// Durable mirror of the session collection and active id.
pub trait StateStore: Send {
    /// Read stored state. Missing or malformed state loads as empty.
    fn load(&self) -> SessionCollection;

    /// Write the full collection and active id. Failures are reported but
    /// the in-memory conversation must stay intact.
    fn save(&self, collection: &SessionCollection) -> Result<()>;
}

/// File-backed state store: one file per storage key under a state directory.
pub struct FileStateStore {
    dir: PathBuf,
}

impl FileStateStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            ParleyError::StorageError(format!(
                "Failed to create state directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(Self { dir })
    }

    fn sessions_path(&self) -> PathBuf {
        self.dir.join(SESSIONS_KEY)
    }

    fn active_path(&self) -> PathBuf {
        self.dir.join(ACTIVE_KEY)
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> SessionCollection {
        let sessions = match std::fs::read_to_string(self.sessions_path()) {
            Ok(raw) => match serde_json::from_str::<Vec<Session>>(&raw) {
                Ok(sessions) => sessions,
                Err(e) => {
                    warn!(error = %e, "Malformed session history, starting empty");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };

        let active_id = std::fs::read_to_string(self.active_path())
            .ok()
            .and_then(|raw| raw.trim().parse::<SessionId>().ok());

        SessionCollection::from_parts(sessions, active_id)
    }

    fn save(&self, collection: &SessionCollection) -> Result<()> {
        let json = serde_json::to_string(collection.sessions())
            .map_err(|e| ParleyError::StorageError(format!("Failed to serialize sessions: {}", e)))?;
        std::fs::write(self.sessions_path(), json).map_err(|e| {
            ParleyError::StorageError(format!("Failed to write session history: {}", e))
        })?;

        match collection.active_id() {
            Some(id) => std::fs::write(self.active_path(), id.to_string()).map_err(|e| {
                ParleyError::StorageError(format!("Failed to write active session: {}", e))
            })?,
            None => {
                // Removing the key mirrors "no active session".
                let _ = std::fs::remove_file(self.active_path());
            }
        }
        Ok(())
    }
}

/// In-memory state store for tests and storage-less operation.
#[derive(Default)]
pub struct MemoryStateStore {
    state: parking_lot::Mutex<(Vec<Session>, Option<SessionId>)>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> SessionCollection {
        let state = self.state.lock();
        SessionCollection::from_parts(state.0.clone(), state.1)
    }

    fn save(&self, collection: &SessionCollection) -> Result<()> {
        let mut state = self.state.lock();
        state.0 = collection.sessions().to_vec();
        state.1 = collection.active_id();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::types::Message;

    fn sample(id: SessionId, seed: &str) -> Session {
        Session::new(id, Some(seed), None)
    }

    #[test]
    fn test_select_absent_id_is_noop() {
        let mut collection = SessionCollection::new();
        collection.insert(sample(1, "a"));
        assert!(!collection.select(42));
        assert_eq!(collection.active_id(), None);
    }

    #[test]
    fn test_remove_active_clears_reference() {
        let mut collection = SessionCollection::new();
        collection.insert(sample(1, "a"));
        collection.select(1);
        assert!(collection.remove(1));
        assert_eq!(collection.active_id(), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut collection = SessionCollection::new();
        collection.insert(sample(1, "a"));
        assert!(collection.remove(1));
        assert!(!collection.remove(1));
        assert!(collection.is_empty());
    }

    #[test]
    fn test_remove_other_session_keeps_active() {
        let mut collection = SessionCollection::new();
        collection.insert(sample(1, "a"));
        collection.insert(sample(2, "b"));
        collection.select(2);
        collection.remove(1);
        assert_eq!(collection.active_id(), Some(2));
    }

    #[test]
    fn test_from_parts_drops_stale_active() {
        let collection = SessionCollection::from_parts(vec![sample(1, "a")], Some(99));
        assert_eq!(collection.active_id(), None);
    }

    #[test]
    fn test_allocate_id_distinguishes_collisions() {
        let mut collection = SessionCollection::new();
        let first = collection.allocate_id();
        collection.insert(sample(first, "a"));
        let second = collection.allocate_id();
        assert_ne!(first, second);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStateStore::new();
        let mut collection = SessionCollection::new();
        collection.insert(sample(1, "Hello"));
        collection.get_mut(1).unwrap().push(Message::assistant("Hi there"));
        collection.insert(sample(2, "Second"));
        collection.select(2);
        store.save(&collection).unwrap();

        let reloaded = store.load();
        assert_eq!(reloaded.active_id(), Some(2));
        assert_eq!(reloaded.len(), 2);
        let first = reloaded.get(1).unwrap();
        assert_eq!(first.messages.len(), 2);
        assert_eq!(first.messages[0].text, "Hello");
        assert_eq!(first.messages[1].text, "Hi there");
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path()).unwrap();
        let mut collection = SessionCollection::new();
        collection.insert(sample(10, "Hello"));
        collection.select(10);
        store.save(&collection).unwrap();

        let reloaded = store.load();
        assert_eq!(reloaded.active_id(), Some(10));
        assert_eq!(reloaded.get(10).unwrap().preview, "Hello");
    }

    #[test]
    fn test_file_store_clears_active_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path()).unwrap();
        let mut collection = SessionCollection::new();
        collection.insert(sample(10, "Hello"));
        collection.select(10);
        store.save(&collection).unwrap();

        collection.remove(10);
        store.save(&collection).unwrap();
        assert_eq!(store.load().active_id(), None);
    }

    #[test]
    fn test_file_store_missing_state_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path()).unwrap();
        let collection = store.load();
        assert!(collection.is_empty());
        assert_eq!(collection.active_id(), None);
    }

    #[test]
    fn test_file_store_malformed_state_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSIONS_KEY), "{not json").unwrap();
        std::fs::write(dir.path().join(ACTIVE_KEY), "not-a-number").unwrap();
        let store = FileStateStore::new(dir.path()).unwrap();
        let collection = store.load();
        assert!(collection.is_empty());
        assert_eq!(collection.active_id(), None);
    }
}
