//! Durable persistence for the shell's credential.
//!
//! The shell writes a single named record on every successful sign-in and
//! refresh, reads it once at startup, and deletes it on sign-out or
//! terminal refresh failure. That's the whole contract — there is no
//! schema beyond one small JSON document, so the [`CredentialStore`]
//! trait is synchronous and the file implementation just reads and writes
//! the file whole.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use cortado_protocol::Principal;

use crate::{Credential, Session, StoreError};

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// The serialized shape of the durable local record.
///
/// Field names are the storage contract (what an operator sees in the
/// record, and what older shells wrote): `user`, `access_token`,
/// `refresh_token`, `expires_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: Principal,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: u64,
}

impl SessionRecord {
    /// Rebuilds the in-memory session this record was written from.
    pub fn into_session(self) -> Session {
        Session {
            user: self.user,
            credential: Credential {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                expires_at: self.expires_at,
            },
        }
    }
}

impl From<&Session> for SessionRecord {
    fn from(session: &Session) -> Self {
        Self {
            user: session.user.clone(),
            access_token: session.credential.access_token.clone(),
            refresh_token: session.credential.refresh_token.clone(),
            expires_at: session.credential.expires_at,
        }
    }
}

// ---------------------------------------------------------------------------
// CredentialStore
// ---------------------------------------------------------------------------

/// Where the shell persists its one session record.
///
/// Implementations must tolerate `clear` on an absent record (sign-out
/// after a failed restore is normal) and treat a corrupt record as an
/// error, not a panic — the coordinator falls back to anonymous.
pub trait CredentialStore: Send + Sync + 'static {
    /// Reads the record, if one exists.
    fn load(&self) -> Result<Option<SessionRecord>, StoreError>;

    /// Writes (or overwrites) the record.
    fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;

    /// Deletes the record. Absence is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

/// A shared store is a store — callers can keep a handle to the instance
/// they hand the coordinator and inspect what got persisted.
impl<S: CredentialStore> CredentialStore for std::sync::Arc<S> {
    fn load(&self) -> Result<Option<SessionRecord>, StoreError> {
        (**self).load()
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        (**self).save(record)
    }

    fn clear(&self) -> Result<(), StoreError> {
        (**self).clear()
    }
}

// ---------------------------------------------------------------------------
// MemoryCredentialStore
// ---------------------------------------------------------------------------

/// An in-memory [`CredentialStore`] — the default for tests and for
/// embedding contexts that don't want anything on disk.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    record: Mutex<Option<SessionRecord>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with a record (simulates a previous
    /// run's persisted session).
    pub fn seeded(record: SessionRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.record.lock().expect("store mutex poisoned").clone())
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        *self.record.lock().expect("store mutex poisoned") =
            Some(record.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.record.lock().expect("store mutex poisoned") = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileCredentialStore
// ---------------------------------------------------------------------------

/// A [`CredentialStore`] backed by one JSON file on disk.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store that persists to `path`. Parent directories are
    /// created on the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path the record is stored at.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<SessionRecord>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(e) => return Err(StoreError::Read(e)),
        };
        let record =
            serde_json::from_slice(&bytes).map_err(StoreError::Corrupt)?;
        Ok(Some(record))
    }

    fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::Write)?;
        }
        let bytes = serde_json::to_vec_pretty(record)
            .map_err(StoreError::Corrupt)?;
        std::fs::write(&self.path, bytes).map_err(StoreError::Write)
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Write(e)),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SessionRecord {
        SessionRecord {
            user: Principal::new("u1", "a@b.com"),
            access_token: "t1".into(),
            refresh_token: "r1".into(),
            expires_at: 2_000,
        }
    }

    /// A scratch file path unique to this test process.
    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "cortado-store-test-{}-{name}.json",
            std::process::id()
        ))
    }

    // =====================================================================
    // SessionRecord <-> Session
    // =====================================================================

    #[test]
    fn test_record_round_trips_through_session() {
        let session = record().into_session();
        assert_eq!(session.user.id, "u1");
        assert_eq!(session.credential.access_token, "t1");
        assert_eq!(session.credential.expires_at, 2_000);

        let back = SessionRecord::from(&session);
        assert_eq!(back, record());
    }

    #[test]
    fn test_record_serialized_field_names_are_the_contract() {
        let json: serde_json::Value =
            serde_json::to_value(record()).unwrap();
        assert!(json.get("user").is_some());
        assert!(json.get("access_token").is_some());
        assert!(json.get("refresh_token").is_some());
        assert!(json.get("expires_at").is_some());
    }

    // =====================================================================
    // MemoryCredentialStore
    // =====================================================================

    #[test]
    fn test_memory_store_starts_empty() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_memory_store_save_then_load() {
        let store = MemoryCredentialStore::new();
        store.save(&record()).unwrap();
        assert_eq!(store.load().unwrap(), Some(record()));
    }

    #[test]
    fn test_memory_store_clear_removes_record() {
        let store = MemoryCredentialStore::seeded(record());
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_memory_store_clear_when_empty_is_ok() {
        let store = MemoryCredentialStore::new();
        store.clear().unwrap();
    }

    // =====================================================================
    // FileCredentialStore
    // =====================================================================

    #[test]
    fn test_file_store_load_missing_file_returns_none() {
        let store = FileCredentialStore::new(scratch_path("missing"));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_save_load_clear_lifecycle() {
        let path = scratch_path("lifecycle");
        let store = FileCredentialStore::new(&path);

        store.save(&record()).unwrap();
        assert_eq!(store.load().unwrap(), Some(record()));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_file_store_clear_missing_file_is_ok() {
        let store = FileCredentialStore::new(scratch_path("clear-missing"));
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_corrupt_record_is_an_error_not_a_panic() {
        let path = scratch_path("corrupt");
        std::fs::write(&path, b"{ not json").unwrap();
        let store = FileCredentialStore::new(&path);

        let result = store.load();
        assert!(matches!(result, Err(StoreError::Corrupt(_))));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_file_store_save_overwrites_previous_record() {
        let path = scratch_path("overwrite");
        let store = FileCredentialStore::new(&path);

        store.save(&record()).unwrap();
        let mut updated = record();
        updated.access_token = "t2".into();
        store.save(&updated).unwrap();

        assert_eq!(store.load().unwrap(), Some(updated));
        let _ = std::fs::remove_file(&path);
    }
}
