//! Durable client-side storage for the persisted session record.
//!
//! The record is three independent keys: `accessToken`, `refreshToken` and
//! `user` (the serialized identity). All three must be present and parseable
//! for the record to count; a partial record is treated as entirely absent.
//! The session manager is the only writer; consumers read only through the
//! manager's in-memory state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::identity::{Credential, Identity, Session};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_KEY: &str = "user";

/// Key/value storage surviving process restarts. Writes are best-effort by
/// contract: failures are logged, never surfaced to callers.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// File-backed store: one file per key under a root directory.
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at the given directory, creating it if needed.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).ok();
        FileSessionStore { root }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = std::fs::write(self.path_for(key), value) {
            warn!(target: "registra::session", "store write failed: key={} err={}", key, e);
        }
    }

    fn remove(&self, key: &str) {
        let path = self.path_for(key);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(target: "registra::session", "store remove failed: key={} err={}", key, e);
            }
        }
    }
}

/// In-memory store used by tests and ephemeral sessions.
#[derive(Default)]
pub struct MemorySessionStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.map.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.map.lock().remove(key);
    }
}

/// Reconstruct a session from the persisted record. Any missing key or an
/// unparseable identity invalidates the whole record.
pub fn load_record(store: &dyn SessionStore) -> Option<Session> {
    let access_token = store.get(ACCESS_TOKEN_KEY)?;
    let refresh_token = store.get(REFRESH_TOKEN_KEY)?;
    let user = store.get(USER_KEY)?;
    match serde_json::from_str::<Identity>(&user) {
        Ok(identity) => Some(Session {
            credential: Credential { access_token, refresh_token },
            identity,
        }),
        Err(e) => {
            debug!(target: "registra::session", "persisted identity unparseable, record ignored: {}", e);
            None
        }
    }
}

/// Overwrite all three record keys from the session.
pub fn save_record(store: &dyn SessionStore, session: &Session) {
    store.set(ACCESS_TOKEN_KEY, &session.credential.access_token);
    store.set(REFRESH_TOKEN_KEY, &session.credential.refresh_token);
    match serde_json::to_string(&session.identity) {
        Ok(user) => store.set(USER_KEY, &user),
        Err(e) => warn!(target: "registra::session", "identity serialization failed: {}", e),
    }
}

/// Delete all three record keys.
pub fn clear_record(store: &dyn SessionStore) {
    store.remove(ACCESS_TOKEN_KEY);
    store.remove(REFRESH_TOKEN_KEY);
    store.remove(USER_KEY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::identity::Role;

    fn sample_session() -> Session {
        Session {
            credential: Credential { access_token: "A1".into(), refresh_token: "R1".into() },
            identity: Identity { username: "alice".into(), email: "a@x.com".into(), role: Role::User },
        }
    }

    #[test]
    fn file_store_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(tmp.path().join("session"));
        save_record(&store, &sample_session());
        let loaded = load_record(&store).expect("record should load");
        assert_eq!(loaded, sample_session());
    }

    #[test]
    fn missing_any_key_invalidates_record() {
        for missing in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY] {
            let store = MemorySessionStore::new();
            save_record(&store, &sample_session());
            store.remove(missing);
            assert!(load_record(&store).is_none(), "record must be absent without {}", missing);
        }
    }

    #[test]
    fn unparseable_identity_invalidates_record() {
        let store = MemorySessionStore::new();
        save_record(&store, &sample_session());
        store.set(USER_KEY, "{not json");
        assert!(load_record(&store).is_none());
    }

    #[test]
    fn clear_removes_all_keys() {
        let store = MemorySessionStore::new();
        save_record(&store, &sample_session());
        clear_record(&store);
        assert!(store.get(ACCESS_TOKEN_KEY).is_none());
        assert!(store.get(REFRESH_TOKEN_KEY).is_none());
        assert!(store.get(USER_KEY).is_none());
        assert!(load_record(&store).is_none());
    }
}
