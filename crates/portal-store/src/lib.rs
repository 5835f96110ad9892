//! Key-value storage for session blobs handed to and from the web layer.
//!
//! Values are opaque strings. [`KeyValueStore`] is the storage backend
//! abstraction; [`SharedStore`] is the thread-safe handle the controller and
//! the script-thread bridge share.

mod file;
mod memory;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use portal_types::error::Result;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Abstraction over a process-wide string key-value store.
pub trait KeyValueStore: Send {
    /// Read a value, or `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a value.
    fn put(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a single key. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Remove every key.
    fn clear(&mut self) -> Result<()>;

    /// All stored keys, sorted.
    fn keys(&self) -> Result<Vec<String>>;
}

/// Cloneable handle to a store shared between threads.
///
/// Reads never fail from the caller's point of view: a missing key or a
/// backend error both read as the empty string. Writes are fire-and-forget
/// and only log failures.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<Box<dyn KeyValueStore>>>,
}

impl SharedStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(store))),
        }
    }

    /// A shared in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn KeyValueStore>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read `key`, returning `""` when absent.
    pub fn get_string(&self, key: &str) -> String {
        match self.lock().get(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                log::warn!("store read of {key:?} failed: {e}");
                String::new()
            },
        }
    }

    pub fn put_string(&self, key: &str, value: &str) {
        if let Err(e) = self.lock().put(key, value) {
            log::warn!("store write of {key:?} failed: {e}");
        }
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.lock().remove(key) {
            log::warn!("store remove of {key:?} failed: {e}");
        }
    }

    /// Wipe the whole store, not just known keys.
    pub fn clear(&self) {
        if let Err(e) = self.lock().clear() {
            log::warn!("store clear failed: {e}");
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().unwrap_or_else(|e| {
            log::warn!("store key listing failed: {e}");
            Vec::new()
        })
    }
}

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore")
            .field("keys", &self.keys().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use portal_types::error::PortalError;

    /// Backend that fails every operation.
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(PortalError::Storage("disk on fire".into()))
        }
        fn put(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(PortalError::Storage("disk on fire".into()))
        }
        fn remove(&mut self, _key: &str) -> Result<()> {
            Err(PortalError::Storage("disk on fire".into()))
        }
        fn clear(&mut self) -> Result<()> {
            Err(PortalError::Storage("disk on fire".into()))
        }
        fn keys(&self) -> Result<Vec<String>> {
            Err(PortalError::Storage("disk on fire".into()))
        }
    }

    #[test]
    fn missing_key_reads_empty() {
        let store = SharedStore::in_memory();
        assert_eq!(store.get_string("user_session"), "");
    }

    #[test]
    fn clones_share_state() {
        let a = SharedStore::in_memory();
        let b = a.clone();
        a.put_string("k", "v");
        assert_eq!(b.get_string("k"), "v");
    }

    #[test]
    fn shared_across_threads() {
        let store = SharedStore::in_memory();
        let writer = store.clone();
        std::thread::spawn(move || writer.put_string("cached_user", "{}"))
            .join()
            .unwrap();
        assert_eq!(store.get_string("cached_user"), "{}");
    }

    #[test]
    fn clear_wipes_unknown_keys_too() {
        let store = SharedStore::in_memory();
        store.put_string("user_session", "s");
        store.put_string("cached_user", "u");
        store.put_string("something_else", "x");
        store.clear();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn backend_errors_are_swallowed() {
        let store = SharedStore::new(BrokenStore);
        store.put_string("k", "v");
        store.remove("k");
        store.clear();
        assert_eq!(store.get_string("k"), "");
        assert!(store.keys().is_empty());
    }
}
