//! Session blobs persisted on behalf of the web layer.

use serde::Deserialize;

use portal_store::SharedStore;

/// Store key of the serialized session.
pub const KEY_USER_SESSION: &str = "user_session";
/// Store key of the serialized cached user profile.
pub const KEY_CACHED_USER: &str = "cached_user";

/// The fields the shell reads out of the cached-user blob. Everything else
/// in the blob is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CachedUser {
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

impl CachedUser {
    /// Parse a cached-user blob. Returns `None` for anything that is not a
    /// JSON object.
    pub fn parse(blob: &str) -> Option<Self> {
        match serde_json::from_str::<Self>(blob) {
            Ok(user) => Some(user),
            Err(e) => {
                log::debug!("cached user blob is not a profile object: {e}");
                None
            },
        }
    }

    /// Display name, if present and not blank.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Typed access to the two session keys of a [`SharedStore`].
#[derive(Debug, Clone)]
pub struct SessionCache {
    store: SharedStore,
}

impl SessionCache {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn save_session(&self, blob: &str) {
        self.store.put_string(KEY_USER_SESSION, blob);
    }

    /// Stored session, or `""`.
    pub fn session(&self) -> String {
        self.store.get_string(KEY_USER_SESSION)
    }

    pub fn save_cached_user(&self, blob: &str) {
        self.store.put_string(KEY_CACHED_USER, blob);
    }

    /// Stored cached-user blob, or `""`.
    pub fn cached_user(&self) -> String {
        self.store.get_string(KEY_CACHED_USER)
    }

    /// Whether a non-empty cached-user blob exists.
    pub fn has_cached_user(&self) -> bool {
        !self.cached_user().is_empty()
    }

    /// Parsed cached user, if the blob is a profile object.
    pub fn cached_profile(&self) -> Option<CachedUser> {
        let blob = self.cached_user();
        if blob.is_empty() {
            return None;
        }
        CachedUser::parse(&blob)
    }

    /// Full logout: wipes the whole store, not only the session keys.
    pub fn clear(&self) {
        log::info!("Clearing all locally stored session data");
        self.store.clear();
    }
}
