//! Collection store — the only durable record of the jar.
//!
//! Three collection keys plus the onboarding flag, all JSON strings in a
//! key-value backend (`localStorage` in the browser, an in-memory map
//! elsewhere). Reads never fail toward the caller: missing or corrupted
//! values load as empty. Writes are logged on failure and otherwise ignored,
//! so the UI keeps working when storage is full or disabled.
//!
//! ## Layout
//!
//! ```text
//! {ns}:jarStars             [{"id","src","x","y","compliment"}, …]
//! {ns}:unlockedCompliments  ["text", …]   (insertion order, no duplicates)
//! {ns}:version              "1"
//! {ns}:introDismissed       "1" when the onboarding deck was dismissed
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::StorageKeys;
use crate::error::StorageError;
use crate::jar::ActiveItem;

/// A string key-value backend.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory backend. Clones share the same map, which is how two tabs on
/// one origin see each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full copy of the contents, for comparing before/after a mutation.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.data.borrow().clone()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.data.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.data
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.data.borrow_mut().remove(key);
        Ok(())
    }
}

/// `window.localStorage`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct BrowserStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl BrowserStorage {
    pub fn open() -> Result<Self, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".to_string()))?;
        Ok(Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage
            .get_item(key)
            .map_err(|e| StorageError::ReadFailed {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| StorageError::WriteRejected {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.storage
            .remove_item(key)
            .map_err(|e| StorageError::WriteRejected {
                key: key.to_string(),
                reason: format!("{:?}", e),
            })
    }
}

/// Compliment texts revealed at least once. Grows by union; only a full
/// reset empties it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnlockedSet(Vec<String>);

impl UnlockedSet {
    /// Insert keeping first-seen order. Returns false if already present.
    pub fn insert(&mut self, text: &str) -> bool {
        if self.contains(text) {
            return false;
        }
        self.0.push(text.to_string());
        true
    }

    pub fn contains(&self, text: &str) -> bool {
        self.0.iter().any(|t| t == text)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for UnlockedSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = UnlockedSet::default();
        for s in iter {
            let s = s.into();
            set.insert(&s);
        }
        set
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub items: Vec<ActiveItem>,
    pub unlocked: UnlockedSet,
}

#[derive(Clone)]
pub struct CollectionStore {
    keys: StorageKeys,
    storage_version: String,
    backend: Rc<dyn KeyValueStore>,
}

impl CollectionStore {
    pub fn new(keys: StorageKeys, storage_version: &str, backend: Rc<dyn KeyValueStore>) -> Self {
        Self {
            keys,
            storage_version: storage_version.to_string(),
            backend,
        }
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    /// Read both collections. Also stamps the schema version if it differs
    /// (there is nothing to migrate yet).
    pub fn load(&self) -> PersistedState {
        self.ensure_version();
        PersistedState {
            items: self.load_items(),
            unlocked: self.load_unlocked(),
        }
    }

    pub fn load_items(&self) -> Vec<ActiveItem> {
        self.read_json(&self.keys.stars)
    }

    pub fn load_unlocked(&self) -> UnlockedSet {
        self.read_json(&self.keys.unlocked)
    }

    pub fn save(&self, state: &PersistedState) {
        self.save_items(&state.items);
        self.save_unlocked(&state.unlocked);
    }

    pub fn save_items(&self, items: &[ActiveItem]) {
        self.write_json(&self.keys.stars, items);
    }

    pub fn save_unlocked(&self, unlocked: &UnlockedSet) {
        self.write_json(&self.keys.unlocked, unlocked);
    }

    /// Drop the jar, the collection and the onboarding flag. The version
    /// key survives; the next load rewrites it anyway.
    pub fn clear(&self) {
        for key in [&self.keys.stars, &self.keys.unlocked, &self.keys.intro] {
            if let Err(e) = self.backend.remove(key) {
                warn!(key = key.as_str(), error = %e, "failed to clear key");
            }
        }
    }

    pub fn intro_dismissed(&self) -> bool {
        matches!(self.backend.get(&self.keys.intro), Ok(Some(v)) if v == "1")
    }

    pub fn dismiss_intro(&self) {
        if let Err(e) = self.backend.set(&self.keys.intro, "1") {
            warn!(error = %e, "failed to save intro flag");
        }
    }

    fn ensure_version(&self) {
        match self.backend.get(&self.keys.version) {
            Ok(Some(v)) if v == self.storage_version => {}
            Ok(_) => {
                if let Err(e) = self.backend.set(&self.keys.version, &self.storage_version) {
                    warn!(error = %e, "failed to stamp storage version");
                }
            }
            Err(e) => warn!(error = %e, "failed to read storage version"),
        }
    }

    fn read_json<T: for<'de> Deserialize<'de> + Default>(&self, key: &str) -> T {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(e) => {
                warn!(key, error = %e, "storage read failed, treating as empty");
                return T::default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(key, error = %e, "corrupted value in storage, treating as empty");
            T::default()
        })
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(StorageError::from)
            .and_then(|json| self.backend.set(key, &json));
        if let Err(e) = result {
            warn!(key, error = %e, "failed to save");
        }
    }
}
