//! In-memory template store.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use huella_core::Template;

/// Keyed in-memory store of fingerprint templates.
///
/// Templates live only as long as the process; persistence is deliberately
/// out of scope. Inserting under an existing id replaces the previous
/// template. The store has its own lock and is never touched through the
/// operation gate, so listing and deleting templates works even while a
/// slow capture holds the device.
///
/// # Examples
///
/// ```
/// use huella_core::Template;
/// use huella_session::TemplateStore;
///
/// let store = TemplateStore::new();
/// store.insert("user-1", Template::zeroed());
/// assert!(store.contains("user-1"));
/// assert_eq!(store.ids(), vec!["user-1".to_string()]);
///
/// assert!(store.remove("user-1"));
/// assert!(!store.remove("user-1"));
/// ```
#[derive(Debug, Default)]
pub struct TemplateStore {
    inner: RwLock<HashMap<String, Template>>,
}

impl TemplateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Template>> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Template>> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Store a template under `id`, replacing any previous one.
    pub fn insert(&self, id: &str, template: Template) {
        self.write().insert(id.to_string(), template);
    }

    /// The template stored under `id`, if any.
    pub fn get(&self, id: &str) -> Option<Template> {
        self.read().get(id).cloned()
    }

    /// Remove the template under `id`. Returns whether one existed.
    pub fn remove(&self, id: &str) -> bool {
        self.write().remove(id).is_some()
    }

    /// Whether a template is stored under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// All stored ids, sorted for stable listings.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of stored templates.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_existing() {
        let store = TemplateStore::new();
        let first = Template::zeroed();
        let second = Template::from_bytes(&[1u8; Template::size()]).unwrap();

        store.insert("user-1", first);
        store.insert("user-1", second.clone());

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("user-1"), Some(second));
    }

    #[test]
    fn test_remove_reports_existence() {
        let store = TemplateStore::new();
        store.insert("user-1", Template::zeroed());

        assert!(store.remove("user-1"));
        assert!(!store.remove("user-1"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_ids_sorted() {
        let store = TemplateStore::new();
        store.insert("zeta", Template::zeroed());
        store.insert("alfa", Template::zeroed());
        store.insert("beta", Template::zeroed());

        assert_eq!(store.ids(), vec!["alfa", "beta", "zeta"]);
    }

    #[test]
    fn test_get_missing_is_none() {
        let store = TemplateStore::new();
        assert_eq!(store.get("nobody"), None);
        assert!(!store.contains("nobody"));
    }
}
