//! Process-wide mapping cache.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::schema::property::PropertySet;

/// Known properties per alias.
///
/// Entries are immutable snapshots: writers replace an entry with
/// [`compare_and_set`](Self::compare_and_set), so a reader holding an `Arc`
/// never observes a half-merged set. The map is sharded; aliases in
/// different shards never contend.
#[derive(Debug, Default)]
pub struct PropertyCache {
    entries: DashMap<String, Arc<PropertySet>>,
}

impl PropertyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, alias: &str) -> Option<Arc<PropertySet>> {
        self.entries.get(alias).map(|entry| Arc::clone(entry.value()))
    }

    /// Replace the entry for `alias` with `new` if it is still `expected`.
    ///
    /// `expected` of `None` means the alias must have no entry. Snapshots
    /// are compared by identity.
    pub fn compare_and_set(
        &self,
        alias: &str,
        expected: Option<&Arc<PropertySet>>,
        new: Arc<PropertySet>,
    ) -> bool {
        match (self.entries.entry(alias.to_string()), expected) {
            (Entry::Occupied(mut entry), Some(expected)) if Arc::ptr_eq(entry.get(), expected) => {
                entry.insert(new);
                true
            }
            (Entry::Vacant(entry), None) => {
                entry.insert(new);
                true
            }
            _ => false,
        }
    }

    /// Unconditionally replace the entry for `alias`.
    pub fn insert(&self, alias: &str, properties: Arc<PropertySet>) {
        self.entries.insert(alias.to_string(), properties);
    }

    pub fn invalidate(&self, alias: &str) {
        self.entries.remove(alias);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::property::Property;

    fn set_of(names: &[&str]) -> Arc<PropertySet> {
        Arc::new(
            names
                .iter()
                .map(|name| (name.to_string(), Property::keyword()))
                .collect(),
        )
    }

    #[test]
    fn test_compare_and_set_on_empty() {
        let cache = PropertyCache::new();
        let other = set_of(&["a"]);

        assert!(!cache.compare_and_set("alias", Some(&other), set_of(&["b"])));
        assert!(cache.compare_and_set("alias", None, set_of(&["a"])));
        assert!(!cache.compare_and_set("alias", None, set_of(&["c"])));
        assert!(cache.get("alias").unwrap().contains("a"));
    }

    #[test]
    fn test_compare_and_set_requires_same_snapshot() {
        let cache = PropertyCache::new();
        cache.insert("alias", set_of(&["a"]));

        let current = cache.get("alias").unwrap();
        let stale = set_of(&["a"]);

        assert!(!cache.compare_and_set("alias", Some(&stale), set_of(&["x"])));
        assert!(cache.compare_and_set("alias", Some(&current), set_of(&["a", "b"])));
        assert_eq!(cache.get("alias").unwrap().len(), 2);
    }

    #[test]
    fn test_invalidate() {
        let cache = PropertyCache::new();
        cache.insert("alias", set_of(&["a"]));
        cache.invalidate("alias");
        cache.invalidate("missing");

        assert!(cache.get("alias").is_none());
        assert!(cache.is_empty());
    }
}
