//! Schema registration against the store.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument};

use crate::errors::StoreError;
use crate::interfaces::SearchStore;
use crate::schema::cache::PropertyCache;
use crate::schema::property::PropertySet;

/// Keeps the property cache in step with the store mappings.
///
/// New properties are registered under a per-field lock, so concurrent
/// batches that discover the same field submit it to the store only once.
pub struct SchemaRegistry {
    store: Arc<dyn SearchStore>,
    cache: PropertyCache,
    field_locks: DashMap<(String, String), Arc<Mutex<()>>>,
}

impl SchemaRegistry {
    pub fn new(store: Arc<dyn SearchStore>) -> Self {
        Self {
            store,
            cache: PropertyCache::new(),
            field_locks: DashMap::new(),
        }
    }

    /// Known properties of `alias`.
    ///
    /// Loaded from the store on first use; an alias without an index has an
    /// empty set.
    #[instrument(skip(self))]
    pub async fn get_mapping(&self, alias: &str) -> Result<Arc<PropertySet>, StoreError> {
        if let Some(cached) = self.cache.get(alias) {
            return Ok(cached);
        }

        let loaded = Arc::new(self.load_mapping(alias).await?);
        if self.cache.compare_and_set(alias, None, Arc::clone(&loaded)) {
            debug!(alias = %alias, properties = loaded.len(), "Loaded mapping");
            return Ok(loaded);
        }

        // A concurrent registration won the race; its entry is at least as new.
        Ok(self.cache.get(alias).unwrap_or(loaded))
    }

    /// Register `properties` under `alias`.
    ///
    /// Properties already in the store mapping are left as they are; the
    /// rest are submitted in one put-mapping request. The index is then
    /// refreshed and the cache entry extended.
    #[instrument(skip(self, properties), fields(count = properties.len()))]
    pub async fn apply_new_properties(
        &self,
        alias: &str,
        properties: &PropertySet,
    ) -> Result<(), StoreError> {
        if properties.is_empty() {
            return Ok(());
        }

        let _guards = self.lock_fields(alias, properties).await;

        let current = self.load_mapping(alias).await?;
        let fresh = current.missing_from(properties);
        if !fresh.is_empty() {
            self.store.put_mapping(alias, &fresh).await?;
            debug!(alias = %alias, added = fresh.len(), "Put new properties");
        }
        self.store.refresh(alias).await?;

        loop {
            let cached = self.cache.get(alias);
            let mut merged = cached.as_deref().cloned().unwrap_or_default();
            merged.merge_missing(&current);
            merged.merge_missing(properties);
            if self
                .cache
                .compare_and_set(alias, cached.as_ref(), Arc::new(merged))
            {
                return Ok(());
            }
        }
    }

    /// Drop the cached mapping of `alias` and its idle field locks.
    pub fn invalidate(&self, alias: &str) {
        self.cache.invalidate(alias);
        // A lock still shared with a guard or waiter stays until released.
        self.field_locks.retain(|(locked_alias, _), lock| {
            locked_alias != alias || Arc::strong_count(lock) > 1
        });
    }

    async fn load_mapping(&self, alias: &str) -> Result<PropertySet, StoreError> {
        if !self.store.index_exists(alias).await? {
            return Ok(PropertySet::new());
        }
        Ok(self.store.get_mapping(alias).await?.unwrap_or_default())
    }

    /// Lock every field of `properties`, in name order.
    async fn lock_fields(
        &self,
        alias: &str,
        properties: &PropertySet,
    ) -> Vec<OwnedMutexGuard<()>> {
        let mut guards = Vec::with_capacity(properties.len());
        for name in properties.names() {
            let lock = self
                .field_locks
                .entry((alias.to_string(), name.to_string()))
                .or_default()
                .clone();
            guards.push(lock.lock_owned().await);
        }
        guards
    }
}
