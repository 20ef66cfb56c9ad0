//! Request-scoped invocation cache.
//!
//! Values are keyed by `(namespace, key)` and stored type-erased; reads are
//! typed and return `None` on a type mismatch.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type CacheKey = (String, String);

/// Typed key/value store owned by one logical execution.
#[derive(Default)]
pub struct InvokeCache {
    entries: HashMap<CacheKey, Arc<dyn Any + Send + Sync>>,
}

impl InvokeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `(namespace, key)`, replacing any previous value.
    pub fn put<T>(&mut self, namespace: &str, key: &str, value: T)
    where
        T: Any + Send + Sync,
    {
        self.entries
            .insert((namespace.to_string(), key.to_string()), Arc::new(value));
    }

    /// Store an already shared value; readers get the same `Arc` back.
    pub fn put_shared<T>(&mut self, namespace: &str, key: &str, value: Arc<T>)
    where
        T: Any + Send + Sync,
    {
        self.entries
            .insert((namespace.to_string(), key.to_string()), value);
    }

    /// Typed read.
    pub fn get<T>(&self, namespace: &str, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let value = self
            .entries
            .get(&(namespace.to_string(), key.to_string()))?
            .clone();
        value.downcast::<T>().ok()
    }

    /// Typed read, computing and storing the value on a miss.
    pub fn get_or_insert_with<T, F>(&mut self, namespace: &str, key: &str, init: F) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let value = self
            .entries
            .entry((namespace.to_string(), key.to_string()))
            .or_insert_with(|| Arc::new(init()) as Arc<dyn Any + Send + Sync>)
            .clone();
        value.downcast::<T>().ok()
    }

    /// Remove an entry; returns whether it existed.
    pub fn remove(&mut self, namespace: &str, key: &str) -> bool {
        self.entries
            .remove(&(namespace.to_string(), key.to_string()))
            .is_some()
    }

    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.entries
            .contains_key(&(namespace.to_string(), key.to_string()))
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for InvokeCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .entries
            .keys()
            .map(|(ns, key)| format!("{}/{}", ns, key))
            .collect();
        keys.sort();
        f.debug_struct("InvokeCache").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_typed_get() {
        let mut cache = InvokeCache::new();
        cache.put("price", "sku-1", 42_u64);

        assert_eq!(cache.get::<u64>("price", "sku-1").as_deref(), Some(&42));
        assert!(cache.get::<String>("price", "sku-1").is_none());
        assert!(cache.get::<u64>("price", "sku-2").is_none());
    }

    #[test]
    fn test_get_or_insert_with_only_initialises_once() {
        let mut cache = InvokeCache::new();
        let first = cache.get_or_insert_with("stock", "sku-1", || 7_i32);
        let second = cache.get_or_insert_with("stock", "sku-1", || 9_i32);
        assert_eq!(first.as_deref(), Some(&7));
        assert_eq!(second.as_deref(), Some(&7));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cache = InvokeCache::new();
        cache.put("a", "1", "x".to_string());
        cache.put("a", "2", "y".to_string());
        assert!(cache.remove("a", "1"));
        assert!(!cache.remove("a", "1"));
        assert!(cache.contains("a", "2"));

        cache.clear();
        assert!(cache.is_empty());
    }
}
