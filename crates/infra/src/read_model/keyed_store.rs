use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReadModelError {
    #[error("{0}")]
    Unavailable(String),
}

/// Key/value store for read models that can be rebuilt from the event stream.
pub trait KeyedStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn upsert(&self, key: K, value: V) -> Result<(), ReadModelError>;
    fn list(&self) -> Vec<V>;
    /// Drop every record (rebuild support).
    fn clear(&self);
}

impl<K, V, S> KeyedStore<K, V> for Arc<S>
where
    S: KeyedStore<K, V> + ?Sized,
{
    fn get(&self, key: &K) -> Option<V> {
        (**self).get(key)
    }

    fn upsert(&self, key: K, value: V) -> Result<(), ReadModelError> {
        (**self).upsert(key, value)
    }

    fn list(&self) -> Vec<V> {
        (**self).list()
    }

    fn clear(&self) {
        (**self).clear()
    }
}

#[derive(Debug)]
pub struct InMemoryKeyedStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
}

impl<K, V> InMemoryKeyedStore<K, V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Default for InMemoryKeyedStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> KeyedStore<K, V> for InMemoryKeyedStore<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(key).cloned()
    }

    fn upsert(&self, key: K, value: V) -> Result<(), ReadModelError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| ReadModelError::Unavailable("read model lock poisoned".to_string()))?;
        map.insert(key, value);
        Ok(())
    }

    fn list(&self) -> Vec<V> {
        match self.inner.read() {
            Ok(map) => map.values().cloned().collect(),
            Err(_) => vec![],
        }
    }

    fn clear(&self) {
        if let Ok(mut map) = self.inner.write() {
            map.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn upsert_then_get_and_list() {
        let store = InMemoryKeyedStore::new();
        store.upsert("a", 1).unwrap();
        store.upsert("a", 2).unwrap();
        assert_eq!(store.get(&"a"), Some(2));
        assert_eq!(store.list(), vec![2]);
        store.clear();
        assert!(store.get(&"a").is_none());
    }

    #[test]
    fn poisoned_store_rejects_writes() {
        let store = Arc::new(InMemoryKeyedStore::<u32, u32>::new());
        let poisoner = Arc::clone(&store);
        let _ = thread::spawn(move || {
            let _guard = poisoner.inner.write().unwrap();
            panic!("writer died holding the store lock");
        })
        .join();

        assert!(matches!(store.upsert(1, 1), Err(ReadModelError::Unavailable(_))));
    }
}
