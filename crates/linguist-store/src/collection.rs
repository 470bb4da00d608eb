use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};
use crate::observable::{ObservableStore, StoreValue};
use crate::traits::KeyValueBackend;

/// Identifier of a record inside one [`Collection`]. Never reused.
pub type RecordId = u64;

/// A stored record together with its id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record<R> {
    pub id: RecordId,
    pub data: R,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollectionData<R> {
    next_id: RecordId,
    records: BTreeMap<RecordId, R>,
}

impl<R> Default for CollectionData<R> {
    fn default() -> Self {
        Self {
            next_id: 1,
            records: BTreeMap::new(),
        }
    }
}

/// Persisted set of records under a single backend key, with
/// auto-incremented ids.
///
/// Every mutation is a read-modify-write through the underlying
/// [`ObservableStore`], so concurrent mutations are serialized.
pub struct Collection<R> {
    name: String,
    store: ObservableStore<CollectionData<R>>,
}

impl<R: StoreValue> Collection<R> {
    /// Collection persisted under `name`.
    pub fn new(backend: Arc<dyn KeyValueBackend>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            store: ObservableStore::new(backend, name.clone(), CollectionData::default()),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a record and return its new id.
    pub async fn add(&self, data: R) -> StoreResult<RecordId> {
        let committed = self
            .store
            .update(move |mut col| {
                let id = col.next_id;
                col.next_id += 1;
                col.records.insert(id, data);
                col
            })
            .await?;
        Ok(committed.next_id - 1)
    }

    /// Record `id`, if present.
    pub async fn get(&self, id: RecordId) -> StoreResult<Option<R>> {
        Ok(self.store.get().await?.records.remove(&id))
    }

    /// Replace an existing record.
    pub async fn update(&self, id: RecordId, data: R) -> StoreResult<()> {
        let collection = self.name.clone();
        self.store
            .try_update(move |mut col| match col.records.get_mut(&id) {
                Some(slot) => {
                    *slot = data;
                    Ok(col)
                }
                None => Err(StoreError::RecordNotFound { collection, id }),
            })
            .await?
            .map(|_| ())
    }

    /// Remove a record. Returns `true` if it existed.
    pub async fn delete(&self, id: RecordId) -> StoreResult<bool> {
        let removed = self
            .store
            .try_update(move |mut col| match col.records.remove(&id) {
                Some(_) => Ok(col),
                None => Err(()),
            })
            .await?;
        Ok(removed.is_ok())
    }

    /// All records, ordered by id.
    pub async fn list(&self) -> StoreResult<Vec<Record<R>>> {
        Ok(self
            .store
            .get()
            .await?
            .records
            .into_iter()
            .map(|(id, data)| Record { id, data })
            .collect())
    }

    /// Records matching `predicate`, ordered by id.
    pub async fn find<P>(&self, predicate: P) -> StoreResult<Vec<Record<R>>>
    where
        P: Fn(&R) -> bool,
    {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|record| predicate(&record.data))
            .collect())
    }

    /// Remove every record. Ids keep increasing afterwards.
    pub async fn clear(&self) -> StoreResult<()> {
        self.store
            .update(|mut col| {
                col.records.clear();
                col
            })
            .await
            .map(|_| ())
    }

    /// Drop the oldest records until at most `limit` remain.
    pub async fn truncate_oldest(&self, limit: usize) -> StoreResult<usize> {
        let mut dropped = 0;
        self.store
            .update(|mut col| {
                while col.records.len() > limit {
                    col.records.pop_first();
                    dropped += 1;
                }
                col
            })
            .await?;
        Ok(dropped)
    }

    /// Number of stored records.
    pub async fn len(&self) -> StoreResult<usize> {
        Ok(self.store.get().await?.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryBackend;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Entry {
        text: String,
    }

    fn entry(text: &str) -> Entry {
        Entry { text: text.into() }
    }

    fn collection() -> Collection<Entry> {
        Collection::new(Arc::new(InMemoryBackend::new()), "entries")
    }

    #[tokio::test]
    async fn ids_increment_and_are_not_reused() {
        let col = collection();
        let a = col.add(entry("a")).await.unwrap();
        let b = col.add(entry("b")).await.unwrap();
        assert_eq!((a, b), (1, 2));
        assert!(col.delete(b).await.unwrap());
        let c = col.add(entry("c")).await.unwrap();
        assert_eq!(c, 3);
    }

    #[tokio::test]
    async fn update_missing_record_fails() {
        let col = collection();
        let err = col.update(7, entry("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::RecordNotFound { id: 7, .. }));
    }

    #[tokio::test]
    async fn update_replaces_record() {
        let col = collection();
        let id = col.add(entry("old")).await.unwrap();
        col.update(id, entry("new")).await.unwrap();
        assert_eq!(col.get(id).await.unwrap(), Some(entry("new")));
    }

    #[tokio::test]
    async fn delete_missing_is_false() {
        let col = collection();
        assert!(!col.delete(1).await.unwrap());
    }

    #[tokio::test]
    async fn find_and_clear() {
        let col = collection();
        col.add(entry("hello")).await.unwrap();
        col.add(entry("world")).await.unwrap();
        let hits = col.find(|e| e.text.starts_with('w')).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].data, entry("world"));

        col.clear().await.unwrap();
        assert_eq!(col.len().await.unwrap(), 0);
        assert_eq!(col.add(entry("again")).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn truncate_keeps_newest() {
        let col = collection();
        for t in ["a", "b", "c", "d"] {
            col.add(entry(t)).await.unwrap();
        }
        assert_eq!(col.truncate_oldest(2).await.unwrap(), 2);
        let left: Vec<String> = col.list().await.unwrap().into_iter().map(|r| r.data.text).collect();
        assert_eq!(left, vec!["c", "d"]);
    }
}
