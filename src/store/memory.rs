use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Collection, Record, RecordId, RecordStore};
use crate::error::Result;

/// In-memory record store.
///
/// Records are kept in insertion order. Reads return owned snapshots, and
/// mutations locate their target by identifier under the write lock, so
/// overlapping deletes never shift another operation onto the wrong record.
/// Identifiers are not reused after a delete. Clones share the same collection.
#[derive(Debug)]
pub struct MemoryStore<R> {
    state: Arc<RwLock<Collection<R>>>,
    latency: Duration,
}

impl<R> Clone for MemoryStore<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            latency: self.latency,
        }
    }
}

impl<R: Record> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Record> MemoryStore<R> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Seed the store with existing records (identifiers are kept as given).
    pub fn with_records(records: Vec<R>) -> Self {
        Self {
            state: Arc::new(RwLock::new(Collection::new(records, 1))),
            latency: Duration::ZERO,
        }
    }

    /// Delay every operation, the way a remote backend would.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.records.is_empty()
    }

    async fn pause(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryStore<R> {
    async fn get_all(&self) -> Result<Vec<R>> {
        self.pause().await;
        Ok(self.state.read().await.records.clone())
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<R>> {
        self.pause().await;
        let state = self.state.read().await;
        Ok(state.records.iter().find(|record| record.id() == id).cloned())
    }

    async fn create(&self, draft: R::Draft) -> Result<R> {
        self.pause().await;
        let mut state = self.state.write().await;
        let id = state.allocate_id()?;
        let record = R::from_draft(id, draft);
        state.records.push(record.clone());
        tracing::debug!(kind = R::KIND, id, "record created");
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: R::Patch) -> Result<Option<R>> {
        self.pause().await;
        let mut state = self.state.write().await;
        let Some(record) = state.records.iter_mut().find(|record| record.id() == id) else {
            tracing::debug!(kind = R::KIND, id, "update target missing");
            return Ok(None);
        };
        record.apply_patch(patch);
        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        self.pause().await;
        let mut state = self.state.write().await;
        match state.position(id) {
            Some(index) => {
                state.records.remove(index);
                tracing::debug!(kind = R::KIND, id, "record deleted");
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: RecordId,
        text: String,
    }

    impl Record for Note {
        type Draft = String;
        type Patch = String;
        const KIND: &'static str = "Note";

        fn id(&self) -> RecordId {
            self.id
        }

        fn from_draft(id: RecordId, draft: String) -> Self {
            Note { id, text: draft }
        }

        fn apply_patch(&mut self, patch: String) {
            self.text = patch;
        }
    }

    #[tokio::test]
    async fn create_assigns_max_plus_one() {
        let store = MemoryStore::with_records(vec![
            Note { id: 4, text: "a".to_string() },
            Note { id: 2, text: "b".to_string() },
        ]);
        let created = store.create("c".to_string()).await.expect("create");
        assert_eq!(created.id, 5);

        let empty = MemoryStore::<Note>::new();
        let first = empty.create("x".to_string()).await.expect("create");
        assert_eq!(first.id, 1);
    }

    #[tokio::test]
    async fn deleted_identifiers_are_not_reissued() {
        let store = MemoryStore::<Note>::new();
        store.create("a".to_string()).await.expect("create");
        let second = store.create("b".to_string()).await.expect("create");
        assert!(store.delete(second.id).await.expect("delete"));

        let third = store.create("c".to_string()).await.expect("create");
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn snapshots_are_detached() {
        let store = MemoryStore::with_records(vec![Note { id: 1, text: "a".to_string() }]);
        let mut snapshot = store.get_all().await.expect("get_all");
        snapshot[0].text = "changed".to_string();
        snapshot.clear();

        let stored = store.get_by_id(1).await.expect("get").expect("present");
        assert_eq!(stored.text, "a");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn missing_ids_report_absent() {
        let store = MemoryStore::<Note>::new();
        assert!(store.update(9, "x".to_string()).await.expect("update").is_none());
        assert!(!store.delete(9).await.expect("delete"));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn concurrent_deletes_target_by_id() {
        let store = MemoryStore::with_records(
            (1..=20)
                .map(|id| Note { id, text: format!("n{id}") })
                .collect(),
        )
        .with_latency(Duration::from_millis(1));

        let mut handles = Vec::new();
        for id in (1..=20).filter(|id| id % 2 == 0) {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.delete(id).await }));
        }
        for handle in handles {
            assert!(handle.await.expect("join").expect("delete"));
        }

        let remaining: Vec<RecordId> = store
            .get_all()
            .await
            .expect("get_all")
            .iter()
            .map(|note| note.id)
            .collect();
        assert_eq!(remaining, (1..=20).filter(|id| id % 2 == 1).collect::<Vec<_>>());
    }
}
