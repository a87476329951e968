use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{Collection, Record, RecordId, RecordStore};
use crate::error::{Error, Result};
use crate::lock::{self, FileLock};
use crate::storage;

/// Schema marker written into every snapshot file
pub const SNAPSHOT_SCHEMA_VERSION: &str = "taskboard.records.v1";

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot<R> {
    schema_version: String,
    /// Identifier high-water mark; absent in snapshots written before it existed
    #[serde(default)]
    next_id: RecordId,
    records: Vec<R>,
}

/// Record store persisted as a JSON snapshot.
///
/// Each operation holds an exclusive lock on `<file>.lock` for its whole
/// read-modify-write cycle, and writes go through a temp file + rename, so
/// concurrent processes never observe a torn collection.
#[derive(Debug)]
pub struct FileStore<R> {
    path: PathBuf,
    lock_timeout_ms: u64,
    _record: PhantomData<fn() -> R>,
}

impl<R> Clone for FileStore<R> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            lock_timeout_ms: self.lock_timeout_ms,
            _record: PhantomData,
        }
    }
}

impl<R> FileStore<R>
where
    R: Record + Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf, lock_timeout_ms: u64) -> Self {
        Self {
            path,
            lock_timeout_ms,
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` against the current records while holding the file lock.
    ///
    /// `op` returns its output plus whether the collection changed; changed
    /// collections are written back before the lock is released.
    async fn locked<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Collection<R>) -> Result<(T, bool)> + Send + 'static,
    {
        let path = self.path.clone();
        let timeout_ms = self.lock_timeout_ms;
        let task = tokio::task::spawn_blocking(move || -> Result<T> {
            let _lock = FileLock::acquire(lock::lock_path_for(&path), timeout_ms)?;
            let mut collection = read_snapshot::<R>(&path)?;
            let (output, dirty) = op(&mut collection)?;
            if dirty {
                write_snapshot(&path, collection)?;
            }
            Ok(output)
        });

        match task.await {
            Ok(result) => result.map_err(|err| err.into_backend(&format!("{} store", R::KIND))),
            Err(join) => Err(Error::backend(
                format!("{} store operation aborted", R::KIND),
                join,
            )),
        }
    }
}

fn read_snapshot<R: Record + DeserializeOwned>(path: &Path) -> Result<Collection<R>> {
    if !path.exists() {
        return Ok(Collection::new(Vec::new(), 1));
    }
    let snapshot: Snapshot<R> = storage::read_json(path)?;
    if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
        return Err(Error::backend_msg(format!(
            "unsupported snapshot schema '{}' in {}",
            snapshot.schema_version,
            path.display()
        )));
    }
    Ok(Collection::new(snapshot.records, snapshot.next_id))
}

fn write_snapshot<R: Serialize>(path: &Path, collection: Collection<R>) -> Result<()> {
    let snapshot = Snapshot {
        schema_version: SNAPSHOT_SCHEMA_VERSION.to_string(),
        next_id: collection.next_id,
        records: collection.records,
    };
    storage::write_json(path, &snapshot)
}

#[async_trait]
impl<R> RecordStore<R> for FileStore<R>
where
    R: Record + Serialize + DeserializeOwned,
{
    async fn get_all(&self) -> Result<Vec<R>> {
        self.locked(|collection| Ok((std::mem::take(&mut collection.records), false)))
            .await
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<R>> {
        self.locked(move |collection| {
            let found = collection
                .position(id)
                .map(|index| collection.records.swap_remove(index));
            Ok((found, false))
        })
        .await
    }

    async fn create(&self, draft: R::Draft) -> Result<R> {
        let record = self
            .locked(move |collection| {
                let id = collection.allocate_id()?;
                let record = R::from_draft(id, draft);
                collection.records.push(record.clone());
                Ok((record, true))
            })
            .await?;
        tracing::debug!(kind = R::KIND, id = record.id(), "record created");
        Ok(record)
    }

    async fn update(&self, id: RecordId, patch: R::Patch) -> Result<Option<R>> {
        self.locked(move |collection| {
            match collection.records.iter_mut().find(|record| record.id() == id) {
                Some(record) => {
                    record.apply_patch(patch);
                    Ok((Some(record.clone()), true))
                }
                None => Ok((None, false)),
            }
        })
        .await
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        let removed = self
            .locked(move |collection| match collection.position(id) {
                Some(index) => {
                    collection.records.remove(index);
                    Ok((true, true))
                }
                None => Ok((false, false)),
            })
            .await?;
        if removed {
            tracing::debug!(kind = R::KIND, id, "record deleted");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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
    async fn missing_file_is_empty_collection() {
        let dir = TempDir::new().expect("tempdir");
        let store = FileStore::<Note>::new(dir.path().join("notes.json"), 1000);
        assert!(store.get_all().await.expect("get_all").is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn records_persist_across_instances() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("notes.json");

        let store = FileStore::<Note>::new(path.clone(), 1000);
        store.create("first".to_string()).await.expect("create");
        store.create("second".to_string()).await.expect("create");
        store.update(1, "edited".to_string()).await.expect("update");

        let reopened = FileStore::<Note>::new(path, 1000);
        let notes = reopened.get_all().await.expect("get_all");
        assert_eq!(
            notes,
            vec![
                Note { id: 1, text: "edited".to_string() },
                Note { id: 2, text: "second".to_string() },
            ]
        );
        assert!(reopened.delete(2).await.expect("delete"));
        assert!(!reopened.delete(2).await.expect("delete"));
    }

    #[tokio::test]
    async fn high_water_mark_survives_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("notes.json");

        let store = FileStore::<Note>::new(path.clone(), 1000);
        store.create("first".to_string()).await.expect("create");
        let second = store.create("second".to_string()).await.expect("create");
        assert!(store.delete(second.id).await.expect("delete"));

        let reopened = FileStore::<Note>::new(path, 1000);
        let third = reopened.create("third".to_string()).await.expect("create");
        assert_eq!(third.id, 3);
    }

    #[tokio::test]
    async fn snapshot_without_mark_continues_after_maximum() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("notes.json");
        std::fs::write(
            &path,
            r#"{"schema_version":"taskboard.records.v1","records":[{"id":5,"text":"old"}]}"#,
        )
        .expect("write");

        let store = FileStore::<Note>::new(path, 1000);
        let created = store.create("new".to_string()).await.expect("create");
        assert_eq!(created.id, 6);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_backend_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "not json").expect("write");

        let store = FileStore::<Note>::new(path, 1000);
        let err = store.get_all().await.expect_err("corrupt");
        assert!(matches!(err, Error::Backend { .. }), "unexpected: {err:?}");
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn busy_lock_is_backend_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("notes.json");
        let _held = FileLock::acquire(lock::lock_path_for(&path), 1000).expect("lock");

        let store = FileStore::<Note>::new(path, 50);
        let err = store.get_all().await.expect_err("busy");
        assert!(matches!(err, Error::Backend { .. }), "unexpected: {err:?}");
    }
}
