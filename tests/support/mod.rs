#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use assert_cmd::Command;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use taskboard::category::{Category, CategoryRepository};
use taskboard::error::{Error, Result};
use taskboard::store::{MemoryStore, Record, RecordId, RecordStore};
use taskboard::task::{Priority, Task, TaskRepository};
use taskboard::view::Board;
use tempfile::TempDir;

/// Fixed instant on 2024-03-04 at the given hour
pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap()
}

pub fn task(id: RecordId, priority: Priority, completed: bool, created_at: DateTime<Utc>) -> Task {
    Task {
        id,
        title: format!("task {id}"),
        description: None,
        category_id: 1,
        priority,
        due_date: None,
        completed,
        completed_at: completed.then_some(created_at),
        created_at,
        updated_at: created_at,
    }
}

pub fn titled(id: RecordId, title: &str, description: Option<&str>) -> Task {
    Task {
        title: title.to_string(),
        description: description.map(str::to_string),
        ..task(id, Priority::Medium, false, at(id))
    }
}

pub fn category(id: RecordId, name: &str) -> Category {
    Category {
        id,
        name: name.to_string(),
        color: "#6366F1".to_string(),
        icon: "Folder".to_string(),
    }
}

pub fn ids<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<RecordId> {
    tasks.into_iter().map(|task| task.id).collect()
}

pub fn task_repo(tasks: Vec<Task>) -> TaskRepository {
    TaskRepository::new(Arc::new(MemoryStore::with_records(tasks)))
}

pub fn board(tasks: Vec<Task>, categories: Vec<Category>) -> Board {
    Board::new(
        task_repo(tasks),
        CategoryRepository::new(Arc::new(MemoryStore::with_records(categories))),
    )
}

/// Store that fails its first `failures` calls, then behaves like a memory store.
pub struct FlakyStore<R> {
    inner: MemoryStore<R>,
    remaining_failures: AtomicUsize,
}

impl<R: Record> FlakyStore<R> {
    pub fn new(records: Vec<R>, failures: usize) -> Self {
        Self {
            inner: MemoryStore::with_records(records),
            remaining_failures: AtomicUsize::new(failures),
        }
    }

    /// Store that never recovers
    pub fn broken() -> Self {
        Self::new(Vec::new(), usize::MAX)
    }

    fn check(&self) -> Result<()> {
        let failing = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(Error::backend_msg("connection reset"));
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for FlakyStore<R> {
    async fn get_all(&self) -> Result<Vec<R>> {
        self.check()?;
        self.inner.get_all().await
    }

    async fn get_by_id(&self, id: RecordId) -> Result<Option<R>> {
        self.check()?;
        self.inner.get_by_id(id).await
    }

    async fn create(&self, draft: R::Draft) -> Result<R> {
        self.check()?;
        self.inner.create(draft).await
    }

    async fn update(&self, id: RecordId, patch: R::Patch) -> Result<Option<R>> {
        self.check()?;
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        self.check()?;
        self.inner.delete(id).await
    }
}

/// Scratch working directory for CLI tests
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join(".taskboard")
    }

    /// `taskboard` running in this directory with a clean environment
    pub fn cmd(&self) -> Command {
        let mut cmd = taskboard_cmd();
        cmd.current_dir(self.path());
        cmd
    }

    /// Run with `--json` and return the parsed envelope, asserting success.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cmd()
            .args(args)
            .arg("--json")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }

    /// Initialized board with the default categories
    pub fn initialized() -> Self {
        let dir = Self::new();
        dir.cmd().arg("init").assert().success();
        dir
    }
}

pub fn taskboard_cmd() -> Command {
    let mut cmd = Command::cargo_bin("taskboard").expect("binary");
    cmd.env_remove("TASKBOARD_CONFIG")
        .env_remove("TASKBOARD_DATA_DIR")
        .env_remove("RUST_LOG");
    cmd
}
