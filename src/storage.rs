//! Storage layout for taskboard
//!
//! The file backend keeps one snapshot per collection inside the data
//! directory:
//!
//! ```text
//! .taskboard/                   # data directory (configurable)
//!   tasks.json                  # task snapshot
//!   tasks.json.lock             # lock guarding tasks.json
//!   categories.json             # category snapshot
//!   categories.json.lock        # lock guarding categories.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::lock;

/// Default name of the data directory
pub const DATA_DIR: &str = ".taskboard";

const TASKS_FILE: &str = "tasks.json";
const CATEGORIES_FILE: &str = "categories.json";

/// Storage manager for taskboard state
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path to the data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path to the task snapshot
    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir.join(TASKS_FILE)
    }

    /// Path to the category snapshot
    pub fn categories_file(&self) -> PathBuf {
        self.data_dir.join(CATEGORIES_FILE)
    }

    /// Create the data directory if needed
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.data_dir.is_dir()
    }
}

/// Write a value as pretty JSON, atomically
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    lock::write_atomic(path, json.as_bytes())
}

/// Read a JSON file into a value
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    let data: T = serde_json::from_str(&content)?;
    Ok(data)
}
