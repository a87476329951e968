//! Configuration loading and management
//!
//! Handles parsing of `.taskboard.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::storage::DATA_DIR;
use crate::task::Priority;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE: &str = ".taskboard.toml";

/// Upper bound for simulated store latency
pub const MAX_LATENCY_MS: u64 = 10_000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Record store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// File lock configuration
    #[serde(default)]
    pub lock: LockConfig,

    /// Task defaults
    #[serde(default)]
    pub tasks: TasksConfig,
}

/// Which record store backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File,
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend name: `file` or `memory`
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Data directory for the file backend, relative to the config file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Simulated per-operation latency for the memory backend
    #[serde(default)]
    pub latency_ms: u64,
}

fn default_backend() -> String {
    "file".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(DATA_DIR)
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
            latency_ms: 0,
        }
    }
}

impl StoreConfig {
    pub fn backend(&self) -> Result<StoreBackend> {
        match self.backend.trim() {
            "file" => Ok(StoreBackend::File),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(Error::InvalidConfig(format!(
                "store.backend: invalid backend '{other}' (expected file|memory)"
            ))),
        }
    }

    fn validate(&self) -> Result<()> {
        self.backend()?;
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "store.data_dir cannot be empty".to_string(),
            ));
        }
        if self.latency_ms > MAX_LATENCY_MS {
            return Err(Error::InvalidConfig(format!(
                "store.latency_ms must be <= {MAX_LATENCY_MS}"
            )));
        }
        Ok(())
    }
}

/// File lock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// How long to wait for a contended lock
    #[serde(default = "default_lock_timeout")]
    pub timeout_ms: u64,
}

fn default_lock_timeout() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_lock_timeout(),
        }
    }
}

/// Task defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Priority used by `taskboard add` when none is given
    #[serde(default = "default_priority")]
    pub default_priority: String,
}

fn default_priority() -> String {
    Priority::default().as_str().to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_priority: default_priority(),
        }
    }
}

impl TasksConfig {
    pub fn default_priority(&self) -> Result<Priority> {
        self.default_priority.parse().map_err(|_| {
            Error::InvalidConfig(format!(
                "tasks.default_priority: invalid priority '{}' (expected high|medium|low)",
                self.default_priority
            ))
        })
    }
}

impl Config {
    /// Load configuration from a `.taskboard.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `.taskboard.toml` from a directory, or return defaults when absent
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!(dir = %dir.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Data directory resolved against `base` when relative
    pub fn data_dir_in(&self, base: &Path) -> PathBuf {
        if self.store.data_dir.is_absolute() {
            self.store.data_dir.clone()
        } else {
            base.join(&self.store.data_dir)
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        if self.lock.timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "lock.timeout_ms must be > 0".to_string(),
            ));
        }
        self.tasks.default_priority()?;
        Ok(())
    }
}
