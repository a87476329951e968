//! taskboard - Task Filtering and View-State Library
//!
//! This library provides the core of the taskboard CLI: tasks organized by
//! category and priority, a stable canonical ordering, multi-criteria
//! filtering, and local state reconciliation after confirmed mutations.
//!
//! # Core Concepts
//!
//! - **Record store**: opaque CRUD backend keyed by positive integer ids
//! - **Repositories**: typed task/category access with id normalization
//! - **Filter spec**: status, priority, category and search criteria
//! - **Board**: in-memory view state reconciled after each mutation
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.taskboard.toml`
//! - `error`: Error types and result aliases
//! - `store`: Record store trait with memory and file backends
//! - `task`: Task model, canonical ordering and the task repository
//! - `category`: Category model and repository
//! - `filter`: Filter spec and the filter engine
//! - `form`: Task form state and validation
//! - `view`: The board (view state coordinator)
//! - `storage`: Data directory layout and JSON helpers
//! - `lock`: File locking and atomic writes for the file backend
//! - `output`: Human and JSON output for CLI commands

pub mod category;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod form;
pub mod lock;
pub mod output;
pub mod storage;
pub mod store;
pub mod task;
pub mod view;

pub use error::{Error, Result};
