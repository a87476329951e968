//! Record store adapters
//!
//! A record store is the opaque persistence backend behind the repositories.
//! It only knows how to hand out snapshots of integer-keyed records and how to
//! apply drafts and patches to them; domain rules live one layer up.
//!
//! Two backends exist:
//! - [`MemoryStore`]: an ordered in-memory collection, optionally with simulated latency
//! - [`FileStore`]: the same semantics persisted as a JSON snapshot under the data directory
//!
//! Exactly one backend is chosen at startup (see [`open_store`]).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::config::{Config, StoreBackend};
use crate::error::{Error, Result};
use crate::form::{FormErrors, FormField};

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Identifier of a stored record. Always positive.
pub type RecordId = u32;

/// A value that can live in a record store.
pub trait Record: Clone + Send + Sync + 'static {
    /// Fields supplied on creation; the store assigns the identifier.
    type Draft: Send + 'static;
    /// Partial update merged field by field into an existing record.
    type Patch: Send + 'static;

    /// Human-readable kind used in errors and logs.
    const KIND: &'static str;

    fn id(&self) -> RecordId;
    fn from_draft(id: RecordId, draft: Self::Draft) -> Self;
    fn apply_patch(&mut self, patch: Self::Patch);
}

/// Uniform CRUD interface over a backend.
///
/// A missing identifier is reported as `None` / `false`; failures of the
/// backend itself surface as [`Error::Backend`].
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    async fn get_all(&self) -> Result<Vec<R>>;
    async fn get_by_id(&self, id: RecordId) -> Result<Option<R>>;
    async fn create(&self, draft: R::Draft) -> Result<R>;
    async fn update(&self, id: RecordId, patch: R::Patch) -> Result<Option<R>>;
    async fn delete(&self, id: RecordId) -> Result<bool>;
}

/// Records of one collection plus its identifier high-water mark.
///
/// `next_id` never goes down, so an identifier freed by a delete is not
/// handed out again and a dangling reference cannot latch onto a new record.
#[derive(Debug, Clone)]
pub(crate) struct Collection<R> {
    pub(crate) records: Vec<R>,
    pub(crate) next_id: RecordId,
}

impl<R: Record> Collection<R> {
    pub(crate) fn new(records: Vec<R>, next_id: RecordId) -> Self {
        Self { records, next_id }
    }

    /// Reserve the next identifier: past both the high-water mark and the
    /// current maximum, 1 for a fresh collection.
    pub(crate) fn allocate_id(&mut self) -> Result<RecordId> {
        let past_max = match self.records.iter().map(Record::id).max() {
            None => 1,
            Some(max) => max.checked_add(1).ok_or_else(exhausted::<R>)?,
        };
        let id = self.next_id.max(past_max);
        self.next_id = id.checked_add(1).ok_or_else(exhausted::<R>)?;
        Ok(id)
    }

    pub(crate) fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }
}

fn exhausted<R: Record>() -> Error {
    Error::backend_msg(format!("{} identifier space exhausted", R::KIND))
}

/// Conversion of caller-supplied identifiers into a [`RecordId`].
///
/// Repositories call this once at their boundary so that string ids coming
/// from forms or the command line are parsed in exactly one place.
pub trait IntoRecordId {
    fn into_record_id(self) -> Result<RecordId>;
}

impl IntoRecordId for RecordId {
    fn into_record_id(self) -> Result<RecordId> {
        if self == 0 {
            return Err(invalid_id(&self.to_string()));
        }
        Ok(self)
    }
}

impl IntoRecordId for i64 {
    fn into_record_id(self) -> Result<RecordId> {
        RecordId::try_from(self)
            .map_err(|_| invalid_id(&self.to_string()))?
            .into_record_id()
    }
}

impl IntoRecordId for i32 {
    fn into_record_id(self) -> Result<RecordId> {
        i64::from(self).into_record_id()
    }
}

impl IntoRecordId for &str {
    fn into_record_id(self) -> Result<RecordId> {
        normalize_id(self)
    }
}

impl IntoRecordId for &String {
    fn into_record_id(self) -> Result<RecordId> {
        normalize_id(self)
    }
}

impl IntoRecordId for String {
    fn into_record_id(self) -> Result<RecordId> {
        normalize_id(&self)
    }
}

/// Parse a textual identifier. Surrounding whitespace is ignored.
pub fn normalize_id(raw: &str) -> Result<RecordId> {
    let trimmed = raw.trim();
    match trimmed.parse::<RecordId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(invalid_id(trimmed)),
    }
}

fn invalid_id(raw: &str) -> Error {
    let mut errors = FormErrors::new();
    errors.insert(
        FormField::Id,
        format!("'{raw}' is not a valid identifier"),
    );
    Error::Validation(errors)
}

/// Build the configured backend for one collection.
pub fn open_store<R>(config: &Config, path: PathBuf) -> Result<Arc<dyn RecordStore<R>>>
where
    R: Record + Serialize + DeserializeOwned,
{
    let latency = Duration::from_millis(config.store.latency_ms);
    match config.store.backend()? {
        StoreBackend::Memory => {
            tracing::debug!(kind = R::KIND, "using in-memory record store");
            Ok(Arc::new(MemoryStore::<R>::new().with_latency(latency)))
        }
        StoreBackend::File => {
            tracing::debug!(kind = R::KIND, path = %path.display(), "using file record store");
            Ok(Arc::new(FileStore::<R>::new(path, config.lock.timeout_ms)))
        }
    }
}
