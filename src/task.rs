//! Tasks and the task repository.
//!
//! The repository wraps a [`RecordStore`] with the task-specific rules:
//! canonical ordering, completion toggling, bulk deletion and timestamp
//! stamping. Identifiers coming from callers are normalized here once.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::form::{FormErrors, FormField};
use crate::store::{IntoRecordId, Record, RecordId, RecordStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Position in the canonical order (high first).
    pub fn rank(self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High Priority",
            Priority::Medium => "Medium Priority",
            Priority::Low => "Low Priority",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::Validation(FormErrors::single(
                    FormField::Priority,
                    format!("unknown priority '{trimmed}' (expected high, medium or low)"),
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: RecordId,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything but the identifier; the store assigns that.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub category_id: RecordId,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field-by-field update. `None` leaves the field untouched; the nested
/// options set a nullable field to a value or clear it.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<RecordId>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub completed: Option<bool>,
    pub completed_at: Option<Option<DateTime<Utc>>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Task {
    type Draft = NewTask;
    type Patch = TaskPatch;
    const KIND: &'static str = "Task";

    fn id(&self) -> RecordId {
        self.id
    }

    fn from_draft(id: RecordId, draft: NewTask) -> Self {
        Task {
            id,
            title: draft.title,
            description: draft.description,
            category_id: draft.category_id,
            priority: draft.priority,
            due_date: draft.due_date,
            completed: draft.completed,
            completed_at: draft.completed_at.filter(|_| draft.completed),
            created_at: draft.created_at,
            updated_at: draft.updated_at,
        }
    }

    fn apply_patch(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = completed_at;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = updated_at;
        }
        // completed_at only exists for completed tasks
        if !self.completed {
            self.completed_at = None;
        }
    }
}

/// Caller-supplied fields for create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInput {
    pub title: String,
    pub description: Option<String>,
    pub category_id: RecordId,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskInput {
    pub fn new(title: impl Into<String>, category_id: RecordId) -> Self {
        Self {
            title: title.into(),
            description: None,
            category_id,
            priority: Priority::default(),
            due_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// How a due date relates to "now", for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    Today,
    Tomorrow,
    Upcoming,
}

impl Task {
    pub fn due_status(&self, now: DateTime<Utc>) -> Option<DueStatus> {
        let due = self.due_date?;
        let today = now.date_naive();
        let due_day = due.date_naive();
        Some(if due_day == today {
            DueStatus::Today
        } else if due < now {
            DueStatus::Overdue
        } else if due_day == today + Duration::days(1) {
            DueStatus::Tomorrow
        } else {
            DueStatus::Upcoming
        })
    }

    /// Short due label: "Today", "Tomorrow" or e.g. "Mar 4".
    pub fn due_label(&self, now: DateTime<Utc>) -> Option<String> {
        let due = self.due_date?;
        Some(match self.due_status(now)? {
            DueStatus::Today => "Today".to_string(),
            DueStatus::Tomorrow => "Tomorrow".to_string(),
            DueStatus::Overdue | DueStatus::Upcoming => due.format("%b %-d").to_string(),
        })
    }
}

/// Canonical task order: incomplete first, then priority (high, medium, low),
/// then newest first, then identifier.
pub fn canonical_cmp(left: &Task, right: &Task) -> Ordering {
    left.completed
        .cmp(&right.completed)
        .then_with(|| left.priority.rank().cmp(&right.priority.rank()))
        .then_with(|| right.created_at.cmp(&left.created_at))
        .then_with(|| left.id.cmp(&right.id))
}

pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(canonical_cmp);
}

fn not_found(id: RecordId) -> Error {
    Error::NotFound {
        kind: Task::KIND,
        id,
    }
}

fn check_input(input: &TaskInput) -> Result<()> {
    let mut errors = FormErrors::new();
    if input.title.trim().is_empty() {
        errors.insert(FormField::Title, crate::form::TITLE_REQUIRED);
    }
    if input.category_id == 0 {
        errors.insert(FormField::CategoryId, crate::form::CATEGORY_REQUIRED);
    }
    errors.into_result()
}

/// Typed task access over a record store
#[derive(Clone)]
pub struct TaskRepository {
    store: Arc<dyn RecordStore<Task>>,
}

impl fmt::Debug for TaskRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRepository").finish_non_exhaustive()
    }
}

impl TaskRepository {
    pub fn new(store: Arc<dyn RecordStore<Task>>) -> Self {
        Self { store }
    }

    /// All tasks in canonical order.
    pub async fn get_all(&self) -> Result<Vec<Task>> {
        let mut tasks = self.store.get_all().await?;
        sort_tasks(&mut tasks);
        tracing::debug!(count = tasks.len(), "tasks loaded");
        Ok(tasks)
    }

    pub async fn get_by_id(&self, id: impl IntoRecordId) -> Result<Option<Task>> {
        let id = id.into_record_id()?;
        self.store.get_by_id(id).await
    }

    pub async fn create(&self, input: TaskInput) -> Result<Task> {
        check_input(&input)?;
        let now = Utc::now();
        let draft = NewTask {
            title: input.title.trim().to_string(),
            description: Some(input.description.unwrap_or_default()),
            category_id: input.category_id.into_record_id()?,
            priority: input.priority,
            due_date: input.due_date,
            completed: false,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        let task = self.store.create(draft).await?;
        tracing::info!(id = task.id, "task created");
        Ok(task)
    }

    /// Replace the editable fields of a task. Completion state is kept.
    pub async fn update(&self, id: impl IntoRecordId, input: TaskInput) -> Result<Task> {
        let id = id.into_record_id()?;
        check_input(&input)?;
        let patch = TaskPatch {
            title: Some(input.title.trim().to_string()),
            description: Some(Some(input.description.unwrap_or_default())),
            category_id: Some(input.category_id),
            priority: Some(input.priority),
            due_date: Some(input.due_date),
            updated_at: Some(Utc::now()),
            ..TaskPatch::default()
        };
        let task = self.store.update(id, patch).await?.ok_or_else(|| not_found(id))?;
        tracing::info!(id, "task updated");
        Ok(task)
    }

    pub async fn delete(&self, id: impl IntoRecordId) -> Result<()> {
        let id = id.into_record_id()?;
        if !self.store.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(id, "task deleted");
        Ok(())
    }

    /// Flip completion. `completed_at` is stamped on completion and cleared
    /// when the task is reopened.
    pub async fn toggle_complete(&self, id: impl IntoRecordId) -> Result<Task> {
        let id = id.into_record_id()?;
        let current = self.store.get_by_id(id).await?.ok_or_else(|| not_found(id))?;

        let now = Utc::now();
        let completed = !current.completed;
        let patch = TaskPatch {
            completed: Some(completed),
            completed_at: Some(completed.then_some(now)),
            updated_at: Some(now),
            ..TaskPatch::default()
        };
        // the task may have been deleted between the read and the write
        let task = self.store.update(id, patch).await?.ok_or_else(|| not_found(id))?;
        tracing::info!(id, completed, "task completion toggled");
        Ok(task)
    }

    /// Delete several tasks, returning the ones actually removed.
    ///
    /// Identifiers that are already gone are skipped; every identifier must
    /// still be well-formed.
    pub async fn bulk_delete<I>(&self, ids: I) -> Result<Vec<Task>>
    where
        I: IntoIterator,
        I::Item: IntoRecordId,
    {
        let mut seen = HashSet::new();
        let mut normalized = Vec::new();
        for id in ids {
            let id = id.into_record_id()?;
            if seen.insert(id) {
                normalized.push(id);
            }
        }

        let mut deleted = Vec::with_capacity(normalized.len());
        for id in normalized {
            let Some(task) = self.store.get_by_id(id).await? else {
                tracing::debug!(id, "bulk delete skipped missing task");
                continue;
            };
            if self.store.delete(id).await? {
                deleted.push(task);
            }
        }
        tracing::info!(count = deleted.len(), "tasks bulk deleted");
        Ok(deleted)
    }
}
