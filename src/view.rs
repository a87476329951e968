//! View state coordination
//!
//! [`Board`] owns the in-memory task and category collections behind a
//! presentation layer. It loads both collections together and, after every
//! confirmed repository mutation, reconciles the single affected record
//! locally instead of reloading.

use std::path::Path;

use serde::Serialize;

use crate::category::{Category, CategoryInput, CategoryPatch, CategoryRepository};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::filter::{filter_tasks, Criterion, FilterSpec};
use crate::form::TaskForm;
use crate::storage::Storage;
use crate::store::{open_store, IntoRecordId, RecordId};
use crate::task::{canonical_cmp, Task, TaskInput, TaskRepository};

/// Message shown when the initial load fails
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load tasks. Please try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    pub active: usize,
    pub completed: usize,
    pub total: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|task| task.completed).count();
        Self {
            active: tasks.len() - completed,
            completed,
            total: tasks.len(),
        }
    }
}

/// A visible task with its resolved category
#[derive(Debug, Clone, Serialize)]
pub struct TaskRow<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    /// `None` when the category was deleted
    pub category: Option<&'a Category>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    /// The board has no tasks at all
    NoTasks,
    /// Tasks exist but the filter hides all of them
    NoMatches,
}

impl EmptyState {
    pub fn title(self) -> &'static str {
        match self {
            EmptyState::NoTasks => "No tasks yet",
            EmptyState::NoMatches => "No matching tasks",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            EmptyState::NoTasks => "Add your first task to get started.",
            EmptyState::NoMatches => "Try adjusting your filters or search query.",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskListView<'a> {
    pub rows: Vec<TaskRow<'a>>,
    pub empty: Option<EmptyState>,
    pub active_filters: Vec<Criterion>,
    pub stats: TaskStats,
}

/// A confirmed task mutation to fold into the local collection
#[derive(Debug, Clone)]
pub enum TaskChange {
    Created(Task),
    Updated(Task),
    Deleted(RecordId),
    BulkDeleted(Vec<RecordId>),
}

impl TaskChange {
    /// Apply the change to `tasks`, touching only the affected records.
    ///
    /// Updates replace the record in its current slot, so after a toggle the
    /// list may no longer be fully canonical. A new record goes in front of
    /// the first record that sorts after it; relative to records that were
    /// never updated in place it lands exactly where a reload would put it.
    pub fn reconcile(self, tasks: &mut Vec<Task>) {
        match self {
            TaskChange::Created(task) => insert_canonical(tasks, task),
            TaskChange::Updated(task) => match tasks.iter_mut().find(|t| t.id == task.id) {
                Some(slot) => *slot = task,
                None => insert_canonical(tasks, task),
            },
            TaskChange::Deleted(id) => tasks.retain(|task| task.id != id),
            TaskChange::BulkDeleted(ids) => tasks.retain(|task| !ids.contains(&task.id)),
        }
    }
}

fn insert_canonical(tasks: &mut Vec<Task>, task: Task) {
    let at = tasks
        .iter()
        .position(|existing| canonical_cmp(existing, &task).is_gt())
        .unwrap_or(tasks.len());
    tasks.insert(at, task);
}

/// In-memory board state over the task and category repositories
#[derive(Debug)]
pub struct Board {
    task_repo: TaskRepository,
    category_repo: CategoryRepository,
    tasks: Vec<Task>,
    categories: Vec<Category>,
    state: LoadState,
    load_error: Option<Error>,
}

impl Board {
    pub fn new(task_repo: TaskRepository, category_repo: CategoryRepository) -> Self {
        Self {
            task_repo,
            category_repo,
            tasks: Vec::new(),
            categories: Vec::new(),
            state: LoadState::Idle,
            load_error: None,
        }
    }

    /// Open the configured backend under `data_dir`.
    pub fn open(config: &Config, data_dir: &Path) -> Result<Self> {
        let storage = Storage::new(data_dir);
        let tasks = open_store::<Task>(config, storage.tasks_file())?;
        let categories = open_store::<Category>(config, storage.categories_file())?;
        Ok(Self::new(
            TaskRepository::new(tasks),
            CategoryRepository::new(categories),
        ))
    }

    pub fn task_repository(&self) -> &TaskRepository {
        &self.task_repo
    }

    pub fn category_repository(&self) -> &CategoryRepository {
        &self.category_repo
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    /// Tasks in canonical order (as of the last load plus reconciled changes)
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Fetch tasks and categories concurrently.
    ///
    /// Both collections are adopted together or not at all; on failure the
    /// state becomes [`LoadState::Failed`], the previous collections stay and
    /// the cause is kept for [`Board::take_load_error`].
    pub async fn load(&mut self) -> &LoadState {
        self.state = LoadState::Loading;
        self.load_error = None;
        let fetched = tokio::try_join!(self.task_repo.get_all(), self.category_repo.get_all());
        match fetched {
            Ok((tasks, categories)) => {
                tracing::debug!(
                    tasks = tasks.len(),
                    categories = categories.len(),
                    "board loaded"
                );
                self.tasks = tasks;
                self.categories = categories;
                self.state = LoadState::Ready;
            }
            Err(err) => {
                tracing::warn!(error = %err, "board load failed");
                self.state = LoadState::Failed(LOAD_FAILED_MESSAGE.to_string());
                self.load_error = Some(err);
            }
        }
        &self.state
    }

    /// Cause of the last failed load, if any
    pub fn take_load_error(&mut self) -> Option<Error> {
        self.load_error.take()
    }

    /// Re-run the full load after a failure
    pub async fn retry(&mut self) -> &LoadState {
        tracing::info!("retrying board load");
        self.load().await
    }

    pub fn task(&self, id: RecordId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn visible(&self, spec: &FilterSpec) -> Vec<&Task> {
        filter_tasks(&self.tasks, spec)
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks)
    }

    /// Category of `task`, if it still exists
    pub fn category_for(&self, task: &Task) -> Option<&Category> {
        self.categories
            .iter()
            .find(|category| category.id == task.category_id)
    }

    pub fn list_view(&self, spec: &FilterSpec) -> TaskListView<'_> {
        let rows: Vec<TaskRow<'_>> = self
            .visible(spec)
            .into_iter()
            .map(|task| TaskRow {
                task,
                category: self.category_for(task),
            })
            .collect();

        let empty = match (rows.is_empty(), spec.is_filtered()) {
            (false, _) => None,
            (true, true) => Some(EmptyState::NoMatches),
            (true, false) => Some(EmptyState::NoTasks),
        };

        TaskListView {
            rows,
            empty,
            active_filters: spec.active_criteria(),
            stats: self.stats(),
        }
    }

    pub async fn create_task(&mut self, input: TaskInput) -> Result<Task> {
        let task = self.task_repo.create(input).await?;
        TaskChange::Created(task.clone()).reconcile(&mut self.tasks);
        Ok(task)
    }

    pub async fn update_task(&mut self, id: impl IntoRecordId, input: TaskInput) -> Result<Task> {
        let task = self.task_repo.update(id, input).await?;
        TaskChange::Updated(task.clone()).reconcile(&mut self.tasks);
        Ok(task)
    }

    pub async fn toggle_task(&mut self, id: impl IntoRecordId) -> Result<Task> {
        let task = self.task_repo.toggle_complete(id).await?;
        TaskChange::Updated(task.clone()).reconcile(&mut self.tasks);
        Ok(task)
    }

    pub async fn delete_task(&mut self, id: impl IntoRecordId) -> Result<RecordId> {
        let id = id.into_record_id()?;
        self.task_repo.delete(id).await?;
        TaskChange::Deleted(id).reconcile(&mut self.tasks);
        Ok(id)
    }

    /// Delete several tasks; returns the records actually removed.
    pub async fn bulk_delete<I>(&mut self, ids: I) -> Result<Vec<Task>>
    where
        I: IntoIterator,
        I::Item: IntoRecordId,
    {
        let deleted = self.task_repo.bulk_delete(ids).await?;
        let removed = deleted.iter().map(|task| task.id).collect();
        TaskChange::BulkDeleted(removed).reconcile(&mut self.tasks);
        Ok(deleted)
    }

    /// Validate `form` in full, then create (or update `editing`) on success.
    pub async fn submit_form(&mut self, form: &TaskForm, editing: Option<RecordId>) -> Result<Task> {
        let input = form.to_input()?;
        match editing {
            Some(id) => self.update_task(id, input).await,
            None => self.create_task(input).await,
        }
    }

    pub async fn create_category(&mut self, input: CategoryInput) -> Result<Category> {
        let category = self.category_repo.create(input).await?;
        self.categories.push(category.clone());
        Ok(category)
    }

    pub async fn update_category(
        &mut self,
        id: impl IntoRecordId,
        patch: CategoryPatch,
    ) -> Result<Category> {
        let category = self.category_repo.update(id, patch).await?;
        match self.categories.iter_mut().find(|c| c.id == category.id) {
            Some(slot) => *slot = category.clone(),
            None => self.categories.push(category.clone()),
        }
        Ok(category)
    }

    /// Delete a category. Tasks referencing it are left untouched.
    pub async fn delete_category(&mut self, id: impl IntoRecordId) -> Result<Category> {
        let category = self.category_repo.delete(id).await?;
        self.categories.retain(|c| c.id != category.id);
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::task::Priority;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn task(id: RecordId, priority: Priority, completed: bool, hour: u32) -> Task {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap();
        Task {
            id,
            title: format!("task {id}"),
            description: None,
            category_id: 1,
            priority,
            due_date: None,
            completed,
            completed_at: completed.then_some(at),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn created_task_lands_at_canonical_position() {
        let mut tasks = vec![
            task(1, Priority::High, false, 1),
            task(2, Priority::Low, false, 2),
            task(3, Priority::High, true, 3),
        ];
        TaskChange::Created(task(4, Priority::Medium, false, 4)).reconcile(&mut tasks);
        let ids: Vec<RecordId> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 4, 2, 3]);
    }

    #[test]
    fn updated_task_is_replaced_in_place() {
        let mut tasks = vec![
            task(1, Priority::High, false, 1),
            task(2, Priority::Low, false, 2),
        ];
        let mut changed = tasks[0].clone();
        changed.priority = Priority::Low;
        TaskChange::Updated(changed).reconcile(&mut tasks);
        assert_eq!(tasks[0].id, 1);
        assert_eq!(tasks[0].priority, Priority::Low);
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn stats_count_by_completion() {
        let tasks = vec![
            task(1, Priority::High, false, 1),
            task(2, Priority::Low, true, 2),
            task(3, Priority::Low, true, 3),
        ];
        assert_eq!(
            TaskStats::from_tasks(&tasks),
            TaskStats {
                active: 1,
                completed: 2,
                total: 3
            }
        );
    }

    #[tokio::test]
    async fn list_view_reports_empty_states() {
        let tasks = TaskRepository::new(Arc::new(MemoryStore::<Task>::new()));
        let categories = CategoryRepository::new(Arc::new(MemoryStore::<Category>::new()));
        let mut board = Board::new(tasks, categories);
        assert!(board.load().await.is_ready());

        let view = board.list_view(&FilterSpec::default());
        assert_eq!(view.empty, Some(EmptyState::NoTasks));

        board
            .create_task(TaskInput::new("Plan", 9))
            .await
            .expect("create");
        let view = board.list_view(&FilterSpec::default().with_search("zzz"));
        assert_eq!(view.empty, Some(EmptyState::NoMatches));
        assert_eq!(view.active_filters, vec![Criterion::Search]);

        let view = board.list_view(&FilterSpec::default());
        assert!(view.empty.is_none());
        assert!(view.rows[0].category.is_none());
    }
}
