//! taskboard task command implementations.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::filter::FilterSpec;
use crate::form::{FormField, TaskForm};
use crate::output::{emit_success, HumanOutput};
use crate::store::normalize_id;
use crate::task::Task;
use crate::view::{Board, TaskRow, TaskStats};

use super::Context;

pub struct ListOptions {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

pub struct AddOptions {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub priority: Option<String>,
    pub due: Option<String>,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub clear_due: bool,
}

#[derive(Serialize)]
struct RemoveReport {
    deleted: Vec<Task>,
    skipped: usize,
}

pub(super) async fn run_list(ctx: &Context, opts: ListOptions) -> Result<()> {
    let spec = FilterSpec::from_tokens(
        opts.status.as_deref(),
        opts.priority.as_deref(),
        opts.category.as_deref(),
        opts.search.as_deref(),
    )?;
    let board = ctx.board().await?;
    let view = board.list_view(&spec);
    let now = Utc::now();

    let mut human = match view.empty {
        Some(empty) => {
            let mut human = HumanOutput::new(empty.title());
            human.note(empty.message());
            human
        }
        None => HumanOutput::new(format!(
            "Tasks ({} of {})",
            view.rows.len(),
            view.stats.total
        )),
    };
    for row in &view.rows {
        human.line(format_row(row, now));
    }
    if !view.active_filters.is_empty() {
        let labels: Vec<&str> = view.active_filters.iter().map(|c| c.label()).collect();
        human.field("filters", labels.join(", "));
    }
    human.stats(view.stats);

    emit_success(ctx.output, "list", &view, Some(&human))
}

pub(super) async fn run_show(ctx: &Context, id: &str) -> Result<()> {
    let id = normalize_id(id)?;
    let board = ctx.board().await?;
    let task = board.task(id).ok_or(Error::NotFound { kind: "Task", id })?;
    let row = TaskRow {
        task,
        category: board.category_for(task),
    };
    let now = Utc::now();

    let mut human = HumanOutput::new(format!("#{} {}", task.id, task.title));
    human.field("status", if task.completed { "completed" } else { "active" });
    human.field("priority", task.priority.label());
    human.field("category", category_name(&row));
    if let Some(due) = task.due_label(now) {
        human.field("due", due);
    }
    if let Some(completed_at) = task.completed_at {
        human.field("completed at", completed_at.to_rfc3339());
    }
    human.field("created", task.created_at.to_rfc3339());
    human.field("updated", task.updated_at.to_rfc3339());
    if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
        human.note(description);
    }

    emit_success(ctx.output, "show", &row, Some(&human))
}

pub(super) async fn run_add(ctx: &Context, opts: AddOptions) -> Result<()> {
    let mut board = ctx.board().await?;

    let mut form = TaskForm::new();
    form.priority = ctx.config.tasks.default_priority()?.as_str().to_string();
    let mut errors = form.validate();
    form.set_field(FormField::Title, opts.title, &mut errors);
    form.set_field(FormField::CategoryId, opts.category, &mut errors);
    if let Some(description) = opts.description {
        form.set_field(FormField::Description, description, &mut errors);
    }
    if let Some(priority) = opts.priority {
        form.set_field(FormField::Priority, priority, &mut errors);
    }
    if let Some(due) = opts.due {
        form.set_field(FormField::DueDate, due, &mut errors);
    }

    let task = board.submit_form(&form, None).await?;
    let mut human = HumanOutput::new(format!("Task added: #{} {}", task.id, task.title));
    task_fields(&mut human, &board, &task);
    human.suggest(format!("taskboard toggle {}", task.id));

    emit_success(ctx.output, "add", &task, Some(&human))
}

pub(super) async fn run_edit(ctx: &Context, opts: EditOptions) -> Result<()> {
    let id = normalize_id(&opts.id)?;
    let mut board = ctx.board().await?;
    let current = board
        .task(id)
        .ok_or(Error::NotFound { kind: "Task", id })?;

    let mut form = TaskForm::from_task(current);
    let mut errors = form.validate();
    if let Some(title) = opts.title {
        form.set_field(FormField::Title, title, &mut errors);
    }
    if let Some(description) = opts.description {
        form.set_field(FormField::Description, description, &mut errors);
    }
    if let Some(category) = opts.category {
        form.set_field(FormField::CategoryId, category, &mut errors);
    }
    if let Some(priority) = opts.priority {
        form.set_field(FormField::Priority, priority, &mut errors);
    }
    if let Some(due) = opts.due {
        form.set_field(FormField::DueDate, due, &mut errors);
    } else if opts.clear_due {
        form.set_field(FormField::DueDate, "", &mut errors);
    }

    let task = board.submit_form(&form, Some(id)).await?;
    let mut human = HumanOutput::new(format!("Task updated: #{} {}", task.id, task.title));
    task_fields(&mut human, &board, &task);

    emit_success(ctx.output, "edit", &task, Some(&human))
}

pub(super) async fn run_toggle(ctx: &Context, id: &str) -> Result<()> {
    let mut board = ctx.board().await?;
    let task = board.toggle_task(id).await?;
    let verb = if task.completed { "completed" } else { "reopened" };
    let mut human = HumanOutput::new(format!("Task {verb}: #{} {}", task.id, task.title));
    human.field("active", board.stats().active);

    emit_success(ctx.output, "toggle", &task, Some(&human))
}

pub(super) async fn run_rm(ctx: &Context, ids: Vec<String>) -> Result<()> {
    let mut board = ctx.board().await?;

    // a single id must exist; a batch skips ids that are already gone
    let report = if let [id] = ids.as_slice() {
        let id = normalize_id(id)?;
        let task = board.task(id).cloned();
        board.delete_task(id).await?;
        RemoveReport {
            deleted: task.into_iter().collect(),
            skipped: 0,
        }
    } else {
        let requested = ids.len();
        let deleted = board.bulk_delete(&ids).await?;
        RemoveReport {
            skipped: requested.saturating_sub(deleted.len()),
            deleted,
        }
    };

    let mut human = HumanOutput::new(format!("Deleted {} task(s)", report.deleted.len()));
    for task in &report.deleted {
        human.line(format!("#{} {}", task.id, task.title));
    }
    if report.skipped > 0 {
        human.warn(format!("{} id(s) did not match a task", report.skipped));
    }

    emit_success(ctx.output, "rm", &report, Some(&human))
}

pub(super) async fn run_stats(ctx: &Context) -> Result<()> {
    let board = ctx.board().await?;
    let stats: TaskStats = board.stats();

    let mut human = HumanOutput::new("Task stats");
    human.stats(stats);

    emit_success(ctx.output, "stats", &stats, Some(&human))
}

fn task_fields(human: &mut HumanOutput, board: &Board, task: &Task) {
    let row = TaskRow {
        task,
        category: board.category_for(task),
    };
    human.field("priority", task.priority.label());
    human.field("category", category_name(&row));
    if let Some(due) = task.due_label(Utc::now()) {
        human.field("due", due);
    }
    if row.category.is_none() {
        human.warn(format!("category {} does not exist", task.category_id));
    }
}

fn category_name(row: &TaskRow<'_>) -> String {
    row.category
        .map(|category| category.name.clone())
        .unwrap_or_else(|| "no category".to_string())
}

fn format_row(row: &TaskRow<'_>, now: DateTime<Utc>) -> String {
    let check = if row.task.completed { "[x]" } else { "[ ]" };
    let mut meta = vec![row.task.priority.as_str().to_string(), category_name(row)];
    if let Some(due) = row.task.due_label(now) {
        meta.push(format!("due {due}"));
    }
    format!(
        "{check} #{} {} ({})",
        row.task.id,
        row.task.title,
        meta.join(", ")
    )
}
