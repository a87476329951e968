//! taskboard category command implementations.

use serde::Serialize;

use crate::category::{Category, CategoryInput, CategoryPatch};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};

use super::Context;

#[derive(Serialize)]
struct CategoryEntry<'a> {
    #[serde(flatten)]
    category: &'a Category,
    task_count: usize,
}

#[derive(Serialize)]
struct RemoveReport {
    deleted: Category,
    orphaned_tasks: usize,
}

pub(super) async fn run_list(ctx: &Context) -> Result<()> {
    let board = ctx.board().await?;
    let entries: Vec<CategoryEntry<'_>> = board
        .categories()
        .iter()
        .map(|category| CategoryEntry {
            category,
            task_count: board
                .tasks()
                .iter()
                .filter(|task| task.category_id == category.id)
                .count(),
        })
        .collect();

    let mut human = HumanOutput::new(format!("Categories ({})", entries.len()));
    for entry in &entries {
        human.line(format!(
            "#{} {} [{} {}] {} task(s)",
            entry.category.id,
            entry.category.name,
            entry.category.icon,
            entry.category.color,
            entry.task_count
        ));
    }
    if entries.is_empty() {
        human.suggest("taskboard init");
    }

    emit_success(ctx.output, "category list", &entries, Some(&human))
}

pub(super) async fn run_add(
    ctx: &Context,
    name: String,
    color: Option<String>,
    icon: Option<String>,
) -> Result<()> {
    let mut board = ctx.board().await?;
    let mut input = CategoryInput::new(name);
    if let Some(color) = color {
        input = input.with_color(color);
    }
    if let Some(icon) = icon {
        input = input.with_icon(icon);
    }

    let category = board.create_category(input).await?;
    let mut human = HumanOutput::new(format!(
        "Category added: #{} {}",
        category.id, category.name
    ));
    human.field("color", &category.color);
    human.field("icon", &category.icon);

    emit_success(ctx.output, "category add", &category, Some(&human))
}

pub(super) async fn run_edit(
    ctx: &Context,
    id: &str,
    name: Option<String>,
    color: Option<String>,
    icon: Option<String>,
) -> Result<()> {
    let patch = CategoryPatch { name, color, icon };
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to change (use --name, --color or --icon)".to_string(),
        ));
    }

    let mut board = ctx.board().await?;
    let category = board.update_category(id, patch).await?;
    let mut human = HumanOutput::new(format!(
        "Category updated: #{} {}",
        category.id, category.name
    ));
    human.field("color", &category.color);
    human.field("icon", &category.icon);

    emit_success(ctx.output, "category edit", &category, Some(&human))
}

pub(super) async fn run_rm(ctx: &Context, id: &str) -> Result<()> {
    let mut board = ctx.board().await?;
    let deleted = board.delete_category(id).await?;
    let orphaned_tasks = board
        .tasks()
        .iter()
        .filter(|task| task.category_id == deleted.id)
        .count();

    let mut human = HumanOutput::new(format!(
        "Category deleted: #{} {}",
        deleted.id, deleted.name
    ));
    if orphaned_tasks > 0 {
        human.warn(format!(
            "{orphaned_tasks} task(s) now have no category"
        ));
    }

    let report = RemoveReport {
        deleted,
        orphaned_tasks,
    };
    emit_success(ctx.output, "category rm", &report, Some(&human))
}
