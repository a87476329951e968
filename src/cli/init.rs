//! taskboard init command implementation
//!
//! Writes the default config, creates the data directory and seeds the
//! default categories into an empty category store.

use std::path::PathBuf;

use crate::category::default_categories;
use crate::config::{Config, StoreBackend};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::storage::Storage;

use super::Context;

#[derive(serde::Serialize)]
struct InitReport {
    config_path: PathBuf,
    data_dir: PathBuf,
    created: InitCreated,
    seeded_categories: usize,
}

#[derive(serde::Serialize)]
struct InitCreated {
    config: bool,
    data_dir: bool,
}

pub(super) async fn run(ctx: &Context) -> Result<()> {
    let created_config = ensure_config(ctx)?;

    let storage = Storage::new(&ctx.data_dir);
    let created_data_dir = !storage.is_initialized();
    storage.init()?;

    let mut board = ctx.board().await?;
    let mut seeded = 0;
    if board.categories().is_empty() {
        for input in default_categories() {
            board.create_category(input).await?;
            seeded += 1;
        }
    }

    let report = InitReport {
        config_path: ctx.config_path.clone(),
        data_dir: ctx.data_dir.clone(),
        created: InitCreated {
            config: created_config,
            data_dir: created_data_dir,
        },
        seeded_categories: seeded,
    };

    let header = if !created_config && !created_data_dir && seeded == 0 {
        "taskboard init: nothing to do".to_string()
    } else {
        "taskboard init: initialized".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.field("config", ctx.config_path.display());
    human.field("data dir", ctx.data_dir.display());
    human.field("seeded categories", seeded);
    if ctx.config.store.backend()? == StoreBackend::Memory {
        human.warn("store.backend is \"memory\": nothing is kept between runs");
    }
    human.suggest("taskboard category list");
    human.suggest("taskboard add --title \"...\" --category 1");

    emit_success(ctx.output, "init", &report, Some(&human))
}

fn ensure_config(ctx: &Context) -> Result<bool> {
    if ctx.config_path.exists() {
        return Ok(false);
    }
    if let Some(parent) = ctx.config_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Config::default().save(&ctx.config_path)?;
    tracing::info!(path = %ctx.config_path.display(), "wrote default config");
    Ok(true)
}
