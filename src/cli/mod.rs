//! Command-line interface for taskboard
//!
//! This module defines the CLI structure using clap derive macros.
//! Each command group is implemented in its own submodule.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::OutputOptions;
use crate::view::{Board, LoadState};

mod category;
mod init;
mod task;

/// taskboard - tasks organized by category and priority
///
/// Create, edit, filter and complete tasks stored in a local data directory.
#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(author, version, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the config file (defaults to ./.taskboard.toml)
    #[arg(long, global = true, env = "TASKBOARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory (overrides store.data_dir)
    #[arg(long, global = true, env = "TASKBOARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the default config and seed the default categories
    Init,

    /// List tasks, optionally filtered
    List {
        /// Status: all, active, completed
        #[arg(long)]
        status: Option<String>,

        /// Priority: all, high, medium, low
        #[arg(long)]
        priority: Option<String>,

        /// Category id or "all"
        #[arg(long)]
        category: Option<String>,

        /// Case-insensitive text to look for in title and description
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one task
    Show {
        /// Task id
        id: String,
    },

    /// Add a task
    Add {
        /// Task title
        #[arg(long)]
        title: String,

        /// Longer description
        #[arg(long)]
        description: Option<String>,

        /// Category id
        #[arg(long)]
        category: String,

        /// Priority: high, medium, low (defaults to tasks.default_priority)
        #[arg(long)]
        priority: Option<String>,

        /// Due date (YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339)
        #[arg(long)]
        due: Option<String>,
    },

    /// Edit a task
    Edit {
        /// Task id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Category id
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        priority: Option<String>,

        /// New due date
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },

    /// Mark a task complete, or reopen a completed one
    Toggle {
        /// Task id
        id: String,
    },

    /// Delete tasks
    Rm {
        /// Task ids
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show active/completed counts
    Stats,

    /// Category management
    #[command(subcommand)]
    Category(CategoryCommands),
}

/// Category subcommands
#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List categories
    List,

    /// Add a category
    Add {
        #[arg(long)]
        name: String,

        /// Display color, e.g. "#6366F1"
        #[arg(long)]
        color: Option<String>,

        /// Icon name, e.g. "Briefcase"
        #[arg(long)]
        icon: Option<String>,
    },

    /// Edit a category
    Edit {
        /// Category id
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        icon: Option<String>,
    },

    /// Delete a category (tasks keep their dangling reference)
    Rm {
        /// Category id
        id: String,
    },
}

/// Resolved settings shared by every command
#[derive(Debug, Clone)]
pub(crate) struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
    pub output: OutputOptions,
}

impl Context {
    /// `creating` lets an explicit `--config` path that does not exist yet
    /// resolve to the defaults, for `init` to write.
    fn resolve(
        config: Option<PathBuf>,
        data_dir: Option<PathBuf>,
        output: OutputOptions,
        creating: bool,
    ) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let (config, config_path) = match config {
            Some(path) if creating && !path.exists() => (Config::default(), path),
            Some(path) => {
                if !path.is_file() {
                    return Err(Error::InvalidConfig(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                (Config::load(&path)?, path)
            }
            None => (Config::load_from_dir(&cwd)?, cwd.join(CONFIG_FILE)),
        };

        let base = config_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        let data_dir = data_dir.unwrap_or_else(|| config.data_dir_in(&base));

        tracing::debug!(
            config = %config_path.display(),
            data_dir = %data_dir.display(),
            "resolved context"
        );

        Ok(Self {
            config,
            config_path,
            data_dir,
            output,
        })
    }

    /// Open the board and load both collections.
    pub(crate) async fn board(&self) -> Result<Board> {
        let mut board = Board::open(&self.config, &self.data_dir)?;
        if let LoadState::Failed(message) = board.load().await {
            let message = message.clone();
            return Err(match board.take_load_error() {
                Some(cause) => Error::backend(message, cause),
                None => Error::backend_msg(message),
            });
        }
        Ok(board)
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.execute())
    }

    async fn execute(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let creating = matches!(self.command, Commands::Init);
        let ctx = Context::resolve(self.config, self.data_dir, output, creating)?;

        match self.command {
            Commands::Init => init::run(&ctx).await,
            Commands::List {
                status,
                priority,
                category,
                search,
            } => {
                task::run_list(
                    &ctx,
                    task::ListOptions {
                        status,
                        priority,
                        category,
                        search,
                    },
                )
                .await
            }
            Commands::Show { id } => task::run_show(&ctx, &id).await,
            Commands::Add {
                title,
                description,
                category,
                priority,
                due,
            } => {
                task::run_add(
                    &ctx,
                    task::AddOptions {
                        title,
                        description,
                        category,
                        priority,
                        due,
                    },
                )
                .await
            }
            Commands::Edit {
                id,
                title,
                description,
                category,
                priority,
                due,
                clear_due,
            } => {
                task::run_edit(
                    &ctx,
                    task::EditOptions {
                        id,
                        title,
                        description,
                        category,
                        priority,
                        due,
                        clear_due,
                    },
                )
                .await
            }
            Commands::Toggle { id } => task::run_toggle(&ctx, &id).await,
            Commands::Rm { ids } => task::run_rm(&ctx, ids).await,
            Commands::Stats => task::run_stats(&ctx).await,
            Commands::Category(cmd) => match cmd {
                CategoryCommands::List => category::run_list(&ctx).await,
                CategoryCommands::Add { name, color, icon } => {
                    category::run_add(&ctx, name, color, icon).await
                }
                CategoryCommands::Edit {
                    id,
                    name,
                    color,
                    icon,
                } => category::run_edit(&ctx, &id, name, color, icon).await,
                CategoryCommands::Rm { id } => category::run_rm(&ctx, &id).await,
            },
        }
    }
}
