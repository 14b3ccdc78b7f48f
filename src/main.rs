//! # tasktally
//!
//! Terminal to-do list with recurring tasks and completion statistics.
//!
//! ## Usage
//!
//! ```bash
//! # Categories are referenced by id
//! tasktally category add work --name Work --color "#3b82f6"
//!
//! # A single task
//! tasktally add "Write report" --category work --priority high --due 2025-12-01
//!
//! # Five daily standups starting today
//! tasktally recur "Standup" --category work --pattern daily --count 5
//!
//! # Every other Monday until June
//! tasktally recur "Review" --category work --pattern weekly --every 2 --start 2025-03-03 --until 2025-06-30
//!
//! # Listing, toggling, archiving
//! tasktally list --sort priority --search report
//! tasktally toggle <ID>
//! tasktally archive            # archives every completed task
//! tasktally list --archived
//! tasktally restore <ID>
//!
//! # Statistics
//! tasktally summary daily --days 7
//! tasktally summary weekly --weeks 4
//! tasktally summary categories
//! tasktally summary overall --json
//! ```
//!
//! IDs may be abbreviated to any unique prefix.
//!
//! Data lives in `~/.local/share/tasktally/` (per platform data directory);
//! set `TASKS_DB` to use another directory. `TASKS_WEEK_START` picks the first
//! day of the week for weekly statistics and `TASKS_LOG` sets the log filter.

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};

use tasktally::clock::SystemClock;
use tasktally::commands::*;
use tasktally::config::Config;
use tasktally::logging;
use tasktally::models::{Priority, SchedulePattern};
use tasktally::query::SortKey;
use tasktally::storage::Store;

#[derive(Parser)]
#[command(name = "tasktally")]
#[command(about = "To-do list with recurring tasks and completion statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Category id
        #[arg(short, long)]
        category: String,
        /// Longer description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// low, medium or high
        #[arg(short, long)]
        priority: Option<Priority>,
        /// Due date in YYYY-MM-DD (or "today", "tomorrow")
        #[arg(short, long)]
        due: Option<String>,
    },
    /// Create a run of recurring tasks
    Recur {
        /// Task title
        title: String,
        /// Category id
        #[arg(short, long)]
        category: String,
        /// Longer description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// low, medium or high (default medium)
        #[arg(short, long)]
        priority: Option<Priority>,
        /// daily, weekly or monthly
        #[arg(short = 'P', long, default_value = "daily")]
        pattern: SchedulePattern,
        /// Step between occurrences, in pattern units
        #[arg(short, long, default_value_t = 1)]
        every: u32,
        /// Maximum number of occurrences
        #[arg(short = 'n', long)]
        count: Option<u32>,
        /// Last allowed due date
        #[arg(short, long)]
        until: Option<String>,
        /// First due date (default today)
        #[arg(short, long)]
        start: Option<String>,
    },
    /// List tasks
    List {
        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
        /// Show archived tasks instead
        #[arg(long)]
        archived: bool,
        /// Only this category id
        #[arg(short, long)]
        category: Option<String>,
        /// Search titles and descriptions
        #[arg(short, long)]
        search: Option<String>,
        /// due, priority, category, status or created
        #[arg(long, default_value = "due")]
        sort: SortKey,
    },
    /// Show every field of a task
    Show { id: String },
    /// Mark a task done, or pending again
    Toggle { id: String },
    /// Edit a task
    Edit {
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// New category id
        #[arg(short, long)]
        category: Option<String>,
        /// New priority
        #[arg(short, long)]
        priority: Option<Priority>,
        /// New due date, or "none" to clear it
        #[arg(short, long)]
        due: Option<String>,
    },
    /// Remove a task permanently
    Remove { id: String },
    /// Archive a task, or every completed task when no id is given
    Archive { id: Option<String> },
    /// Restore an archived task
    Restore { id: String },
    /// Completion statistics
    Summary {
        #[command(subcommand)]
        command: SummaryCommands,
    },
    /// Manage the category directory
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
    /// Reset the database (delete all tasks and categories)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum SummaryCommands {
    /// Completed vs. due per day
    Daily {
        #[arg(short, long, default_value_t = 7)]
        days: usize,
        #[arg(long)]
        json: bool,
    },
    /// Completed vs. due per week
    Weekly {
        #[arg(short, long, default_value_t = 4)]
        weeks: usize,
        #[arg(long)]
        json: bool,
    },
    /// Completion per category
    Categories {
        #[arg(long)]
        json: bool,
    },
    /// Today, this week and all time
    Overall {
        #[arg(long)]
        json: bool,
    },
    /// Totals, due today, overdue and pending per category
    Progress {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// Add or update a category
    Add {
        id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        color: Option<String>,
        #[arg(short, long)]
        icon: Option<String>,
    },
    /// List categories
    List,
    /// Remove a category
    Remove { id: String },
}

fn run(cli: Cli, ctx: &Context) -> tasktally::Result<()> {
    match cli.command {
        Commands::Add { title, category, description, priority, due } => {
            cmd_add(ctx, title, description, category, priority, due).map(|_| ())
        }
        Commands::Recur { title, category, description, priority, pattern, every, count, until, start } => {
            let opts = RecurOptions { title, description, category, priority, pattern, every, count, until, start };
            cmd_recur(ctx, opts).map(|_| ())
        }
        Commands::List { all, archived, category, search, sort } => {
            cmd_list(ctx, ListOptions { all, archived, category, search, sort })
        }
        Commands::Show { id } => cmd_show(ctx, &id).map(|_| ()),
        Commands::Toggle { id } => cmd_toggle(ctx, &id).map(|_| ()),
        Commands::Edit { id, title, description, category, priority, due } => {
            let opts = EditOptions { title, description, category, priority, due };
            cmd_edit(ctx, &id, opts).map(|_| ())
        }
        Commands::Remove { id } => cmd_remove(ctx, &id),
        Commands::Archive { id } => cmd_archive(ctx, id.as_deref()).map(|_| ()),
        Commands::Restore { id } => cmd_restore(ctx, &id).map(|_| ()),
        Commands::Summary { command } => match command {
            SummaryCommands::Daily { days, json } => cmd_summary_daily(ctx, days, json).map(|_| ()),
            SummaryCommands::Weekly { weeks, json } => cmd_summary_weekly(ctx, weeks, json).map(|_| ()),
            SummaryCommands::Categories { json } => cmd_summary_categories(ctx, json),
            SummaryCommands::Overall { json } => cmd_summary_overall(ctx, json),
            SummaryCommands::Progress { json } => cmd_summary_progress(ctx, json),
        },
        Commands::Category { command } => match command {
            CategoryCommands::Add { id, name, color, icon } => cmd_category_add(ctx, id, name, color, icon),
            CategoryCommands::List => cmd_category_list(ctx),
            CategoryCommands::Remove { id } => cmd_category_remove(ctx, &id),
        },
        Commands::Reset { force } => cmd_reset(ctx, force),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "tasktally", &mut io::stdout());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(&config.log_filter);
    tracing::debug!(data_dir = %config.data_dir.display(), "starting");

    let store = match Store::open(&config.data_dir) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let ctx = Context::new(store, Arc::new(SystemClock)).with_week_start(config.week_start);

    match run(cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
