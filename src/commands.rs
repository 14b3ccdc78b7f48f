use std::io::{self, Write};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::models::{Category, CategoryDirectory, NewTask, Priority, SchedulePattern, Task, TaskId, TaskPatch};
use crate::query::{sort_tasks, SortKey};
use crate::recurrence::RecurrenceSpec;
use crate::repository::{TaskFilter, TaskRepository};
use crate::storage::Store;
use crate::summary::{Bucket, SummaryEngine, MAX_BUCKETS};

/// Everything a command needs: where data lives, what time it is, and whether
/// to print.
pub struct Context {
    pub store: Store,
    pub clock: Arc<dyn Clock>,
    pub week_start: Weekday,
    pub silent: bool,
}

impl Context {
    pub fn new(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            week_start: Weekday::Sun,
            silent: false,
        }
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    fn load(&self) -> Result<TaskRepository> {
        self.store.load_repository(self.clock.clone())
    }

    fn engine(&self) -> SummaryEngine {
        SummaryEngine::new(self.clock.now()).with_week_start(self.week_start)
    }

    fn say(&self, msg: impl AsRef<str>) {
        if !self.silent {
            println!("{}", msg.as_ref());
        }
    }

    fn warn(&self, msg: impl AsRef<str>) {
        if !self.silent {
            eprintln!("{}", msg.as_ref());
        }
    }
}

/// Parses a date or date-time typed on the command line.
///
/// Accepts `today`, `tomorrow`, `YYYY-MM-DD` (midnight), `YYYY-MM-DD HH:MM`
/// and `YYYY-MM-DDTHH:MM[:SS]`.
pub fn parse_when(field: &'static str, input: &str, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let midnight = |d: NaiveDate| d.and_hms_opt(0, 0, 0);
    let parsed = match input.trim().to_lowercase().as_str() {
        "today" => midnight(now.date()),
        "tomorrow" => midnight(now.date() + Duration::days(1)),
        s => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(midnight)
            .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").ok())
            .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dt%H:%M").ok())
            .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dt%H:%M:%S").ok()),
    };
    parsed.ok_or_else(|| {
        Error::validation(field, format!("'{}' is not a date. Use YYYY-MM-DD.", input))
    })
}

fn format_when(when: Option<NaiveDateTime>) -> String {
    match when {
        Some(t) if t.num_seconds_from_midnight() == 0 => t.format("%Y-%m-%d").to_string(),
        Some(t) => t.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

fn format_rate(rate: f64) -> String {
    format!("{:.0}%", rate)
}

fn warn_unknown_category(ctx: &Context, directory: &CategoryDirectory, category_id: &str) {
    if !directory.is_empty() && !directory.contains(category_id) {
        ctx.warn(format!(
            "Category '{}' is not in the category directory.",
            category_id
        ));
    }
}

/// Adds a single task.
pub fn cmd_add(
    ctx: &Context,
    title: String,
    description: Option<String>,
    category: String,
    priority: Option<Priority>,
    due: Option<String>,
) -> Result<TaskId> {
    let now = ctx.clock.now();
    let due_date = due.map(|d| parse_when("due", &d, now)).transpose()?;
    let directory = ctx.store.load_categories()?;
    warn_unknown_category(ctx, &directory, &category);

    let mut repo = ctx.load()?;
    let task = repo.create(NewTask {
        title,
        description: description.unwrap_or_default(),
        category_id: category,
        priority: priority.unwrap_or_default(),
        due_date,
    })?;
    ctx.store.save_repository(&repo)?;
    ctx.say(format!("Task added (id = {})", task.id.short()));
    Ok(task.id)
}

/// Options for [`cmd_recur`].
#[derive(Debug, Clone)]
pub struct RecurOptions {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub priority: Option<Priority>,
    pub pattern: SchedulePattern,
    pub every: u32,
    pub count: Option<u32>,
    pub until: Option<String>,
    /// First due date; today at midnight when absent.
    pub start: Option<String>,
}

/// Creates a run of recurring tasks in one batch.
pub fn cmd_recur(ctx: &Context, opts: RecurOptions) -> Result<Vec<TaskId>> {
    let now = ctx.clock.now();
    let anchor = parse_when("start", opts.start.as_deref().unwrap_or("today"), now)?;
    let end_date = opts.until.map(|u| parse_when("until", &u, now)).transpose()?;
    let directory = ctx.store.load_categories()?;
    warn_unknown_category(ctx, &directory, &opts.category);

    let spec = RecurrenceSpec {
        title: opts.title,
        description: opts.description.unwrap_or_default(),
        category_id: opts.category,
        priority: opts.priority.unwrap_or(Priority::Medium),
        schedule_pattern: opts.pattern,
        interval: opts.every,
        max_occurrences: opts.count,
        end_date,
    };

    let mut repo = ctx.load()?;
    let created = repo.create_recurring(&spec, anchor)?;
    ctx.store.save_repository(&repo)?;

    if let (Some(first), Some(last)) = (created.first(), created.last()) {
        ctx.say(format!(
            "Created {} {} tasks due {} through {}",
            created.len(),
            spec.schedule_pattern,
            format_when(first.due_date),
            format_when(last.due_date),
        ));
    }
    Ok(created.into_iter().map(|t| t.id).collect())
}

/// Filters for [`cmd_list`].
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Include completed tasks.
    pub all: bool,
    /// Show the archive instead of the active list.
    pub archived: bool,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: SortKey,
}

/// Returns the tasks a list invocation would show, in display order.
pub fn list_tasks(ctx: &Context, opts: &ListOptions) -> Result<Vec<Task>> {
    let repo = ctx.load()?;
    let directory = ctx.store.load_categories()?;

    let mut filter = TaskFilter::default().archived(opts.archived);
    if !opts.all && !opts.archived {
        filter = filter.completed(false);
    }
    if let Some(c) = &opts.category {
        filter = filter.category(c.clone());
    }
    if let Some(q) = &opts.search {
        filter = filter.search(q.clone());
    }

    let mut tasks = repo.list(&filter);
    sort_tasks(&mut tasks, opts.sort, &directory);
    Ok(tasks)
}

/// Prints tasks in a table.
pub fn cmd_list(ctx: &Context, opts: ListOptions) -> Result<()> {
    let tasks = list_tasks(ctx, &opts)?;
    if tasks.is_empty() {
        ctx.say("No tasks found.");
        return Ok(());
    }
    let directory = ctx.store.load_categories()?;
    let today = ctx.clock.now().date();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Title").add_attribute(Attribute::Bold),
            Cell::new("Category").add_attribute(Attribute::Bold),
            Cell::new("Priority").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    for t in &tasks {
        let overdue = !t.completed && t.due_date.is_some_and(|d| d.date() < today);
        let priority_color = match t.priority {
            Priority::High => Color::Red,
            Priority::Medium => Color::Yellow,
            Priority::Low => Color::Green,
        };
        let (status, status_color) = if t.archived {
            ("Archived", Color::Grey)
        } else if t.completed {
            ("Done", Color::Green)
        } else {
            ("Pending", Color::Yellow)
        };
        let title = if t.is_recurring {
            format!("{} ↻", t.title)
        } else {
            t.title.clone()
        };

        table.add_row(vec![
            Cell::new(t.id.short()),
            Cell::new(title),
            Cell::new(directory.name_of(&t.category_id)),
            Cell::new(t.priority).fg(priority_color),
            Cell::new(format_when(t.due_date)).fg(if overdue { Color::Red } else { Color::Reset }),
            Cell::new(status).fg(status_color),
        ]);
    }

    ctx.say(format!("{table}"));
    ctx.say(format!("{} tasks found", tasks.len()));
    Ok(())
}

/// Prints every field of one task.
pub fn cmd_show(ctx: &Context, id: &str) -> Result<Task> {
    let repo = ctx.load()?;
    let task = repo.get(repo.resolve(id)?)?;
    let directory = ctx.store.load_categories()?;

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    let rows = [
        ("ID", task.id.to_string()),
        ("Title", task.title.clone()),
        ("Description", task.description.clone()),
        ("Category", directory.name_of(&task.category_id).to_string()),
        ("Priority", task.priority.to_string()),
        ("Due", format_when(task.due_date)),
        ("Completed", task.completed.to_string()),
        ("Completed at", format_when(task.completed_at)),
        ("Created at", format_when(Some(task.created_at))),
        ("Archived at", format_when(task.archived_at)),
        (
            "Recurring",
            task.recurring_id.map(|r| r.to_string()).unwrap_or_else(|| "-".into()),
        ),
    ];
    for (k, v) in rows {
        table.add_row(vec![Cell::new(k).add_attribute(Attribute::Bold), Cell::new(v)]);
    }
    ctx.say(format!("{table}"));
    Ok(task)
}

/// Flips a task between pending and done.
pub fn cmd_toggle(ctx: &Context, id: &str) -> Result<Task> {
    let mut repo = ctx.load()?;
    let id = repo.resolve(id)?;
    let task = repo.toggle_complete(id)?;
    ctx.store.save_repository(&repo)?;
    if task.completed {
        ctx.say(format!("Task {} completed!", task.id.short()));
    } else {
        ctx.say(format!("Task {} marked as pending.", task.id.short()));
    }
    Ok(task)
}

/// Fields [`cmd_edit`] may change. `due` of `"none"` clears the deadline.
#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<Priority>,
    pub due: Option<String>,
}

/// Edits an existing task's details.
pub fn cmd_edit(ctx: &Context, id: &str, opts: EditOptions) -> Result<Task> {
    let now = ctx.clock.now();
    let due_date = match opts.due.as_deref() {
        None => None,
        Some(d) if d.eq_ignore_ascii_case("none") => Some(None),
        Some(d) => Some(Some(parse_when("due", d, now)?)),
    };
    if let Some(c) = &opts.category {
        warn_unknown_category(ctx, &ctx.store.load_categories()?, c);
    }

    let mut repo = ctx.load()?;
    let id = repo.resolve(id)?;
    let task = repo.update(
        id,
        TaskPatch {
            title: opts.title,
            description: opts.description,
            category_id: opts.category,
            priority: opts.priority,
            due_date,
            completed: None,
        },
    )?;
    ctx.store.save_repository(&repo)?;
    ctx.say(format!("Task {} updated.", task.id.short()));
    Ok(task)
}

/// Removes a task from the repository permanently.
pub fn cmd_remove(ctx: &Context, id: &str) -> Result<()> {
    let mut repo = ctx.load()?;
    let id = repo.resolve(id)?;
    repo.delete(id)?;
    ctx.store.save_repository(&repo)?;
    ctx.say(format!("Task {} removed.", id.short()));
    Ok(())
}

/// Archives one task, or every completed active task when `id` is `None`.
pub fn cmd_archive(ctx: &Context, id: Option<&str>) -> Result<usize> {
    let mut repo = ctx.load()?;
    let ids = match id {
        Some(id) => vec![repo.resolve(id)?],
        None => repo
            .list(&TaskFilter::default().completed(true).archived(false))
            .into_iter()
            .map(|t| t.id)
            .collect(),
    };
    for id in &ids {
        repo.archive(*id)?;
    }
    ctx.store.save_repository(&repo)?;
    ctx.say(format!("Archived {} task(s).", ids.len()));
    Ok(ids.len())
}

/// Moves an archived task back to the active list.
pub fn cmd_restore(ctx: &Context, id: &str) -> Result<Task> {
    let mut repo = ctx.load()?;
    let id = repo.resolve(id)?;
    let task = repo.restore(id)?;
    ctx.store.save_repository(&repo)?;
    ctx.say(format!("Task {} restored.", task.id.short()));
    Ok(task)
}

fn print_buckets(ctx: &Context, buckets: &[Bucket], json: bool) -> Result<()> {
    if json {
        ctx.say(serde_json::to_string_pretty(buckets)?);
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Period", "Completed", "Due", "Rate"]);
    for b in buckets {
        table.add_row(vec![
            b.label.clone(),
            b.completed.to_string(),
            b.total.to_string(),
            format_rate(b.completion_rate),
        ]);
    }
    ctx.say(format!("{table}"));
    Ok(())
}

/// Completed versus due per day, for the last `days` days.
pub fn cmd_summary_daily(ctx: &Context, days: usize, json: bool) -> Result<Vec<Bucket>> {
    check_bucket_count("days", days)?;
    let repo = ctx.load()?;
    let buckets = ctx.engine().daily_summary(repo.tasks(), days);
    print_buckets(ctx, &buckets, json)?;
    Ok(buckets)
}

fn check_bucket_count(field: &'static str, count: usize) -> Result<()> {
    if count > MAX_BUCKETS {
        return Err(Error::validation(
            field,
            format!("at most {} buckets can be shown", MAX_BUCKETS),
        ));
    }
    Ok(())
}

/// Completed versus due per week, for the last `weeks` weeks.
pub fn cmd_summary_weekly(ctx: &Context, weeks: usize, json: bool) -> Result<Vec<Bucket>> {
    check_bucket_count("weeks", weeks)?;
    let repo = ctx.load()?;
    let buckets = ctx.engine().weekly_summary(repo.tasks(), weeks);
    print_buckets(ctx, &buckets, json)?;
    Ok(buckets)
}

pub fn cmd_summary_categories(ctx: &Context, json: bool) -> Result<()> {
    let repo = ctx.load()?;
    let directory = ctx.store.load_categories()?;
    let stats = ctx.engine().category_breakdown(repo.tasks(), &directory);
    if json {
        ctx.say(serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    if stats.is_empty() {
        ctx.say("No tasks found.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["Category", "Completed", "Total", "Rate"]);
    for s in stats {
        table.add_row(vec![
            s.name.unwrap_or(s.category_id),
            s.completed.to_string(),
            s.total.to_string(),
            format_rate(s.completion_rate),
        ]);
    }
    ctx.say(format!("{table}"));
    Ok(())
}

pub fn cmd_summary_overall(ctx: &Context, json: bool) -> Result<()> {
    let repo = ctx.load()?;
    let stats = ctx.engine().overall_stats(repo.tasks());
    if json {
        ctx.say(serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["", "Completed", "Due / Total", "Rate"]);
    table.add_row(vec![
        "Today".to_string(),
        stats.today.completed.to_string(),
        stats.today.due.to_string(),
        format_rate(stats.today.completion_rate),
    ]);
    table.add_row(vec![
        "This week".to_string(),
        stats.week.completed.to_string(),
        stats.week.due.to_string(),
        format_rate(stats.week.completion_rate),
    ]);
    table.add_row(vec![
        "Overall".to_string(),
        stats.overall.completed.to_string(),
        stats.overall.total.to_string(),
        format_rate(stats.overall.completion_rate),
    ]);
    ctx.say(format!("{table}"));
    Ok(())
}

/// Headline counters plus pending tasks per category.
pub fn cmd_summary_progress(ctx: &Context, json: bool) -> Result<()> {
    let repo = ctx.load()?;
    let directory = ctx.store.load_categories()?;
    let engine = ctx.engine();
    let progress = engine.progress(repo.tasks());
    let per_category = engine.pending_by_category(repo.tasks(), &directory);
    if json {
        let value = serde_json::json!({ "progress": progress, "pendingByCategory": per_category });
        ctx.say(serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    ctx.say(format!(
        "{} total, {} completed, {} due today, {} overdue",
        progress.total, progress.completed, progress.due_today, progress.overdue
    ));
    if !per_category.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec!["Category", "Pending"]);
        for c in per_category {
            table.add_row(vec![
                directory.name_of(&c.category_id).to_string(),
                c.pending.to_string(),
            ]);
        }
        ctx.say(format!("{table}"));
    }
    Ok(())
}

/// Adds or replaces a category in the directory.
pub fn cmd_category_add(ctx: &Context, id: String, name: Option<String>, color: Option<String>, icon: Option<String>) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::missing("id"));
    }
    let mut directory = ctx.store.load_categories()?;
    let existed = directory.contains(&id);
    directory.upsert(Category {
        name: name.unwrap_or_else(|| id.clone()),
        id: id.clone(),
        color: color.unwrap_or_default(),
        icon: icon.unwrap_or_default(),
    });
    ctx.store.save_categories(&directory)?;
    if existed {
        ctx.say(format!("Category '{}' updated.", id));
    } else {
        ctx.say(format!("Category '{}' added.", id));
    }
    Ok(())
}

pub fn cmd_category_list(ctx: &Context) -> Result<()> {
    let directory = ctx.store.load_categories()?;
    if directory.is_empty() {
        ctx.say("No categories found.");
        return Ok(());
    }
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Name", "Color", "Icon"]);
    for c in directory.iter() {
        table.add_row(vec![c.id.clone(), c.name.clone(), c.color.clone(), c.icon.clone()]);
    }
    ctx.say(format!("{table}"));
    Ok(())
}

/// Removes a category from the directory. Tasks keep their category id.
pub fn cmd_category_remove(ctx: &Context, id: &str) -> Result<()> {
    let mut directory = ctx.store.load_categories()?;
    if !directory.remove(id) {
        return Err(Error::validation("category", format!("'{}' not found", id)));
    }
    ctx.store.save_categories(&directory)?;
    ctx.say(format!("Category '{}' removed.", id));
    Ok(())
}

/// Deletes all tasks and categories, asking first unless `force` is set.
pub fn cmd_reset(ctx: &Context, force: bool) -> Result<()> {
    if !force {
        print!("Are you sure you want to delete all tasks and categories? This cannot be undone. [y/N] ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        if input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return Ok(());
        }
    }
    ctx.store.reset()?;
    ctx.say("Database reset successfully.");
    Ok(())
}
