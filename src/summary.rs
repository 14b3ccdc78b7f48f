//! Completion statistics computed from a snapshot of tasks.
//!
//! Every function is a pure read over a task slice and the engine's reference
//! "now". Conventions shared by all of them:
//!
//! - A task counts as *completed* in a period when its `completed_at` falls in
//!   that period, and as *due* when its `due_date` does. A task without a
//!   `due_date` is never due; a task without a `completed_at` is never completed.
//! - Weeks start on the engine's `week_start` (Sunday unless configured) and
//!   run seven calendar days.
//! - `completion_rate` is `completed / total * 100`, `0` when `total` is zero,
//!   and capped at `100`. It is never rounded here.
//! - Daily and weekly summaries produce at most [`MAX_BUCKETS`] buckets, and
//!   drop any bucket that would start before the earliest representable date.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::Serialize;

use crate::models::{CategoryDirectory, Task};

/// Upper bound on the number of buckets one summary returns.
pub const MAX_BUCKETS: usize = 3660;

/// Completion rate as a percentage in `[0, 100]`.
pub fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (completed as f64 / total as f64 * 100.0).min(100.0)
}

/// First day of the week containing `date`.
pub fn start_of_week(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset = (7 + date.weekday().num_days_from_monday() as i64
        - week_start.num_days_from_monday() as i64)
        % 7;
    date.checked_sub_signed(Duration::days(offset)).unwrap_or(NaiveDate::MIN)
}

fn last_of_week(first: NaiveDate) -> NaiveDate {
    first.checked_add_signed(Duration::days(6)).unwrap_or(NaiveDate::MAX)
}

/// One day or one week of activity.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    /// First day of the bucket.
    pub date: NaiveDate,
    pub label: String,
    pub completed: usize,
    pub total: usize,
    pub completion_rate: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStat {
    pub category_id: String,
    /// Directory name, when the category is known.
    pub name: Option<String>,
    pub color: Option<String>,
    pub total: usize,
    pub completed: usize,
    pub completion_rate: f64,
}

/// Due-versus-completed counts for a calendar period.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub completed: usize,
    pub due: usize,
    pub completion_rate: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TotalStats {
    pub completed: usize,
    pub total: usize,
    pub completion_rate: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OverallStats {
    pub today: PeriodStats,
    pub week: PeriodStats,
    pub overall: TotalStats,
}

/// Headline counters for the task list sidebar.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub total: usize,
    pub completed: usize,
    /// Pending tasks due today.
    pub due_today: usize,
    /// Pending tasks whose due day has passed.
    pub overdue: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    pub category_id: String,
    pub pending: usize,
}

/// Computes statistics relative to a fixed "now".
#[derive(Debug, Clone, Copy)]
pub struct SummaryEngine {
    now: NaiveDateTime,
    week_start: Weekday,
}

impl SummaryEngine {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now,
            week_start: Weekday::Sun,
        }
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    fn completed_between(tasks: &[Task], first: NaiveDate, last: NaiveDate) -> usize {
        tasks
            .iter()
            .filter_map(|t| t.completed_at)
            .filter(|at| (first..=last).contains(&at.date()))
            .count()
    }

    fn due_between(tasks: &[Task], first: NaiveDate, last: NaiveDate) -> usize {
        tasks
            .iter()
            .filter_map(|t| t.due_date)
            .filter(|due| (first..=last).contains(&due.date()))
            .count()
    }

    /// One bucket per calendar day for the `days` days ending today, oldest first.
    ///
    /// `days` is capped at [`MAX_BUCKETS`].
    pub fn daily_summary(&self, tasks: &[Task], days: usize) -> Vec<Bucket> {
        let today = self.today();
        (0..days.min(MAX_BUCKETS))
            .rev()
            .filter_map(|back| today.checked_sub_signed(Duration::days(back as i64)))
            .map(|day| {
                let completed = Self::completed_between(tasks, day, day);
                let total = Self::due_between(tasks, day, day);
                Bucket {
                    date: day,
                    label: day.format("%b %d").to_string(),
                    completed,
                    total,
                    completion_rate: completion_rate(completed, total),
                }
            })
            .collect()
    }

    /// One bucket per week for the `weeks` weeks ending with the current one,
    /// oldest first.
    pub fn weekly_summary(&self, tasks: &[Task], weeks: usize) -> Vec<Bucket> {
        let current = start_of_week(self.today(), self.week_start);
        (0..weeks.min(MAX_BUCKETS))
            .rev()
            .filter_map(|back| current.checked_sub_signed(Duration::weeks(back as i64)))
            .map(|first| {
                let last = last_of_week(first);
                let completed = Self::completed_between(tasks, first, last);
                let total = Self::due_between(tasks, first, last);
                Bucket {
                    date: first,
                    label: format!("{} - {}", first.format("%b %d"), last.format("%b %d")),
                    completed,
                    total,
                    completion_rate: completion_rate(completed, total),
                }
            })
            .collect()
    }

    /// Totals per category, omitting categories without tasks.
    ///
    /// Here `completed` counts tasks whose `completed` flag is set. Categories
    /// are listed in directory order, followed by ids the directory does not
    /// know, sorted.
    pub fn category_breakdown(&self, tasks: &[Task], directory: &CategoryDirectory) -> Vec<CategoryStat> {
        let mut counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for task in tasks {
            let entry = counts.entry(task.category_id.as_str()).or_default();
            entry.0 += 1;
            if task.completed {
                entry.1 += 1;
            }
        }

        let stat = |id: &str, (total, completed): (usize, usize)| {
            let category = directory.get(id);
            CategoryStat {
                category_id: id.to_string(),
                name: category.map(|c| c.name.clone()),
                color: category.map(|c| c.color.clone()),
                total,
                completed,
                completion_rate: completion_rate(completed, total),
            }
        };

        let mut stats: Vec<CategoryStat> = directory
            .iter()
            .filter_map(|c| counts.remove(c.id.as_str()).map(|n| stat(&c.id, n)))
            .collect();
        stats.extend(counts.into_iter().map(|(id, n)| stat(id, n)));
        stats
    }

    /// Today, this week and all-time completion figures.
    ///
    /// The overall block counts every task and its `completed` flag.
    pub fn overall_stats(&self, tasks: &[Task]) -> OverallStats {
        let today = self.today();
        let week_first = start_of_week(today, self.week_start);
        let week_last = last_of_week(week_first);

        let period = |first, last| {
            let completed = Self::completed_between(tasks, first, last);
            let due = Self::due_between(tasks, first, last);
            PeriodStats {
                completed,
                due,
                completion_rate: completion_rate(completed, due),
            }
        };

        let completed = tasks.iter().filter(|t| t.completed).count();
        OverallStats {
            today: period(today, today),
            week: period(week_first, week_last),
            overall: TotalStats {
                completed,
                total: tasks.len(),
                completion_rate: completion_rate(completed, tasks.len()),
            },
        }
    }

    pub fn progress(&self, tasks: &[Task]) -> Progress {
        let today = self.today();
        let pending_due = || {
            tasks
                .iter()
                .filter(|t| !t.completed)
                .filter_map(|t| t.due_date.map(|d| d.date()))
        };
        Progress {
            total: tasks.len(),
            completed: tasks.iter().filter(|t| t.completed).count(),
            due_today: pending_due().filter(|d| *d == today).count(),
            overdue: pending_due().filter(|d| *d < today).count(),
        }
    }

    /// Pending task count for every directory category, zeros included.
    pub fn pending_by_category(&self, tasks: &[Task], directory: &CategoryDirectory) -> Vec<CategoryCount> {
        directory
            .iter()
            .map(|c| CategoryCount {
                category_id: c.id.clone(),
                pending: tasks
                    .iter()
                    .filter(|t| t.category_id == c.id && !t.completed)
                    .count(),
            })
            .collect()
    }
}
