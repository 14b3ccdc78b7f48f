use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::models::{CategoryDirectory, Task};

/// Orderings offered by the task list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Earliest deadline first; tasks without one go last.
    #[default]
    Due,
    /// Highest priority first.
    Priority,
    /// Alphabetical by category display name.
    Category,
    /// Pending before completed.
    Status,
    /// Newest first.
    Created,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortKey::Due => "due",
            SortKey::Priority => "priority",
            SortKey::Category => "category",
            SortKey::Status => "status",
            SortKey::Created => "created",
        };
        f.write_str(s)
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "due" | "duedate" => Ok(SortKey::Due),
            "priority" => Ok(SortKey::Priority),
            "category" => Ok(SortKey::Category),
            "status" => Ok(SortKey::Status),
            "created" => Ok(SortKey::Created),
            _ => Err(format!(
                "unknown sort key '{}'. Supported: due, priority, category, status, created.",
                s
            )),
        }
    }
}

fn compare(a: &Task, b: &Task, key: SortKey, directory: &CategoryDirectory) -> Ordering {
    match key {
        SortKey::Due => match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::Priority => b.priority.cmp(&a.priority),
        SortKey::Category => directory
            .name_of(&a.category_id)
            .cmp(directory.name_of(&b.category_id)),
        SortKey::Status => a.completed.cmp(&b.completed),
        SortKey::Created => b.created_at.cmp(&a.created_at),
    }
}

/// Sorts tasks in place. Ties keep their existing order.
pub fn sort_tasks(tasks: &mut [Task], key: SortKey, directory: &CategoryDirectory) {
    tasks.sort_by(|a, b| compare(a, b, key, directory));
}
