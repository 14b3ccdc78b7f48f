//! Expansion of a recurrence specification into concrete task occurrences.
//!
//! The first occurrence is due at the anchor. Every later due date is derived
//! from the previous one:
//! - **daily**: `interval` days later.
//! - **weekly**: `interval * 7` days later.
//! - **monthly**: `interval` calendar months later. A day-of-month that does not
//!   exist in the target month is clamped to that month's last day
//!   (Jan 31 + 1 month = Feb 28, or Feb 29 in a leap year), and because steps
//!   chain from the previous date the clamped day carries forward
//!   (Jan 31 -> Feb 28 -> Mar 28).
//!
//! Expansion stops at `max_occurrences`, at the first date past `end_date`
//! (which is not included), or at [`MAX_OCCURRENCES`], whichever comes first.

use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{Priority, RecurringId, SchedulePattern, Task, TaskId};

/// Hard ceiling on the size of one expansion.
pub const MAX_OCCURRENCES: usize = 100;

/// Describes one logical repeating task.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceSpec {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category_id: String,
    #[serde(default = "default_priority")]
    pub priority: Priority,
    pub schedule_pattern: SchedulePattern,
    pub interval: u32,
    #[serde(default)]
    pub max_occurrences: Option<u32>,
    #[serde(default)]
    pub end_date: Option<NaiveDateTime>,
}

fn default_priority() -> Priority {
    Priority::Medium
}

impl RecurrenceSpec {
    /// A spec with defaults: priority medium, every 1 unit, no limits.
    pub fn new(
        title: impl Into<String>,
        category_id: impl Into<String>,
        schedule_pattern: SchedulePattern,
    ) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category_id: category_id.into(),
            priority: default_priority(),
            schedule_pattern,
            interval: 1,
            max_occurrences: None,
            end_date: None,
        }
    }

    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    pub fn max_occurrences(mut self, max: u32) -> Self {
        self.max_occurrences = Some(max);
        self
    }

    pub fn until(mut self, end_date: NaiveDateTime) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Rejects specs that could not produce a bounded, well-formed batch.
    pub fn validate(&self, anchor: NaiveDateTime) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::missing("title"));
        }
        if self.category_id.trim().is_empty() {
            return Err(Error::missing("categoryId"));
        }
        if self.interval < 1 {
            return Err(Error::validation("interval", "must be at least 1"));
        }
        if self.max_occurrences.is_none() && self.end_date.is_none() {
            return Err(Error::validation(
                "maxOccurrences",
                "either max occurrences or an end date must be set",
            ));
        }
        if self.max_occurrences == Some(0) {
            return Err(Error::validation("maxOccurrences", "must be at least 1"));
        }
        if let Some(end) = self.end_date {
            if end < anchor {
                return Err(Error::validation(
                    "endDate",
                    format!("{} is before the first occurrence {}", end, anchor),
                ));
            }
        }
        Ok(())
    }

    fn occurrence(
        &self,
        sequence: usize,
        due: NaiveDateTime,
        recurring_id: RecurringId,
        now: NaiveDateTime,
    ) -> Task {
        let title = if sequence == 1 {
            self.title.clone()
        } else {
            format!("{} ({})", self.title, sequence)
        };
        Task {
            id: TaskId::new(),
            title,
            description: self.description.clone(),
            category_id: self.category_id.clone(),
            priority: self.priority,
            due_date: Some(due),
            completed: false,
            completed_at: None,
            created_at: now,
            archived: false,
            archived_at: None,
            is_recurring: true,
            recurring_id: Some(recurring_id),
        }
    }
}

/// Steps `from` forward by `interval` units of `pattern`.
///
/// Returns `None` when the result falls outside chrono's representable range.
pub fn next_due(
    pattern: SchedulePattern,
    interval: u32,
    from: NaiveDateTime,
) -> Option<NaiveDateTime> {
    match pattern {
        SchedulePattern::Daily => from.checked_add_signed(Duration::days(i64::from(interval))),
        SchedulePattern::Weekly => {
            from.checked_add_signed(Duration::days(i64::from(interval) * 7))
        }
        SchedulePattern::Monthly => from.checked_add_months(Months::new(interval)),
    }
}

/// Expands `spec` into its ordered occurrences, starting at `anchor`.
///
/// Nothing is stored; hand the result to
/// [`TaskRepository::append_batch`](crate::repository::TaskRepository::append_batch)
/// to insert it atomically. `now` becomes every occurrence's `created_at`.
pub fn expand(spec: &RecurrenceSpec, anchor: NaiveDateTime, now: NaiveDateTime) -> Result<Vec<Task>> {
    if let Err(e) = spec.validate(anchor) {
        tracing::warn!(title = %spec.title, error = %e, "rejected recurrence spec");
        return Err(e);
    }

    let limit = spec
        .max_occurrences
        .map(|m| m as usize)
        .unwrap_or(MAX_OCCURRENCES)
        .min(MAX_OCCURRENCES);
    let recurring_id = RecurringId::new();

    let mut occurrences = Vec::new();
    let mut due = Some(anchor);
    while let Some(current) = due {
        if occurrences.len() >= limit {
            break;
        }
        if spec.end_date.is_some_and(|end| current > end) {
            break;
        }
        occurrences.push(spec.occurrence(occurrences.len() + 1, current, recurring_id, now));
        due = next_due(spec.schedule_pattern, spec.interval, current);
    }

    tracing::debug!(
        recurring_id = %recurring_id,
        pattern = %spec.schedule_pattern,
        count = occurrences.len(),
        "expanded recurrence"
    );
    Ok(occurrences)
}
