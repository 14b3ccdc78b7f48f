//! The owned, in-memory task collection.
//!
//! `TaskRepository` is the only place tasks are mutated. Every read hands out
//! clones, so a previously returned listing never reflects later changes.
//! The repository is not internally synchronized; concurrent callers share it
//! through [`SharedRepository`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::models::{NewTask, Task, TaskId, TaskPatch};
use crate::recurrence::{self, RecurrenceSpec};

/// A repository shared between threads. Every access takes the lock, so
/// mutations never interleave.
pub type SharedRepository = Arc<Mutex<TaskRepository>>;

/// Predicate for [`TaskRepository::list`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub category_id: Option<String>,
    pub completed: Option<bool>,
    pub archived: Option<bool>,
    /// Case-insensitive substring of the title or description.
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(category) = &self.category_id {
            if &task.category_id != category {
                return false;
            }
        }
        if self.completed.is_some_and(|c| c != task.completed) {
            return false;
        }
        if self.archived.is_some_and(|a| a != task.archived) {
            return false;
        }
        if let Some(query) = &self.search {
            let query = query.to_lowercase();
            if !task.title.to_lowercase().contains(&query)
                && !task.description.to_lowercase().contains(&query)
            {
                return false;
            }
        }
        true
    }
}

pub struct TaskRepository {
    tasks: Vec<Task>,
    clock: Arc<dyn Clock>,
}

impl TaskRepository {
    /// Creates an empty repository.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks: Vec::new(),
            clock,
        }
    }

    /// Hydrates a repository from previously stored tasks.
    ///
    /// Fails if two records share an id.
    pub fn with_tasks(tasks: Vec<Task>, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut seen = HashSet::new();
        for t in &tasks {
            if !seen.insert(t.id) {
                return Err(Error::validation("id", format!("duplicate task id {}", t.id)));
            }
        }
        Ok(Self { tasks, clock })
    }

    /// Wraps the repository for use from several threads.
    pub fn into_shared(self) -> SharedRepository {
        Arc::new(Mutex::new(self))
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Borrowed view of every task, for aggregation and persistence.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Copy of every task.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    fn position(&self, id: TaskId) -> Result<usize> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::not_found(id))
    }

    pub fn get(&self, id: TaskId) -> Result<Task> {
        let idx = self.position(id)?;
        Ok(self.tasks[idx].clone())
    }

    /// Resolves a full id or a unique prefix of one.
    pub fn resolve(&self, id_or_prefix: &str) -> Result<TaskId> {
        if let Ok(id) = id_or_prefix.parse::<TaskId>() {
            return self.position(id).map(|_| id);
        }
        let needle = id_or_prefix.to_lowercase().replace('-', "");
        if needle.is_empty() {
            return Err(Error::missing("id"));
        }
        let mut matches = self
            .tasks
            .iter()
            .filter(|t| t.id.to_string().replace('-', "").starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(t), None) => Ok(t.id),
            (Some(_), Some(_)) => Err(Error::AmbiguousId(id_or_prefix.to_string())),
            (None, _) => Err(Error::not_found(id_or_prefix)),
        }
    }

    /// Creates a single, non-recurring task.
    pub fn create(&mut self, fields: NewTask) -> Result<Task> {
        if fields.title.trim().is_empty() {
            tracing::warn!("rejected task without a title");
            return Err(Error::missing("title"));
        }
        if fields.category_id.trim().is_empty() {
            tracing::warn!(title = %fields.title, "rejected task without a category");
            return Err(Error::missing("categoryId"));
        }

        let task = Task {
            id: TaskId::new(),
            title: fields.title,
            description: fields.description,
            category_id: fields.category_id,
            priority: fields.priority,
            due_date: fields.due_date,
            completed: false,
            completed_at: None,
            created_at: self.clock.now(),
            archived: false,
            archived_at: None,
            is_recurring: false,
            recurring_id: None,
        };
        tracing::debug!(id = %task.id, title = %task.title, "created task");
        self.tasks.push(task.clone());
        Ok(task)
    }

    /// Merges `patch` onto an existing task.
    ///
    /// `completed_at` is stamped only when `completed` goes from false to true;
    /// otherwise it is carried over untouched, including when a task is
    /// reopened.
    pub fn update(&mut self, id: TaskId, patch: TaskPatch) -> Result<Task> {
        let idx = self.position(id)?;
        if patch.title.as_ref().is_some_and(|t| t.trim().is_empty()) {
            return Err(Error::missing("title"));
        }
        if patch.category_id.as_ref().is_some_and(|c| c.trim().is_empty()) {
            return Err(Error::missing("categoryId"));
        }

        let now = self.clock.now();
        let task = &mut self.tasks[idx];
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(category_id) = patch.category_id {
            task.category_id = category_id;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(completed) = patch.completed {
            if completed && !task.completed {
                task.completed_at = Some(now);
            }
            task.completed = completed;
        }
        tracing::debug!(id = %id, completed = task.completed, "updated task");
        Ok(task.clone())
    }

    /// Flips the completion state of a task.
    pub fn toggle_complete(&mut self, id: TaskId) -> Result<Task> {
        let idx = self.position(id)?;
        let done = !self.tasks[idx].completed;
        self.update(id, TaskPatch::completed(done))
    }

    /// Removes a task permanently.
    pub fn delete(&mut self, id: TaskId) -> Result<()> {
        let idx = self.position(id)?;
        self.tasks.remove(idx);
        tracing::debug!(id = %id, "deleted task");
        Ok(())
    }

    /// Moves a task out of the active listing. Completion state is untouched.
    pub fn archive(&mut self, id: TaskId) -> Result<Task> {
        let idx = self.position(id)?;
        let now = self.clock.now();
        let task = &mut self.tasks[idx];
        task.archived = true;
        task.archived_at = Some(now);
        tracing::debug!(id = %id, "archived task");
        Ok(task.clone())
    }

    /// Returns an archived task to the active listing.
    pub fn restore(&mut self, id: TaskId) -> Result<Task> {
        let idx = self.position(id)?;
        let task = &mut self.tasks[idx];
        task.archived = false;
        task.archived_at = None;
        tracing::debug!(id = %id, "restored task");
        Ok(task.clone())
    }

    /// Appends a batch of fully formed tasks, all or nothing.
    ///
    /// Every member is validated, and checked against existing ids and the
    /// rest of the batch, before any is inserted.
    pub fn append_batch(&mut self, batch: Vec<Task>) -> Result<Vec<Task>> {
        let mut ids: HashSet<TaskId> = self.tasks.iter().map(|t| t.id).collect();
        for task in &batch {
            if task.title.trim().is_empty() {
                return Err(Error::missing("title"));
            }
            if task.category_id.trim().is_empty() {
                return Err(Error::missing("categoryId"));
            }
            if !ids.insert(task.id) {
                return Err(Error::validation("id", format!("duplicate task id {}", task.id)));
            }
            if task.archived != task.archived_at.is_some() {
                return Err(Error::validation(
                    "archivedAt",
                    "must be set exactly when the task is archived",
                ));
            }
            // A reopened task may keep its old completed_at; the reverse is invalid.
            if task.completed && task.completed_at.is_none() {
                return Err(Error::validation("completedAt", "must be set on a completed task"));
            }
        }
        self.tasks.extend(batch.iter().cloned());
        Ok(batch)
    }

    /// Expands `spec` from `anchor` and stores every occurrence atomically.
    pub fn create_recurring(&mut self, spec: &RecurrenceSpec, anchor: NaiveDateTime) -> Result<Vec<Task>> {
        let batch = recurrence::expand(spec, anchor, self.clock.now())?;
        let created = self.append_batch(batch)?;
        tracing::info!(title = %spec.title, count = created.len(), "created recurring tasks");
        Ok(created)
    }

    /// Copies of every task matching `filter`, in insertion order.
    pub fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).cloned().collect()
    }

    pub fn by_category(&self, category_id: &str) -> Vec<Task> {
        self.list(&TaskFilter::default().category(category_id))
    }

    pub fn completed(&self) -> Vec<Task> {
        self.list(&TaskFilter::default().completed(true))
    }

    pub fn pending(&self) -> Vec<Task> {
        self.list(&TaskFilter::default().completed(false))
    }

    /// Tasks that are not archived.
    pub fn active(&self) -> Vec<Task> {
        self.list(&TaskFilter::default().archived(false))
    }

    pub fn archived(&self) -> Vec<Task> {
        self.list(&TaskFilter::default().archived(true))
    }
}
