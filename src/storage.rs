use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{CategoryDirectory, Task};
use crate::repository::TaskRepository;

const TASKS_FILE: &str = "tasks.json";
const CATEGORIES_FILE: &str = "categories.json";

/// JSON files in one data directory.
///
/// Holds `tasks.json` (the repository snapshot) and `categories.json` (the
/// category directory).
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn tasks_path(&self) -> PathBuf {
        self.dir.join(TASKS_FILE)
    }

    fn categories_path(&self) -> PathBuf {
        self.dir.join(CATEGORIES_FILE)
    }

    /// Loads every stored task.
    ///
    /// A missing file is an empty list; an unreadable or malformed one is an error.
    pub fn load_tasks(&self) -> Result<Vec<Task>> {
        read_json(&self.tasks_path())
    }

    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        write_json(&self.tasks_path(), tasks)
    }

    /// Builds a repository from the stored tasks.
    pub fn load_repository(&self, clock: Arc<dyn Clock>) -> Result<TaskRepository> {
        let tasks = self.load_tasks()?;
        tracing::debug!(count = tasks.len(), path = %self.tasks_path().display(), "loaded tasks");
        TaskRepository::with_tasks(tasks, clock)
    }

    pub fn save_repository(&self, repo: &TaskRepository) -> Result<()> {
        self.save_tasks(repo.tasks())
    }

    pub fn load_categories(&self) -> Result<CategoryDirectory> {
        read_json(&self.categories_path())
    }

    pub fn save_categories(&self, directory: &CategoryDirectory) -> Result<()> {
        write_json(&self.categories_path(), directory)
    }

    /// Deletes the tasks and categories files.
    pub fn reset(&self) -> Result<()> {
        for path in [self.tasks_path(), self.categories_path()] {
            if path.exists() {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let mut f = match OpenOptions::new().read(true).open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(T::default()),
        Err(e) => return Err(e.into()),
    };
    let mut s = String::new();
    f.read_to_string(&mut s)?;
    if s.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(&s)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    let mut f = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}
